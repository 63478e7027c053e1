//! Transactional proxy bypass rule
//!
//! Declarative transactions are applied by a proxy around the bean. A call
//! from one method of a type to a `@Transactional` method of the same type
//! goes through `this`, not the proxy, so the callee's transaction
//! settings are silently ignored. Only callers that are not themselves
//! transactional are reported: inside an existing transaction the
//! callee would join it anyway.

use std::collections::BTreeSet;

use super::base::{Rule, RuleConfig};
use crate::bytecode::{CallKind, InstructionEvent};
use crate::classfile::{MemberModel, MetadataKind, TypeModel};
use crate::metrics::ClassMetrics;
use crate::models::{Issue, IssueKind, Location, Severity};

pub struct TransactionalProxyBypassRule {
    config: RuleConfig,
}

impl TransactionalProxyBypassRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self { config }
    }

    /// Transactional methods called on `this` from `caller`, as signatures
    fn bypassed_calls<'m>(model: &'m TypeModel, caller: &MemberModel) -> BTreeSet<&'m str> {
        let Some(summary) = &caller.instructions else {
            return BTreeSet::new();
        };
        summary
            .calls()
            .filter_map(|event| match event {
                InstructionEvent::Call {
                    owner: Some(owner),
                    name,
                    descriptor,
                    kind,
                } if owner == &model.name && !matches!(kind, CallKind::Static | CallKind::Dynamic) => {
                    model.methods.iter().find(|m| {
                        &m.name == name
                            && &m.descriptor == descriptor
                            && m.has_tag_kind(MetadataKind::Transactional)
                    })
                }
                _ => None,
            })
            .map(|callee| callee.name.as_str())
            .collect()
    }
}

impl Default for TransactionalProxyBypassRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for TransactionalProxyBypassRule {
    fn name(&self) -> &'static str {
        "transactional-proxy-bypass"
    }

    fn description(&self) -> &'static str {
        "Detects self-calls that bypass the transactional proxy"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::TransactionalProxyBypass
    }

    fn check_class(&self, model: &TypeModel, _metrics: &ClassMetrics) -> Vec<Issue> {
        // Type-level transactions cover every public entry point
        if model.has_tag_kind(MetadataKind::Transactional) {
            return vec![];
        }

        let mut issues = Vec::new();
        for caller in model.methods.iter().filter(|m| m.is_executable()) {
            if caller.has_tag_kind(MetadataKind::Transactional) {
                continue;
            }
            for callee in Self::bypassed_calls(model, caller) {
                issues.push(Issue::new(
                    self.name(),
                    self.kind(),
                    Severity::High,
                    Location::member(&model.name, caller.signature()),
                    format!("Transaction bypassed: {} calls {}", caller.name, callee),
                    format!(
                        "{}.{} calls @Transactional method {} on the same instance; the \
                         call does not pass through the transactional proxy, so no \
                         transaction is started.",
                        model.name, caller.name, callee
                    ),
                    "Move the transactional method to a separate bean, annotate the \
                     caller instead, or call through the injected proxy.",
                ));
            }
        }
        issues
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }
}
