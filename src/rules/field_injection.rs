//! Field injection rule
//!
//! Fields filled by a dependency-injection container (`@Autowired`,
//! `@Inject`, `@Resource`) hide a type's dependencies from its constructor,
//! cannot be final, and make the type unusable without the container.

use super::base::{Rule, RuleConfig};
use crate::classfile::{MetadataKind, TypeModel};
use crate::classify::TypeRole;
use crate::metrics::ClassMetrics;
use crate::models::{Issue, IssueKind, Location, Severity};

pub struct FieldInjectionRule {
    config: RuleConfig,
    /// From this many injected fields on one type, each issue is Medium
    many_injections: usize,
}

impl FieldInjectionRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self {
            many_injections: config.get_option_or("many_injections", 5),
            config,
        }
    }
}

impl Default for FieldInjectionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for FieldInjectionRule {
    fn name(&self) -> &'static str {
        "field-injection"
    }

    fn description(&self) -> &'static str {
        "Detects container-injected fields"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::FieldInjection
    }

    fn check_class(&self, model: &TypeModel, metrics: &ClassMetrics) -> Vec<Issue> {
        if metrics.role == TypeRole::Test {
            return vec![];
        }
        let injected: Vec<_> = model
            .fields
            .iter()
            .filter(|f| f.has_tag_kind(MetadataKind::Injection))
            .collect();
        let severity = if injected.len() >= self.many_injections {
            Severity::Medium
        } else {
            Severity::Low
        };

        injected
            .into_iter()
            .map(|field| {
                let tag = field
                    .tags
                    .iter()
                    .find(|t| t.kind() == MetadataKind::Injection)
                    .map(|t| t.name.rsplit('.').next().unwrap_or(&t.name))
                    .unwrap_or("Inject");
                Issue::new(
                    self.name(),
                    self.kind(),
                    severity,
                    Location::member(&model.name, &field.name),
                    format!("Field injection: {}.{}", model.simple_name(), field.name),
                    format!(
                        "Field {} of {} is injected with @{} instead of through the constructor.",
                        field.name, model.name, tag
                    ),
                    "Use constructor injection: declare the dependency as a final field \
                     and take it as a constructor parameter.",
                )
            })
            .collect()
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }
}
