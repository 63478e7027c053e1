//! Per-run analysis context
//!
//! Everything a run needs is carried here and owned by the caller: project
//! configuration, the include policy, the type classifier, the rule list,
//! the cancellation token and the worker count. Nothing is process-wide.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use super::CancellationToken;
use crate::classify::{NoClassifier, PatternClassifier, TypeClassifier};
use crate::config::ProjectConfig;
use crate::resolver::{IncludePolicy, PrefixPolicy};
use crate::rules::{default_rules, effective_workers, Rule};

/// Progress callback: (completed, total)
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

#[derive(Clone)]
pub struct AnalysisContext {
    pub config: ProjectConfig,
    pub policy: Arc<dyn IncludePolicy>,
    pub classifier: Arc<dyn TypeClassifier>,
    pub rules: Vec<Arc<dyn Rule>>,
    pub cancel: CancellationToken,
    /// Resolved worker count (never 0)
    pub workers: usize,
    pub progress: Option<ProgressCallback>,
}

impl fmt::Debug for AnalysisContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisContext")
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("workers", &self.workers)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Default for AnalysisContext {
    fn default() -> Self {
        let config = ProjectConfig::default();
        Self {
            rules: default_rules(&config),
            config,
            policy: Arc::new(PrefixPolicy::default()),
            classifier: Arc::new(NoClassifier),
            cancel: CancellationToken::new(),
            workers: effective_workers(0),
            progress: None,
        }
    }
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context driven by a project config.
    ///
    /// Fails only when a classifier pattern is not a valid regex or names
    /// an unknown role.
    pub fn from_config(config: ProjectConfig) -> Result<Self> {
        let classifier: Arc<dyn TypeClassifier> =
            if config.classifier.patterns.is_empty() && !config.classifier.use_conventions {
                Arc::new(NoClassifier)
            } else {
                Arc::new(PatternClassifier::from_config(&config.classifier)?)
            };
        Ok(Self {
            rules: default_rules(&config),
            policy: Arc::new(config.analysis.policy()),
            classifier,
            cancel: CancellationToken::new(),
            workers: effective_workers(config.analysis.workers.unwrap_or(0)),
            progress: None,
            config,
        })
    }

    pub fn with_policy(mut self, policy: impl IncludePolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn with_classifier(mut self, classifier: impl TypeClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Replace the rule list
    pub fn with_rules(mut self, rules: Vec<Arc<dyn Rule>>) -> Self {
        self.rules = rules;
        self
    }

    /// Append a rule after the configured ones
    pub fn with_rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Worker threads (0 = auto-detect)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = effective_workers(workers);
        self
    }

    /// Called after each extracted type
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{TypeKind, TypeModel};
    use crate::classify::TypeRole;

    #[test]
    fn test_default_context() {
        let ctx = AnalysisContext::new();
        assert_eq!(ctx.rules.len(), 11);
        assert!(ctx.workers >= 1);
        assert!(!ctx.policy.includes("java.util.List"));
        assert!(ctx.policy.includes("com.acme.Order"));
    }

    #[test]
    fn test_from_config() {
        let config: ProjectConfig = toml::from_str(
            r#"
[analysis]
include = ["com.acme."]
workers = 3

[rules.field-injection]
enabled = false

[[classifier.patterns]]
role = "service"
pattern = "Manager$"
"#,
        )
        .unwrap();
        let ctx = AnalysisContext::from_config(config).unwrap();
        assert_eq!(ctx.workers, 3);
        assert_eq!(ctx.rules.len(), 10);
        assert!(!ctx.policy.includes("org.other.Thing"));
        let t = TypeModel::new("com.acme.OrderManager", TypeKind::Class);
        assert_eq!(ctx.classifier.classify(&t), TypeRole::Service);
    }

    #[test]
    fn test_closure_policy() {
        let ctx = AnalysisContext::new().with_policy(|name: &str| name.starts_with("app."));
        assert!(ctx.policy.includes("app.X"));
        assert!(!ctx.policy.includes("lib.Y"));
    }

    #[test]
    fn test_bad_classifier_pattern() {
        let config: ProjectConfig = toml::from_str(
            r#"
[[classifier.patterns]]
role = "wizard"
pattern = "Magic$"
"#,
        )
        .unwrap();
        assert!(AnalysisContext::from_config(config).is_err());
    }
}
