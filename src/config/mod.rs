//! Configuration module for classlens
//!
//! This module handles:
//! - Project-level configuration (classlens.toml)
//! - Include/exclude scope for reference resolution
//! - Rule threshold overrides
//! - Scoring customization
//! - Type classifier patterns

mod project_config;

pub use project_config::{
    load_config_file, load_project_config, normalize_rule_name, AnalysisConfig,
    ClassifierConfig, PillarWeights, ProjectConfig, RolePattern, RuleConfigOverride,
    ScoringConfig, ThresholdValue,
};
