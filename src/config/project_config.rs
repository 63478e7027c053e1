//! Project-level configuration support
//!
//! Loads per-project configuration from `classlens.toml` or
//! `.classlensrc.json` in the analyzed directory.
//!
//! # Configuration Format
//!
//! ```toml
//! # classlens.toml
//!
//! [analysis]
//! include = ["com.acme."]
//! exclude = ["com.acme.generated."]
//! workers = 8
//!
//! [rules.god-class]
//! enabled = true
//! thresholds = { method_count = 30, wmc = 60 }
//!
//! [rules.deep-inheritance]
//! severity = "high"  # Override default severity
//!
//! [scoring]
//! pillar_weights = { structure = 0.3, quality = 0.4, architecture = 0.3 }
//! kind_weights = { cyclic-dependency = 2.0 }
//! bonus_cap_ratio = 0.5
//!
//! [[classifier.patterns]]
//! role = "repository"
//! pattern = "\\.store\\."
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::models::{IssueKind, Severity};
use crate::resolver::PrefixPolicy;
use crate::rules::RuleConfig;

/// Project-level configuration loaded from classlens.toml or similar
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Scope and worker settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Per-rule configuration overrides
    #[serde(default)]
    pub rules: HashMap<String, RuleConfigOverride>,

    /// Scoring configuration
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Type role classification
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Which types are in scope, and how many workers to use
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Fully-qualified name prefixes to include (empty = everything)
    #[serde(default)]
    pub include: Vec<String>,

    /// Fully-qualified name prefixes to exclude
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Do not exclude the platform prefixes (`java.`, `kotlin.`, ...)
    #[serde(default)]
    pub skip_default_excludes: bool,

    /// Worker threads (0 or unset = auto)
    #[serde(default)]
    pub workers: Option<usize>,
}

impl AnalysisConfig {
    pub fn policy(&self) -> PrefixPolicy {
        let base = if self.skip_default_excludes {
            PrefixPolicy::empty()
        } else {
            PrefixPolicy::default()
        };
        let with_includes = self
            .include
            .iter()
            .fold(base, |p, prefix| p.with_include(prefix.clone()));
        self.exclude
            .iter()
            .fold(with_includes, |p, prefix| p.with_exclude(prefix.clone()))
    }
}

/// Configuration override for a specific rule
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleConfigOverride {
    /// Whether the rule is enabled (default: true)
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Override the default severity (critical, high, medium, low)
    #[serde(default)]
    pub severity: Option<String>,

    /// Rule-specific threshold overrides
    /// Keys depend on the rule (e.g., method_count, max_params)
    #[serde(default)]
    pub thresholds: HashMap<String, ThresholdValue>,
}

/// A threshold value can be an integer, float, boolean or string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl ThresholdValue {
    /// Get as i64 (returns None for non-numeric types)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ThresholdValue::Integer(v) => Some(*v),
            ThresholdValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ThresholdValue::Integer(v) => Some(*v as f64),
            ThresholdValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ThresholdValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ThresholdValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ThresholdValue::Integer(v) => serde_json::Value::from(*v),
            ThresholdValue::Float(v) => serde_json::Value::from(*v),
            ThresholdValue::Boolean(v) => serde_json::Value::from(*v),
            ThresholdValue::String(v) => serde_json::Value::from(v.as_str()),
        }
    }
}

/// Scoring configuration for the quality score
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Weights for each pillar (normalised to sum to 1.0)
    #[serde(default)]
    pub pillar_weights: PillarWeights,

    /// Penalty multipliers keyed by issue kind (`god-class = 1.5`)
    #[serde(default)]
    pub kind_weights: HashMap<String, f64>,

    /// Largest bonus a pillar may earn, as a share of its penalty
    #[serde(default = "default_bonus_cap_ratio")]
    pub bonus_cap_ratio: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pillar_weights: PillarWeights::default(),
            kind_weights: HashMap::new(),
            bonus_cap_ratio: default_bonus_cap_ratio(),
        }
    }
}

fn default_bonus_cap_ratio() -> f64 {
    0.5
}

impl ScoringConfig {
    /// Penalty multiplier for an issue kind (default 1.0)
    pub fn kind_weight(&self, kind: IssueKind) -> f64 {
        self.kind_weights
            .get(kind.as_str())
            .copied()
            .filter(|w| w.is_finite() && *w >= 0.0)
            .unwrap_or(1.0)
    }
}

/// Weights for the three scoring pillars
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PillarWeights {
    /// Weight for structure score (default: 0.4)
    #[serde(default = "default_structure_weight")]
    pub structure: f64,

    /// Weight for quality score (default: 0.3)
    #[serde(default = "default_quality_weight")]
    pub quality: f64,

    /// Weight for architecture score (default: 0.3)
    #[serde(default = "default_architecture_weight")]
    pub architecture: f64,
}

impl Default for PillarWeights {
    fn default() -> Self {
        Self {
            structure: default_structure_weight(),
            quality: default_quality_weight(),
            architecture: default_architecture_weight(),
        }
    }
}

fn default_structure_weight() -> f64 {
    0.4
}
fn default_quality_weight() -> f64 {
    0.3
}
fn default_architecture_weight() -> f64 {
    0.3
}

impl PillarWeights {
    /// Validate that weights sum to 1.0 (with tolerance)
    pub fn is_valid(&self) -> bool {
        let sum = self.structure + self.quality + self.architecture;
        (sum - 1.0).abs() < 0.001
    }

    /// Normalize weights to sum to 1.0.
    ///
    /// Weights with no usable total fall back to an equal split.
    pub fn normalize(&mut self) {
        let sum = self.structure + self.quality + self.architecture;
        if sum > 0.0 && sum.is_finite() {
            self.structure /= sum;
            self.quality /= sum;
            self.architecture /= sum;
        } else {
            self.structure = 1.0 / 3.0;
            self.quality = 1.0 / 3.0;
            self.architecture = 1.0 / 3.0;
        }
    }
}

/// Pattern-based type classifier configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClassifierConfig {
    /// Append the built-in naming and stereotype conventions after the
    /// configured patterns
    #[serde(default)]
    pub use_conventions: bool,

    /// Ordered, first match wins
    #[serde(default)]
    pub patterns: Vec<RolePattern>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RolePattern {
    pub role: String,
    /// Regex over the fully-qualified type name
    #[serde(default)]
    pub pattern: Option<String>,
    /// Fully-qualified metadata tag names
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Load project configuration from the analyzed directory.
///
/// Searches for configuration files in this order:
/// 1. `classlens.toml`
/// 2. `.classlensrc.json`
///
/// Returns default configuration if no config file is found.
pub fn load_project_config(root: &Path) -> ProjectConfig {
    let toml_path = root.join("classlens.toml");
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = root.join(".classlensrc.json");
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

/// Load an explicit config file; `.json` is read as JSON, anything else as TOML
pub fn load_config_file(path: &Path) -> anyhow::Result<ProjectConfig> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json_config(path),
        _ => load_toml_config(path),
    }
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

fn load_json_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    Ok(config)
}

impl ProjectConfig {
    fn rule_override(&self, name: &str) -> Option<&RuleConfigOverride> {
        let normalized = normalize_rule_name(name);
        self.rules
            .get(&normalized)
            .or_else(|| self.rules.get(name))
    }

    /// Check if a rule is enabled (defaults to true if not specified)
    pub fn is_rule_enabled(&self, name: &str) -> bool {
        self.rule_override(name)
            .and_then(|c| c.enabled)
            .unwrap_or(true)
    }

    /// Parsed severity override; unparseable values are ignored with a warning
    pub fn severity_override(&self, name: &str) -> Option<Severity> {
        let raw = self.rule_override(name)?.severity.as_deref()?;
        match raw.parse() {
            Ok(severity) => Some(severity),
            Err(e) => {
                warn!("Ignoring severity override for {}: {}", name, e);
                None
            }
        }
    }

    /// Names of rules explicitly disabled, sorted
    pub fn disabled_rules(&self) -> Vec<String> {
        let mut disabled: Vec<String> = self
            .rules
            .iter()
            .filter(|(_, c)| c.enabled == Some(false))
            .map(|(name, _)| normalize_rule_name(name))
            .collect();
        disabled.sort();
        disabled
    }

    /// Options handed to a rule at construction
    pub fn rule_config(&self, name: &str) -> RuleConfig {
        let mut config = RuleConfig::new();
        if let Some(o) = self.rule_override(name) {
            for (key, value) in &o.thresholds {
                config = config.with_option(key.clone(), value.to_json());
            }
        }
        if let Some(severity) = self.severity_override(name) {
            config = config.with_severity(severity);
        }
        config
    }

    /// Pillar weights, normalised when they do not sum to 1
    pub fn pillar_weights(&self) -> PillarWeights {
        let mut weights = self.scoring.pillar_weights.clone();
        if !weights.is_valid() {
            warn!("Pillar weights do not sum to 1.0, normalising");
            weights.normalize();
        }
        weights
    }
}

/// Normalize rule name for config lookup
/// Converts various formats to kebab-case for matching
pub fn normalize_rule_name(name: &str) -> String {
    // GodClassRule -> god-class
    // god_class -> god-class
    // LCOMRule -> lcom

    let mut result = String::new();
    let chars: Vec<char> = name.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_is_lower = i > 0 && chars[i - 1].is_lowercase();
            let is_acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && i + 1 < chars.len()
                && chars[i + 1].is_lowercase();

            if prev_is_lower || is_acronym_end {
                result.push('-');
            }
            result.extend(c.to_lowercase());
        } else if *c == '_' {
            result.push('-');
        } else {
            result.push(*c);
        }
    }

    result.trim_end_matches("-rule").to_string()
}
