//! Type role classification
//!
//! Deciding whether a type is a controller, a repository and so on is a
//! naming and metadata heuristic, so it lives behind the [`TypeClassifier`]
//! trait and is supplied by the caller. The analysis itself only consumes
//! the resulting [`TypeRole`].

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classfile::{MetadataKind, TypeModel};
use crate::config::ClassifierConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRole {
    Controller,
    Service,
    Repository,
    Entity,
    Configuration,
    Test,
    #[default]
    Unclassified,
}

impl std::str::FromStr for TypeRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "controller" => Ok(TypeRole::Controller),
            "service" => Ok(TypeRole::Service),
            "repository" => Ok(TypeRole::Repository),
            "entity" => Ok(TypeRole::Entity),
            "configuration" | "config" => Ok(TypeRole::Configuration),
            "test" => Ok(TypeRole::Test),
            "unclassified" => Ok(TypeRole::Unclassified),
            other => Err(format!("unknown type role '{}'", other)),
        }
    }
}

pub trait TypeClassifier: Send + Sync {
    fn classify(&self, model: &TypeModel) -> TypeRole;
}

/// Leaves every type unclassified
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClassifier;

impl TypeClassifier for NoClassifier {
    fn classify(&self, _model: &TypeModel) -> TypeRole {
        TypeRole::Unclassified
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Name(Regex),
    Tag(String),
    Kind(MetadataKind),
}

/// First-match-wins list of (role, matcher) rules
#[derive(Debug, Clone, Default)]
pub struct PatternClassifier {
    rules: Vec<(TypeRole, Matcher)>,
}

impl PatternClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match the fully-qualified type name against a regex
    pub fn with_name_pattern(mut self, role: TypeRole, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("invalid classifier pattern '{}'", pattern))?;
        self.rules.push((role, Matcher::Name(regex)));
        Ok(self)
    }

    /// Match a metadata tag by fully-qualified name
    pub fn with_tag(mut self, role: TypeRole, tag: impl Into<String>) -> Self {
        self.rules.push((role, Matcher::Tag(tag.into())));
        self
    }

    pub fn with_metadata_kind(mut self, role: TypeRole, kind: MetadataKind) -> Self {
        self.rules.push((role, Matcher::Kind(kind)));
        self
    }

    /// Common enterprise naming conventions
    pub fn conventional() -> Self {
        let mut c = Self::new()
            .with_metadata_kind(TypeRole::Entity, MetadataKind::Entity)
            .with_tag(TypeRole::Controller, "org.springframework.stereotype.Controller")
            .with_tag(
                TypeRole::Controller,
                "org.springframework.web.bind.annotation.RestController",
            )
            .with_tag(TypeRole::Service, "org.springframework.stereotype.Service")
            .with_tag(TypeRole::Repository, "org.springframework.stereotype.Repository")
            .with_tag(
                TypeRole::Configuration,
                "org.springframework.context.annotation.Configuration",
            );
        let names = [
            (TypeRole::Test, r"(Test|Tests|IT)$"),
            (TypeRole::Controller, r"(Controller|Resource|Endpoint)$"),
            (TypeRole::Service, r"(Service|ServiceImpl)$"),
            (TypeRole::Repository, r"(Repository|Dao|DAO)$"),
            (TypeRole::Configuration, r"(Config|Configuration)$"),
        ];
        for (role, pattern) in names {
            if let Ok(regex) = Regex::new(pattern) {
                c.rules.push((role, Matcher::Name(regex)));
            }
        }
        c
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        // Configured patterns take precedence over conventions
        let mut c = Self::new();
        for p in &config.patterns {
            let role: TypeRole = p.role.parse().map_err(anyhow::Error::msg)?;
            if let Some(pattern) = &p.pattern {
                c = c.with_name_pattern(role, pattern)?;
            }
            for tag in &p.tags {
                c = c.with_tag(role, tag.clone());
            }
        }
        if config.use_conventions {
            c.rules.extend(Self::conventional().rules);
        }
        Ok(c)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl TypeClassifier for PatternClassifier {
    fn classify(&self, model: &TypeModel) -> TypeRole {
        for (role, matcher) in &self.rules {
            let hit = match matcher {
                Matcher::Name(regex) => regex.is_match(&model.name),
                Matcher::Tag(name) => model.tags.iter().any(|t| &t.name == name),
                Matcher::Kind(kind) => model.has_tag_kind(*kind),
            };
            if hit {
                return *role;
            }
        }
        TypeRole::Unclassified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{MetadataTag, TypeKind};
    use crate::config::RolePattern;

    #[test]
    fn test_no_classifier() {
        let t = TypeModel::new("a.UserController", TypeKind::Class);
        assert_eq!(NoClassifier.classify(&t), TypeRole::Unclassified);
    }

    #[test]
    fn test_conventional_names_and_tags() {
        let c = PatternClassifier::conventional();
        let ctl = TypeModel::new("a.UserController", TypeKind::Class);
        assert_eq!(c.classify(&ctl), TypeRole::Controller);

        let tagged = TypeModel::new("a.Billing", TypeKind::Class)
            .with_tag(MetadataTag::new("org.springframework.stereotype.Service"));
        assert_eq!(c.classify(&tagged), TypeRole::Service);

        let entity = TypeModel::new("a.Order", TypeKind::Class)
            .with_tag(MetadataTag::new("jakarta.persistence.Entity"));
        assert_eq!(c.classify(&entity), TypeRole::Entity);

        let test = TypeModel::new("a.OrderServiceTest", TypeKind::Class);
        assert_eq!(c.classify(&test), TypeRole::Test);
    }

    #[test]
    fn test_config_patterns_take_precedence() {
        let config = ClassifierConfig {
            use_conventions: true,
            patterns: vec![RolePattern {
                role: "repository".into(),
                pattern: Some(r"\.store\.".into()),
                tags: vec![],
            }],
        };
        let c = PatternClassifier::from_config(&config).unwrap();
        let t = TypeModel::new("a.store.CartService", TypeKind::Class);
        assert_eq!(c.classify(&t), TypeRole::Repository);
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let config = ClassifierConfig {
            use_conventions: false,
            patterns: vec![RolePattern {
                role: "service".into(),
                pattern: Some("(".into()),
                tags: vec![],
            }],
        };
        assert!(PatternClassifier::from_config(&config).is_err());
    }
}
