//! Reference resolution
//!
//! Turns the names a `TypeModel` mentions (inheritance, member signatures,
//! metadata tags and instruction events) into typed `ReferenceEdge`s between
//! in-scope types. What counts as in scope is decided by an [`IncludePolicy`]
//! supplied by the caller.

use serde::{Deserialize, Serialize};

use crate::bytecode::InstructionEvent;
use crate::classfile::{MemberModel, MetadataTag, TypeModel};

/// Prefixes excluded by [`PrefixPolicy::default`]
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "java.", "javax.", "jdk.", "sun.", "com.sun.", "kotlin.", "scala.", "jakarta.",
];

/// Decides whether a fully-qualified type name belongs to the analyzed project
pub trait IncludePolicy: Send + Sync {
    fn includes(&self, type_name: &str) -> bool;
}

impl<F> IncludePolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn includes(&self, type_name: &str) -> bool {
        self(type_name)
    }
}

/// Include/exclude by name prefix.
///
/// Excludes win over includes. An empty include list admits everything not
/// excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixPolicy {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Default for PrefixPolicy {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PrefixPolicy {
    /// A policy with no default excludes
    pub fn empty() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn with_include(mut self, prefix: impl Into<String>) -> Self {
        self.include.push(prefix.into());
        self
    }

    pub fn with_exclude(mut self, prefix: impl Into<String>) -> Self {
        self.exclude.push(prefix.into());
        self
    }
}

impl IncludePolicy for PrefixPolicy {
    fn includes(&self, type_name: &str) -> bool {
        if self.exclude.iter().any(|p| type_name.starts_with(p.as_str())) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|p| type_name.starts_with(p.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Inheritance,
    FieldType,
    Parameter,
    Return,
    Call,
    Construction,
    Cast,
    FieldAccess,
    Metadata,
}

/// One reference from a type to another in-scope type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub source: String,
    pub target: String,
    pub kind: ReferenceKind,
}

/// Collect every in-scope reference a type makes.
///
/// Each occurrence yields one edge, so repeated calls to the same type show
/// up as multiplicity. References to the type itself are dropped.
pub fn resolve(model: &TypeModel, policy: &dyn IncludePolicy) -> Vec<ReferenceEdge> {
    let mut collector = Collector {
        source: &model.name,
        policy,
        edges: Vec::new(),
    };

    if let Some(sup) = &model.superclass {
        collector.add(sup, ReferenceKind::Inheritance);
    }
    for iface in &model.interfaces {
        collector.add(iface, ReferenceKind::Inheritance);
    }
    collector.add_tags(&model.tags);

    for field in &model.fields {
        if let Some(ty) = field.field_type() {
            if let Some(target) = ty.referenced_type() {
                collector.add(target, ReferenceKind::FieldType);
            }
        }
        collector.add_tags(&field.tags);
    }

    for method in &model.methods {
        collector.add_method(method);
    }

    collector.edges
}

struct Collector<'a> {
    source: &'a str,
    policy: &'a dyn IncludePolicy,
    edges: Vec<ReferenceEdge>,
}

impl Collector<'_> {
    fn add(&mut self, target: &str, kind: ReferenceKind) {
        if target == self.source || !self.policy.includes(target) {
            return;
        }
        self.edges.push(ReferenceEdge {
            source: self.source.to_string(),
            target: target.to_string(),
            kind,
        });
    }

    fn add_tags(&mut self, tags: &[MetadataTag]) {
        for tag in tags {
            self.add(&tag.name, ReferenceKind::Metadata);
        }
    }

    fn add_method(&mut self, method: &MemberModel) {
        if let Ok(descriptor) =
            crate::classfile::descriptor::parse_method_descriptor(&method.descriptor)
        {
            for param in &descriptor.parameters {
                if let Some(target) = param.referenced_type() {
                    self.add(target, ReferenceKind::Parameter);
                }
            }
            if let Some(target) = descriptor.return_type.referenced_type() {
                self.add(target, ReferenceKind::Return);
            }
        }
        self.add_tags(&method.tags);

        let Some(summary) = &method.instructions else {
            return;
        };
        for event in &summary.events {
            match event {
                InstructionEvent::Call {
                    owner: Some(owner), ..
                } => self.add(owner, ReferenceKind::Call),
                InstructionEvent::FieldAccess { owner, .. } => {
                    self.add(owner, ReferenceKind::FieldAccess)
                }
                InstructionEvent::Construction { type_name } => {
                    self.add(type_name, ReferenceKind::Construction)
                }
                InstructionEvent::Cast { type_name, .. } => self.add(type_name, ReferenceKind::Cast),
                _ => {}
            }
        }
    }
}
