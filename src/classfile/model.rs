//! Structural model of a compiled type
//!
//! A `TypeModel` is produced once per class file by [`super::extract`] and is
//! never mutated afterwards. Models can also be assembled by hand with the
//! builder methods below, which is how callers synthesise fixtures.

use crate::bytecode::InstructionSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::descriptor::{parse_field_descriptor, parse_method_descriptor, TypeDescriptor};

/// JVM access flags (shared bit layout for types, fields and methods)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SYNCHRONIZED: u16 = 0x0020;
    pub const VOLATILE_OR_BRIDGE: u16 = 0x0040;
    pub const TRANSIENT_OR_VARARGS: u16 = 0x0080;
    pub const NATIVE: u16 = 0x0100;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const STRICT: u16 = 0x0800;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ANNOTATION: u16 = 0x2000;
    pub const ENUM: u16 = 0x4000;
    pub const MODULE: u16 = 0x8000;

    pub fn new(bits: u16) -> Self {
        Self(bits)
    }

    pub fn with(self, bits: u16) -> Self {
        Self(self.0 | bits)
    }

    pub fn contains(&self, bits: u16) -> bool {
        self.0 & bits == bits
    }

    pub fn is_public(&self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub fn is_private(&self) -> bool {
        self.contains(Self::PRIVATE)
    }

    pub fn is_protected(&self) -> bool {
        self.contains(Self::PROTECTED)
    }

    pub fn is_static(&self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.contains(Self::FINAL)
    }

    pub fn is_abstract(&self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn is_native(&self) -> bool {
        self.contains(Self::NATIVE)
    }

    pub fn is_synthetic(&self) -> bool {
        self.contains(Self::SYNTHETIC)
    }

    /// Only meaningful on methods (shares its bit with `volatile` on fields)
    pub fn is_bridge(&self) -> bool {
        self.contains(Self::VOLATILE_OR_BRIDGE)
    }

    pub fn visibility(&self) -> Visibility {
        if self.is_public() {
            Visibility::Public
        } else if self.is_protected() {
            Visibility::Protected
        } else if self.is_private() {
            Visibility::Private
        } else {
            Visibility::Package
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    AnnotationType,
    Module,
}

impl TypeKind {
    pub fn from_flags(flags: AccessFlags) -> Self {
        if flags.contains(AccessFlags::MODULE) {
            TypeKind::Module
        } else if flags.contains(AccessFlags::ANNOTATION) {
            TypeKind::AnnotationType
        } else if flags.contains(AccessFlags::INTERFACE) {
            TypeKind::Interface
        } else if flags.contains(AccessFlags::ENUM) {
            TypeKind::Enum
        } else {
            TypeKind::Class
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeKind::Class => write!(f, "class"),
            TypeKind::Interface => write!(f, "interface"),
            TypeKind::Enum => write!(f, "enum"),
            TypeKind::AnnotationType => write!(f, "annotation"),
            TypeKind::Module => write!(f, "module"),
        }
    }
}

/// Element value of a metadata tag attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TagValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Enum { type_name: String, constant: String },
    Class(String),
    Tag(Box<MetadataTag>),
    Array(Vec<TagValue>),
}

/// A declarative metadata tag (annotation) attached to a type or member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataTag {
    /// Dotted type name of the tag
    pub name: String,
    pub attributes: BTreeMap<String, TagValue>,
    /// Retained at runtime (`RuntimeVisibleAnnotations`)
    pub runtime_visible: bool,
}

impl MetadataTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            runtime_visible: true,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: TagValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> MetadataKind {
        MetadataKind::from_tag_name(&self.name)
    }
}

/// Recognised metadata tag families.
///
/// Rules match on this closed set instead of inspecting tag names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataKind {
    Injection,
    Transactional,
    Deprecated,
    Stereotype,
    Entity,
    Test,
    Other,
}

impl MetadataKind {
    pub fn from_tag_name(name: &str) -> Self {
        match name {
            "org.springframework.beans.factory.annotation.Autowired"
            | "javax.inject.Inject"
            | "jakarta.inject.Inject"
            | "javax.annotation.Resource"
            | "jakarta.annotation.Resource"
            | "com.google.inject.Inject" => MetadataKind::Injection,
            "org.springframework.transaction.annotation.Transactional"
            | "javax.transaction.Transactional"
            | "jakarta.transaction.Transactional" => MetadataKind::Transactional,
            "java.lang.Deprecated" | "kotlin.Deprecated" => MetadataKind::Deprecated,
            "org.springframework.stereotype.Component"
            | "org.springframework.stereotype.Service"
            | "org.springframework.stereotype.Repository"
            | "org.springframework.stereotype.Controller"
            | "org.springframework.web.bind.annotation.RestController"
            | "org.springframework.context.annotation.Configuration" => MetadataKind::Stereotype,
            "javax.persistence.Entity" | "jakarta.persistence.Entity" => MetadataKind::Entity,
            "org.junit.Test" | "org.junit.jupiter.api.Test" | "org.testng.annotations.Test" => {
                MetadataKind::Test
            }
            _ => MetadataKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Method,
    Constructor,
}

/// A field, method or constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberModel {
    pub kind: MemberKind,
    pub name: String,
    /// Raw JVM descriptor
    pub descriptor: String,
    pub modifiers: AccessFlags,
    pub tags: Vec<MetadataTag>,
    /// Present for members with a `Code` attribute
    pub instructions: Option<InstructionSummary>,
}

impl MemberModel {
    pub fn field(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self::new(MemberKind::Field, name.into(), descriptor.into())
    }

    /// A method; `<init>` becomes a constructor
    pub fn method(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        let name = name.into();
        let kind = if name == "<init>" {
            MemberKind::Constructor
        } else {
            MemberKind::Method
        };
        Self::new(kind, name, descriptor.into())
    }

    fn new(kind: MemberKind, name: String, descriptor: String) -> Self {
        Self {
            kind,
            name,
            descriptor,
            modifiers: AccessFlags::new(AccessFlags::PUBLIC),
            tags: Vec::new(),
            instructions: None,
        }
    }

    pub fn with_modifiers(mut self, modifiers: AccessFlags) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_tag(mut self, tag: MetadataTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_instructions(mut self, summary: InstructionSummary) -> Self {
        self.instructions = Some(summary);
        self
    }

    pub fn is_executable(&self) -> bool {
        matches!(self.kind, MemberKind::Method | MemberKind::Constructor)
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    /// `access$000`-style accessors the compiler emits for nested-class access
    pub fn is_synthetic_accessor(&self) -> bool {
        self.modifiers.is_synthetic() && self.name.starts_with("access$")
    }

    pub fn has_tag_kind(&self, kind: MetadataKind) -> bool {
        self.tags.iter().any(|t| t.kind() == kind)
    }

    /// Method identifier: `name(descriptor)`
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.descriptor)
    }

    /// Parameter types for executable members (empty on parse failure)
    pub fn parameter_types(&self) -> Vec<TypeDescriptor> {
        parse_method_descriptor(&self.descriptor)
            .map(|d| d.parameters)
            .unwrap_or_default()
    }

    /// Declared type of a field
    pub fn field_type(&self) -> Option<TypeDescriptor> {
        parse_field_descriptor(&self.descriptor).ok()
    }
}

/// The structural model of one compiled type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeModel {
    /// Fully-qualified dotted name (`com.acme.Foo$Bar`)
    pub name: String,
    pub kind: TypeKind,
    pub modifiers: AccessFlags,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<MemberModel>,
    /// Methods and constructors in declaration order
    pub methods: Vec<MemberModel>,
    pub tags: Vec<MetadataTag>,
    pub source_file: Option<String>,
    /// (major, minor) class-file version
    pub version: (u16, u16),
}

impl TypeModel {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        let mut modifiers = AccessFlags::new(AccessFlags::PUBLIC);
        if kind == TypeKind::Interface || kind == TypeKind::AnnotationType {
            modifiers = modifiers.with(AccessFlags::INTERFACE | AccessFlags::ABSTRACT);
        }
        Self {
            name: name.into(),
            kind,
            modifiers,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            tags: Vec::new(),
            source_file: None,
            version: (52, 0),
        }
    }

    pub fn with_modifiers(mut self, modifiers: AccessFlags) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        let interface = interface.into();
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
        self
    }

    pub fn with_field(mut self, field: MemberModel) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MemberModel) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_tag(mut self, tag: MetadataTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Package part of the name; empty for the default package
    pub fn package(&self) -> &str {
        package_of(&self.name)
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract() || self.kind == TypeKind::Interface
    }

    pub fn has_tag_kind(&self, kind: MetadataKind) -> bool {
        self.tags.iter().any(|t| t.kind() == kind)
    }

    pub fn field(&self, name: &str) -> Option<&MemberModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Methods excluding constructors and static initialisers
    pub fn plain_methods(&self) -> impl Iterator<Item = &MemberModel> {
        self.methods
            .iter()
            .filter(|m| m.kind == MemberKind::Method && !m.is_static_initializer())
    }
}

/// Package of a dotted type name; empty for the default package
pub fn package_of(name: &str) -> &str {
    name.rfind('.').map(|i| &name[..i]).unwrap_or("")
}
