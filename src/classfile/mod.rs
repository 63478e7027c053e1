//! Structural model extraction from compiled class files
//!
//! `extract` parses one class file into a [`TypeModel`] without resolving any
//! of the types it references. Method bodies are handed to the instruction
//! walker as they are read, so each model carries its `InstructionSummary`.

pub mod constant_pool;
pub mod descriptor;
pub mod model;
pub(crate) mod reader;

#[cfg(test)]
pub(crate) mod builder;

pub use descriptor::{DescriptorError, MethodDescriptor, TypeDescriptor};
pub use model::{
    package_of, AccessFlags, MemberKind, MemberModel, MetadataKind, MetadataTag, TagValue,
    TypeKind, TypeModel, Visibility,
};

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, trace};

use crate::bytecode::{self, ExceptionHandler};
use constant_pool::{Constant, ConstantPool};
use descriptor::{class_constant_to_type, internal_to_dotted, parse_field_descriptor};
use reader::ByteReader;

const MAGIC: u32 = 0xCAFE_BABE;
const DEPRECATED_TAG: &str = "java.lang.Deprecated";

/// A class file that cannot be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedTypeError {
    #[error("truncated input at byte {offset}")]
    Truncated { offset: usize },

    #[error("bad magic number 0x{found:08X}")]
    BadMagic { found: u32 },

    #[error("constant pool index {index} is out of range or unusable")]
    BadConstantIndex { index: u16 },

    #[error("constant #{index} is {found}, expected {expected}")]
    WrongConstantKind {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    InvalidDescriptor(#[from] DescriptorError),

    #[error("invalid modified UTF-8 in constant at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("unknown constant pool tag {tag} at byte {offset}")]
    UnknownConstantTag { tag: u8, offset: usize },

    #[error("malformed {attribute} attribute at byte {offset}")]
    BadAttribute { attribute: String, offset: usize },
}

/// Parse one compiled type.
///
/// No referenced type needs to be resolvable; references stay as names.
pub fn extract(bytes: &[u8]) -> Result<TypeModel, MalformedTypeError> {
    let mut r = ByteReader::new(bytes);

    let magic = r.u4()?;
    if magic != MAGIC {
        return Err(MalformedTypeError::BadMagic { found: magic });
    }
    let minor = r.u2()?;
    let major = r.u2()?;

    let pool = ConstantPool::parse(&mut r)?;

    let modifiers = AccessFlags::new(r.u2()?);
    let this_class = pool.class_name(r.u2()?)?;
    let name = internal_to_dotted(this_class);

    let super_index = r.u2()?;
    let superclass = if super_index == 0 {
        None
    } else {
        class_constant_to_type(pool.class_name(super_index)?)
    };

    let interface_count = r.u2()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        let iface = internal_to_dotted(pool.class_name(r.u2()?)?);
        if !interfaces.contains(&iface) {
            interfaces.push(iface);
        }
    }

    let field_count = r.u2()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(read_member(&mut r, &pool, false)?);
    }

    let method_count = r.u2()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(read_member(&mut r, &pool, true)?);
    }

    let attrs = read_attributes(&mut r, &pool, AttributeOwner::Type)?;

    let mut tags = attrs.tags;
    if attrs.deprecated {
        add_deprecated(&mut tags);
    }

    trace!(
        "Extracted {} ({} fields, {} methods)",
        name,
        fields.len(),
        methods.len()
    );

    Ok(TypeModel {
        name,
        kind: TypeKind::from_flags(modifiers),
        modifiers,
        superclass,
        interfaces,
        fields,
        methods,
        tags,
        source_file: attrs.source_file,
        version: (major, minor),
    })
}

fn read_member(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
    executable: bool,
) -> Result<MemberModel, MalformedTypeError> {
    let modifiers = AccessFlags::new(r.u2()?);
    let name = pool.utf8(r.u2()?)?.to_string();
    let descriptor = pool.utf8(r.u2()?)?.to_string();

    if executable {
        descriptor::parse_method_descriptor(&descriptor)?;
    } else {
        parse_field_descriptor(&descriptor)?;
    }

    let owner = if executable {
        AttributeOwner::Method
    } else {
        AttributeOwner::Field
    };
    let attrs = read_attributes(r, pool, owner)?;

    let mut member = if executable {
        MemberModel::method(name, descriptor)
    } else {
        MemberModel::field(name, descriptor)
    }
    .with_modifiers(modifiers);

    member.tags = attrs.tags;
    if attrs.deprecated {
        add_deprecated(&mut member.tags);
    }
    member.instructions = attrs.code;
    Ok(member)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum AttributeOwner {
    Type,
    Field,
    Method,
}

#[derive(Default)]
struct Attributes {
    tags: Vec<MetadataTag>,
    deprecated: bool,
    source_file: Option<String>,
    code: Option<bytecode::InstructionSummary>,
}

fn read_attributes(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
    owner: AttributeOwner,
) -> Result<Attributes, MalformedTypeError> {
    let mut out = Attributes::default();
    let count = r.u2()?;
    for _ in 0..count {
        let name = pool.utf8(r.u2()?)?;
        let length = r.u4()? as usize;
        let mut body = r.sub_reader(length)?;

        match (name, owner) {
            ("RuntimeVisibleAnnotations", _) => {
                out.tags.extend(read_annotations(&mut body, pool, true)?);
            }
            ("RuntimeInvisibleAnnotations", _) => {
                out.tags.extend(read_annotations(&mut body, pool, false)?);
            }
            ("Deprecated", _) => out.deprecated = true,
            ("SourceFile", AttributeOwner::Type) => {
                out.source_file = Some(pool.utf8(body.u2()?)?.to_string());
            }
            ("Code", AttributeOwner::Method) => {
                // A broken body degrades this method only
                let summary = read_code(&mut body, pool).unwrap_or_else(|e| {
                    debug!("Malformed Code attribute: {}", e);
                    bytecode::InstructionSummary {
                        warning: Some(format!("malformed Code attribute: {}", e)),
                        ..Default::default()
                    }
                });
                out.code = Some(summary);
            }
            _ => {}
        }
    }
    Ok(out)
}

fn read_code(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<bytecode::InstructionSummary, MalformedTypeError> {
    let _max_stack = r.u2()?;
    let _max_locals = r.u2()?;
    let code_length = r.u4()? as usize;
    let code = r.take(code_length)?;

    let handler_count = r.u2()?;
    let mut handlers = Vec::with_capacity(handler_count as usize);
    for _ in 0..handler_count {
        handlers.push(ExceptionHandler {
            start_pc: r.u2()?,
            end_pc: r.u2()?,
            handler_pc: r.u2()?,
            catch_type: r.u2()?,
        });
    }
    // Nested attributes (line numbers, stack maps) carry nothing we model

    Ok(bytecode::walk(code, &handlers, pool))
}

fn read_annotations(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
    runtime_visible: bool,
) -> Result<Vec<MetadataTag>, MalformedTypeError> {
    let count = r.u2()?;
    let mut tags = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut tag = read_annotation(r, pool)?;
        tag.runtime_visible = runtime_visible;
        tags.push(tag);
    }
    Ok(tags)
}

fn read_annotation(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<MetadataTag, MalformedTypeError> {
    let type_descriptor = pool.utf8(r.u2()?)?;
    let name = tag_type_name(type_descriptor)?;

    let pair_count = r.u2()?;
    let mut attributes = BTreeMap::new();
    for _ in 0..pair_count {
        let key = pool.utf8(r.u2()?)?.to_string();
        let value = read_element_value(r, pool)?;
        attributes.insert(key, value);
    }

    Ok(MetadataTag {
        name,
        attributes,
        runtime_visible: true,
    })
}

fn read_element_value(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<TagValue, MalformedTypeError> {
    let offset = r.position();
    let tag = r.u1()?;
    let value = match tag {
        b'B' | b'I' | b'S' => TagValue::Int(int_constant(pool, r.u2()?)? as i64),
        b'C' => {
            let code = int_constant(pool, r.u2()?)?;
            TagValue::Char(char::from_u32(code as u32).unwrap_or('\u{FFFD}'))
        }
        b'Z' => TagValue::Bool(int_constant(pool, r.u2()?)? != 0),
        b'J' => {
            let index = r.u2()?;
            match pool.get(index)? {
                Constant::Long(v) => TagValue::Int(*v),
                other => return Err(wrong_kind(index, "Long", other)),
            }
        }
        b'F' | b'D' => {
            let index = r.u2()?;
            match pool.get(index)? {
                Constant::Float(v) => TagValue::Float(*v as f64),
                Constant::Double(v) => TagValue::Float(*v),
                other => return Err(wrong_kind(index, "Float", other)),
            }
        }
        b's' => TagValue::Str(pool.utf8(r.u2()?)?.to_string()),
        b'e' => {
            let type_descriptor = pool.utf8(r.u2()?)?;
            TagValue::Enum {
                type_name: tag_type_name(type_descriptor)?,
                constant: pool.utf8(r.u2()?)?.to_string(),
            }
        }
        b'c' => {
            let descriptor = pool.utf8(r.u2()?)?;
            // `void.class` is written as "V"
            let type_name = match parse_field_descriptor(descriptor) {
                Ok(TypeDescriptor::Object(name)) => name,
                _ => descriptor.to_string(),
            };
            TagValue::Class(type_name)
        }
        b'@' => TagValue::Tag(Box::new(read_annotation(r, pool)?)),
        b'[' => {
            let count = r.u2()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(read_element_value(r, pool)?);
            }
            TagValue::Array(values)
        }
        _ => {
            return Err(MalformedTypeError::BadAttribute {
                attribute: "annotation element".to_string(),
                offset,
            })
        }
    };
    Ok(value)
}

fn int_constant(pool: &ConstantPool, index: u16) -> Result<i32, MalformedTypeError> {
    match pool.get(index)? {
        Constant::Integer(v) => Ok(*v),
        other => Err(wrong_kind(index, "Integer", other)),
    }
}

fn wrong_kind(index: u16, expected: &'static str, found: &Constant) -> MalformedTypeError {
    let found = match found {
        Constant::Utf8(_) => "Utf8",
        Constant::Integer(_) => "Integer",
        Constant::Float(_) => "Float",
        Constant::Long(_) => "Long",
        Constant::Double(_) => "Double",
        _ => "non-literal constant",
    };
    MalformedTypeError::WrongConstantKind {
        index,
        expected,
        found,
    }
}

/// `Lcom/acme/Inject;` -> `com.acme.Inject`
fn tag_type_name(descriptor: &str) -> Result<String, MalformedTypeError> {
    match parse_field_descriptor(descriptor)? {
        TypeDescriptor::Object(name) => Ok(name),
        _ => Err(MalformedTypeError::InvalidDescriptor(DescriptorError {
            descriptor: descriptor.to_string(),
            position: 0,
        })),
    }
}

fn add_deprecated(tags: &mut Vec<MetadataTag>) {
    if !tags.iter().any(|t| t.name == DEPRECATED_TAG) {
        tags.push(MetadataTag::new(DEPRECATED_TAG));
    }
}
