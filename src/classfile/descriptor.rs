//! Field and method descriptor parsing
//!
//! Descriptors use the JVM internal grammar (`I`, `[Ljava/lang/String;`,
//! `(IJ)V`). Object names are converted to dotted form on the way out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid descriptor '{descriptor}' at position {position}")]
pub struct DescriptorError {
    pub descriptor: String,
    pub position: usize,
}

/// A parsed field type, parameter type or return type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Primitive(char),
    Object(String),
    Array(Box<TypeDescriptor>),
    Void,
}

impl TypeDescriptor {
    /// Innermost object type, if any (`[[Lfoo/Bar;` -> `foo.Bar`)
    pub fn referenced_type(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Object(name) => Some(name.as_str()),
            TypeDescriptor::Array(inner) => inner.referenced_type(),
            TypeDescriptor::Primitive(_) | TypeDescriptor::Void => None,
        }
    }
}

/// Parsed method descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub parameters: Vec<TypeDescriptor>,
    pub return_type: TypeDescriptor,
}

/// Convert an internal name (`com/acme/Foo$Bar`) to dotted form (`com.acme.Foo$Bar`)
pub fn internal_to_dotted(name: &str) -> String {
    name.replace('/', ".")
}

/// Convert the name stored in a `Class` constant to a dotted element type name.
///
/// Array classes (`[Lcom/acme/Foo;`) resolve to their element type; arrays of
/// primitives resolve to `None`.
pub fn class_constant_to_type(name: &str) -> Option<String> {
    if name.starts_with('[') {
        parse_field_descriptor(name)
            .ok()
            .and_then(|d| d.referenced_type().map(str::to_string))
    } else {
        Some(internal_to_dotted(name))
    }
}

pub fn parse_field_descriptor(descriptor: &str) -> Result<TypeDescriptor, DescriptorError> {
    let bytes = descriptor.as_bytes();
    let (ty, end) = parse_type(descriptor, bytes, 0)?;
    if end != bytes.len() || ty == TypeDescriptor::Void {
        return Err(DescriptorError {
            descriptor: descriptor.to_string(),
            position: end,
        });
    }
    Ok(ty)
}

pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodDescriptor, DescriptorError> {
    let bytes = descriptor.as_bytes();
    let err = |position| DescriptorError {
        descriptor: descriptor.to_string(),
        position,
    };

    if bytes.first() != Some(&b'(') {
        return Err(err(0));
    }

    let mut pos = 1;
    let mut parameters = Vec::new();
    loop {
        match bytes.get(pos) {
            Some(b')') => {
                pos += 1;
                break;
            }
            Some(_) => {
                let (ty, next) = parse_type(descriptor, bytes, pos)?;
                if ty == TypeDescriptor::Void {
                    return Err(err(pos));
                }
                parameters.push(ty);
                pos = next;
            }
            None => return Err(err(pos)),
        }
    }

    let (return_type, end) = parse_type(descriptor, bytes, pos)?;
    if end != bytes.len() {
        return Err(err(end));
    }

    Ok(MethodDescriptor {
        parameters,
        return_type,
    })
}

fn parse_type(
    descriptor: &str,
    bytes: &[u8],
    pos: usize,
) -> Result<(TypeDescriptor, usize), DescriptorError> {
    let err = |position| DescriptorError {
        descriptor: descriptor.to_string(),
        position,
    };

    match bytes.get(pos).copied() {
        Some(c @ (b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z')) => {
            Ok((TypeDescriptor::Primitive(c as char), pos + 1))
        }
        Some(b'V') => Ok((TypeDescriptor::Void, pos + 1)),
        Some(b'L') => {
            let rest = &descriptor[pos + 1..];
            let semi = rest.find(';').ok_or_else(|| err(pos))?;
            if semi == 0 {
                return Err(err(pos + 1));
            }
            let name = internal_to_dotted(&rest[..semi]);
            Ok((TypeDescriptor::Object(name), pos + 1 + semi + 1))
        }
        Some(b'[') => {
            let (inner, next) = parse_type(descriptor, bytes, pos + 1)?;
            if inner == TypeDescriptor::Void {
                return Err(err(pos + 1));
            }
            Ok((TypeDescriptor::Array(Box::new(inner)), next))
        }
        _ => Err(err(pos)),
    }
}
