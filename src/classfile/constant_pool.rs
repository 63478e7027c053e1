//! Constant pool decoding

use super::reader::{decode_modified_utf8, ByteReader};
use super::MalformedTypeError;

/// One constant-pool slot.
///
/// `Unusable` fills index 0 and the phantom slot after every `Long`/`Double`.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl Constant {
    fn kind_name(&self) -> &'static str {
        match self {
            Constant::Unusable => "unusable",
            Constant::Utf8(_) => "Utf8",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::Class { .. } => "Class",
            Constant::String { .. } => "String",
            Constant::FieldRef { .. } => "Fieldref",
            Constant::MethodRef { .. } => "Methodref",
            Constant::InterfaceMethodRef { .. } => "InterfaceMethodref",
            Constant::NameAndType { .. } => "NameAndType",
            Constant::MethodHandle { .. } => "MethodHandle",
            Constant::MethodType { .. } => "MethodType",
            Constant::Dynamic { .. } => "Dynamic",
            Constant::InvokeDynamic { .. } => "InvokeDynamic",
            Constant::Module { .. } => "Module",
            Constant::Package { .. } => "Package",
        }
    }
}

/// A member reference resolved out of the pool (owner in internal form)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRefInfo {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub is_interface: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Parse `constant_pool_count - 1` entries starting at the reader position
    pub fn parse(reader: &mut ByteReader<'_>) -> Result<Self, MalformedTypeError> {
        let count = reader.u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let offset = reader.position();
            let tag = reader.u1()?;
            let constant = match tag {
                1 => {
                    let len = reader.u2()? as usize;
                    let bytes = reader.take(len)?;
                    Constant::Utf8(decode_modified_utf8(bytes, offset)?)
                }
                3 => Constant::Integer(reader.i4()?),
                4 => Constant::Float(f32::from_bits(reader.u4()?)),
                5 => Constant::Long(reader.u8()? as i64),
                6 => Constant::Double(f64::from_bits(reader.u8()?)),
                7 => Constant::Class { name_index: reader.u2()? },
                8 => Constant::String { string_index: reader.u2()? },
                9 => Constant::FieldRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                10 => Constant::MethodRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                11 => Constant::InterfaceMethodRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                12 => Constant::NameAndType {
                    name_index: reader.u2()?,
                    descriptor_index: reader.u2()?,
                },
                15 => Constant::MethodHandle {
                    reference_kind: reader.u1()?,
                    reference_index: reader.u2()?,
                },
                16 => Constant::MethodType { descriptor_index: reader.u2()? },
                17 => Constant::Dynamic {
                    bootstrap_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                19 => Constant::Module { name_index: reader.u2()? },
                20 => Constant::Package { name_index: reader.u2()? },
                other => return Err(MalformedTypeError::UnknownConstantTag { tag: other, offset }),
            };

            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            entries.push(constant);
            if wide {
                entries.push(Constant::Unusable);
            }
        }

        // A Long/Double in the last slot pushes one phantom entry too many
        entries.truncate(count.max(1));
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn get(&self, index: u16) -> Result<&Constant, MalformedTypeError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => {
                Err(MalformedTypeError::BadConstantIndex { index })
            }
            Some(c) => Ok(c),
        }
    }

    fn wrong_kind(&self, index: u16, expected: &'static str) -> MalformedTypeError {
        let found = self
            .entries
            .get(index as usize)
            .map(Constant::kind_name)
            .unwrap_or("missing");
        MalformedTypeError::WrongConstantKind {
            index,
            expected,
            found,
        }
    }

    pub fn utf8(&self, index: u16) -> Result<&str, MalformedTypeError> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s.as_str()),
            _ => Err(self.wrong_kind(index, "Utf8")),
        }
    }

    /// Internal name of a `Class` constant (`java/lang/String`, or an array descriptor)
    pub fn class_name(&self, index: u16) -> Result<&str, MalformedTypeError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(self.wrong_kind(index, "Class")),
        }
    }

    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), MalformedTypeError> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(self.wrong_kind(index, "NameAndType")),
        }
    }

    /// Resolve a Fieldref / Methodref / InterfaceMethodref
    pub fn member_ref(&self, index: u16) -> Result<MemberRefInfo, MalformedTypeError> {
        let (class_index, nat_index, is_interface) = match self.get(index)? {
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            }
            | Constant::MethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index, false),
            Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index, true),
            _ => return Err(self.wrong_kind(index, "member reference")),
        };
        let owner = self.class_name(class_index)?.to_string();
        let (name, descriptor) = self.name_and_type(nat_index)?;
        Ok(MemberRefInfo {
            owner,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            is_interface,
        })
    }

    /// Name and descriptor of an InvokeDynamic / Dynamic call site
    pub fn dynamic_site(&self, index: u16) -> Result<(&str, &str), MalformedTypeError> {
        match self.get(index)? {
            Constant::InvokeDynamic {
                name_and_type_index,
                ..
            }
            | Constant::Dynamic {
                name_and_type_index,
                ..
            } => self.name_and_type(*name_and_type_index),
            _ => Err(self.wrong_kind(index, "InvokeDynamic")),
        }
    }
}
