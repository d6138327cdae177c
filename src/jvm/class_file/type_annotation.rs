use crate::jvm::class_file::serialize::invalid_data;
use crate::jvm::class_file::{Annotation, Deserialize, Serialize};
use crate::jvm::Error;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fmt;

/// Annotation on a use of a type, along with where exactly that use is
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.20
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnnotation {
    pub target: TargetDescriptor,
    pub path: TypePath,
    pub annotation: Annotation,
}

/// Value of the `target_type` byte
///
/// The first group (below `0x40`) appears on classes, fields, and methods. The second group
/// appears only on the `Code` attribute and refers to bytecode offsets or local variable ranges.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TargetType {
    ClassTypeParameter = 0x00,
    MethodTypeParameter = 0x01,
    ClassExtends = 0x10,
    ClassTypeParameterBound = 0x11,
    MethodTypeParameterBound = 0x12,
    Field = 0x13,
    MethodReturn = 0x14,
    MethodReceiver = 0x15,
    MethodFormalParameter = 0x16,
    Throws = 0x17,
    LocalVariable = 0x40,
    ResourceVariable = 0x41,
    ExceptionParameter = 0x42,
    InstanceOf = 0x43,
    New = 0x44,
    ConstructorReference = 0x45,
    MethodReference = 0x46,
    Cast = 0x47,
    ConstructorInvocationTypeArgument = 0x48,
    MethodInvocationTypeArgument = 0x49,
    ConstructorReferenceTypeArgument = 0x4A,
    MethodReferenceTypeArgument = 0x4B,
}

impl TargetType {
    pub const ALL: [TargetType; 22] = [
        TargetType::ClassTypeParameter,
        TargetType::MethodTypeParameter,
        TargetType::ClassExtends,
        TargetType::ClassTypeParameterBound,
        TargetType::MethodTypeParameterBound,
        TargetType::Field,
        TargetType::MethodReturn,
        TargetType::MethodReceiver,
        TargetType::MethodFormalParameter,
        TargetType::Throws,
        TargetType::LocalVariable,
        TargetType::ResourceVariable,
        TargetType::ExceptionParameter,
        TargetType::InstanceOf,
        TargetType::New,
        TargetType::ConstructorReference,
        TargetType::MethodReference,
        TargetType::Cast,
        TargetType::ConstructorInvocationTypeArgument,
        TargetType::MethodInvocationTypeArgument,
        TargetType::ConstructorReferenceTypeArgument,
        TargetType::MethodReferenceTypeArgument,
    ];

    pub fn from_u8(tag: u8) -> Option<TargetType> {
        TargetType::ALL.iter().copied().find(|t| *t as u8 == tag)
    }

    /// Name used when printing class files
    pub fn name(self) -> &'static str {
        match self {
            TargetType::ClassTypeParameter => "CLASS_TYPE_PARAMETER",
            TargetType::MethodTypeParameter => "METHOD_TYPE_PARAMETER",
            TargetType::ClassExtends => "CLASS_EXTENDS",
            TargetType::ClassTypeParameterBound => "CLASS_TYPE_PARAMETER_BOUND",
            TargetType::MethodTypeParameterBound => "METHOD_TYPE_PARAMETER_BOUND",
            TargetType::Field => "FIELD",
            TargetType::MethodReturn => "METHOD_RETURN",
            TargetType::MethodReceiver => "METHOD_RECEIVER",
            TargetType::MethodFormalParameter => "METHOD_FORMAL_PARAMETER",
            TargetType::Throws => "THROWS",
            TargetType::LocalVariable => "LOCAL_VARIABLE",
            TargetType::ResourceVariable => "RESOURCE_VARIABLE",
            TargetType::ExceptionParameter => "EXCEPTION_PARAMETER",
            TargetType::InstanceOf => "INSTANCEOF",
            TargetType::New => "NEW",
            TargetType::ConstructorReference => "CONSTRUCTOR_REFERENCE",
            TargetType::MethodReference => "METHOD_REFERENCE",
            TargetType::Cast => "CAST",
            TargetType::ConstructorInvocationTypeArgument => "CONSTRUCTOR_INVOCATION_TYPE_ARGUMENT",
            TargetType::MethodInvocationTypeArgument => "METHOD_INVOCATION_TYPE_ARGUMENT",
            TargetType::ConstructorReferenceTypeArgument => "CONSTRUCTOR_REFERENCE_TYPE_ARGUMENT",
            TargetType::MethodReferenceTypeArgument => "METHOD_REFERENCE_TYPE_ARGUMENT",
        }
    }

    /// Does this target refer to something inside a `Code` attribute?
    pub fn is_code_target(self) -> bool {
        (self as u8) >= 0x40
    }
}

/// Which type in a declaration or expression the annotation applies to
///
/// Every variant corresponds to exactly one `target_type` and carries exactly the fields of the
/// matching `target_info` union member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetDescriptor {
    ClassTypeParameter { index: u8 },
    MethodTypeParameter { index: u8 },

    /// `type_index` is [`TargetDescriptor::SUPERCLASS`] for the `extends` clause and otherwise
    /// the position in the `implements` clause
    ClassExtends { type_index: u16 },

    ClassTypeParameterBound { param_index: u8, bound_index: u8 },
    MethodTypeParameterBound { param_index: u8, bound_index: u8 },
    Field,
    MethodReturn,
    MethodReceiver,

    /// Index among the declared formal parameters (the receiver does not count)
    MethodFormalParameter { index: u8 },

    Throws { index: u16 },
    LocalVariable { ranges: Vec<LocalVarRange> },
    ResourceVariable { ranges: Vec<LocalVarRange> },

    /// Index into the method's exception table
    ExceptionParameter { table_index: u16 },

    InstanceOf { offset: u16 },
    New { offset: u16 },
    ConstructorReference { offset: u16 },
    MethodReference { offset: u16 },

    /// For an intersection cast, `type_arg_index` selects the alternative
    Cast { offset: u16, type_arg_index: u8 },
    ConstructorInvocationTypeArgument { offset: u16, type_arg_index: u8 },
    MethodInvocationTypeArgument { offset: u16, type_arg_index: u8 },
    ConstructorReferenceTypeArgument { offset: u16, type_arg_index: u8 },
    MethodReferenceTypeArgument { offset: u16, type_arg_index: u8 },
}

/// One disjoint live range of an annotated local variable
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LocalVarRange {
    pub start_pc: u16,
    pub length: u16,
    /// Local variable slot
    pub index: u16,
}

impl LocalVarRange {
    /// Exclusive end of the range
    pub fn end_pc(&self) -> u32 {
        self.start_pc as u32 + self.length as u32
    }
}

impl TargetDescriptor {
    /// `type_index` value designating the superclass in `ClassExtends`
    pub const SUPERCLASS: u16 = 65535;

    pub fn target_type(&self) -> TargetType {
        match self {
            TargetDescriptor::ClassTypeParameter { .. } => TargetType::ClassTypeParameter,
            TargetDescriptor::MethodTypeParameter { .. } => TargetType::MethodTypeParameter,
            TargetDescriptor::ClassExtends { .. } => TargetType::ClassExtends,
            TargetDescriptor::ClassTypeParameterBound { .. } => TargetType::ClassTypeParameterBound,
            TargetDescriptor::MethodTypeParameterBound { .. } => {
                TargetType::MethodTypeParameterBound
            }
            TargetDescriptor::Field => TargetType::Field,
            TargetDescriptor::MethodReturn => TargetType::MethodReturn,
            TargetDescriptor::MethodReceiver => TargetType::MethodReceiver,
            TargetDescriptor::MethodFormalParameter { .. } => TargetType::MethodFormalParameter,
            TargetDescriptor::Throws { .. } => TargetType::Throws,
            TargetDescriptor::LocalVariable { .. } => TargetType::LocalVariable,
            TargetDescriptor::ResourceVariable { .. } => TargetType::ResourceVariable,
            TargetDescriptor::ExceptionParameter { .. } => TargetType::ExceptionParameter,
            TargetDescriptor::InstanceOf { .. } => TargetType::InstanceOf,
            TargetDescriptor::New { .. } => TargetType::New,
            TargetDescriptor::ConstructorReference { .. } => TargetType::ConstructorReference,
            TargetDescriptor::MethodReference { .. } => TargetType::MethodReference,
            TargetDescriptor::Cast { .. } => TargetType::Cast,
            TargetDescriptor::ConstructorInvocationTypeArgument { .. } => {
                TargetType::ConstructorInvocationTypeArgument
            }
            TargetDescriptor::MethodInvocationTypeArgument { .. } => {
                TargetType::MethodInvocationTypeArgument
            }
            TargetDescriptor::ConstructorReferenceTypeArgument { .. } => {
                TargetType::ConstructorReferenceTypeArgument
            }
            TargetDescriptor::MethodReferenceTypeArgument { .. } => {
                TargetType::MethodReferenceTypeArgument
            }
        }
    }
}

impl Serialize for LocalVarRange {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.start_pc.serialize(writer)?;
        self.length.serialize(writer)?;
        self.index.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for LocalVarRange {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        Ok(LocalVarRange {
            start_pc: u16::deserialize(reader)?,
            length: u16::deserialize(reader)?,
            index: u16::deserialize(reader)?,
        })
    }
}

impl Serialize for TargetDescriptor {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        (self.target_type() as u8).serialize(writer)?;
        match self {
            TargetDescriptor::ClassTypeParameter { index }
            | TargetDescriptor::MethodTypeParameter { index }
            | TargetDescriptor::MethodFormalParameter { index } => index.serialize(writer)?,
            TargetDescriptor::ClassExtends { type_index } => type_index.serialize(writer)?,
            TargetDescriptor::ClassTypeParameterBound {
                param_index,
                bound_index,
            }
            | TargetDescriptor::MethodTypeParameterBound {
                param_index,
                bound_index,
            } => {
                param_index.serialize(writer)?;
                bound_index.serialize(writer)?;
            }
            TargetDescriptor::Field
            | TargetDescriptor::MethodReturn
            | TargetDescriptor::MethodReceiver => (),
            TargetDescriptor::Throws { index } => index.serialize(writer)?,
            TargetDescriptor::LocalVariable { ranges }
            | TargetDescriptor::ResourceVariable { ranges } => ranges.serialize(writer)?,
            TargetDescriptor::ExceptionParameter { table_index } => {
                table_index.serialize(writer)?
            }
            TargetDescriptor::InstanceOf { offset }
            | TargetDescriptor::New { offset }
            | TargetDescriptor::ConstructorReference { offset }
            | TargetDescriptor::MethodReference { offset } => offset.serialize(writer)?,
            TargetDescriptor::Cast {
                offset,
                type_arg_index,
            }
            | TargetDescriptor::ConstructorInvocationTypeArgument {
                offset,
                type_arg_index,
            }
            | TargetDescriptor::MethodInvocationTypeArgument {
                offset,
                type_arg_index,
            }
            | TargetDescriptor::ConstructorReferenceTypeArgument {
                offset,
                type_arg_index,
            }
            | TargetDescriptor::MethodReferenceTypeArgument {
                offset,
                type_arg_index,
            } => {
                offset.serialize(writer)?;
                type_arg_index.serialize(writer)?;
            }
        }
        Ok(())
    }
}

impl Deserialize for TargetDescriptor {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let tag = u8::deserialize(reader)?;
        let target_type =
            TargetType::from_u8(tag).ok_or_else(|| invalid_data(Error::UnknownTargetType(tag)))?;

        Ok(match target_type {
            TargetType::ClassTypeParameter => TargetDescriptor::ClassTypeParameter {
                index: u8::deserialize(reader)?,
            },
            TargetType::MethodTypeParameter => TargetDescriptor::MethodTypeParameter {
                index: u8::deserialize(reader)?,
            },
            TargetType::ClassExtends => TargetDescriptor::ClassExtends {
                type_index: u16::deserialize(reader)?,
            },
            TargetType::ClassTypeParameterBound => TargetDescriptor::ClassTypeParameterBound {
                param_index: u8::deserialize(reader)?,
                bound_index: u8::deserialize(reader)?,
            },
            TargetType::MethodTypeParameterBound => TargetDescriptor::MethodTypeParameterBound {
                param_index: u8::deserialize(reader)?,
                bound_index: u8::deserialize(reader)?,
            },
            TargetType::Field => TargetDescriptor::Field,
            TargetType::MethodReturn => TargetDescriptor::MethodReturn,
            TargetType::MethodReceiver => TargetDescriptor::MethodReceiver,
            TargetType::MethodFormalParameter => TargetDescriptor::MethodFormalParameter {
                index: u8::deserialize(reader)?,
            },
            TargetType::Throws => TargetDescriptor::Throws {
                index: u16::deserialize(reader)?,
            },
            TargetType::LocalVariable => TargetDescriptor::LocalVariable {
                ranges: Vec::deserialize(reader)?,
            },
            TargetType::ResourceVariable => TargetDescriptor::ResourceVariable {
                ranges: Vec::deserialize(reader)?,
            },
            TargetType::ExceptionParameter => TargetDescriptor::ExceptionParameter {
                table_index: u16::deserialize(reader)?,
            },
            TargetType::InstanceOf => TargetDescriptor::InstanceOf {
                offset: u16::deserialize(reader)?,
            },
            TargetType::New => TargetDescriptor::New {
                offset: u16::deserialize(reader)?,
            },
            TargetType::ConstructorReference => TargetDescriptor::ConstructorReference {
                offset: u16::deserialize(reader)?,
            },
            TargetType::MethodReference => TargetDescriptor::MethodReference {
                offset: u16::deserialize(reader)?,
            },
            TargetType::Cast => TargetDescriptor::Cast {
                offset: u16::deserialize(reader)?,
                type_arg_index: u8::deserialize(reader)?,
            },
            TargetType::ConstructorInvocationTypeArgument => {
                TargetDescriptor::ConstructorInvocationTypeArgument {
                    offset: u16::deserialize(reader)?,
                    type_arg_index: u8::deserialize(reader)?,
                }
            }
            TargetType::MethodInvocationTypeArgument => {
                TargetDescriptor::MethodInvocationTypeArgument {
                    offset: u16::deserialize(reader)?,
                    type_arg_index: u8::deserialize(reader)?,
                }
            }
            TargetType::ConstructorReferenceTypeArgument => {
                TargetDescriptor::ConstructorReferenceTypeArgument {
                    offset: u16::deserialize(reader)?,
                    type_arg_index: u8::deserialize(reader)?,
                }
            }
            TargetType::MethodReferenceTypeArgument => {
                TargetDescriptor::MethodReferenceTypeArgument {
                    offset: u16::deserialize(reader)?,
                    type_arg_index: u8::deserialize(reader)?,
                }
            }
        })
    }
}

/// Step from a type to one of its components
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TypePathEntry {
    /// Deeper in an array type (towards the element type)
    Array,

    /// Deeper in a nested type (from an enclosing type to the member type)
    InnerType,

    /// Onto the bound of a wildcard type argument
    Wildcard,

    /// Onto the type argument at the given position
    TypeArgument(u8),
}

impl TypePathEntry {
    pub fn kind(self) -> u8 {
        match self {
            TypePathEntry::Array => 0,
            TypePathEntry::InnerType => 1,
            TypePathEntry::Wildcard => 2,
            TypePathEntry::TypeArgument(_) => 3,
        }
    }
}

impl fmt::Display for TypePathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypePathEntry::Array => f.write_str("ARRAY"),
            TypePathEntry::InnerType => f.write_str("INNER_TYPE"),
            TypePathEntry::Wildcard => f.write_str("WILDCARD"),
            TypePathEntry::TypeArgument(idx) => write!(f, "TYPE_ARGUMENT({})", idx),
        }
    }
}

/// Location of the annotated type inside the type that the target designates, ordered from the
/// outermost step to the innermost
///
/// Empty when the annotation is directly on the target type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypePath(pub Vec<TypePathEntry>);

impl TypePath {
    pub fn empty() -> TypePath {
        TypePath(vec![])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// New path with one extra step at the innermost end
    pub fn with(&self, entry: TypePathEntry) -> TypePath {
        let mut entries = self.0.clone();
        entries.push(entry);
        TypePath(entries)
    }
}

impl From<Vec<TypePathEntry>> for TypePath {
    fn from(entries: Vec<TypePathEntry>) -> TypePath {
        TypePath(entries)
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", entry)?;
        }
        f.write_str("]")
    }
}

/// Unlike most sequences in class files, the length here is a `u8`
impl Serialize for TypePath {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        let len = u8::try_from(self.0.len())
            .map_err(|_| invalid_data(Error::TypePathTooLong(self.0.len())))?;
        len.serialize(writer)?;
        for entry in &self.0 {
            entry.kind().serialize(writer)?;
            let argument: u8 = match entry {
                TypePathEntry::TypeArgument(idx) => *idx,
                _ => 0,
            };
            argument.serialize(writer)?;
        }
        Ok(())
    }
}

impl Deserialize for TypePath {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let len = u8::deserialize(reader)?;
        let mut entries = Vec::with_capacity(len as usize);
        for _ in 0..len {
            let kind = u8::deserialize(reader)?;
            let argument = u8::deserialize(reader)?;
            entries.push(match kind {
                0 => TypePathEntry::Array,
                1 => TypePathEntry::InnerType,
                2 => TypePathEntry::Wildcard,
                3 => TypePathEntry::TypeArgument(argument),
                other => return Err(invalid_data(Error::UnknownPathKind(other))),
            });
        }
        Ok(TypePath(entries))
    }
}

impl Serialize for TypeAnnotation {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.target.serialize(writer)?;
        self.path.serialize(writer)?;
        self.annotation.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for TypeAnnotation {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let target = TargetDescriptor::deserialize(reader)?;
        let path = TypePath::deserialize(reader)?;
        let annotation = Annotation::deserialize(reader)?;
        Ok(TypeAnnotation {
            target,
            path,
            annotation,
        })
    }
}
