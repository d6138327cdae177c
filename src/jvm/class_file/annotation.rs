use crate::jvm::class_file::serialize::invalid_data;
use crate::jvm::class_file::{ConstantIndex, Deserialize, Serialize, Utf8ConstantIndex};
use crate::jvm::Error;
use byteorder::{ReadBytesExt, WriteBytesExt};

/// Annotation as it appears in the class file, with every name and value already interned in the
/// constant pool
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.16
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Field descriptor of the annotation interface (eg. `Ljava/lang/Deprecated;`)
    pub type_index: Utf8ConstantIndex,
    pub element_value_pairs: Vec<ElementValuePair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementValuePair {
    pub element_name_index: Utf8ConstantIndex,
    pub value: ElementValue,
}

/// Tag of an `element_value` holding a constant
///
/// The constant kind is implied by the tag: `B`, `C`, `I`, `S`, and `Z` point at a
/// `CONSTANT_Integer`, `D` at `CONSTANT_Double`, `F` at `CONSTANT_Float`, `J` at
/// `CONSTANT_Long`, and `s` directly at a `CONSTANT_Utf8` (not a `CONSTANT_String`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConstTag {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    String,
}

impl ConstTag {
    pub fn tag(self) -> u8 {
        match self {
            ConstTag::Byte => b'B',
            ConstTag::Char => b'C',
            ConstTag::Double => b'D',
            ConstTag::Float => b'F',
            ConstTag::Int => b'I',
            ConstTag::Long => b'J',
            ConstTag::Short => b'S',
            ConstTag::Boolean => b'Z',
            ConstTag::String => b's',
        }
    }

    pub fn from_tag(tag: u8) -> Option<ConstTag> {
        Some(match tag {
            b'B' => ConstTag::Byte,
            b'C' => ConstTag::Char,
            b'D' => ConstTag::Double,
            b'F' => ConstTag::Float,
            b'I' => ConstTag::Int,
            b'J' => ConstTag::Long,
            b'S' => ConstTag::Short,
            b'Z' => ConstTag::Boolean,
            b's' => ConstTag::String,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    Const(ConstTag, ConstantIndex),
    Enum {
        type_name_index: Utf8ConstantIndex,
        const_name_index: Utf8ConstantIndex,
    },
    /// Return descriptor of the class literal (`V` for `void.class`)
    Class(Utf8ConstantIndex),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

impl Serialize for Annotation {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.type_index.serialize(writer)?;
        self.element_value_pairs.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for Annotation {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let type_index = Utf8ConstantIndex::deserialize(reader)?;
        let element_value_pairs = Vec::deserialize(reader)?;
        Ok(Annotation {
            type_index,
            element_value_pairs,
        })
    }
}

impl Serialize for ElementValuePair {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.element_name_index.serialize(writer)?;
        self.value.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for ElementValuePair {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        Ok(ElementValuePair {
            element_name_index: Utf8ConstantIndex::deserialize(reader)?,
            value: ElementValue::deserialize(reader)?,
        })
    }
}

impl Serialize for ElementValue {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            ElementValue::Const(tag, index) => {
                tag.tag().serialize(writer)?;
                index.serialize(writer)?;
            }
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => {
                b'e'.serialize(writer)?;
                type_name_index.serialize(writer)?;
                const_name_index.serialize(writer)?;
            }
            ElementValue::Class(class_info_index) => {
                b'c'.serialize(writer)?;
                class_info_index.serialize(writer)?;
            }
            ElementValue::Annotation(annotation) => {
                b'@'.serialize(writer)?;
                annotation.serialize(writer)?;
            }
            ElementValue::Array(values) => {
                b'['.serialize(writer)?;
                values.serialize(writer)?;
            }
        }
        Ok(())
    }
}

impl Deserialize for ElementValue {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let tag = u8::deserialize(reader)?;
        if let Some(const_tag) = ConstTag::from_tag(tag) {
            return Ok(ElementValue::Const(
                const_tag,
                ConstantIndex::deserialize(reader)?,
            ));
        }
        Ok(match tag {
            b'e' => ElementValue::Enum {
                type_name_index: Utf8ConstantIndex::deserialize(reader)?,
                const_name_index: Utf8ConstantIndex::deserialize(reader)?,
            },
            b'c' => ElementValue::Class(Utf8ConstantIndex::deserialize(reader)?),
            b'@' => ElementValue::Annotation(Annotation::deserialize(reader)?),
            b'[' => ElementValue::Array(Vec::deserialize(reader)?),
            other => return Err(invalid_data(Error::UnknownElementTag(other))),
        })
    }
}
