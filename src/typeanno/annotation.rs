use crate::jvm::class_file::{self, ConstTag, ConstantsPool};
use crate::jvm::{BinaryName, Error, Name, UnqualifiedName};

/// Retention policy of an annotation interface
///
/// This alone decides which attribute (if any) an annotation lands in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Retention {
    /// Discarded by the compiler
    Source,
    /// Recorded in `RuntimeInvisibleTypeAnnotations` (the default when no `@Retention` is given)
    Class,
    /// Recorded in `RuntimeVisibleTypeAnnotations`
    Runtime,
}

impl Default for Retention {
    fn default() -> Self {
        Retention::Class
    }
}

/// A resolved annotation, as written in source
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub type_name: BinaryName,
    pub retention: Retention,
    pub elements: Vec<(UnqualifiedName, ElementValue)>,
}

/// Value of an annotation element
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Byte(i8),
    Char(char),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    String(String),
    Enum {
        type_name: BinaryName,
        constant: UnqualifiedName,
    },
    /// Class literal, as a return descriptor (`Ljava/lang/String;`, `I`, `V`)
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl Annotation {
    /// Annotation without elements
    pub fn marker(type_name: BinaryName, retention: Retention) -> Annotation {
        Annotation {
            type_name,
            retention,
            elements: vec![],
        }
    }

    /// Annotation with only a `value` element
    pub fn single(type_name: BinaryName, retention: Retention, value: ElementValue) -> Annotation {
        Annotation::marker(type_name, retention).with_element(UnqualifiedName::VALUE, value)
    }

    pub fn with_element(mut self, name: UnqualifiedName, value: ElementValue) -> Annotation {
        self.elements.push((name, value));
        self
    }

    /// Intern every name and value into the constant pool
    pub fn intern(&self, constants: &mut ConstantsPool) -> Result<class_file::Annotation, Error> {
        let type_index = constants.get_utf8(self.type_name.descriptor())?;
        let mut element_value_pairs = Vec::with_capacity(self.elements.len());
        for (name, value) in &self.elements {
            element_value_pairs.push(class_file::ElementValuePair {
                element_name_index: constants.get_utf8(name.as_str())?,
                value: value.intern(constants)?,
            });
        }
        Ok(class_file::Annotation {
            type_index,
            element_value_pairs,
        })
    }
}

impl ElementValue {
    pub fn intern(&self, constants: &mut ConstantsPool) -> Result<class_file::ElementValue, Error> {
        use class_file::ElementValue as Raw;

        Ok(match self {
            ElementValue::Byte(b) => Raw::Const(ConstTag::Byte, constants.get_integer(*b as i32)?),
            ElementValue::Char(c) => Raw::Const(ConstTag::Char, constants.get_integer(*c as i32)?),
            ElementValue::Short(s) => {
                Raw::Const(ConstTag::Short, constants.get_integer(*s as i32)?)
            }
            ElementValue::Boolean(z) => {
                Raw::Const(ConstTag::Boolean, constants.get_integer(*z as i32)?)
            }
            ElementValue::Int(i) => Raw::Const(ConstTag::Int, constants.get_integer(*i)?),
            ElementValue::Long(j) => Raw::Const(ConstTag::Long, constants.get_long(*j)?),
            ElementValue::Float(f) => Raw::Const(ConstTag::Float, constants.get_float(*f)?),
            ElementValue::Double(d) => Raw::Const(ConstTag::Double, constants.get_double(*d)?),
            ElementValue::String(s) => {
                Raw::Const(ConstTag::String, constants.get_utf8(s.as_str())?.into())
            }
            ElementValue::Enum {
                type_name,
                constant,
            } => Raw::Enum {
                type_name_index: constants.get_utf8(type_name.descriptor())?,
                const_name_index: constants.get_utf8(constant.as_str())?,
            },
            ElementValue::Class(descriptor) => Raw::Class(constants.get_utf8(descriptor.as_str())?),
            ElementValue::Annotation(annotation) => {
                Raw::Annotation(annotation.intern(constants)?)
            }
            ElementValue::Array(values) => Raw::Array(
                values
                    .iter()
                    .map(|value| value.intern(constants))
                    .collect::<Result<Vec<_>, Error>>()?,
            ),
        })
    }
}
