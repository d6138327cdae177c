use crate::jvm::class_file::{
    Annotation, ConstTag, Constant, ConstantIndex, ConstantsPool, ElementValue,
    RuntimeInvisibleTypeAnnotations, RuntimeVisibleTypeAnnotations, TargetDescriptor,
    TypeAnnotation, Utf8ConstantIndex,
};
use crate::jvm::descriptor_to_source;
use std::fmt::{self, Write};

/// Renders type annotation attributes in the same layout as the Eclipse class file disassembler
///
/// ```text
///     RuntimeInvisibleTypeAnnotations:
///       #21 @B(
///         #22 value=(int) 3 (constant type)
///         target type = 0x11 CLASS_TYPE_PARAMETER_BOUND
///         type parameter index = 1 type parameter bound index = 1
///       )
/// ```
///
/// Without a constant pool, names and values are shown as bare constant indices.
pub struct Disassembler<'p> {
    constants: Option<&'p ConstantsPool>,
}

const TAB: &str = "  ";

/// One attribute, rendered through [`fmt::Display`]
struct Listing<'d, 'p> {
    disassembler: &'d Disassembler<'p>,
    name: &'d str,
    entries: &'d [TypeAnnotation],
}

impl<'d, 'p> fmt::Display for Listing<'d, 'p> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.disassembler.write_attribute(f, self.name, self.entries)
    }
}

impl<'p> Disassembler<'p> {
    pub fn new(constants: &'p ConstantsPool) -> Disassembler<'p> {
        Disassembler {
            constants: Some(constants),
        }
    }

    pub fn without_constants() -> Disassembler<'static> {
        Disassembler { constants: None }
    }

    pub fn visible(&self, attribute: &RuntimeVisibleTypeAnnotations) -> String {
        self.attribute("RuntimeVisibleTypeAnnotations", &attribute.0)
    }

    pub fn invisible(&self, attribute: &RuntimeInvisibleTypeAnnotations) -> String {
        self.attribute("RuntimeInvisibleTypeAnnotations", &attribute.0)
    }

    pub fn attribute(&self, name: &str, entries: &[TypeAnnotation]) -> String {
        Listing {
            disassembler: self,
            name,
            entries,
        }
        .to_string()
    }

    /// Header line followed by one block per entry
    pub fn write_attribute<W: Write>(
        &self,
        out: &mut W,
        name: &str,
        entries: &[TypeAnnotation],
    ) -> fmt::Result {
        write!(out, "{}{}: ", TAB.repeat(2), name)?;
        for entry in entries {
            self.entry(out, entry, 3)?;
        }
        out.write_char('\n')
    }

    fn entry<W: Write>(&self, out: &mut W, entry: &TypeAnnotation, depth: usize) -> fmt::Result {
        newline(out, depth)?;
        self.annotation_start(out, &entry.annotation, depth)?;

        let target = &entry.target;
        let target_type = target.target_type();
        newline(out, depth + 1)?;
        write!(
            out,
            "target type = 0x{:x} {}",
            target_type as u8,
            target_type.name()
        )?;

        match target {
            TargetDescriptor::Field
            | TargetDescriptor::MethodReturn
            | TargetDescriptor::MethodReceiver => (),
            other => {
                newline(out, depth + 1)?;
                target_info(out, other, depth)?;
            }
        }

        if !entry.path.is_empty() {
            newline(out, depth + 1)?;
            write!(out, "location = {}", entry.path)?;
        }

        newline(out, depth)?;
        out.write_char(')')
    }

    /// `#N @Name(` followed by the element value pairs
    fn annotation_start<W: Write>(
        &self,
        out: &mut W,
        annotation: &Annotation,
        depth: usize,
    ) -> fmt::Result {
        let type_index = annotation.type_index;
        write!(out, "#{} @{}(", (type_index.0).0, self.type_name(type_index))?;
        for pair in &annotation.element_value_pairs {
            newline(out, depth + 1)?;
            let name_index = pair.element_name_index;
            write!(out, "#{} {}=", (name_index.0).0, self.utf8(name_index))?;
            self.element_value(out, &pair.value, depth + 1)?;
        }
        Ok(())
    }

    /// Nested annotation: same as an entry, minus the target
    fn annotation<W: Write>(&self, out: &mut W, annotation: &Annotation, depth: usize) -> fmt::Result {
        newline(out, depth)?;
        self.annotation_start(out, annotation, depth)?;
        newline(out, depth)?;
        out.write_char(')')
    }

    fn element_value<W: Write>(&self, out: &mut W, value: &ElementValue, depth: usize) -> fmt::Result {
        match value {
            ElementValue::Const(tag, index) => {
                write!(out, "{} (constant type)", self.constant_value(*tag, *index))
            }
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => write!(
                out,
                "{}.{}(enum type #{}.#{})",
                self.type_name(*type_name_index),
                self.utf8(*const_name_index),
                (type_name_index.0).0,
                (const_name_index.0).0
            ),
            ElementValue::Class(class_index) => write!(
                out,
                "{} (#{} class type)",
                self.type_name(*class_index),
                (class_index.0).0
            ),
            ElementValue::Annotation(annotation) => {
                out.write_str("annotation value =")?;
                self.annotation(out, annotation, depth + 1)
            }
            ElementValue::Array(values) => {
                out.write_char('[')?;
                for value in values {
                    newline(out, depth + 1)?;
                    self.element_value(out, value, depth + 1)?;
                }
                newline(out, depth + 1)?;
                out.write_char(']')
            }
        }
    }

    fn utf8(&self, index: Utf8ConstantIndex) -> String {
        match self.constants.map(|c| c.get_utf8_str(index)) {
            Some(Ok(string)) => string.to_owned(),
            _ => format!("#{}", (index.0).0),
        }
    }

    /// Descriptors are printed as source names (`Ljava/lang/Deprecated;` as `java.lang.Deprecated`)
    fn type_name(&self, index: Utf8ConstantIndex) -> String {
        match self.constants.map(|c| c.get_utf8_str(index)) {
            Some(Ok(descriptor)) => descriptor_to_source(descriptor),
            _ => format!("#{}", (index.0).0),
        }
    }

    fn constant_value(&self, tag: ConstTag, index: ConstantIndex) -> String {
        let constant = match self.constants.and_then(|c| c.get(index)) {
            Some(constant) => constant,
            None => return format!("#{}", index.0),
        };
        match (tag, constant) {
            (ConstTag::Char, Constant::Integer(i)) => {
                let c = char::from_u32(*i as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
                format!("'{}'", escape_char(c, false))
            }
            (ConstTag::Boolean, Constant::Integer(i)) => (*i == 1).to_string(),
            (ConstTag::Byte, Constant::Integer(i)) => format!("(byte) {}", i),
            (ConstTag::Short, Constant::Integer(i)) => format!("(short) {}", i),
            (ConstTag::Int, Constant::Integer(i)) => format!("(int) {}", i),
            (_, Constant::Long(j)) => format!("{}L", j),
            (_, Constant::Float(f)) => format!("{}f", java_float(*f as f64)),
            (_, Constant::Double(d)) => java_float(*d),
            (_, Constant::Utf8(s)) => {
                let escaped: String = s.chars().map(|c| escape_char(c, true)).collect();
                format!("\"{}\"", escaped)
            }
            (_, Constant::Integer(i)) => i.to_string(),
        }
    }
}

fn target_info<W: Write>(out: &mut W, target: &TargetDescriptor, depth: usize) -> fmt::Result {
    match target {
        TargetDescriptor::ClassTypeParameter { index }
        | TargetDescriptor::MethodTypeParameter { index } => {
            write!(out, "type parameter index = {}", index)
        }
        TargetDescriptor::ClassExtends { type_index } => {
            if *type_index == TargetDescriptor::SUPERCLASS {
                out.write_str("type index = -1")
            } else {
                write!(out, "type index = {}", type_index)
            }
        }
        TargetDescriptor::ClassTypeParameterBound {
            param_index,
            bound_index,
        }
        | TargetDescriptor::MethodTypeParameterBound {
            param_index,
            bound_index,
        } => write!(
            out,
            "type parameter index = {} type parameter bound index = {}",
            param_index, bound_index
        ),
        TargetDescriptor::MethodFormalParameter { index } => {
            write!(out, "method parameter index = {}", index)
        }
        TargetDescriptor::Throws { index } => write!(out, "throws index = {}", index),
        TargetDescriptor::LocalVariable { ranges } | TargetDescriptor::ResourceVariable { ranges } => {
            out.write_str("local variable entries:")?;
            for range in ranges {
                newline(out, depth + 2)?;
                write!(
                    out,
                    "[pc: {}, pc: {}] index: {}",
                    range.start_pc,
                    range.end_pc(),
                    range.index
                )?;
            }
            Ok(())
        }
        TargetDescriptor::ExceptionParameter { table_index } => {
            write!(out, "exception table index = {}", table_index)
        }
        TargetDescriptor::InstanceOf { offset }
        | TargetDescriptor::New { offset }
        | TargetDescriptor::ConstructorReference { offset }
        | TargetDescriptor::MethodReference { offset } => write!(out, "offset = {}", offset),
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
            write!(out, "offset = {}", offset)?;
            newline(out, depth + 1)?;
            write!(out, "type argument index = {}", type_arg_index)
        }
        TargetDescriptor::Field | TargetDescriptor::MethodReturn | TargetDescriptor::MethodReceiver => {
            Ok(())
        }
    }
}

fn newline<W: Write>(out: &mut W, depth: usize) -> fmt::Result {
    out.write_char('\n')?;
    for _ in 0..depth {
        out.write_str(TAB)?;
    }
    Ok(())
}

/// Java-style escaping: quotes of the other kind are left alone
fn escape_char(c: char, in_string: bool) -> String {
    match c {
        '\u{8}' => String::from("\\b"),
        '\t' => String::from("\\t"),
        '\n' => String::from("\\n"),
        '\u{c}' => String::from("\\f"),
        '\r' => String::from("\\r"),
        '"' if in_string => String::from("\\\""),
        '\'' if !in_string => String::from("\\'"),
        '\\' => String::from("\\\\"),
        '\0' => String::from("\\0"),
        other => other.to_string(),
    }
}

/// Approximates `Double.toString`: integral values keep a trailing `.0`
fn java_float(value: f64) -> String {
    if value.is_nan() {
        String::from("NaN")
    } else if value.is_infinite() {
        String::from(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else if value.fract() == 0.0 && value.abs() < 1e7 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
