use crate::jvm::class_file::{Deserialize, Serialize, TypeAnnotation, Utf8ConstantIndex};
use crate::jvm::Error;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Attributes (used in classes, fields, methods, and even on some attributes)
///
/// The representation is designed to be easily extended with custom attributes.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name_index: Utf8ConstantIndex,
    pub info: Vec<u8>,
}

impl Serialize for Attribute {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name_index.serialize(writer)?;

        // Attribute info length is 4 bytes
        (self.info.len() as u32).serialize(writer)?;
        writer.write_all(&self.info)?;

        Ok(())
    }
}

/// Attributes are all stored in the same way (see `Attribute`), but internally
/// they represent very different things. This trait is implemented by things
/// which can be turned into attributes.
pub trait AttributeLike: Serialize {
    /// Name of the attribute
    const NAME: &'static str;
}

/// Type annotations whose retention is `RUNTIME`
///
/// Appears on `ClassFile`, `field_info`, `method_info`, `Code`, and `record_component_info`.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.20
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuntimeVisibleTypeAnnotations(pub Vec<TypeAnnotation>);

impl Serialize for RuntimeVisibleTypeAnnotations {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Deserialize for RuntimeVisibleTypeAnnotations {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        Ok(RuntimeVisibleTypeAnnotations(Vec::deserialize(reader)?))
    }
}

impl AttributeLike for RuntimeVisibleTypeAnnotations {
    const NAME: &'static str = "RuntimeVisibleTypeAnnotations";
}

/// Type annotations whose retention is `CLASS`
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.21
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuntimeInvisibleTypeAnnotations(pub Vec<TypeAnnotation>);

impl Serialize for RuntimeInvisibleTypeAnnotations {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Deserialize for RuntimeInvisibleTypeAnnotations {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        Ok(RuntimeInvisibleTypeAnnotations(Vec::deserialize(reader)?))
    }
}

impl AttributeLike for RuntimeInvisibleTypeAnnotations {
    const NAME: &'static str = "RuntimeInvisibleTypeAnnotations";
}

/// Decode an entire attribute body (the `info` of an [`Attribute`]), or anything else that has to
/// use up all of its input
///
/// Bytes left over after the attribute are an error.
pub fn decode_attribute_body<A: Deserialize>(info: &[u8]) -> Result<A, Error> {
    let mut cursor = Cursor::new(info);
    let attribute = A::deserialize(&mut cursor)?;
    let remaining = info.len() - cursor.position() as usize;
    if remaining > 0 {
        return Err(Error::TrailingBytes(remaining));
    }
    Ok(attribute)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_file::ConstantsPool;
    use crate::jvm::Error;

    #[test]
    fn empty_attribute_still_has_a_count() -> Result<(), Error> {
        let mut pool = ConstantsPool::new();
        let attribute = pool.get_attribute(RuntimeInvisibleTypeAnnotations::default())?;
        assert_eq!(attribute.info, vec![0, 0]);
        assert_eq!(
            pool.get_utf8_str(attribute.name_index)?,
            "RuntimeInvisibleTypeAnnotations"
        );

        let mut bytes = vec![];
        attribute.serialize(&mut bytes)?;
        assert_eq!(bytes, vec![0, 1, 0, 0, 0, 2, 0, 0]);
        Ok(())
    }

    #[test]
    fn trailing_bytes_are_rejected() -> Result<(), Error> {
        let decoded: RuntimeVisibleTypeAnnotations = decode_attribute_body(&[0, 0])?;
        assert!(decoded.0.is_empty());

        match decode_attribute_body::<RuntimeVisibleTypeAnnotations>(&[0, 0, 7]) {
            Err(Error::TrailingBytes(1)) => (),
            other => panic!("expected trailing bytes error, got {:?}", other),
        }
        assert!(decode_attribute_body::<RuntimeVisibleTypeAnnotations>(&[0, 1]).is_err());
        Ok(())
    }
}
