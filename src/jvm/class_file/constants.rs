use crate::jvm::class_file::serialize::invalid_data;
use crate::jvm::class_file::{Attribute, AttributeLike, Deserialize, Serialize};
use crate::jvm::Error;
use crate::util::{Offset, OffsetVec, Width};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::result::Result;

/// Class file constants pool builder
///
/// Only the constants that annotations can refer to are supported: `element_value` structures
/// point at `CONSTANT_Utf8` (names, descriptors, strings) and at the four numeric constants.
/// Insertion deduplicates, so interning the same annotation twice does not grow the pool.
pub struct ConstantsPool {
    constants: OffsetVec<Constant>,

    integers: HashMap<i32, ConstantIndex>,
    floats: HashMap<u32, ConstantIndex>,
    longs: HashMap<i64, ConstantIndex>,
    doubles: HashMap<u64, ConstantIndex>,
    utf8s: HashMap<String, Utf8ConstantIndex>,
}

impl ConstantsPool {
    /// Make a fresh empty constants pool
    pub fn new() -> ConstantsPool {
        ConstantsPool {
            constants: OffsetVec::new_starting_at(Offset(1)),
            integers: HashMap::new(),
            floats: HashMap::new(),
            longs: HashMap::new(),
            doubles: HashMap::new(),
            utf8s: HashMap::new(),
        }
    }

    /// Push a constant into the constant pool, provided there is space for it
    ///
    /// Note: the largest valid index is 65535, indexing starts at 1, and some constants take two
    /// spaces.
    fn push_constant(&mut self, constant: Constant) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let offset: u16 = self.constants.offset_len().0 as u16;

        if offset.checked_add(constant.width() as u16).is_none() {
            return Err(ConstantPoolOverflow { constant, offset });
        }

        self.constants.push(constant);
        Ok(ConstantIndex(offset))
    }

    /// Number of slots the pool occupies (what `constant_pool_count` would be in a class file)
    pub fn count(&self) -> u16 {
        self.constants.offset_len().0 as u16
    }

    /// Look up a constant by index
    pub fn get(&self, index: ConstantIndex) -> Option<&Constant> {
        self.constants.get_offset(Offset(index.0 as usize))
    }

    /// Look up a `CONSTANT_Utf8` by index
    pub fn get_utf8_str(&self, index: Utf8ConstantIndex) -> Result<&str, Error> {
        match self.get(index.0) {
            Some(Constant::Utf8(string)) => Ok(string),
            _ => Err(Error::MissingConstant(index.0)),
        }
    }

    /// Get or insert a utf8 constant from the constant pool
    pub fn get_utf8<'a, S: Into<Cow<'a, str>>>(
        &mut self,
        utf8: S,
    ) -> Result<Utf8ConstantIndex, ConstantPoolOverflow> {
        let cow = utf8.into();

        if let Some(idx) = self.utf8s.get::<str>(cow.borrow()) {
            Ok(*idx)
        } else {
            let owned = cow.into_owned();
            let constant = Constant::Utf8(owned.clone());
            let idx = Utf8ConstantIndex(self.push_constant(constant)?);
            self.utf8s.insert(owned, idx);
            Ok(idx)
        }
    }

    /// Get or insert an integer constant (also used for `byte`, `char`, `short`, and `boolean`
    /// element values)
    pub fn get_integer(&mut self, integer: i32) -> Result<ConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.integers.get(&integer) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Integer(integer))?;
            self.integers.insert(integer, idx);
            Ok(idx)
        }
    }

    /// Get or insert a float constant (deduplicated on the bit pattern, so `NaN`s work)
    pub fn get_float(&mut self, float: f32) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let bits = float.to_bits();
        if let Some(idx) = self.floats.get(&bits) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Float(float))?;
            self.floats.insert(bits, idx);
            Ok(idx)
        }
    }

    pub fn get_long(&mut self, long: i64) -> Result<ConstantIndex, ConstantPoolOverflow> {
        if let Some(idx) = self.longs.get(&long) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Long(long))?;
            self.longs.insert(long, idx);
            Ok(idx)
        }
    }

    pub fn get_double(&mut self, double: f64) -> Result<ConstantIndex, ConstantPoolOverflow> {
        let bits = double.to_bits();
        if let Some(idx) = self.doubles.get(&bits) {
            Ok(*idx)
        } else {
            let idx = self.push_constant(Constant::Double(double))?;
            self.doubles.insert(bits, idx);
            Ok(idx)
        }
    }

    /// Add an attribute to the constant pool
    pub fn get_attribute<A: AttributeLike>(&mut self, attribute: A) -> Result<Attribute, Error> {
        let name_index = self.get_utf8(A::NAME)?;
        let mut info = vec![];

        attribute.serialize(&mut info).map_err(Error::IoError)?;

        Ok(Attribute { name_index, info })
    }
}

/// Written as in a class file: `constant_pool_count` followed by the entries
impl Serialize for ConstantsPool {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.count().serialize(writer)?;
        for (_, _, constant) in &self.constants {
            constant.serialize(writer)?;
        }
        Ok(())
    }
}

/// Reading a pool back also fills in the deduplication tables, so constants already present are
/// reused by later insertions (the first of several equal entries wins)
impl Deserialize for ConstantsPool {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let count = u16::deserialize(reader)?;
        let mut pool = ConstantsPool::new();
        while pool.count() < count {
            let constant = Constant::deserialize(reader)?;
            let key = constant.clone();
            let idx = pool
                .push_constant(constant)
                .map_err(|overflow| invalid_data(overflow.into()))?;
            match key {
                Constant::Integer(integer) => {
                    pool.integers.entry(integer).or_insert(idx);
                }
                Constant::Float(float) => {
                    pool.floats.entry(float.to_bits()).or_insert(idx);
                }
                Constant::Long(long) => {
                    pool.longs.entry(long).or_insert(idx);
                }
                Constant::Double(double) => {
                    pool.doubles.entry(double.to_bits()).or_insert(idx);
                }
                Constant::Utf8(string) => {
                    pool.utf8s.entry(string).or_insert(Utf8ConstantIndex(idx));
                }
            }
        }
        Ok(pool)
    }
}

impl Default for ConstantsPool {
    fn default() -> Self {
        ConstantsPool::new()
    }
}

#[derive(Debug)]
pub struct ConstantPoolOverflow {
    pub constant: Constant,
    pub offset: u16,
}

impl From<ConstantPoolOverflow> for Error {
    fn from(overflow: ConstantPoolOverflow) -> Error {
        Error::ConstantPoolOverflow {
            constant: overflow.constant,
            offset: overflow.offset,
        }
    }
}

/// Constants as in the constant pool
///
/// Note: only the constant kinds that annotation structures can point at are included
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the
    /// null character `\u{0000}` and the encoding of supplementary characters
    /// is different).
    Utf8(String),
}

impl Serialize for Constant {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Constant::Utf8(string) => {
                1u8.serialize(writer)?;
                let buffer: Vec<u8> = encode_modified_utf8(string);
                (buffer.len() as u16).serialize(writer)?;
                writer.write_all(&buffer)?;
            }
            Constant::Integer(integer) => {
                3u8.serialize(writer)?;
                integer.serialize(writer)?;
            }
            Constant::Float(float) => {
                4u8.serialize(writer)?;
                float.serialize(writer)?;
            }
            Constant::Long(long) => {
                5u8.serialize(writer)?;
                long.serialize(writer)?;
            }
            Constant::Double(double) => {
                6u8.serialize(writer)?;
                double.serialize(writer)?;
            }
        };
        Ok(())
    }
}

impl Deserialize for Constant {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let constant = match u8::deserialize(reader)? {
            1 => {
                let len = u16::deserialize(reader)?;
                let mut buffer = vec![0; len as usize];
                reader.read_exact(&mut buffer)?;
                let string = decode_modified_utf8(&buffer)
                    .ok_or_else(|| invalid_data(Error::MalformedUtf8(buffer)))?;
                Constant::Utf8(string)
            }
            3 => Constant::Integer(i32::deserialize(reader)?),
            4 => Constant::Float(f32::deserialize(reader)?),
            5 => Constant::Long(i64::deserialize(reader)?),
            6 => Constant::Double(f64::deserialize(reader)?),
            tag => return Err(invalid_data(Error::UnknownConstantTag(tag))),
        };
        Ok(constant)
    }
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = vec![];
    for c in string.chars() {
        let len: usize = if c == '\u{0000}' { 2 } else { c.len_utf8() };
        let code: u32 = c as u32;

        match len {
            1 => buffer.push(code as u8),
            2 => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            3 => {
                buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }

            // Supplementary characters: main divergence from unicode
            _ => {
                buffer.push(0b1110_1101);
                buffer.push(((code >> 16 & 0x0F) as u8).wrapping_sub(1) & 0x0F | 0b1010_0000);
                buffer.push((code >> 10 & 0x3F) as u8 | 0b1000_0000);

                buffer.push(0b1110_1101);
                buffer.push(((code >> 6 & 0x0F) as u8) | 0b1011_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}

/// Inverse of [`encode_modified_utf8`]
///
/// Unpaired surrogates (which Java strings can contain but Rust ones can't) come out as
/// `U+FFFD`. Returns `None` on a truncated or otherwise malformed byte sequence.
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i] as u16;
        if b0 & 0x80 == 0 {
            units.push(b0);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = *bytes.get(i + 1)? as u16;
            units.push((b0 & 0x1F) << 6 | (b1 & 0x3F));
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = *bytes.get(i + 1)? as u16;
            let b2 = *bytes.get(i + 2)? as u16;
            units.push((b0 & 0x0F) << 12 | (b1 & 0x3F) << 6 | (b2 & 0x3F));
            i += 3;
        } else {
            return None;
        }
    }
    Some(
        char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
    )
}

#[cfg(test)]
mod modified_utf8_tests {
    use super::*;

    #[test]
    fn containing_null_byte() {
        assert_eq!(encode_modified_utf8("a\x00a"), vec![97, 192, 128, 97]);
        assert_eq!(decode_modified_utf8(&[97, 192, 128, 97]).as_deref(), Some("a\x00a"));
    }

    #[test]
    fn simple_ascii() {
        assert_eq!(encode_modified_utf8("value"), vec![118, 97, 108, 117, 101]);
        assert_eq!(
            encode_modified_utf8("Ljava/lang/Deprecated;"),
            b"Ljava/lang/Deprecated;".to_vec()
        );
    }

    #[test]
    fn two_and_three_byte_encodings() {
        assert_eq!(
            encode_modified_utf8("ĄǍǞ"),
            vec![196, 132, 199, 141, 199, 158]
        );
        assert_eq!(
            encode_modified_utf8("ऄअॲ"),
            vec![224, 164, 132, 224, 164, 133, 224, 165, 178]
        );
        assert_eq!(decode_modified_utf8(&encode_modified_utf8("ĄǍ ऄअ")).as_deref(), Some("ĄǍ ऄअ"));
    }

    #[test]
    fn supplementary_characters() {
        let encoded = encode_modified_utf8("\u{10000}\u{dffff}\u{10FFFF}");
        assert_eq!(
            encoded,
            vec![
                237, 160, 128, 237, 176, 128, 237, 172, 191, 237, 191, 191, 237, 175, 191, 237,
                191, 191
            ]
        );
        assert_eq!(
            decode_modified_utf8(&encoded).as_deref(),
            Some("\u{10000}\u{dffff}\u{10FFFF}")
        );
    }

    #[test]
    fn truncated_sequence() {
        assert_eq!(decode_modified_utf8(&[0xE0, 0xA4]), None);
    }
}

/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`. Quoting
/// the JVMS (§4.4.5):
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
/// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
/// > at index n, then the next usable item in the pool is located at index n+2. The constant_pool
/// > index n+1 must be valid but is considered unusable.
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ConstantIndex(pub u16);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct Utf8ConstantIndex(pub ConstantIndex);

impl From<Utf8ConstantIndex> for ConstantIndex {
    fn from(idx: Utf8ConstantIndex) -> ConstantIndex {
        idx.0
    }
}

impl Serialize for ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Serialize for Utf8ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Deserialize for ConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        Ok(ConstantIndex(u16::deserialize(reader)?))
    }
}

impl Deserialize for Utf8ConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        Ok(Utf8ConstantIndex(ConstantIndex::deserialize(reader)?))
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;

    #[test]
    fn wide_constants_take_two_slots() -> Result<(), Error> {
        let mut pool = ConstantsPool::new();
        let a = pool.get_utf8("value")?;
        let l = pool.get_long(42)?;
        let b = pool.get_integer(3)?;

        assert_eq!(a, Utf8ConstantIndex(ConstantIndex(1)));
        assert_eq!(l, ConstantIndex(2));
        assert_eq!(b, ConstantIndex(4), "long occupies #2 and #3");
        assert_eq!(pool.count(), 5);
        assert_eq!(pool.get(ConstantIndex(3)), None, "unusable slot after a long");
        Ok(())
    }

    #[test]
    fn constants_are_deduplicated() -> Result<(), Error> {
        let mut pool = ConstantsPool::new();
        let first = pool.get_utf8("LA;")?;
        pool.get_float(1.5)?;
        let again = pool.get_utf8(String::from("LA;"))?;
        assert_eq!(first, again);
        assert_eq!(pool.get_float(1.5)?, ConstantIndex(2));
        assert_eq!(pool.get_float(f32::NAN)?, pool.get_float(f32::NAN)?);
        assert_eq!(pool.get_utf8_str(first)?, "LA;");
        Ok(())
    }

    #[test]
    fn pool_read_back_keeps_indices() -> Result<(), Error> {
        let mut pool = ConstantsPool::new();
        pool.get_utf8("LA;")?;
        pool.get_double(2.5)?;
        pool.get_utf8("caf\u{e9}\u{0}")?;
        pool.get_integer(-7)?;

        let mut bytes = vec![];
        pool.serialize(&mut bytes)?;
        let mut read: ConstantsPool = ConstantsPool::deserialize(&mut bytes.as_slice())?;

        assert_eq!(read.count(), pool.count());
        assert_eq!(read.get(ConstantIndex(2)), Some(&Constant::Double(2.5)));
        assert_eq!(
            read.get_utf8_str(Utf8ConstantIndex(ConstantIndex(4)))?,
            "caf\u{e9}\u{0}"
        );
        assert_eq!(read.get_integer(-7)?, ConstantIndex(5));
        assert_eq!(read.get_utf8("LA;")?, Utf8ConstantIndex(ConstantIndex(1)));
        assert_eq!(read.count(), 6, "nothing was added");
        Ok(())
    }

    #[test]
    fn unknown_constant_tags_are_rejected() {
        let bytes: &[u8] = &[0, 2, 7, 0, 1];
        assert!(ConstantsPool::deserialize(&mut &bytes[..]).is_err());
    }
}
