use super::class_file::{Constant, ConstantIndex};
use super::code::NodeId;
use std::fmt;

/// Internal errors
///
/// None of these are user-facing: by the time a resolved tree reaches this crate, placement
/// problems have already been reported. Seeing one of these means an invariant between code
/// generation and annotation resolution was broken (or an attribute being read is malformed).
#[derive(Debug)]
pub enum Error {
    ConstantPoolOverflow {
        constant: Constant,
        offset: u16,
    },
    IoError(std::io::Error),

    /// Asked for the bytecode offset of a construct for which no code was generated
    MissingCodeFor(NodeId),

    /// Asked for the live ranges of a local that was never given a slot
    MissingLiveRange(NodeId),

    /// Asked for the exception table entry of a catch alternative that has none
    MissingExceptionHandler {
        catch_clause: NodeId,
        alternative: usize,
    },

    /// A type path longer than 255 entries cannot be encoded
    TypePathTooLong(usize),

    /// An index that has to fit in `u8` or `u16` does not
    IndexOverflow(&'static str, usize),

    /// Decoding: unrecognized `target_type` byte
    UnknownTargetType(u8),

    /// Decoding: unrecognized `type_path_kind` byte
    UnknownPathKind(u8),

    /// Decoding: unrecognized `element_value` tag
    UnknownElementTag(u8),

    /// Decoding: unrecognized (or unsupported) constant pool tag
    UnknownConstantTag(u8),

    /// Decoding: `CONSTANT_Utf8` bytes that aren't Modified UTF-8
    MalformedUtf8(Vec<u8>),

    /// Decoding: constant index does not point at a usable constant
    MissingConstant(ConstantIndex),

    /// Decoding: input ended before the attribute did
    TrailingBytes(usize),

    MalformedName(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConstantPoolOverflow { constant, offset } => {
                write!(f, "constant pool overflow at #{} inserting {:?}", offset, constant)
            }
            Error::IoError(err) => write!(f, "i/o error: {}", err),
            Error::MissingCodeFor(node) => write!(f, "no code was generated for {:?}", node),
            Error::MissingLiveRange(node) => write!(f, "local {:?} has no live range", node),
            Error::MissingExceptionHandler {
                catch_clause,
                alternative,
            } => write!(
                f,
                "catch clause {:?} has no exception table entry for alternative {}",
                catch_clause, alternative
            ),
            Error::TypePathTooLong(len) => write!(f, "type path of length {} does not fit", len),
            Error::IndexOverflow(what, index) => write!(f, "{} {} is out of range", what, index),
            Error::UnknownTargetType(tag) => write!(f, "unknown target type 0x{:x}", tag),
            Error::UnknownPathKind(kind) => write!(f, "unrecognized type_path_kind: {}", kind),
            Error::UnknownElementTag(tag) => {
                write!(f, "unknown element value tag '{}'", *tag as char)
            }
            Error::UnknownConstantTag(tag) => write!(f, "unsupported constant tag {}", tag),
            Error::MalformedUtf8(bytes) => write!(f, "malformed modified UTF-8: {:x?}", bytes),
            Error::MissingConstant(idx) => write!(f, "no usable constant at #{}", idx.0),
            Error::TrailingBytes(len) => write!(f, "{} bytes left after attribute", len),
            Error::MalformedName(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}
