//! JVM class file structures needed to emit (and read back) type annotations
//!
//! ### Simple example
//!
//! Consider the following field:
//!
//! ```java,ignore,no_run
//! @Target(TYPE_USE) @Retention(CLASS) @interface B { int value(); }
//!
//! class X {
//!     java.util.List<@B(3) String> names;
//! }
//! ```
//!
//! The `RuntimeInvisibleTypeAnnotations` attribute on `names` can be built as follows:
//!
//! ```
//! use typeflow::jvm::class_file::*;
//! use typeflow::jvm::*;
//!
//! # fn generate_attribute() -> Result<(), Error> {
//! let mut constants = ConstantsPool::new();
//! let annotation = Annotation {
//!     type_index: constants.get_utf8("LB;")?,
//!     element_value_pairs: vec![ElementValuePair {
//!         element_name_index: constants.get_utf8("value")?,
//!         value: ElementValue::Const(ConstTag::Int, constants.get_integer(3)?),
//!     }],
//! };
//! let entry = TypeAnnotation {
//!     target: TargetDescriptor::Field,
//!     path: TypePath(vec![TypePathEntry::TypeArgument(0)]),
//!     annotation,
//! };
//! let attribute = constants.get_attribute(RuntimeInvisibleTypeAnnotations(vec![entry]))?;
//!
//! let mut bytes: Vec<u8> = vec![];
//! attribute.serialize(&mut bytes).map_err(Error::IoError)?;
//! # Ok(())
//! # }
//! ```

pub mod class_file;
pub mod code;
mod errors;
mod names;

pub use errors::*;
pub use names::*;
