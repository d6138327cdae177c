mod annotation;
mod attribute;
mod constants;
mod serialize;
mod type_annotation;

pub use annotation::*;
pub use attribute::*;
pub use constants::*;
pub use serialize::{Deserialize, Serialize};
pub use type_annotation::*;
