//! Class file back end pieces for Java language features that need more than a one-to-one
//! translation
//!
//!   - [`typeanno`] places type annotations into `Runtime{Visible,Invisible}TypeAnnotations`
//!     attributes, working out the target and type path of every annotated type
//!   - [`patterns`] decides where pattern variables are in scope and reports misuses
//!
//! [`jvm`] has the class file structures (constants pool, attributes) that both rely on.

pub mod jvm;
pub mod patterns;
pub mod settings;
pub mod typeanno;
mod util;
