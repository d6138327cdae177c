//! Type annotations on declarations and method bodies
//!
//! Annotations written on types (`@NonNull String`, `List<@A Integer>`) are recorded in
//! `RuntimeVisibleTypeAnnotations` and `RuntimeInvisibleTypeAnnotations` attributes. Each entry
//! says _where_ the annotated type was written (the target) and _which part_ of that type carries
//! the annotation (the type path). Getting from a declaration to those entries happens in stages:
//!
//!   - [`TypeTree`] describes a type as it was written, annotations and all, and computes the
//!     type path for every annotation it contains
//!   - [`TypeAnnotationResolver`] pairs those with the syntactic context of the type to pick a
//!     [`TargetDescriptor`], consulting a [`CodeOffsetTracker`] for anything inside a method body
//!   - [`AttributeEmitter`] interns the results into a constant pool and splits them by
//!     retention into the two attributes
//!
//! [`Disassembler`] renders attributes back to text, mostly for tests and debugging.
//!
//! [`CodeOffsetTracker`]: crate::jvm::code::CodeOffsetTracker

mod annotation;
mod decl;
mod disassembler;
mod emitter;
mod resolver;
mod type_tree;

pub use crate::jvm::class_file::{TargetDescriptor, TargetType, TypePath, TypePathEntry};
pub use annotation::*;
pub use decl::*;
pub use disassembler::*;
pub use emitter::*;
pub use resolver::*;
pub use type_tree::*;
