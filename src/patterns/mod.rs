//! Flow-sensitive scoping of pattern variables
//!
//! A pattern variable (`s` in `o instanceof String s`) isn't scoped by blocks the way other
//! locals are. It is in scope exactly where the pattern is known to have matched:
//!
//! ```text
//! if (!(o instanceof String s)) {
//!     return;                      // `s` not in scope
//! }
//! s.length();                      // in scope: the `if` can only be left with a match
//! ```
//!
//! [`PatternScopeAnalyzer`] computes this for a method [`Body`], producing a
//! [`PatternBindingTable`] (which variable each name refers to, and what is in scope at every
//! expression and statement) along with [`Diagnostic`]s for duplicate, unresolved, or illegally
//! modified pattern variables.

mod analyzer;
mod ast;
pub mod completion;
mod diagnostics;
pub mod dominance;
mod facts;
mod table;

pub use analyzer::*;
pub use ast::*;
pub use diagnostics::*;
pub use dominance::{ClassHierarchy, TypeHierarchy};
pub use facts::*;
pub use table::*;
