//! Bookkeeping about generated method code
//!
//! Bytecode generation itself lives elsewhere; this only records enough about what was emitted
//! (instruction offsets, local live ranges, exception table entries) to locate code-level type
//! annotation targets.

mod offsets;

pub use offsets::*;
