// This module groups the infrastructure shared by the parser and the LLVM lowering
// stage: the arena-based compilation session (tree allocation, interning and
// statistics), the function and storage-slot symbol tables, and the thiserror-based
// error type returned by lowering and emission.

//! Core compiler infrastructure.
//!
//! - [`session`]: arena allocation and lowering statistics
//! - [`symbols`]: function and storage-slot registries
//! - [`error`]: [`CompileError`] and [`CompileResult`]

pub mod error;
pub mod session;
pub mod symbols;

pub use error::{CompileError, CompileResult};
pub use session::{CompilationSession, SessionStats};
pub use symbols::{FunctionEntry, FunctionTable, SlotTable};
