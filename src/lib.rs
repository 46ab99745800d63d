//! Chara - a small compiler from Chara source to native executables.
//!
//! Source text is parsed into an arena-allocated tree, lowered to LLVM IR in
//! two passes (signatures, then bodies), emitted as an object file for the
//! host and linked by the system C compiler.
//!
//! # Primary Usage
//!
//! ```ignore
//! use chara::driver::{compile_file, CompileOptions};
//!
//! let output = compile_file("hello.chr".as_ref(), &CompileOptions::default(), &mut std::io::sink())?;
//! println!("{}", output.executable.display());
//! ```
//!
//! # Architecture
//!
//! - [`ast`] - Tree model and debug printer
//! - [`parser`] - Lexer and recursive-descent parser
//! - [`core`] - Session, symbol tables, errors
//! - [`llvm`] - Lowering to LLVM IR and object emission
//! - [`driver`] - File handling and linking

pub mod ast;
pub mod core;
pub mod driver;
pub mod llvm;
pub mod parser;

pub use crate::ast::{Node, NodeKind};
pub use crate::core::{
    CompilationSession, CompileError, CompileResult, FunctionEntry, FunctionTable, SessionStats,
    SlotTable,
};
pub use crate::driver::{compile_file, CompileOptions, CompileOutput, DriverError};
pub use crate::llvm::CodeGen;
pub use crate::parser::{parse, ParseError};
