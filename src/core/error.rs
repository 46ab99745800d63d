// This module defines the error types raised while lowering a Chara tree to LLVM IR and
// while emitting the resulting module, using the thiserror crate. CompileError covers
// symbol resolution failures (undefined function or variable, wrong argument count,
// duplicate function definitions), integer/string kind mismatches, unsupported node
// kinds in expression position, LLVM builder and verifier failures, and target machine /
// object emission failures. Lowering never terminates the process: every failure is
// returned as a CompileError and the driver decides how to report it and which exit
// code to use. CompileResult<T> is the matching Result alias.

//! Error types for the Chara compiler.

use crate::ast::NodeKind;
use inkwell::builder::BuilderError;
use thiserror::Error;

/// Main error type for lowering and emission.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("undefined function {name}")]
    UndefinedFunction { name: String },

    #[error("call to {name}: expected {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {position} of call to {function}: expected {expected}, got {found}")]
    ArgumentType {
        function: String,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("variable {name} not defined")]
    UndefinedVariable { name: String },

    #[error("cannot assign {found} to variable {name}: variables hold {expected} values")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("function {function} must return an integer, got {found}")]
    ReturnType {
        function: String,
        found: &'static str,
    },

    #[error("function {name} is defined more than once")]
    DuplicateFunction { name: String },

    #[error("unsupported expression node: {kind}")]
    UnsupportedExpression { kind: NodeKind },

    #[error("invalid LLVM value: {reason}")]
    InvalidValue { reason: String },

    #[error("IR builder error: {0}")]
    Builder(#[from] BuilderError),

    #[error("module verification failed: {reason}")]
    Verification { reason: String },

    #[error("target error: {reason}")]
    Target { reason: String },

    #[error("emit error: {reason}")]
    Emit { reason: String },
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
