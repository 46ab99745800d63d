// This module lowers a Chara syntax tree into an LLVM module through inkwell and emits it
// as a native object file. CodeGen owns the module, the instruction builder and the
// function registry for one compilation, and borrows the CompilationSession for
// statistics. Lowering is split by concern: runtime.rs defines the `out`/`outs` shims
// over a declared `printf`, stmt.rs runs the two passes over the declarations (signatures
// first, bodies second) and lowers statements, expr.rs lowers expressions and calls,
// and emit.rs selects the host target machine and serializes the module. Every failure
// is returned as a CompileError; nothing here terminates the process.

//! LLVM lowering and object emission.
//!
//! # Example
//! ```ignore
//! use bumpalo::Bump;
//! use chara::core::CompilationSession;
//! use chara::llvm::CodeGen;
//! use inkwell::context::Context;
//!
//! let arena = Bump::new();
//! let session = CompilationSession::new(&arena);
//! let root = chara::parser::parse(&session, "fn main out(\"hi\") end 0")?;
//!
//! let context = Context::create();
//! let mut codegen = CodeGen::new(&context, "demo", &session);
//! codegen.lower_program(root)?;
//! chara::llvm::emit::emit_object(codegen.module(), "demo.o".as_ref())?;
//! ```

pub mod emit;
mod expr;
mod runtime;
mod stmt;

use crate::ast::{Node, NodeKind};
use crate::core::{CompilationSession, CompileError, CompileResult, FunctionTable, SlotTable};
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::BasicTypeEnum;
use inkwell::values::IntValue;

pub use runtime::{OUT, OUTS, PRINTF};

/// Name given to the module by the driver.
pub const MODULE_NAME: &str = "chara_module";

/// LLVM code generator for one compilation.
///
/// The builder is declared before the module so it is disposed first.
pub struct CodeGen<'ctx, 'a> {
    context: &'ctx Context,

    /// Instruction builder; its insertion point is the only cursor.
    builder: Builder<'ctx>,

    /// Module receiving every function of the program.
    module: Module<'ctx>,

    /// Session for lowering statistics.
    session: &'a CompilationSession<'a>,

    /// Functions callable from user code, shims included.
    functions: FunctionTable<'ctx>,

    /// Storage slots of the function being lowered.
    slots: SlotTable<'ctx>,
}

impl<'ctx, 'a> CodeGen<'ctx, 'a> {
    pub fn new(context: &'ctx Context, module_name: &str, session: &'a CompilationSession<'a>) -> Self {
        Self {
            context,
            builder: context.create_builder(),
            module: context.create_module(module_name),
            session,
            functions: FunctionTable::new(),
            slots: SlotTable::new(),
        }
    }

    /// The module built so far.
    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Function registry, including the runtime shims once lowering started.
    pub fn functions(&self) -> &FunctionTable<'ctx> {
        &self.functions
    }

    /// Textual IR of the module.
    pub fn print_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Lower a whole program.
    ///
    /// `root` is either a `Program` node or the first declaration of the
    /// top-level sequence. The runtime shims are defined first, then every
    /// function signature is declared, then every body is lowered, and the
    /// finished module is checked by the LLVM verifier.
    pub fn lower_program(&mut self, root: &Node<'_>) -> CompileResult<()> {
        let first = match root.kind {
            NodeKind::Program => root.primary,
            _ => Some(root),
        };

        self.define_runtime()?;
        self.declare_functions(first)?;
        self.define_functions(first)?;

        self.module.verify().map_err(|e| CompileError::Verification {
            reason: e.to_string(),
        })?;

        log::info!(
            "Lowered module {} ({} callable functions)",
            self.module.get_name().to_string_lossy(),
            self.functions.len()
        );
        Ok(())
    }

    fn i32_const(&self, value: i32) -> IntValue<'ctx> {
        // Sign-extend so negative literals keep their value.
        self.context.i32_type().const_int(value as i64 as u64, true)
    }
}

/// Source-level kind of an LLVM type, for diagnostics.
fn describe(ty: BasicTypeEnum<'_>) -> &'static str {
    match ty {
        BasicTypeEnum::IntType(_) => "integer",
        BasicTypeEnum::PointerType(_) => "string",
        _ => "value",
    }
}
