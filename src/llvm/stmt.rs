//! Program and statement lowering.
//!
//! Pass 1 declares every function as `i32 ()` so bodies can call functions
//! declared later in the file. Pass 2 lowers each body into a fresh `entry`
//! block with a fresh slot table and returns the declared return expression,
//! or 0 when there is none.

use super::{describe, CodeGen};
use crate::ast::{siblings, Node, NodeKind};
use crate::core::{CompileError, CompileResult, SlotTable};
use hashbrown::HashSet;
use inkwell::values::BasicValueEnum;

impl<'ctx> CodeGen<'ctx, '_> {
    /// Pass 1: declare and register every function signature.
    pub(super) fn declare_functions(&mut self, first: Option<&Node<'_>>) -> CompileResult<()> {
        let fn_type = self.context.i32_type().fn_type(&[], false);
        let mut declared = HashSet::new();

        for decl in siblings(first).filter(|n| n.kind == NodeKind::FunctionDecl) {
            let name = decl.name();
            if !declared.insert(name) {
                return Err(CompileError::DuplicateFunction {
                    name: name.to_string(),
                });
            }

            let function = self.module.add_function(name, fn_type, None);
            self.functions.register(name, function, 0);
        }

        log::debug!("Declared {} functions", declared.len());
        Ok(())
    }

    /// Pass 2: lower every function body.
    pub(super) fn define_functions(&mut self, first: Option<&Node<'_>>) -> CompileResult<()> {
        for decl in siblings(first).filter(|n| n.kind == NodeKind::FunctionDecl) {
            self.define_function(decl)?;
        }
        Ok(())
    }

    fn define_function(&mut self, decl: &Node<'_>) -> CompileResult<()> {
        let name = decl.name();
        let entry = self
            .functions
            .lookup(name)
            .ok_or_else(|| CompileError::UndefinedFunction {
                name: name.to_string(),
            })?;

        log::info!("Lowering function {}", name);
        self.session.set_current_function(name);

        let block = self.context.append_basic_block(entry.function, "entry");
        self.builder.position_at_end(block);
        self.slots = SlotTable::new();

        let statements = self.lower_statements(decl.primary)?;

        let ret = match decl.secondary {
            Some(expr) => match self.lower_expr(expr)? {
                BasicValueEnum::IntValue(value) => value,
                other => {
                    return Err(CompileError::ReturnType {
                        function: name.to_string(),
                        found: describe(other.get_type()),
                    });
                }
            },
            None => self.i32_const(0),
        };
        self.builder.build_return(Some(&ret))?;

        self.session.record_function_lowered(name, statements);
        Ok(())
    }

    /// Lower a statement sequence, returning how many statements were lowered.
    ///
    /// Statement kinds without a lowering are skipped.
    fn lower_statements(&mut self, first: Option<&Node<'_>>) -> CompileResult<usize> {
        let mut lowered = 0;

        for stmt in siblings(first) {
            match (stmt.kind, stmt.primary) {
                (NodeKind::Call, _) => {
                    self.lower_call(stmt)?;
                }
                (NodeKind::VarAssign, Some(value)) => self.lower_assignment(stmt.name(), value)?,
                (kind, _) => {
                    log::debug!("Skipping {} in statement position", kind);
                    self.session.record_statement_skipped();
                    continue;
                }
            }
            lowered += 1;
        }

        Ok(lowered)
    }

    fn lower_assignment(&mut self, name: &str, value: &Node<'_>) -> CompileResult<()> {
        let value = match self.lower_expr(value)? {
            BasicValueEnum::IntValue(value) => value,
            other => {
                return Err(CompileError::TypeMismatch {
                    name: name.to_string(),
                    expected: "integer",
                    found: describe(other.get_type()),
                });
            }
        };

        let slot = match self.slots.lookup(name) {
            Some(slot) => slot,
            None => {
                let slot = self.builder.build_alloca(self.context.i32_type(), name)?;
                self.slots.register(name, slot);
                self.session.record_slot_allocated();
                log::debug!("Allocated stack slot for {}", name);
                slot
            }
        };

        log::trace!("store {}", name);
        self.builder.build_store(slot, value)?;
        Ok(())
    }
}
