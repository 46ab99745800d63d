//! Expression lowering.

use super::{describe, CodeGen};
use crate::ast::{siblings, Node, NodeKind};
use crate::core::{CompileError, CompileResult};
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum};

impl<'ctx> CodeGen<'ctx, '_> {
    /// Lower an expression node to an IR value.
    pub(super) fn lower_expr(&mut self, node: &Node<'_>) -> CompileResult<BasicValueEnum<'ctx>> {
        match node.kind {
            NodeKind::NumberLiteral => Ok(self.i32_const(node.int_value).into()),
            NodeKind::StringLiteral => {
                let global = self.builder.build_global_string_ptr(node.name(), "str")?;
                self.session.record_string_literal();
                Ok(global.as_pointer_value().into())
            }
            NodeKind::Identifier => self.lower_load(node),
            NodeKind::Call => self.lower_call(node),
            kind => Err(CompileError::UnsupportedExpression { kind }),
        }
    }

    fn lower_load(&mut self, node: &Node<'_>) -> CompileResult<BasicValueEnum<'ctx>> {
        let name = node.name();
        let slot = self
            .slots
            .lookup(name)
            .ok_or_else(|| CompileError::UndefinedVariable {
                name: name.to_string(),
            })?;

        log::trace!("load {}", name);
        Ok(self.builder.build_load(self.context.i32_type(), slot, name)?)
    }

    /// Lower a call, checking the callee's arity and parameter kinds.
    ///
    /// Arguments are lowered left to right before the callee is resolved.
    pub(super) fn lower_call(&mut self, node: &Node<'_>) -> CompileResult<BasicValueEnum<'ctx>> {
        let name = node.name();

        let mut args = Vec::new();
        for arg in siblings(node.primary) {
            args.push(self.lower_expr(arg)?);
        }

        let callee = self
            .functions
            .lookup(name)
            .ok_or_else(|| CompileError::UndefinedFunction {
                name: name.to_string(),
            })?;

        if args.len() != callee.arity {
            return Err(CompileError::ArityMismatch {
                name: name.to_string(),
                expected: callee.arity,
                found: args.len(),
            });
        }

        for (index, (arg, param)) in args.iter().zip(callee.function.get_param_iter()).enumerate() {
            if arg.get_type() != param.get_type() {
                return Err(CompileError::ArgumentType {
                    function: name.to_string(),
                    position: index + 1,
                    expected: describe(param.get_type()),
                    found: describe(arg.get_type()),
                });
            }
        }

        let call_args: Vec<BasicMetadataValueEnum<'ctx>> = args.iter().map(|&arg| arg.into()).collect();
        let call = self.builder.build_call(callee.function, &call_args, "call")?;
        self.session.record_call(name);
        log::trace!("call {} with {} arguments", name, call_args.len());

        call.try_as_basic_value()
            .left()
            .ok_or_else(|| CompileError::InvalidValue {
                reason: format!("call to {} produced no value", name),
            })
    }
}
