//! Built-in output routines.
//!
//! `outs(text)` prints `text` verbatim and `out(text)` prints it followed by a
//! newline. Both are ordinary IR functions wrapping the C library `printf`, so
//! call lowering resolves them like user functions.

use super::CodeGen;
use crate::core::{CompileError, CompileResult};
use inkwell::module::Linkage;
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;

pub const PRINTF: &str = "printf";
pub const OUTS: &str = "outs";
pub const OUT: &str = "out";

impl<'ctx> CodeGen<'ctx, '_> {
    /// Declare `printf` and define the output shims.
    ///
    /// The builder's insertion block is restored afterwards, also on error.
    pub(super) fn define_runtime(&mut self) -> CompileResult<()> {
        let printf = self.get_or_declare_printf();

        let saved_block = self.builder.get_insert_block();
        let result = self.define_output_shims(printf);
        if let Some(block) = saved_block {
            self.builder.position_at_end(block);
        }
        result
    }

    fn define_output_shims(&mut self, printf: FunctionValue<'ctx>) -> CompileResult<()> {
        self.define_print_shim(OUTS, "%s", "outs_fmt", printf)?;
        self.define_print_shim(OUT, "%s\n", "out_fmt", printf)?;
        Ok(())
    }

    fn get_or_declare_printf(&self) -> FunctionValue<'ctx> {
        if let Some(printf) = self.module.get_function(PRINTF) {
            return printf;
        }

        let ptr_type = self.context.ptr_type(AddressSpace::default());
        let printf_type = self.context.i32_type().fn_type(&[ptr_type.into()], true);
        self.module
            .add_function(PRINTF, printf_type, Some(Linkage::External))
    }

    /// Define `i32 name(ptr text)` as `printf(format, text); ret 0`.
    fn define_print_shim(
        &mut self,
        name: &str,
        format: &str,
        format_name: &str,
        printf: FunctionValue<'ctx>,
    ) -> CompileResult<()> {
        let ptr_type = self.context.ptr_type(AddressSpace::default());
        let shim_type = self.context.i32_type().fn_type(&[ptr_type.into()], false);
        let function = self.module.add_function(name, shim_type, None);

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let text = function
            .get_first_param()
            .ok_or_else(|| CompileError::InvalidValue {
                reason: format!("{} has no parameter", name),
            })?;

        let format = self.builder.build_global_string_ptr(format, format_name)?;
        self.builder
            .build_call(printf, &[format.as_pointer_value().into(), text.into()], "")?;
        self.builder.build_return(Some(&self.i32_const(0)))?;

        self.functions.register(name, function, 1);
        log::debug!("Defined runtime shim {}", name);
        Ok(())
    }
}
