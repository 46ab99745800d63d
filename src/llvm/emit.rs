// This module serializes a finished LLVM module into native object code for the host.
// The native target is initialized once per process; the host triple comes from LLVM's
// default triple and a target machine is created for it with the generic CPU, default
// optimization level and code model, and position-independent relocations so the object
// links into the default PIE executables produced by modern C toolchains. The module's
// triple and data layout are set from the target machine before writing. Emission does
// not transform the IR. The target machine is dropped before every return.

//! Object file emission.

use crate::core::{CompileError, CompileResult};
use inkwell::module::Module;
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine, TargetTriple,
};
use inkwell::OptimizationLevel;
use std::path::Path;
use std::sync::OnceLock;

/// CPU name passed to the target machine.
pub const HOST_CPU: &str = "generic";

/// Initialize the native target and asm printer, once per process.
pub fn initialize_native_target() -> CompileResult<()> {
    static NATIVE: OnceLock<Result<(), String>> = OnceLock::new();

    NATIVE
        .get_or_init(|| Target::initialize_native(&InitializationConfig::default()))
        .clone()
        .map_err(|reason| CompileError::Target { reason })
}

fn triple_name(triple: &TargetTriple) -> String {
    triple.as_str().to_string_lossy().into_owned()
}

/// Target machine for the host triple.
pub fn host_target_machine() -> CompileResult<TargetMachine> {
    initialize_native_target()?;

    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple).map_err(|e| CompileError::Target {
        reason: format!("{}: {}", triple_name(&triple), e),
    })?;

    let machine = target
        .create_target_machine(
            &triple,
            HOST_CPU,
            "",
            OptimizationLevel::Default,
            RelocMode::PIC,
            CodeModel::Default,
        )
        .ok_or_else(|| CompileError::Target {
            reason: format!("cannot create a target machine for {}", triple_name(&triple)),
        })?;

    log::debug!("Target machine for {}", triple_name(&triple));
    Ok(machine)
}

fn prepare_module(module: &Module<'_>, machine: &TargetMachine) {
    module.set_triple(&machine.get_triple());
    module.set_data_layout(&machine.get_target_data().get_data_layout());
}

/// Emit `module` as a relocatable object file at `path`.
pub fn emit_object(module: &Module<'_>, path: &Path) -> CompileResult<()> {
    let machine = host_target_machine()?;
    prepare_module(module, &machine);

    let result = machine
        .write_to_file(module, FileType::Object, path)
        .map_err(|e| CompileError::Emit {
            reason: format!("{}: {}", path.display(), e),
        });
    drop(machine);

    if result.is_ok() {
        log::info!("Wrote object file {}", path.display());
    }
    result
}

/// Emit `module` as a relocatable object held in memory.
pub fn emit_object_bytes(module: &Module<'_>) -> CompileResult<Vec<u8>> {
    let machine = host_target_machine()?;
    prepare_module(module, &machine);

    let result = machine
        .write_to_memory_buffer(module, FileType::Object)
        .map(|buffer| buffer.as_slice().to_vec())
        .map_err(|e| CompileError::Emit {
            reason: e.to_string(),
        });
    drop(machine);
    result
}
