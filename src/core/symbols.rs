//! Symbol tables used during lowering.
//!
//! Two independent registries: functions (name to declared LLVM function plus
//! arity) and storage slots (name to the `alloca` backing a variable). Both
//! insert unconditionally; a later registration shadows an earlier one with
//! the same name. There is no removal.

use hashbrown::HashMap;
use inkwell::values::{FunctionValue, PointerValue};

/// A callable known to the lowering stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionEntry<'ctx> {
    pub function: FunctionValue<'ctx>,
    /// Number of arguments a call site must pass.
    pub arity: usize,
}

/// Function registry, scoped to one compilation.
#[derive(Debug, Default)]
pub struct FunctionTable<'ctx> {
    entries: HashMap<String, FunctionEntry<'ctx>>,
}

impl<'ctx> FunctionTable<'ctx> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `function` under `name`, returning the entry it shadows.
    pub fn register(
        &mut self,
        name: &str,
        function: FunctionValue<'ctx>,
        arity: usize,
    ) -> Option<FunctionEntry<'ctx>> {
        log::debug!("Registering function {} (arity {})", name, arity);
        self.entries
            .insert(name.to_string(), FunctionEntry { function, arity })
    }

    /// Most recently registered entry for `name`.
    pub fn lookup(&self, name: &str) -> Option<FunctionEntry<'ctx>> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Storage-slot registry. The lowering stage creates one per function body.
#[derive(Debug, Default)]
pub struct SlotTable<'ctx> {
    slots: HashMap<String, PointerValue<'ctx>>,
}

impl<'ctx> SlotTable<'ctx> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Register `slot` under `name`, returning the slot it shadows.
    pub fn register(&mut self, name: &str, slot: PointerValue<'ctx>) -> Option<PointerValue<'ctx>> {
        self.slots.insert(name.to_string(), slot)
    }

    pub fn lookup(&self, name: &str) -> Option<PointerValue<'ctx>> {
        self.slots.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
