// This module provides arena-based compilation session management using the bumpalo crate.
// CompilationSession owns a reference to the arena that holds every syntax tree node and
// interned name of one compilation, so the parser can hand out plain shared references and
// the lowering stage never deals with ownership of the tree. The session also tracks the
// function currently being lowered and collects statistics (functions lowered, statements
// lowered and skipped, calls per callee, stack slots, string literals) that the driver logs
// at debug level once a file is compiled. Interior mutability through RefCell lets parser
// and lowering share one `&CompilationSession` without threading `&mut` everywhere.

//! Arena-based compilation session management.
//!
//! All tree nodes of a compilation are allocated in the session arena and share
//! its lifetime.

use crate::ast::Node;
use bumpalo::Bump;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// Arena-based compilation session.
pub struct CompilationSession<'arena> {
    /// Arena allocator for tree nodes and names.
    arena: &'arena Bump,

    /// Statistics collected while lowering.
    stats: RefCell<SessionStats>,

    /// String interning for names and literal text.
    interned_strings: RefCell<HashMap<String, &'arena str>>,

    /// Function currently being lowered.
    current_function: RefCell<Option<String>>,
}

impl<'arena> CompilationSession<'arena> {
    /// Create a new compilation session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(SessionStats::default()),
            interned_strings: RefCell::new(HashMap::new()),
            current_function: RefCell::new(None),
        }
    }

    /// Allocate an object in the session arena.
    pub fn alloc<T>(&self, value: T) -> &'arena mut T {
        self.arena.alloc(value)
    }

    /// Allocate `nodes` in order and chain them through `next`.
    ///
    /// Returns the head of the sequence, or `None` for an empty one. Nodes are
    /// allocated back to front so each one links to an already allocated node.
    pub fn alloc_sequence(&self, nodes: Vec<Node<'arena>>) -> Option<&'arena Node<'arena>> {
        nodes.into_iter().rev().fold(None, |next, node| {
            Some(&*self.arena.alloc(Node { next, ..node }))
        })
    }

    /// Intern a string in the arena.
    pub fn intern_str(&self, s: &str) -> &'arena str {
        let mut strings = self.interned_strings.borrow_mut();
        if let Some(&interned) = strings.get(s) {
            return interned;
        }

        let interned = self.arena.alloc_str(s);
        strings.insert(s.to_string(), interned);
        interned
    }

    /// Set current function being lowered.
    pub fn set_current_function(&self, name: &str) {
        *self.current_function.borrow_mut() = Some(name.to_string());
    }

    /// Name of the function being lowered, if any.
    pub fn current_function(&self) -> Option<String> {
        self.current_function.borrow().clone()
    }

    /// Record that a function body was lowered.
    pub fn record_function_lowered(&self, name: &str, statements: usize) {
        let mut stats = self.stats.borrow_mut();
        stats.functions_lowered += 1;
        stats.statements_lowered += statements;

        if stats.largest_function_name.is_empty() || stats.largest_function_statements < statements {
            stats.largest_function_statements = statements;
            stats.largest_function_name = name.to_string();
        }
        drop(stats);

        *self.current_function.borrow_mut() = None;
    }

    /// Record a statement kind the lowering stage does not handle.
    pub fn record_statement_skipped(&self) {
        self.stats.borrow_mut().statements_skipped += 1;
    }

    /// Record a lowered call instruction.
    pub fn record_call(&self, callee: &str) {
        let mut stats = self.stats.borrow_mut();
        stats.calls_lowered += 1;
        *stats.call_counts.entry(callee.to_string()).or_insert(0) += 1;
    }

    /// Record a stack slot allocation.
    pub fn record_slot_allocated(&self) {
        self.stats.borrow_mut().slots_allocated += 1;
    }

    /// Record a string literal materialized as a global.
    pub fn record_string_literal(&self) {
        self.stats.borrow_mut().string_literals += 1;
    }

    /// Get compilation statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

impl fmt::Debug for CompilationSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationSession")
            .field("allocated_bytes", &self.arena.allocated_bytes())
            .field("stats", &self.stats.borrow())
            .field("current_function", &self.current_function.borrow())
            .finish_non_exhaustive()
    }
}

/// Compilation session statistics.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    /// Number of function bodies lowered.
    pub functions_lowered: usize,

    /// Statements lowered across all functions.
    pub statements_lowered: usize,

    /// Statements skipped because their kind has no lowering.
    pub statements_skipped: usize,

    /// Total call instructions emitted for user code.
    pub calls_lowered: usize,

    /// Calls per callee name.
    pub call_counts: HashMap<String, usize>,

    /// Stack slots allocated for variables.
    pub slots_allocated: usize,

    /// String literals materialized as globals.
    pub string_literals: usize,

    /// Function with the most lowered statements.
    pub largest_function_name: String,

    /// Statement count of the largest function.
    pub largest_function_statements: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Session Statistics:")?;
        writeln!(f, "  Functions lowered: {}", self.functions_lowered)?;
        writeln!(f, "  Statements lowered: {}", self.statements_lowered)?;
        writeln!(f, "  Statements skipped: {}", self.statements_skipped)?;
        writeln!(f, "  Calls lowered: {}", self.calls_lowered)?;
        writeln!(f, "  Stack slots: {}", self.slots_allocated)?;
        writeln!(f, "  String literals: {}", self.string_literals)?;

        if !self.largest_function_name.is_empty() {
            writeln!(
                f,
                "  Largest function: {} ({} statements)",
                self.largest_function_name, self.largest_function_statements
            )?;
        }

        if !self.call_counts.is_empty() {
            writeln!(f, "  Calls by callee:")?;
            let mut sorted: Vec<_> = self.call_counts.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

            for (callee, count) in sorted.into_iter().take(10) {
                writeln!(f, "    {}: {}", callee, count)?;
            }
        }

        Ok(())
    }
}
