// This module defines the syntax tree consumed by the lowering pipeline. Every node has
// the same shape: a kind tag, an optional name, an integer literal, a primary child, a
// secondary child and a next-sibling link. Sequences (top-level declarations, function
// bodies, call arguments) are chained through `next` only. Nodes live in the arena of a
// CompilationSession and are linked through shared references, so a node can only point
// at nodes allocated before it and every sequence is acyclic and finite. The module also
// carries the tree debug printer used by `charac --ast`.

//! Syntax tree for Chara programs.
//!
//! | Kind | name | int_value | primary | secondary |
//! |---|---|---|---|---|
//! | `Program` | - | - | first declaration | - |
//! | `FunctionDecl` | function | - | first statement | return expression |
//! | `Call` | callee | - | first argument | - |
//! | `StringLiteral` | text | - | - | - |
//! | `NumberLiteral` | - | value | - | - |
//! | `Identifier` | variable | - | - | - |
//! | `VarAssign` | variable | - | assigned expression | - |

use std::fmt;

/// Node kinds produced by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    FunctionDecl,
    Call,
    StringLiteral,
    NumberLiteral,
    Identifier,
    VarAssign,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Program => "program",
            NodeKind::FunctionDecl => "function declaration",
            NodeKind::Call => "call",
            NodeKind::StringLiteral => "string literal",
            NodeKind::NumberLiteral => "number literal",
            NodeKind::Identifier => "identifier",
            NodeKind::VarAssign => "assignment",
        };
        f.write_str(name)
    }
}

/// A tree node. Children and siblings are arena references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node<'a> {
    pub kind: NodeKind,
    pub name: Option<&'a str>,
    pub int_value: i32,
    pub primary: Option<&'a Node<'a>>,
    pub secondary: Option<&'a Node<'a>>,
    pub next: Option<&'a Node<'a>>,
}

impl<'a> Node<'a> {
    /// Create a bare node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            int_value: 0,
            primary: None,
            secondary: None,
            next: None,
        }
    }

    pub fn program(first: Option<&'a Node<'a>>) -> Self {
        Self {
            primary: first,
            ..Self::new(NodeKind::Program)
        }
    }

    pub fn function(
        name: &'a str,
        body: Option<&'a Node<'a>>,
        ret: Option<&'a Node<'a>>,
    ) -> Self {
        Self {
            name: Some(name),
            primary: body,
            secondary: ret,
            ..Self::new(NodeKind::FunctionDecl)
        }
    }

    pub fn call(callee: &'a str, args: Option<&'a Node<'a>>) -> Self {
        Self {
            name: Some(callee),
            primary: args,
            ..Self::new(NodeKind::Call)
        }
    }

    pub fn string(text: &'a str) -> Self {
        Self {
            name: Some(text),
            ..Self::new(NodeKind::StringLiteral)
        }
    }

    pub fn number(value: i32) -> Self {
        Self {
            int_value: value,
            ..Self::new(NodeKind::NumberLiteral)
        }
    }

    pub fn identifier(name: &'a str) -> Self {
        Self {
            name: Some(name),
            ..Self::new(NodeKind::Identifier)
        }
    }

    pub fn assign(target: &'a str, value: &'a Node<'a>) -> Self {
        Self {
            name: Some(target),
            primary: Some(value),
            ..Self::new(NodeKind::VarAssign)
        }
    }

    /// Name of the node, or the empty string for unnamed kinds.
    pub fn name(&self) -> &'a str {
        self.name.unwrap_or_default()
    }

    /// Iterate this node and every node reachable through `next`.
    pub fn siblings(&'a self) -> Siblings<'a> {
        siblings(Some(self))
    }

    /// Render the subtree rooted at this node with the debug printer.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        write_tree(&mut out, self, 0);
        out
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Program => write!(f, "[Program]"),
            NodeKind::FunctionDecl => write!(f, "[Function: {}]", self.name()),
            NodeKind::Call => write!(f, "[Call: {}]", self.name()),
            NodeKind::StringLiteral => write!(f, "[String: {}]", self.name()),
            NodeKind::NumberLiteral => write!(f, "[Number: {}]", self.int_value),
            NodeKind::Identifier => write!(f, "[Ident: {}]", self.name()),
            NodeKind::VarAssign => write!(f, "[Variable: {}]", self.name()),
        }
    }
}

/// Iterator over a `next`-linked sequence.
#[derive(Debug, Clone)]
pub struct Siblings<'a> {
    next: Option<&'a Node<'a>>,
}

impl<'a> Iterator for Siblings<'a> {
    type Item = &'a Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next;
        Some(node)
    }
}

/// Iterate a sequence starting at `first`, which may be absent.
pub fn siblings<'a>(first: Option<&'a Node<'a>>) -> Siblings<'a> {
    Siblings { next: first }
}

fn write_tree(out: &mut String, node: &Node<'_>, depth: usize) {
    use std::fmt::Write;

    for node in siblings(Some(node)) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{node}");

        if let Some(primary) = node.primary {
            write_tree(out, primary, depth + 1);
        }
        if let Some(secondary) = node.secondary {
            write_tree(out, secondary, depth + 1);
        }
    }
}
