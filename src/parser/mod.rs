// This module implements the Chara front end: a logos-generated lexer and a recursive-descent
// parser for the fixed grammar below. Parsed nodes are allocated in the arena of a
// CompilationSession and every sequence (declarations, statements, arguments) is chained
// through the `next` link of the tree model, so the lowering stage walks a single kind
// of sequence. Names and literal text are interned in the session. Errors carry the
// 1-based line and column of the offending token.

//! Chara parser.
//!
//! # Grammar
//!
//! ```text
//! program   := { function }
//! function  := "fn" IDENT { statement } "end" [ expr ]
//! statement := IDENT "(" [ expr { "," expr } ] ")"
//!            | IDENT "=" expr
//! expr      := NUMBER | STRING | IDENT | IDENT "(" [ expr { "," expr } ] ")"
//! ```
//!
//! `#` starts a comment that runs to the end of the line. Calls nest at most
//! [`MAX_CALL_DEPTH`] levels deep; deeper input is rejected with a
//! [`ParseError`] rather than exhausting the stack of the recursive parser and
//! lowering stage.

pub mod lexer;

use crate::ast::Node;
use crate::core::CompilationSession;
use lexer::{Lexer, Token, TokenKind};
use thiserror::Error;

/// Deepest accepted nesting of call expressions.
pub const MAX_CALL_DEPTH: usize = 256;

/// Syntax error with its source position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Parse `source` into a `Program` node allocated in the session arena.
pub fn parse<'arena>(
    session: &CompilationSession<'arena>,
    source: &str,
) -> Result<&'arena Node<'arena>, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let root = Parser {
        session,
        tokens,
        pos: 0,
        depth: 0,
    }
    .parse_program()?;
    log::debug!("Parsed {} functions", root.primary.map_or(0, |f| f.siblings().count()));
    Ok(root)
}

struct Parser<'p, 'arena, 's> {
    session: &'p CompilationSession<'arena>,
    tokens: Vec<Token<'s>>,
    pos: usize,
    /// Calls currently open around the parse position.
    depth: usize,
}

impl<'arena, 's> Parser<'_, 'arena, 's> {
    fn peek(&self) -> &Token<'s> {
        // tokenize() always ends with Eof, and bump() never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_second(&self) -> &TokenKind<'s> {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].kind
    }

    fn bump(&mut self) -> Token<'s> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, token: &Token<'_>, message: impl Into<String>) -> ParseError {
        ParseError::new(token.line, token.column, message)
    }

    fn expect(&mut self, expected: TokenKind<'static>) -> Result<Token<'s>, ParseError> {
        let token = self.peek();
        if token.kind == expected {
            Ok(self.bump())
        } else {
            Err(self.error_at(token, format!("expected {}, found {}", expected, token.kind)))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<&'arena str, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Ident(name) => {
                let name = self.session.intern_str(name);
                self.bump();
                Ok(name)
            }
            ref other => Err(self.error_at(token, format!("expected {}, found {}", what, other))),
        }
    }

    fn parse_program(&mut self) -> Result<&'arena Node<'arena>, ParseError> {
        let mut functions = Vec::new();
        while self.peek().kind != TokenKind::Eof {
            functions.push(self.parse_function()?);
        }

        let first = self.session.alloc_sequence(functions);
        Ok(self.session.alloc(Node::program(first)))
    }

    fn parse_function(&mut self) -> Result<Node<'arena>, ParseError> {
        self.expect(TokenKind::Fn)?;
        let name = self.expect_ident("function name")?;

        let mut statements = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::End => break,
                TokenKind::Eof | TokenKind::Fn => {
                    let token = self.peek();
                    return Err(self.error_at(
                        token,
                        format!("expected `end` to close function `{}`, found {}", name, token.kind),
                    ));
                }
                _ => statements.push(self.parse_statement()?),
            }
        }
        self.bump();

        let ret = if self.peek().kind.starts_expression() {
            let expr = self.parse_expr()?;
            Some(&*self.session.alloc(expr))
        } else {
            None
        };

        let body = self.session.alloc_sequence(statements);
        Ok(Node::function(name, body, ret))
    }

    fn parse_statement(&mut self) -> Result<Node<'arena>, ParseError> {
        let name = self.expect_ident("statement")?;
        match self.peek().kind {
            TokenKind::LParen => self.parse_call(name),
            TokenKind::Assign => {
                self.bump();
                let value = self.parse_expr()?;
                Ok(Node::assign(name, self.session.alloc(value)))
            }
            ref other => {
                let token = self.peek();
                Err(self.error_at(
                    token,
                    format!("expected `(` or `=` after `{}`, found {}", name, other),
                ))
            }
        }
    }

    fn parse_call(&mut self, callee: &'arena str) -> Result<Node<'arena>, ParseError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(self.error_at(
                self.peek(),
                format!("calls nested deeper than {} levels", MAX_CALL_DEPTH),
            ));
        }

        self.depth += 1;
        let call = self.parse_call_args(callee);
        self.depth -= 1;
        call
    }

    fn parse_call_args(&mut self, callee: &'arena str) -> Result<Node<'arena>, ParseError> {
        self.expect(TokenKind::LParen)?;

        let mut args = Vec::new();
        if self.peek().kind == TokenKind::RParen {
            self.bump();
        } else {
            loop {
                args.push(self.parse_expr()?);
                match self.peek().kind {
                    TokenKind::Comma => {
                        self.bump();
                    }
                    TokenKind::RParen => {
                        self.bump();
                        break;
                    }
                    ref other => {
                        let token = self.peek();
                        return Err(self.error_at(
                            token,
                            format!("expected `,` or `)` in call to `{}`, found {}", callee, other),
                        ));
                    }
                }
            }
        }

        Ok(Node::call(callee, self.session.alloc_sequence(args)))
    }

    fn parse_expr(&mut self) -> Result<Node<'arena>, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Number(value) => {
                self.bump();
                Ok(Node::number(value))
            }
            TokenKind::Str(ref text) => {
                let text = self.session.intern_str(text);
                self.bump();
                Ok(Node::string(text))
            }
            TokenKind::Ident(_) if *self.peek_second() == TokenKind::LParen => {
                let callee = self.expect_ident("function name")?;
                self.parse_call(callee)
            }
            TokenKind::Ident(_) => {
                let name = self.expect_ident("identifier")?;
                Ok(Node::identifier(name))
            }
            ref other => Err(self.error_at(token, format!("expected expression, found {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use bumpalo::Bump;

    #[test]
    fn test_parse_functions_and_statements() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);
        let source = r#"
            fn main
              x = 1
              out("hi")
              helper()
            end 0

            fn helper
              outs(x)
            end
        "#;

        let root = parse(&session, source).unwrap();
        assert_eq!(root.kind, NodeKind::Program);

        let functions: Vec<_> = root.primary.unwrap().siblings().collect();
        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].name(), "main");
        assert_eq!(functions[0].secondary.unwrap().int_value, 0);
        assert_eq!(functions[1].name(), "helper");
        assert!(functions[1].secondary.is_none());

        let body: Vec<_> = functions[0].primary.unwrap().siblings().collect();
        let kinds: Vec<_> = body.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NodeKind::VarAssign, NodeKind::Call, NodeKind::Call]);
        assert_eq!(body[0].primary.unwrap().int_value, 1);
        assert_eq!(body[1].primary.unwrap().name(), "hi");
        assert!(body[2].primary.is_none());
    }

    #[test]
    fn test_call_arguments_are_chained_in_order() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);

        let root = parse(&session, r#"fn main f(1, "two", three, g(4)) end"#).unwrap();
        let call = root.primary.unwrap().primary.unwrap();
        let args: Vec<_> = call.primary.unwrap().siblings().collect();

        let kinds: Vec<_> = args.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::NumberLiteral,
                NodeKind::StringLiteral,
                NodeKind::Identifier,
                NodeKind::Call,
            ]
        );
        assert_eq!(args[3].primary.unwrap().int_value, 4);
    }

    #[test]
    fn test_return_expression_can_be_identifier() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);

        let root = parse(&session, "fn main x = 3 end x").unwrap();
        let ret = root.primary.unwrap().secondary.unwrap();
        assert_eq!(ret.kind, NodeKind::Identifier);
        assert_eq!(ret.name(), "x");
    }

    #[test]
    fn test_empty_program() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);

        let root = parse(&session, "  # nothing here\n").unwrap();
        assert_eq!(root.kind, NodeKind::Program);
        assert!(root.primary.is_none());
    }

    #[test]
    fn test_parse_errors_report_position() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);

        let err = parse(&session, "fn main\n  out(1\nend").unwrap_err();
        assert_eq!((err.line, err.column), (3, 1));
        assert!(err.message.contains("expected `,` or `)`"));

        let err = parse(&session, "fn main\n  x\nend").unwrap_err();
        assert_eq!((err.line, err.column), (3, 1));

        let err = parse(&session, "fn main out(1)").unwrap_err();
        assert!(err.message.contains("expected `end`"));

        let err = parse(&session, "out(1)").unwrap_err();
        assert_eq!(err.to_string(), "1:1: expected `fn`, found identifier `out`");

        let err = parse(&session, "fn end").unwrap_err();
        assert!(err.message.contains("function name"));
    }

    fn nested_calls(depth: usize) -> String {
        format!("fn main {}{} end", "f(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn test_call_nesting_limit() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);

        let root = parse(&session, &nested_calls(MAX_CALL_DEPTH)).unwrap();
        let mut call = root.primary.unwrap().primary;
        let mut depth = 0;
        while let Some(node) = call {
            depth += 1;
            call = node.primary;
        }
        assert_eq!(depth, MAX_CALL_DEPTH);

        let err = parse(&session, &nested_calls(MAX_CALL_DEPTH + 1)).unwrap_err();
        assert!(err.message.contains("nested deeper than 256"), "{err}");
        assert_eq!(err.column as usize, 10 + 2 * MAX_CALL_DEPTH);

        let err = parse(&session, &nested_calls(100_000)).unwrap_err();
        assert!(err.message.contains("nested deeper"));
    }
}
