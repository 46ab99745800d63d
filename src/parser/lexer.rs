//! Tokenizer for Chara source text.
//!
//! Tokens are recognized by a `logos` lexer. Byte spans are turned into
//! 1-based line and column positions for the parser and its errors.

use super::ParseError;
use logos::Logos;
use std::fmt;

/// Lexer failure, positioned by the byte offset of its cause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LexError {
    #[default]
    UnexpectedCharacter,
    IntegerOverflow,
    UnterminatedString,
    UnknownEscape { offset: usize, escape: char },
}

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n\f]+")] // Whitespace
#[logos(skip r"#[^\n]*")] // Comments run to the end of the line
pub enum TokenKind<'s> {
    #[token("fn")]
    Fn,
    #[token("end")]
    End,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'s str),

    /// The sign is part of the literal so `-2147483648` fits.
    #[regex(r"-?[0-9]+", lex_number)]
    Number(i32),

    /// String literal with escapes already resolved.
    #[token("\"", lex_string)]
    Str(String),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("=")]
    Assign,

    /// Produced by [`Lexer`] once the input is exhausted.
    Eof,
}

fn lex_number<'s>(lex: &mut logos::Lexer<'s, TokenKind<'s>>) -> Result<i32, LexError> {
    lex.slice()
        .parse()
        .map_err(|_| LexError::IntegerOverflow)
}

/// Consume a string body after its opening quote, resolving escapes.
fn lex_string<'s>(lex: &mut logos::Lexer<'s, TokenKind<'s>>) -> Result<String, LexError> {
    let body_start = lex.span().end;
    let rest = lex.remainder();
    let mut chars = rest.char_indices();
    let mut text = String::new();

    while let Some((index, ch)) = chars.next() {
        match ch {
            '"' => {
                lex.bump(index + 1);
                return Ok(text);
            }
            '\\' => {
                let escaped = match chars.next() {
                    Some((_, 'n')) => '\n',
                    Some((_, 't')) => '\t',
                    Some((_, '0')) => '\0',
                    Some((_, '"')) => '"',
                    Some((_, '\\')) => '\\',
                    Some((_, escape)) => {
                        lex.bump(index);
                        return Err(LexError::UnknownEscape {
                            offset: body_start + index,
                            escape,
                        });
                    }
                    None => break,
                };
                text.push(escaped);
            }
            ch => text.push(ch),
        }
    }

    lex.bump(rest.len());
    Err(LexError::UnterminatedString)
}

impl TokenKind<'_> {
    /// True for tokens that can begin an expression.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident(_) | TokenKind::Number(_) | TokenKind::Str(_)
        )
    }
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Fn => write!(f, "`fn`"),
            TokenKind::End => write!(f, "`end`"),
            TokenKind::Ident(name) => write!(f, "identifier `{}`", name),
            TokenKind::Number(value) => write!(f, "number {}", value),
            TokenKind::Str(_) => write!(f, "string literal"),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Assign => write!(f, "`=`"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'s> {
    pub kind: TokenKind<'s>,
    /// 1-based line of the first character.
    pub line: u32,
    /// 1-based column of the first character.
    pub column: u32,
}

/// Byte offsets of line starts, for offset to line/column conversion.
struct LineIndex<'s> {
    source: &'s str,
    starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    fn new(source: &'s str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, starts }
    }

    fn locate(&self, offset: usize) -> (u32, u32) {
        // starts[0] is 0, so at least one start precedes any offset.
        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        let column = self.source[self.starts[line]..offset].chars().count() + 1;
        (line as u32 + 1, column as u32)
    }
}

/// Token stream over one source text. The last token is always `Eof`.
pub struct Lexer<'s> {
    inner: logos::Lexer<'s, TokenKind<'s>>,
    lines: LineIndex<'s>,
    done: bool,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            lines: LineIndex::new(source),
            done: false,
        }
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> Result<Vec<Token<'s>>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token<'s>, ParseError> {
        let next = if self.done { None } else { self.inner.next() };

        let Some(result) = next else {
            self.done = true;
            let (line, column) = self.lines.locate(self.lines.source.len());
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
                column,
            });
        };

        let span = self.inner.span();
        match result {
            Ok(kind) => {
                let (line, column) = self.lines.locate(span.start);
                Ok(Token { kind, line, column })
            }
            Err(err) => Err(self.error(span.start, err)),
        }
    }

    fn error(&self, start: usize, err: LexError) -> ParseError {
        let (offset, message) = match err {
            LexError::UnexpectedCharacter => {
                let ch = self.lines.source[start..].chars().next().unwrap_or('\0');
                (start, format!("unexpected character {:?}", ch))
            }
            LexError::IntegerOverflow => (
                start,
                format!(
                    "integer literal {} does not fit in 32 bits",
                    self.inner.slice()
                ),
            ),
            LexError::UnterminatedString => (start, "unterminated string literal".to_string()),
            LexError::UnknownEscape { offset, escape } => {
                (offset, format!("unknown escape sequence \\{}", escape))
            }
        };

        let (line, column) = self.lines.locate(offset);
        ParseError::new(line, column, message)
    }
}
