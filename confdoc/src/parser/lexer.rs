use std::iter::Peekable;
use std::ops::Range;
use std::str::CharIndices;

use crate::parser::error::ParseError;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    StringLit(String),
    Number(f64),
    Eq,
    LBrace,
    RBrace,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl TokenKind {
    /// Short description used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{}`", name),
            TokenKind::StringLit(_) => "string".to_string(),
            TokenKind::Number(_) => "number".to_string(),
            TokenKind::Eq => "`=`".to_string(),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Split `source` into tokens. The last token is always `Eof`.
///
/// Lexing keeps going after a bad character so that every problem in the
/// file is reported at once.
pub(crate) fn tokenize(source: &str, file_id: usize) -> (Vec<Token>, Vec<ParseError>) {
    let mut lexer = Lexer {
        chars: source.char_indices().peekable(),
        source,
        file_id,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    lexer.run();
    lexer.tokens.push(Token {
        kind: TokenKind::Eof,
        span: source.len()..source.len(),
    });
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    source: &'a str,
    file_id: usize,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) {
        while let Some(&(start, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '#' => self.skip_line(),
                '/' if self.source[start..].starts_with("//") => self.skip_line(),
                '=' => self.single(TokenKind::Eq, start),
                '{' => self.single(TokenKind::LBrace, start),
                '}' => self.single(TokenKind::RBrace, start),
                '"' => self.string(start),
                c if c.is_ascii_digit() || c == '-' => self.number(start),
                c if c.is_alphabetic() => self.ident(start),
                other => {
                    self.chars.next();
                    self.errors.push(ParseError::error(
                        format!("unexpected character `{}`", other),
                        start..start + other.len_utf8(),
                        self.file_id,
                    ));
                }
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize) {
        self.chars.next();
        self.tokens.push(Token {
            kind,
            span: start..start + 1,
        });
    }

    fn skip_line(&mut self) {
        for (_, ch) in self.chars.by_ref() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn end_of_current(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.source.len())
    }

    fn ident(&mut self, start: usize) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.chars.next();
            } else {
                break;
            }
        }
        let end = self.end_of_current();
        self.tokens.push(Token {
            kind: TokenKind::Ident(self.source[start..end].to_string()),
            span: start..end,
        });
    }

    fn number(&mut self, start: usize) {
        self.chars.next();
        let mut seen_dot = false;
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_ascii_digit() || (ch == '.' && !seen_dot) {
                seen_dot |= ch == '.';
                self.chars.next();
            } else {
                break;
            }
        }
        let end = self.end_of_current();
        let text = &self.source[start..end];
        match text.parse::<f64>() {
            Ok(n) => self.tokens.push(Token {
                kind: TokenKind::Number(n),
                span: start..end,
            }),
            Err(_) => self.errors.push(ParseError::error(
                format!("invalid number `{}`", text),
                start..end,
                self.file_id,
            )),
        }
    }

    fn string(&mut self, start: usize) {
        self.chars.next(); // opening quote
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((end, '"')) => {
                    self.tokens.push(Token {
                        kind: TokenKind::StringLit(value),
                        span: start..end + 1,
                    });
                    return;
                }
                Some((i, '\\')) => match self.chars.next() {
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((j, other)) => {
                        self.errors.push(ParseError::error(
                            format!("invalid escape sequence `\\{}`", other),
                            i..j + other.len_utf8(),
                            self.file_id,
                        ));
                    }
                    None => break,
                },
                Some((i, '\n')) => {
                    self.errors.push(
                        ParseError::error("unterminated string", start..i, self.file_id)
                            .with_note("strings cannot span multiple lines"),
                    );
                    return;
                }
                Some((_, ch)) => value.push(ch),
                None => break,
            }
        }
        self.errors.push(ParseError::error(
            "unterminated string",
            start..self.source.len(),
            self.file_id,
        ));
    }
}
