use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use crate::body::syntax::{SyntaxAttribute, SyntaxBlock, SyntaxBody};
use crate::diagnostic::SourceRange;
use crate::parser::error::ParseError;
use crate::parser::lexer::{Token, TokenKind, tokenize};
use crate::value::{Expression, Value};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a whole file into its root body.
pub fn parse_body(source: &str, file_id: usize) -> Result<SyntaxBody, Vec<ParseError>> {
    let (tokens, mut errors) = tokenize(source, file_id);

    let mut state = ParseState {
        tokens,
        pos: 0,
        file_id,
        errors: Vec::new(),
    };
    let body = state.parse_items(None);
    errors.append(&mut state.errors);

    if errors.is_empty() {
        Ok(body)
    } else {
        errors.sort_by_key(|e| e.span.start);
        Err(errors)
    }
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState {
    tokens: Vec<Token>,
    pos: usize,
    file_id: usize,
    errors: Vec<ParseError>,
}

impl ParseState {
    fn peek(&self) -> &Token {
        // tokenize always ends the stream with Eof, and we never advance past it
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn range(&self, span: Range<usize>) -> SourceRange {
        SourceRange::new(self.file_id, span)
    }

    fn unexpected(&mut self, token: &Token, expected: &str) {
        self.errors.push(ParseError::error(
            format!("expected {}, found {}", expected, token.kind.describe()),
            token.span.clone(),
            self.file_id,
        ));
    }

    /// Parse items until the closing brace (when `open` is the span of the
    /// opening brace) or until end of file (for the root body).
    fn parse_items(&mut self, open: Option<Range<usize>>) -> SyntaxBody {
        let mut attributes: Vec<SyntaxAttribute> = Vec::new();
        let mut blocks = Vec::new();
        let mut seen: HashMap<String, Range<usize>> = HashMap::new();

        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => {
                    if let Some(open) = open {
                        self.errors.push(
                            ParseError::error("unclosed block", open, self.file_id)
                                .with_note("add a closing `}`"),
                        );
                    }
                    return SyntaxBody::new(attributes, blocks, self.range(token.span));
                }
                TokenKind::RBrace => {
                    self.advance();
                    if open.is_some() {
                        return SyntaxBody::new(attributes, blocks, self.range(token.span));
                    }
                    self.errors.push(ParseError::error(
                        "unexpected `}`",
                        token.span,
                        self.file_id,
                    ));
                }
                TokenKind::Ident(name) => {
                    self.advance();
                    if self.peek().kind == TokenKind::Eq {
                        self.advance();
                        let Some(attr) = self.parse_attribute(name, token.span) else {
                            continue;
                        };
                        if let Some(first) = seen.get(&attr.name) {
                            self.errors.push(
                                ParseError::error(
                                    format!("duplicate argument \"{}\"", attr.name),
                                    attr.name_range.span.clone(),
                                    self.file_id,
                                )
                                .with_note(format!(
                                    "\"{}\" was already defined at byte {}",
                                    attr.name, first.start
                                )),
                            );
                            continue;
                        }
                        seen.insert(attr.name.clone(), attr.name_range.span.clone());
                        attributes.push(attr);
                    } else if let Some(block) = self.parse_block(name, token.span) {
                        blocks.push(block);
                    }
                }
                _ => {
                    self.advance();
                    self.unexpected(&token, "an argument or block");
                }
            }
        }
    }

    /// `name =` has been consumed.
    fn parse_attribute(&mut self, name: String, name_span: Range<usize>) -> Option<SyntaxAttribute> {
        let token = self.peek().clone();
        let value = match &token.kind {
            TokenKind::StringLit(s) => Value::String(s.clone()),
            TokenKind::Number(n) => Value::Number(*n),
            TokenKind::Ident(word) if word == "true" => Value::Bool(true),
            TokenKind::Ident(word) if word == "false" => Value::Bool(false),
            _ => {
                self.unexpected(&token, "a value after `=`");
                return None;
            }
        };
        self.advance();

        Some(SyntaxAttribute {
            name,
            name_range: self.range(name_span.clone()),
            expr: Expression::new(value, Some(self.range(token.span.clone()))),
            range: self.range(name_span.start..token.span.end),
        })
    }

    /// The block type has been consumed; labels and the body follow.
    fn parse_block(&mut self, block_type: String, type_span: Range<usize>) -> Option<SyntaxBlock> {
        let mut labels = Vec::new();
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::StringLit(label) | TokenKind::Ident(label) => {
                    labels.push((label, self.range(token.span)));
                }
                TokenKind::LBrace => {
                    let body = self.parse_items(Some(token.span.clone()));
                    let end = body.end_range.span.end;
                    return Some(SyntaxBlock {
                        block_type,
                        type_range: self.range(type_span.clone()),
                        labels,
                        open_brace_range: self.range(token.span),
                        body: Rc::new(body),
                        range: self.range(type_span.start..end),
                    });
                }
                _ => {
                    self.unexpected(&token, "a block label or `{`");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks() {
        let body = parse_body(
            r#"
            outer "x" {
              inner {
                deep = 1
              }
              name = "n"
            }
            "#,
            0,
        )
        .expect("parse failed");

        assert_eq!(body.blocks.len(), 1);
        let outer = &body.blocks[0];
        assert_eq!(outer.block_type, "outer");
        assert_eq!(outer.labels.len(), 1);
        assert_eq!(outer.body.attributes[0].name, "name");
        assert_eq!(outer.body.blocks[0].body.attributes[0].name, "deep");
    }

    #[test]
    fn one_line_block() {
        let source = r#"block "a" { foo = "a" }"#;
        let body = parse_body(source, 7).expect("parse failed");
        let block = &body.blocks[0];
        assert_eq!(block.labels[0].0, "a");
        assert_eq!(block.labels[0].1, SourceRange::new(7, 6..9));
        assert_eq!(block.range.span, 0..source.len());
        assert_eq!(block.body.attributes[0].range.span, 12..21);
    }

    #[test]
    fn bare_identifier_labels() {
        let body = parse_body("service http web { }", 0).expect("parse failed");
        let labels: Vec<&str> = body.blocks[0]
            .labels
            .iter()
            .map(|(l, _)| l.as_str())
            .collect();
        assert_eq!(labels, vec!["http", "web"]);
    }

    #[test]
    fn unclosed_block() {
        let errors = parse_body("a {\n b = 1\n", 0).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unclosed block");
        assert_eq!(errors[0].span, 2..3);
    }

    #[test]
    fn duplicate_argument() {
        let errors = parse_body("a = 1\na = 2\n", 0).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "duplicate argument \"a\"");
        assert_eq!(errors[0].span, 6..7);
    }

    #[test]
    fn collects_several_errors() {
        let errors = parse_body("a = \n}\nb = {\n", 0).unwrap_err();
        assert!(errors.len() >= 2, "{:?}", errors);
        assert!(errors[0].message.starts_with("expected a value after `=`"));
    }
}
