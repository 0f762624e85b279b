pub mod error;
mod lexer;
mod structural;

pub use error::ParseError;

use crate::body::SyntaxBody;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source text into the root body of the document.
    pub fn parse(&self) -> Result<SyntaxBody, Vec<ParseError>> {
        structural::parse_body(&self.source, self.file_id)
    }
}

/// A letter followed by zero or more letters, digits, or underscores.
pub fn valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
