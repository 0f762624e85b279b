use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic as Report, Severity};

use crate::diagnostic::{Diagnostic, SourceRange};

/// Syntax errors with source location information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn error(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Error,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn to_diagnostic(&self) -> Report<usize> {
        Diagnostic::from(self.clone()).to_diagnostic()
    }
}

impl From<ParseError> for Diagnostic {
    fn from(error: ParseError) -> Self {
        Diagnostic {
            severity: error.severity,
            summary: error.message,
            detail: error.notes.join("\n"),
            subject: Some(SourceRange::new(error.file_id, error.span)),
        }
    }
}
