use std::fmt;

use confdoc::{Diagnostic, Diagnostics};

/// Everything that can be wrong with an overlay argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// The raw token has no `=`, or nothing before it.
    InvalidArgumentSyntax { raw: String },
    /// One dot-separated step of the path is not an identifier.
    InvalidIdentifierComponent { step: String, path: String },
    /// The schema has no place for the path.
    UnexpectedArgument { path: String },
    /// The path continues past a step that names an attribute.
    AttributeUsedAsPrefix { path: String, attribute: String },
}

impl OverlayError {
    pub fn summary(&self) -> &'static str {
        "Invalid argument"
    }

    pub(crate) fn into_diagnostics(self) -> Diagnostics {
        Diagnostics::from(Diagnostic::from(self))
    }
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::InvalidArgumentSyntax { raw } => write!(
                f,
                "Invalid argument {:?}: must be a configuration setting, followed by an equals sign, and then a value for that setting.",
                raw
            ),
            OverlayError::InvalidIdentifierComponent { step, path } => write!(
                f,
                "Invalid component {:?} in argument {:?}: dot-separated parts must be a letter followed by zero or more letters, digits, or underscores.",
                step, path
            ),
            OverlayError::UnexpectedArgument { path } => {
                write!(f, "Unexpected argument {:?}.", path)
            }
            OverlayError::AttributeUsedAsPrefix { path, attribute } => write!(
                f,
                "Unexpected argument {:?}: {:?} is a single setting, so it cannot contain nested settings.",
                path, attribute
            ),
        }
    }
}

impl std::error::Error for OverlayError {}

impl From<OverlayError> for Diagnostic {
    fn from(error: OverlayError) -> Self {
        Diagnostic::error(error.summary(), error.to_string())
    }
}
