use std::fmt;

use crate::diagnostic::SourceRange;

/// A literal value as written in a document or supplied by an overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A static expression: a value plus the place it was written, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub value: Value,
    pub range: Option<SourceRange>,
}

impl Expression {
    pub fn new(value: Value, range: Option<SourceRange>) -> Self {
        Expression { value, range }
    }

    /// A string literal with no source position.
    pub fn literal_string(value: impl Into<String>) -> Self {
        Expression {
            value: Value::String(value.into()),
            range: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_display_without_fraction() {
        assert_eq!(Value::Number(8080.0).to_string(), "8080");
        assert_eq!(Value::Number(-2.5).to_string(), "-2.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::String("a.b=c".into()).to_string(), "a.b=c");
    }

    #[test]
    fn literal_string_has_no_range() {
        let expr = Expression::literal_string("x");
        assert_eq!(expr.value.as_str(), Some("x"));
        assert!(expr.range.is_none());
    }
}
