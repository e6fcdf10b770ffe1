//! The closed error taxonomy and its exact user-visible wording.
//!
//! `ErrorKind` plays the role a `va_list`-driven `report(fmt, ...)` call
//! would in a C front-end: a typed enum, one variant per diagnosable
//! condition, with a single `Display` impl rendering `(kind, args...)`.
//! The test suite matches on these strings verbatim, so wording changes
//! here are breaking changes.

use std::fmt;

use crate::position::Position;

/// One fatal diagnostic: where it happened, and what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub position: Position,
    pub kind: ErrorKind,
}

impl Diagnostic {
    #[must_use]
    pub fn new(position: Position, kind: ErrorKind) -> Self {
        Self { position, kind }
    }

    /// Renders the full `<source-file>:<line>:<column>: <message>` form.
    #[must_use]
    pub fn render(&self, source_file: &str) -> String {
        format!("{source_file}:{}: {}", self.position, self.kind)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Expect { expected: String, found: String },
    ExpectedTypeSpecifier { found: String },
    ExpectedStatement { found: String },
    ExpectedFactor { found: String },
    ExpectedExpressionOrArrayAllocation { found: String },
    ExpectedExpressionOrString { found: String },
    Unreachable(String),
    MultipleDefinition(String),
    UnknownIdentifier(String),
    NotAVariable(String),
    NotAnArray(String),
    NotAFunction(String),
    NotAProcedure(String),
    IllegalArrayOperation(String),
    ExpectedScalar(String),
    TooFewArguments(String),
    TooManyArguments(String),
    MissingReturnExpression,
    ReturnExpressionNotAllowed,
    TypeMismatch { expected: String, found: String, context: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expect { expected, found } => write!(f, "expected {expected}, but found {found}"),
            Self::ExpectedTypeSpecifier { found } => write!(f, "expected type specifier, but found {found}"),
            Self::ExpectedStatement { found } => write!(f, "expected statement, but found {found}"),
            Self::ExpectedFactor { found } => write!(f, "expected factor, but found {found}"),
            Self::ExpectedExpressionOrArrayAllocation { found } => {
                write!(f, "expected expression or array allocation, but found {found}")
            }
            Self::ExpectedExpressionOrString { found } => {
                write!(f, "expected expression or string, but found {found}")
            }
            Self::Unreachable(text) => write!(f, "unreachable: {text}"),
            Self::MultipleDefinition(id) => write!(f, "multiple definition of '{id}'"),
            Self::UnknownIdentifier(id) => write!(f, "unknown identifier '{id}'"),
            Self::NotAVariable(id) => write!(f, "'{id}' is not a variable"),
            Self::NotAnArray(id) => write!(f, "'{id}' is not an array"),
            Self::NotAFunction(id) => write!(f, "'{id}' is not a function"),
            Self::NotAProcedure(id) => write!(f, "'{id}' is not a procedure"),
            Self::IllegalArrayOperation(op) => write!(f, "{op} is an illegal array operation"),
            Self::ExpectedScalar(id) => write!(f, "expected scalar variable instead of '{id}'"),
            Self::TooFewArguments(id) => write!(f, "too few arguments for call to '{id}'"),
            Self::TooManyArguments(id) => write!(f, "too many arguments for call to '{id}'"),
            Self::MissingReturnExpression => write!(f, "missing return expression for a function"),
            Self::ReturnExpressionNotAllowed => write!(f, "a return expression is not allowed for a procedure"),
            Self::TypeMismatch { expected, found, context } => {
                write!(f, "incompatible types (expected {expected}, found {found}) {context}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_wordings_match_the_spec_table() {
        assert_eq!(
            ErrorKind::Expect { expected: "':'".into(), found: "'main'".into() }.to_string(),
            "expected ':', but found 'main'"
        );
        assert_eq!(ErrorKind::MultipleDefinition("f".into()).to_string(), "multiple definition of 'f'");
        assert_eq!(ErrorKind::UnknownIdentifier("x".into()).to_string(), "unknown identifier 'x'");
        assert_eq!(ErrorKind::NotAVariable("f".into()).to_string(), "'f' is not a variable");
        assert_eq!(ErrorKind::NotAnArray("x".into()).to_string(), "'x' is not an array");
        assert_eq!(ErrorKind::NotAFunction("p".into()).to_string(), "'p' is not a function");
        assert_eq!(ErrorKind::NotAProcedure("f".into()).to_string(), "'f' is not a procedure");
        assert_eq!(
            ErrorKind::IllegalArrayOperation("+".into()).to_string(),
            "+ is an illegal array operation"
        );
        assert_eq!(
            ErrorKind::ExpectedScalar("a".into()).to_string(),
            "expected scalar variable instead of 'a'"
        );
        assert_eq!(ErrorKind::TooFewArguments("g".into()).to_string(), "too few arguments for call to 'g'");
        assert_eq!(ErrorKind::TooManyArguments("g".into()).to_string(), "too many arguments for call to 'g'");
        assert_eq!(ErrorKind::MissingReturnExpression.to_string(), "missing return expression for a function");
        assert_eq!(
            ErrorKind::ReturnExpressionNotAllowed.to_string(),
            "a return expression is not allowed for a procedure"
        );
        assert_eq!(
            ErrorKind::TypeMismatch { expected: "int".into(), found: "bool".into(), context: "for operator +".into() }
                .to_string(),
            "incompatible types (expected int, found bool) for operator +"
        );
    }

    #[test]
    fn render_prefixes_source_file_and_position() {
        let d = Diagnostic::new(Position::new(3, 7), ErrorKind::UnknownIdentifier("x".into()));
        assert_eq!(d.render("prog.ampl"), "prog.ampl:3:7: unknown identifier 'x'");
    }
}
