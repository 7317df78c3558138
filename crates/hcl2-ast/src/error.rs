use std::fmt;

use thiserror::Error as ThisError;

use crate::syntax::cst::Rule;

/// Error codes prefixed by phase: L = lexer, P = grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal
    L003, // invalid escape sequence
    L004, // integer literal out of range
    L005, // template sequence in string literal
    L006, // unterminated block comment

    // Grammar
    P001, // unexpected token
    P002, // missing expected token
    P003, // nesting too deep
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::L004 => "L004",
            Self::L005 => "L005",
            Self::L006 => "L006",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
        }
    }
}

/// A syntax error in the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}:{} — {}", self.code.as_str(), self.line, self.column, self.message)
    }
}

// ─── Lowering ─────────────────────────────────────────────────────────────────

/// The CST handed to the lowering broke the grammar's contract.
///
/// This is a defect in the lowering or an incompatible grammar, never a
/// problem with the user's document.
#[derive(Debug, Clone, PartialEq, ThisError)]
#[error("malformed `{rule}` node (line {line}): {message}")]
pub struct LowerError {
    pub rule: Rule,
    pub line: usize,
    pub message: String,
}

impl LowerError {
    pub fn new(rule: Rule, line: usize, message: impl Into<String>) -> Self {
        Self { rule, line, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum ParseError {
    #[error("{}", render_all(.0))]
    Syntax(Vec<Error>),
    #[error("internal lowering failure: {0}")]
    Lower(#[from] LowerError),
}

impl From<Vec<Error>> for ParseError {
    fn from(errors: Vec<Error>) -> Self {
        Self::Syntax(errors)
    }
}

fn render_all(errors: &[Error]) -> String {
    errors.iter().map(Error::to_string).collect::<Vec<_>>().join("\n")
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// The single user-facing error kind raised by configurable objects.
#[derive(Debug, Clone, PartialEq, ThisError)]
#[error("in context of object {context}: {message}")]
pub struct ConfigurationError {
    /// `Debug` rendering of the offending context, captured when the error was raised.
    pub context: String,
    pub message: String,
}

impl ConfigurationError {
    pub fn new(context: &dyn fmt::Debug, message: impl Into<String>) -> Self {
        Self { context: format!("{context:?}"), message: message.into() }
    }
}

// ─── Runtime ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum RuntimeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("unsupported expression kind `{kind}`")]
    UnsupportedExpression { kind: &'static str },

    #[error("nested {kind} values cannot be evaluated")]
    NestedCollection { kind: &'static str },

    #[error("operator `{op}` is not defined for {left} and {right}")]
    TypeMismatch { op: &'static str, left: &'static str, right: &'static str },

    #[error("operator `{op}` is not defined for {kind}")]
    InvalidOperand { op: &'static str, kind: &'static str },

    #[error("operator `{op}`: {message}")]
    Arithmetic { op: &'static str, message: String },
}

impl RuntimeError {
    /// The configuration error behind this failure, if it came from a context.
    pub fn as_configuration(&self) -> Option<&ConfigurationError> {
        match self {
            Self::Configuration(e) => Some(e),
            _ => None,
        }
    }
}
