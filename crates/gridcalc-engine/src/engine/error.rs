//! Formula error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The closed set of errors a formula can produce.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Wrong number of arguments, or a lookup found nothing.
    NotAvailable,
    /// An argument could not be coerced to the required type.
    Value,
    /// Division or modulo by zero.
    DivZero,
    /// Numeric domain violation.
    Num,
    /// Unknown function or unparseable reference.
    Name,
    /// Dangling reference.
    Ref,
    /// A cell depends on itself.
    Circular,
    /// Structural problem found while parsing.
    Syntax,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotAvailable => "#N/A",
            ErrorKind::Value => "#VALUE!",
            ErrorKind::DivZero => "#DIV/0!",
            ErrorKind::Num => "#NUM!",
            ErrorKind::Name => "#NAME?",
            ErrorKind::Ref => "#REF!",
            ErrorKind::Circular => "#CIRC!",
            ErrorKind::Syntax => "#ERROR!",
        }
    }

    pub fn from_code(code: &str) -> Option<ErrorKind> {
        let kind = match code.trim().to_ascii_uppercase().as_str() {
            "#N/A" => ErrorKind::NotAvailable,
            "#VALUE!" => ErrorKind::Value,
            "#DIV/0!" => ErrorKind::DivZero,
            "#NUM!" => ErrorKind::Num,
            "#NAME?" => ErrorKind::Name,
            "#REF!" => ErrorKind::Ref,
            "#CIRC!" => ErrorKind::Circular,
            "#ERROR!" => ErrorKind::Syntax,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An error raised while parsing or evaluating a formula.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{kind} {message}")]
pub struct FormulaError {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    pub cause: Option<Box<FormulaError>>,
}

impl FormulaError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> FormulaError {
        FormulaError {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: FormulaError) -> FormulaError {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn not_available(message: impl Into<String>) -> FormulaError {
        FormulaError::new(ErrorKind::NotAvailable, message)
    }

    pub fn value(message: impl Into<String>) -> FormulaError {
        FormulaError::new(ErrorKind::Value, message)
    }

    pub fn div_zero(message: impl Into<String>) -> FormulaError {
        FormulaError::new(ErrorKind::DivZero, message)
    }

    pub fn num(message: impl Into<String>) -> FormulaError {
        FormulaError::new(ErrorKind::Num, message)
    }

    pub fn name(message: impl Into<String>) -> FormulaError {
        FormulaError::new(ErrorKind::Name, message)
    }

    pub fn reference(message: impl Into<String>) -> FormulaError {
        FormulaError::new(ErrorKind::Ref, message)
    }

    pub fn circular(message: impl Into<String>) -> FormulaError {
        FormulaError::new(ErrorKind::Circular, message)
    }

    pub fn syntax(message: impl Into<String>) -> FormulaError {
        FormulaError::new(ErrorKind::Syntax, message)
    }
}

pub type Result<T> = std::result::Result<T, FormulaError>;
