use std::fmt;

/// A line:col position in source text, attached to reader errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn new(line: usize, col: usize) -> Self {
        Span { line, col }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Every recoverable failure in the runtime.
///
/// Reader failures keep their own variant so a caller can tell which
/// subsystem rejected the input. Internal invariant violations (stale heap
/// handles, corrupt free lists) are not represented here; those panic.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SprigError {
    #[error("Parse error at {span}: {message}")]
    Parse { message: String, span: Span },

    #[error("Unbound variable: {0}")]
    Unbound(String),

    #[error("Arity error: {name} expects {expected} args, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("Invalid operator: {0} is not callable")]
    InvalidOperator(String),

    #[error("Invalid {form} form: {message}")]
    InvalidForm { form: &'static str, message: String },

    #[error("Cannot use {0} as a condition")]
    InvalidCondition(String),

    #[error("Variable already defined in this scope: {0}")]
    Redefined(String),

    #[error("Type error: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    #[error("Heap exhausted: all {capacity} slots live after forced collection")]
    HeapExhausted { capacity: usize },
}

impl SprigError {
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        SprigError::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn arity(name: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        SprigError::Arity {
            name: name.into(),
            expected: expected.into(),
            got,
        }
    }

    pub fn invalid_form(form: &'static str, message: impl Into<String>) -> Self {
        SprigError::InvalidForm {
            form,
            message: message.into(),
        }
    }

    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        SprigError::Type {
            expected: expected.into(),
            got: got.into(),
        }
    }
}
