use thiserror::Error;

/// Caller-supplied data that cannot be accepted.
///
/// Always surfaced back to the caller (transaction or query rejected); never
/// a reason to crash the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("No {0} argument supplied")]
    MissingArgument(&'static str),

    #[error("Invalid {name} argument: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Malformed vector literal: {0}")]
    MalformedVector(String),

    #[error("Vector has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl InputError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument { name, reason: reason.into() }
    }
}

pub type InputResult<T> = Result<T, InputError>;
