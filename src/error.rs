//! Error types for the `html_policy` crate.

#[cfg(feature = "async")]
use std::time::Duration;

/// All errors that can occur while building a policy or sanitizing input.
#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    /// A value pattern handed to the policy builder does not compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The input was empty or whitespace-only and the policy rejects that.
    #[error("Input is empty")]
    EmptyInput,

    /// The token source reported a lexical error.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Reading the input or writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The token source produced a token kind the engine does not model.
    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),

    /// A deadline-bound sanitize call did not finish in time.
    #[cfg(feature = "async")]
    #[error("Sanitize timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking task running a sanitize call panicked or was cancelled.
    #[cfg(feature = "async")]
    #[error("Sanitize task failed: {0}")]
    TaskFailed(String),
}

/// A type alias for `Result<T, SanitizeError>`.
pub type Result<T> = std::result::Result<T, SanitizeError>;
