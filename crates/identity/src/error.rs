//! Identity store error types

use thiserror::Error;

/// Result type for identity store operations
pub type Result<T> = std::result::Result<T, IdentityError>;

/// Errors raised while persisting identity cookies
///
/// These never reach SDK callers: the store logs them and degrades to a
/// no-op so the host response is never affected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The response has already started, cookies can no longer be set
    #[error("cannot write cookie '{name}': response already started")]
    ResponseStarted {
        /// Cookie that could not be written
        name: String,
    },
}

impl IdentityError {
    /// Create a ResponseStarted error
    pub fn response_started(name: impl Into<String>) -> Self {
        Self::ResponseStarted { name: name.into() }
    }
}
