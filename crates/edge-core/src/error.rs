//! Contract errors raised by the request pipeline.

use thiserror::Error;

/// Errors signalling a broken pipeline contract.
///
/// These are programming errors (mutating a committed response, reading a
/// loader that never ran), not recoverable runtime conditions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Status, headers or cookies touched after the response was committed,
    /// or a second body send.
    #[error("Response already sent")]
    ResponseAlreadySent,

    /// The response stream was already closed.
    #[error("Response stream already closed")]
    StreamClosed,

    /// `get_data` called for a loader whose result is not cached.
    #[error("Loader data does not exist: {0}")]
    LoaderDataMissing(String),

    /// Status code outside 100..=599.
    #[error("Invalid status code: {0}")]
    InvalidStatus(u16),

    /// Header name or value rejected by the HTTP codec.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Inbound body could not be decoded.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Inbound URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<url::ParseError> for CoreError {
    fn from(err: url::ParseError) -> Self {
        CoreError::InvalidUrl(err.to_string())
    }
}
