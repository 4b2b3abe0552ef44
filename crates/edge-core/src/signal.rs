//! Response-control primitives returned by handlers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Redirect requested; status and `Location` are already on the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RedirectMessage;

/// Abort requested; no further handler should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbortMessage;

/// Application-level error with a status and message, rendered upstream by
/// an error boundary rather than treated as a crash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for ErrorResponse {}

/// What a handler asks the pipeline to do next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Flow {
    /// Keep running the chain.
    #[default]
    Continue,
    /// Stop the chain; the response is a redirect.
    Redirect(RedirectMessage),
    /// Stop the chain; whatever was written stands.
    Abort(AbortMessage),
    /// Stop the chain; render an error page.
    Error(ErrorResponse),
}

impl Flow {
    /// Check if this flow lets the chain continue.
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Check if this flow short-circuits the chain.
    pub fn is_short_circuit(&self) -> bool {
        !self.is_continue()
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Redirect(_) => "redirect",
            Self::Abort(_) => "abort",
            Self::Error(_) => "error",
        }
    }
}

impl From<ErrorResponse> for Flow {
    fn from(err: ErrorResponse) -> Self {
        Self::Error(err)
    }
}
