//! Static generation errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the static generator itself.
///
/// Failures of a single page never surface here; they are attached to that
/// page's `StaticWorkerRenderResult`.
#[derive(Error, Debug)]
pub enum StaticError {
    /// Origin is not an absolute URL.
    #[error("Invalid origin {origin}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    /// Options disagree with the plan on trailing slashes.
    #[error("trailing_slash = {options} does not match the app's trailing_slash = {plan}")]
    TrailingSlashMismatch { options: bool, plan: bool },

    /// File system operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker stopped before answering.
    #[error("Worker {0} is gone")]
    WorkerGone(usize),

    /// A worker answered with the wrong message type.
    #[error("Worker {worker} sent an unexpected response to {request}")]
    UnexpectedResponse { worker: usize, request: &'static str },
}
