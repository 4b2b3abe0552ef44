//! Error types for route resolution.

use thiserror::Error;

/// Errors that can occur while resolving a route.
#[derive(Error, Debug)]
pub enum RouterError {
    /// Route pattern failed to compile.
    #[error("Invalid route pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A route or menu module failed to load.
    #[error("Failed to load module {id}: {reason}")]
    ModuleLoad { id: String, reason: String },

    /// Two loaders, or two actions, of one route share an id.
    #[error("Route {route} defines {kind} id {id} more than once")]
    DuplicateServerFn {
        route: String,
        kind: &'static str,
        id: String,
    },
}
