//! Observability for the edge request pipeline.
//!
//! This crate provides:
//! - `init_logging` - Install a `tracing` subscriber (human or JSON output)
//! - `request_span` - Span correlating every event of one request
//! - `record_timing` - Attach commit and total latency to a request span

mod logging;
mod span;

pub use logging::*;
pub use span::*;

// Re-export TimingContext from edge-core for convenience
pub use edge_core::TimingContext;
