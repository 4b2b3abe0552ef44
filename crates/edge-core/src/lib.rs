//! Core abstractions for the edge request pipeline.
//!
//! This crate provides the fundamental types and traits:
//! - `RequestEvent` - Per-request state machine driving a handler chain
//! - `RequestHandler` - Handler interface
//! - `ServerLoader` / `ServerAction` - Memoized data fetches and mutations
//! - `ServerRequestEvent` / `ResponseWriter` - Transport seam
//! - `Headers` / `Cookie` - Outbound response metadata

mod context;
mod cookie;
mod error;
mod handler;
mod headers;
mod lifecycle;
mod request_event;
mod server_fn;
mod signal;
mod transport;

pub use context::*;
pub use cookie::*;
pub use error::*;
pub use handler::*;
pub use headers::*;
pub use lifecycle::*;
pub use request_event::*;
pub use server_fn::*;
pub use signal::*;
pub use transport::*;

pub use edge_cache::{CacheControl, CacheScope};
