//! Response body sinks for the edge request pipeline.
//!
//! Every sink implements `edge_core::ResponseWriter`:
//! - `SinkWriter` - Adapter over any `futures::Sink<Bytes>`
//! - `BufferSink` - Collects the whole body in memory
//! - `NoopSink` - Discards the body
//! - `body_channel` - Streams chunks to a `ChannelBody` consumer

mod buffer;
mod channel;
mod noop;
mod sink;

pub use buffer::*;
pub use channel::*;
pub use noop::*;
pub use sink::*;
