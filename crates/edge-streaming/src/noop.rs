//! Writer that discards the body.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use edge_core::ResponseWriter;
use tracing::trace;

/// Accepts and drops every chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl ResponseWriter for NoopSink {
    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        trace!(len = chunk.len(), "discarding body chunk");
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
