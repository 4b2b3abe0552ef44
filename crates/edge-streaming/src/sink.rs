//! Response writer over a generic `futures::Sink`.

use std::fmt::Display;
use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use edge_core::{ResponseWriter, TimingContext};
use futures::{Sink, SinkExt};

/// State of the sink writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    /// Nothing written yet.
    Initial,
    /// At least one chunk was forwarded.
    Streaming,
    /// The body was closed.
    Completed,
}

/// Forwards body chunks into any `Sink<Bytes>`.
///
/// This is generic over the underlying sink type so transports only need a
/// `Sink` implementation, including a channel sender.
pub struct SinkWriter<S>
where
    S: Sink<Bytes> + Unpin + Send,
    S::Error: Display,
{
    inner: S,
    state: SinkState,
    timing: TimingContext,
    bytes_written: usize,
}

impl<S> SinkWriter<S>
where
    S: Sink<Bytes> + Unpin + Send,
    S::Error: Display,
{
    /// Create a new sink writer.
    pub fn new(sink: S) -> Self {
        Self {
            inner: sink,
            state: SinkState::Initial,
            timing: TimingContext::new(),
            bytes_written: 0,
        }
    }

    /// Total bytes forwarded.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Check if the body was closed.
    pub fn is_complete(&self) -> bool {
        self.state == SinkState::Completed
    }

    /// Get timing context reference.
    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S> ResponseWriter for SinkWriter<S>
where
    S: Sink<Bytes> + Unpin + Send,
    S::Error: Display,
{
    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        if self.state == SinkState::Completed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Sink already completed"));
        }

        if self.state == SinkState::Initial {
            self.timing.mark("first_byte");
            self.state = SinkState::Streaming;
        }
        let len = chunk.len();
        self.inner.send(chunk).await.map_err(|e| io::Error::other(e.to_string()))?;
        self.bytes_written += len;

        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        if self.state == SinkState::Completed {
            return Ok(());
        }
        self.state = SinkState::Completed;
        self.timing.mark("complete");
        self.inner.close().await.map_err(|e| io::Error::other(e.to_string()))
    }
}
