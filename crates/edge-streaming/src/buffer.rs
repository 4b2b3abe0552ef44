//! In-memory body buffer.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use edge_core::ResponseWriter;

#[derive(Debug, Default)]
struct Buffered {
    body: BytesMut,
    closed: bool,
}

/// Read side of a [`BufferSink`], shared with the writer.
#[derive(Debug, Clone, Default)]
pub struct BodyBuffer {
    inner: Arc<Mutex<Buffered>>,
}

impl BodyBuffer {
    fn lock(&self) -> MutexGuard<'_, Buffered> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Everything written so far.
    pub fn bytes(&self) -> Bytes {
        self.lock().body.clone().freeze()
    }

    /// Body as lossy UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.lock().body).into_owned()
    }

    /// Check if the writer closed the body.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// Collects the body in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    buffer: BodyBuffer,
}

impl BufferSink {
    /// Create a sink together with its read handle.
    pub fn new() -> (Self, BodyBuffer) {
        let buffer = BodyBuffer::default();
        (
            Self {
                buffer: buffer.clone(),
            },
            buffer,
        )
    }
}

#[async_trait]
impl ResponseWriter for BufferSink {
    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        let mut buffered = self.buffer.lock();
        if buffered.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Buffer already closed"));
        }
        buffered.body.extend_from_slice(&chunk);
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.buffer.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffer_collects_body() {
        let (mut sink, body) = BufferSink::new();
        sink.write(Bytes::from_static(b"pepperoni, ")).await.unwrap();
        sink.write(Bytes::from_static(b"bacon")).await.unwrap();

        assert!(!body.is_closed());
        sink.close().await.unwrap();

        assert_eq!(body.text(), "pepperoni, bacon");
        assert!(body.is_closed());
        assert!(sink.write(Bytes::from_static(b"x")).await.is_err());
    }
}
