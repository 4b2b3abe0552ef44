//! Channel-backed streaming body.
//!
//! The writer half is handed to the pipeline; the [`ChannelBody`] half is
//! polled by the transport and yields chunks as soon as they are written.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::channel::mpsc;
use futures::{Stream, StreamExt};

use crate::sink::SinkWriter;

/// Writer half of a body channel.
pub type ChannelWriter = SinkWriter<mpsc::Sender<Bytes>>;

/// Create a body channel holding at most `buffer` unread chunks per sender.
pub fn body_channel(buffer: usize) -> (ChannelWriter, ChannelBody) {
    let (tx, rx) = mpsc::channel(buffer);
    (SinkWriter::new(tx), ChannelBody { rx })
}

/// Read half of a body channel; ends when the writer closes.
#[derive(Debug)]
pub struct ChannelBody {
    rx: mpsc::Receiver<Bytes>,
}

impl ChannelBody {
    /// Drain the stream into one buffer.
    pub async fn collect_bytes(mut self) -> Bytes {
        let mut body = BytesMut::new();
        while let Some(chunk) = self.rx.next().await {
            body.extend_from_slice(&chunk);
        }
        body.freeze()
    }
}

impl Stream for ChannelBody {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}
