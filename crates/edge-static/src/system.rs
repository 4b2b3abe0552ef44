//! Host services used by static generation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use edge_core::{Platform, ResponseWriter};
use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info_span, Instrument};

use crate::config::StaticGenerateOptions;
use crate::error::StaticError;
use crate::types::{WorkerMessage, WorkerResponse};

/// Messages a worker can queue before senders wait.
const WORKER_QUEUE: usize = 64;

/// Handles every message a worker receives.
///
/// Called synchronously in message order; the returned future may run
/// concurrently with later messages.
pub type WorkerHandler = Arc<dyn Fn(WorkerMessage) -> BoxFuture<'static, WorkerResponse> + Send + Sync>;

/// File layout, output streams and worker hosting.
#[async_trait]
pub trait System: Send + Sync {
    /// Options of the current run.
    fn options(&self) -> &StaticGenerateOptions;

    /// File a page's HTML is written to.
    fn page_file_path(&self, pathname: &str) -> PathBuf;

    /// File a page's data is written to, if data files are supported.
    fn data_file_path(&self, pathname: &str) -> Option<PathBuf>;

    /// Create the parent directory of `file_path`.
    async fn ensure_dir(&self, file_path: &Path) -> io::Result<()>;

    /// Writer streaming into the file at `path`.
    fn create_write_stream(&self, path: &Path) -> Box<dyn ResponseWriter>;

    /// Start a worker running `handler`.
    fn create_worker_process(&self, handler: WorkerHandler) -> WorkerHandle;

    /// Host context handed to handlers.
    fn platform(&self) -> Platform;
}

type Envelope = (WorkerMessage, oneshot::Sender<WorkerResponse>);

/// Sending side of a worker.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    id: usize,
    tx: mpsc::Sender<Envelope>,
}

impl WorkerHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Send a message and wait for its reply.
    pub async fn send(&self, msg: WorkerMessage) -> Result<WorkerResponse, StaticError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((msg, reply_tx))
            .await
            .map_err(|_| StaticError::WorkerGone(self.id))?;
        reply_rx.await.map_err(|_| StaticError::WorkerGone(self.id))
    }
}

/// Run a worker as a tokio task.
///
/// Render replies are produced concurrently. `Close` is answered once its
/// handler future completes, after which the worker stops.
pub fn spawn_worker(id: usize, handler: WorkerHandler) -> WorkerHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(WORKER_QUEUE);

    tokio::spawn(
        async move {
            while let Some((msg, reply)) = rx.recv().await {
                let closing = matches!(msg, WorkerMessage::Close);
                let response = handler(msg);
                if closing {
                    let _ = reply.send(response.await);
                    break;
                }
                tokio::spawn(async move {
                    let _ = reply.send(response.await);
                });
            }
            debug!("worker stopped");
        }
        .instrument(info_span!("worker", id)),
    );

    WorkerHandle { id, tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    use crate::types::{StaticRoute, StaticWorkerRenderResult};

    fn echo() -> WorkerHandler {
        Arc::new(|msg| {
            async move {
                match msg {
                    WorkerMessage::Render(route) => {
                        WorkerResponse::Render(StaticWorkerRenderResult::new(route.pathname, "http://localhost/"))
                    }
                    WorkerMessage::Close => WorkerResponse::Close,
                }
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_worker_replies_per_message() {
        let worker = spawn_worker(0, echo());

        let reply = worker.send(WorkerMessage::Render(StaticRoute::new("/a/"))).await.unwrap();

        match reply {
            WorkerResponse::Render(result) => assert_eq!(result.pathname, "/a/"),
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_worker_stops_after_close() {
        let worker = spawn_worker(3, echo());

        assert_eq!(worker.send(WorkerMessage::Close).await.unwrap(), WorkerResponse::Close);

        let err = worker.send(WorkerMessage::Close).await.unwrap_err();
        assert!(matches!(err, StaticError::WorkerGone(3)));
    }
}
