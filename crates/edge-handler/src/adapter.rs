//! Live-serving adapters.
//!
//! Hosts hand a [`RequestContext`] to one of these and get back an HTTP
//! response they can translate to their own types:
//! - [`serve`] buffers the whole body
//! - [`serve_streaming`] returns as soon as the response is committed and
//!   streams the body through a [`ChannelBody`]
//!
//! No matching route yields a plain 404. An unexpected failure before
//! commit, including a route module that fails to load, yields a plain 500;
//! after commit it is logged and the partial response stands.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use edge_core::{content_types, header_names, Cookie, Headers, RequestContext, ResponseWriter, ServerRequestEvent};
use edge_streaming::{body_channel, BufferSink, ChannelBody};
use futures::channel::oneshot;
use http::Method;
use tracing::{debug, error, warn};

use crate::plan::CityPlan;
use crate::request_handler::{request_handler, HandledResponse};

/// Unread chunks a streaming body may hold before the pipeline waits.
const STREAM_BUFFER: usize = 16;

const INTERNAL_ERROR: &str = "Internal Server Error";

/// Status line and headers of a committed response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Headers,
    /// `Set-Cookie` values, one per cookie.
    pub set_cookies: Vec<String>,
}

impl ResponseHead {
    fn capture(status: u16, headers: &Headers, cookie: &Cookie) -> Self {
        Self {
            status,
            headers: headers.clone(),
            set_cookies: cookie.headers(),
        }
    }

    fn plain(status: u16) -> Self {
        let mut headers = Headers::new();
        // Static header values always parse.
        let _ = headers.set(header_names::CONTENT_TYPE, content_types::TEXT);
        Self {
            status,
            headers,
            set_cookies: Vec::new(),
        }
    }

    /// Content type, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header_names::CONTENT_TYPE)
    }
}

/// Fully buffered response.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    pub head: ResponseHead,
    pub body: Bytes,
}

impl BufferedResponse {
    /// Body as lossy UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Response whose body is still being produced.
#[derive(Debug)]
pub struct StreamingResponse {
    pub head: ResponseHead,
    pub body: ChannelBody,
}

fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Serve one request and buffer the whole response.
pub async fn serve(plan: &CityPlan, request: RequestContext) -> anyhow::Result<BufferedResponse> {
    let is_head = request.method == Method::HEAD;
    let (sink, buffer) = BufferSink::new();
    let slot: Arc<Mutex<Option<ResponseHead>>> = Arc::default();

    let head_slot = slot.clone();
    let writable = move |status: u16, headers: &Headers, cookie: &Cookie| {
        *lock(&head_slot) = Some(ResponseHead::capture(status, headers, cookie));
        Box::new(sink) as Box<dyn ResponseWriter>
    };
    let server_ev = ServerRequestEvent::new(request, writable)?;

    let handled = match request_handler(server_ev, plan).await {
        Ok(Some(handled)) => handled,
        Ok(None) => {
            debug!("no route matched, responding 404");
            return Ok(BufferedResponse {
                head: ResponseHead::plain(404),
                body: Bytes::from_static(b"Not Found"),
            });
        }
        Err(err) => {
            log_uncommitted(&err);
            return Ok(BufferedResponse {
                head: ResponseHead::plain(500),
                body: Bytes::from_static(INTERNAL_ERROR.as_bytes()),
            });
        }
    };
    settle(handled).await;

    let head = lock(&slot)
        .take()
        .ok_or_else(|| anyhow::anyhow!("response was never committed"))?;
    let body = if is_head { Bytes::new() } else { buffer.bytes() };
    Ok(BufferedResponse { head, body })
}

/// Serve one request, returning once the response is committed.
///
/// The pipeline keeps running on a spawned task and feeds the body.
/// Returns `Ok(None)` when no route matches.
pub async fn serve_streaming(plan: CityPlan, request: RequestContext) -> anyhow::Result<Option<StreamingResponse>> {
    let (writer, body) = body_channel(STREAM_BUFFER);
    let (head_tx, head_rx) = oneshot::channel();

    let writable = move |status: u16, headers: &Headers, cookie: &Cookie| {
        // The receiver is only gone when the caller stopped waiting.
        let _ = head_tx.send(ResponseHead::capture(status, headers, cookie));
        Box::new(writer) as Box<dyn ResponseWriter>
    };
    let server_ev = ServerRequestEvent::new(request, writable)?;

    let task = tokio::spawn(async move {
        let handled = request_handler(server_ev, &plan).await?;
        let found = handled.is_some();
        if let Some(handled) = handled {
            settle(handled).await;
        }
        anyhow::Ok(found)
    });

    match head_rx.await {
        Ok(head) => Ok(Some(StreamingResponse { head, body })),
        // The factory was dropped unused: no route, or the pipeline failed
        // before it could commit.
        Err(oneshot::Canceled) => match task.await? {
            Ok(false) => Ok(None),
            Ok(true) => Err(anyhow::anyhow!("response was never committed")),
            Err(err) => {
                log_uncommitted(&err);
                Ok(Some(internal_error_stream().await?))
            }
        },
    }
}

fn log_uncommitted(err: &anyhow::Error) {
    error!(error = %format!("{:#}", err), "request failed before commit, responding 500");
}

async fn internal_error_stream() -> anyhow::Result<StreamingResponse> {
    let (mut writer, body) = body_channel(1);
    writer.write(Bytes::from_static(INTERNAL_ERROR.as_bytes())).await?;
    writer.close().await?;
    Ok(StreamingResponse {
        head: ResponseHead::plain(500),
        body,
    })
}

/// Make sure a handled request ends with a committed, closed response.
async fn settle(handled: HandledResponse) {
    let HandledResponse { mut event, error, .. } = handled;
    let Some(err) = error else {
        return;
    };
    if event.headers_sent() {
        return;
    }

    error!(
        request_id = %event.request_id(),
        error = %format!("{:#}", err),
        "unhandled error, responding 500"
    );
    if let Err(err) = event.text(500, INTERNAL_ERROR).await {
        warn!(error = %err, "failed to send error response");
    }
}
