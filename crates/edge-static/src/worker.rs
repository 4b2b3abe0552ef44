//! Static generation worker.
//!
//! A worker renders pathnames through the live request pipeline with a
//! file-backed writer. A page counts as rendered when it answers 2xx with
//! an HTML content type; anything else is discarded. Errors and panics are
//! caught per render and reported on that render's result, so one broken
//! page never takes the worker down.

use std::any::Any;
use std::backtrace::BacktraceStatus;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use edge_core::{
    header_names, Cookie, Headers, RequestContext, RequestMode, ResponseWriter, ServerRequestEvent, Q_DATA_KEY,
};
use edge_handler::{request_handler, CityPlan, HandledResponse};
use edge_streaming::NoopSink;
use futures::FutureExt;
use http::Method;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::StaticError;
use crate::pending::PendingRenders;
use crate::system::{System, WorkerHandler};
use crate::types::{StaticRoute, StaticWorkerRenderResult, WorkerMessage, WorkerResponse};

/// `User-Agent` of synthetic requests.
pub const SSG_USER_AGENT: &str = "Edge City SSG";

/// `Accept` of synthetic requests.
pub const SSG_ACCEPT: &str = "text/html,application/json";

/// Message handler for one worker.
///
/// Every render is registered as pending before its future is returned, so
/// a `Close` that arrives later waits for it.
pub fn worker_handler(sys: Arc<dyn System>, plan: CityPlan) -> WorkerHandler {
    let pending = PendingRenders::new();

    Arc::new(move |msg| match msg {
        WorkerMessage::Render(route) => {
            let guard = pending.track();
            let sys = sys.clone();
            let plan = plan.clone();
            async move {
                let result = worker_render(sys, &plan, route).await;
                drop(guard);
                WorkerResponse::Render(result)
            }
            .boxed()
        }
        WorkerMessage::Close => {
            let pending = pending.clone();
            async move {
                debug!(pending = pending.len(), "draining before close");
                pending.wait_idle().await;
                WorkerResponse::Close
            }
            .boxed()
        }
    })
}

/// Render one pathname to disk.
pub async fn worker_render(sys: Arc<dyn System>, plan: &CityPlan, route: StaticRoute) -> StaticWorkerRenderResult {
    let options = sys.options();

    let url = match Url::parse(&options.origin).and_then(|origin| origin.join(&route.pathname)) {
        Ok(url) => url,
        Err(err) => {
            let mut result = StaticWorkerRenderResult::new(&route.pathname, "");
            result.error = Some(format!("Invalid URL for {}: {}", route.pathname, err));
            return result;
        }
    };
    let mut result = StaticWorkerRenderResult::new(&route.pathname, url.as_str());

    let html_path = sys.page_file_path(&route.pathname);
    let data_path = sys.data_file_path(&route.pathname).filter(|_| options.emit_data);
    let write_html = options.emit_html;

    let mut dirs: Vec<&PathBuf> = Vec::new();
    if write_html {
        dirs.push(&html_path);
    }
    if let Some(path) = &data_path {
        dirs.push(path);
    }
    for path in dirs {
        if let Err(source) = sys.ensure_dir(path).await {
            let err = StaticError::Io {
                path: path.clone(),
                source,
            };
            result.error = Some(normalize_error(&anyhow::Error::new(err)));
            return result;
        }
    }

    let ok = Arc::new(AtomicBool::new(false));
    let rendered = AssertUnwindSafe(run_pipeline(sys.clone(), plan, &url, html_path, write_html, ok.clone()))
        .catch_unwind()
        .await;
    result.ok = ok.load(Ordering::SeqCst);

    match rendered {
        Err(panic) => {
            result.ok = false;
            result.error = Some(panic_message(panic.as_ref()));
        }
        Ok(Err(err)) => result.error = Some(normalize_error(&err)),
        Ok(Ok(None)) => debug!(pathname = %route.pathname, "no route matched"),
        Ok(Ok(Some(handled))) => {
            if let Some(err) = &handled.error {
                result.error = Some(normalize_error(err));
            }
            let data = handled.event.shared_map().get(Q_DATA_KEY).cloned();
            drop(handled);
            if result.ok && result.error.is_none() {
                if let (Some(path), Some(data)) = (&data_path, data) {
                    if let Err(err) = write_page_data(sys.as_ref(), path, &data, &mut result).await {
                        result.error = Some(normalize_error(&err));
                    }
                }
            }
        }
    }

    if let Some(error) = &result.error {
        warn!(pathname = %result.pathname, error = %error, "render failed");
    } else {
        debug!(pathname = %result.pathname, ok = result.ok, is_static = result.is_static, "rendered");
    }
    result
}

async fn run_pipeline(
    sys: Arc<dyn System>,
    plan: &CityPlan,
    url: &Url,
    html_path: PathBuf,
    write_html: bool,
    ok: Arc<AtomicBool>,
) -> anyhow::Result<Option<HandledResponse>> {
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    let request = RequestContext::new(Method::GET, url.as_str())
        .with_header(header_names::HOST, &host)?
        .with_header(header_names::ACCEPT, SSG_ACCEPT)?
        .with_header(header_names::USER_AGENT, SSG_USER_AGENT)?;

    let platform = sys.platform();
    let writable = move |status: u16, headers: &Headers, _cookie: &Cookie| {
        let is_html = headers
            .get(header_names::CONTENT_TYPE)
            .is_some_and(|ct| ct.contains("text/html"));
        let page_ok = (200..=299).contains(&status) && is_html;
        ok.store(page_ok, Ordering::SeqCst);

        if page_ok && write_html {
            sys.create_write_stream(&html_path)
        } else {
            Box::new(NoopSink) as Box<dyn ResponseWriter>
        }
    };

    let server_ev = ServerRequestEvent::new(request, writable)?
        .with_mode(RequestMode::Static)
        .with_platform(platform);

    request_handler(server_ev, plan).await
}

/// Write the page data snapshot and take `is_static` from it.
async fn write_page_data(
    sys: &dyn System,
    path: &std::path::Path,
    data: &Value,
    result: &mut StaticWorkerRenderResult,
) -> anyhow::Result<()> {
    if let Some(is_static) = data.get("isStatic").and_then(Value::as_bool) {
        result.is_static = is_static;
    }

    let mut writer = sys.create_write_stream(path);
    writer.write(serde_json::to_vec(data)?.into()).await?;
    writer.close().await?;
    Ok(())
}

/// Render an error as text: with its backtrace when one was captured,
/// otherwise its message chain, otherwise `"Error"`.
pub fn normalize_error(err: &anyhow::Error) -> String {
    let message = format!("{:#}", err);
    let backtrace = err.backtrace();
    if backtrace.status() == BacktraceStatus::Captured {
        return format!("{}\n{}", message, backtrace);
    }
    if message.is_empty() {
        "Error".to_string()
    } else {
        message
    }
}

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::new()
    };
    if message.is_empty() {
        "Error".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Error Normalization Tests ===

    #[test]
    fn test_normalize_error_uses_chain() {
        let err = anyhow::anyhow!("disk full").context("writing page");

        let text = normalize_error(&err);

        assert!(text.starts_with("writing page: disk full"));
    }

    #[test]
    fn test_normalize_empty_error() {
        let err = anyhow::anyhow!("");
        let text = normalize_error(&err);
        assert!(text.starts_with("Error") || text.contains('\n'));
    }

    #[test]
    fn test_panic_message_variants() {
        let payload: Box<dyn Any + Send> = Box::new("oven exploded");
        assert_eq!(panic_message(payload.as_ref()), "oven exploded");

        let payload: Box<dyn Any + Send> = Box::new(String::from("dough too thick"));
        assert_eq!(panic_message(payload.as_ref()), "dough too thick");

        let payload: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "Error");
    }
}
