//! Per-request state machine.
//!
//! A [`RequestEvent`] owns everything a handler chain may observe or change
//! while serving one request. Handlers run strictly one at a time in chain
//! order; a handler may call [`RequestEvent::next`] to run the rest of the
//! chain before it continues, which is how layouts wrap inner routes.
//!
//! The response is committed the first time the writer is obtained. From
//! then on status, headers and cookies are frozen and every attempt to
//! change them returns [`CoreError::ResponseAlreadySent`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::io;

use bytes::Bytes;
use edge_cache::CacheControl;
use futures::future::BoxFuture;
use http::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::context::{FormData, PathParams, QueryParams, RequestContext, RequestId};
use crate::cookie::Cookie;
use crate::error::CoreError;
use crate::handler::HandlerChain;
use crate::headers::{content_types, header_names, Headers};
use crate::lifecycle::{PipelineState, TimingContext};
use crate::server_fn::{ServerAction, ServerFnKind, ServerFunction, ServerLoader};
use crate::signal::{AbortMessage, ErrorResponse, Flow, RedirectMessage};
use crate::transport::{Platform, RequestMode, ResponseWriter, ServerRequestEvent, WritableStreamFactory};

/// Cursor value marking an exited pipeline.
pub const ABORT_INDEX: usize = 999_999_999;

/// Shared-map key holding the page data snapshot.
pub const Q_DATA_KEY: &str = "qData";

enum WriterSlot {
    Pending(Box<dyn WritableStreamFactory>),
    Open(Box<dyn ResponseWriter>),
    Closed,
}

struct EventState {
    cursor: usize,
    status: u16,
    locale: Option<String>,
    loaders: HashMap<String, Value>,
    action: Option<String>,
    writer: WriterSlot,
}

/// One inbound request moving through its handler chain.
pub struct RequestEvent {
    request_id: RequestId,
    mode: RequestMode,
    url: Url,
    query: QueryParams,
    params: PathParams,
    request: RequestContext,
    platform: Platform,
    headers: Headers,
    cookie: Cookie,
    shared: Map<String, Value>,
    handlers: HandlerChain,
    timing: TimingContext,
    state: EventState,
}

impl RequestEvent {
    /// Create the event for a matched route.
    pub fn new(server_ev: ServerRequestEvent, params: PathParams, handlers: HandlerChain) -> Self {
        let ServerRequestEvent {
            mode,
            locale,
            url,
            request,
            platform,
            writable,
        } = server_ev;

        let cookie = Cookie::parse(request.cookie_header());
        let query = url.query_pairs().into_owned().collect();

        Self {
            request_id: RequestId::generate(),
            mode,
            url,
            query,
            params,
            request,
            platform,
            headers: Headers::new(),
            cookie,
            shared: Map::new(),
            handlers,
            timing: TimingContext::new(),
            state: EventState {
                cursor: 0,
                status: 200,
                locale,
                loaders: HashMap::new(),
                action: None,
                writer: WriterSlot::Pending(writable),
            },
        }
    }

    // === Chain control ===

    /// Run the remaining handlers in order.
    ///
    /// Stops at the first handler returning a non-`Continue` flow, which
    /// moves the cursor to [`ABORT_INDEX`] and is returned to the caller.
    /// After exit this runs nothing and returns `Continue`.
    pub fn next(&mut self) -> BoxFuture<'_, anyhow::Result<Flow>> {
        Box::pin(async move {
            while self.state.cursor < self.handlers.len() {
                let index = self.state.cursor;
                let handler = self.handlers[index].clone();
                self.state.cursor += 1;

                debug!(request_id = %self.request_id, index, "running handler");
                let flow = match handler.handle(self).await {
                    Ok(flow) => flow,
                    Err(err) => {
                        self.state.cursor = ABORT_INDEX;
                        return Err(err);
                    }
                };

                if flow.is_short_circuit() {
                    debug!(request_id = %self.request_id, index, flow = flow.name(), "chain short-circuited");
                    self.state.cursor = ABORT_INDEX;
                    return Ok(flow);
                }
            }
            Ok(Flow::Continue)
        })
    }

    /// Stop the chain; no further handler runs.
    pub fn exit(&mut self) -> Flow {
        self.state.cursor = ABORT_INDEX;
        Flow::Abort(AbortMessage)
    }

    /// Check if the chain was exited.
    pub fn exited(&self) -> bool {
        self.state.cursor >= ABORT_INDEX
    }

    /// Check if the writer was obtained and the response committed.
    pub fn headers_sent(&self) -> bool {
        !matches!(self.state.writer, WriterSlot::Pending(_))
    }

    /// Current pipeline state.
    pub fn state(&self) -> PipelineState {
        match self.state.writer {
            WriterSlot::Closed => PipelineState::Done,
            _ if self.exited() => PipelineState::Exited,
            WriterSlot::Open(_) => PipelineState::Committed,
            WriterSlot::Pending(_) => PipelineState::Running,
        }
    }

    fn check(&self) -> Result<(), CoreError> {
        if self.headers_sent() {
            return Err(CoreError::ResponseAlreadySent);
        }
        Ok(())
    }

    fn check_status(status: u16) -> Result<u16, CoreError> {
        if (100..=599).contains(&status) {
            Ok(status)
        } else {
            Err(CoreError::InvalidStatus(status))
        }
    }

    // === Response metadata ===

    /// Response status (defaults to 200).
    pub fn status(&self) -> u16 {
        self.state.status
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: u16) -> Result<u16, CoreError> {
        self.check()?;
        self.state.status = Self::check_status(status)?;
        Ok(status)
    }

    /// Resolved locale, or `""`.
    pub fn locale(&self) -> &str {
        self.state.locale.as_deref().unwrap_or("")
    }

    /// Set the locale.
    pub fn set_locale(&mut self, locale: impl Into<String>) -> &str {
        self.state.locale = Some(locale.into());
        self.locale()
    }

    /// Set the `Cache-Control` header from a directive set.
    pub fn cache_control(&mut self, cache_control: impl Into<CacheControl>) -> Result<(), CoreError> {
        self.check()?;
        let value = cache_control.into().header_value();
        self.headers.set(header_names::CACHE_CONTROL, &value)
    }

    /// Outbound headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Outbound headers, writable until commit.
    pub fn headers_mut(&mut self) -> Result<&mut Headers, CoreError> {
        self.check()?;
        Ok(&mut self.headers)
    }

    /// Cookie jar.
    pub fn cookie(&self) -> &Cookie {
        &self.cookie
    }

    /// Cookie jar, writable until commit.
    pub fn cookie_mut(&mut self) -> Result<&mut Cookie, CoreError> {
        self.check()?;
        Ok(&mut self.cookie)
    }

    // === Response-control signals ===

    /// Redirect to `location`.
    ///
    /// Any `Cache-Control` is dropped; codes above 301 are marked `no-store`.
    pub fn redirect(&mut self, status: u16, location: &str) -> Result<Flow, CoreError> {
        self.check()?;
        self.state.status = Self::check_status(status)?;
        self.headers.set(header_names::LOCATION, location)?;
        self.headers.delete(header_names::CACHE_CONTROL);
        if status > 301 {
            self.headers.set(header_names::CACHE_CONTROL, "no-store")?;
        }
        Ok(Flow::Redirect(RedirectMessage))
    }

    /// Signal an application error to be rendered by the error page.
    ///
    /// Once committed, status and headers are left untouched.
    pub fn error(&mut self, status: u16, message: impl Into<String>) -> Flow {
        if self.headers_sent() {
            debug!(request_id = %self.request_id, status, "error raised after commit");
        } else {
            self.state.status = status;
            self.headers.delete(header_names::CACHE_CONTROL);
        }
        Flow::Error(ErrorResponse::new(status, message))
    }

    /// Mark an action as failed and hand its payload back to the caller.
    pub fn fail<T>(&mut self, status: u16, data: T) -> Result<T, CoreError> {
        self.check()?;
        self.state.status = Self::check_status(status)?;
        self.headers.delete(header_names::CACHE_CONTROL);
        Ok(data)
    }

    // === Body ===

    /// Obtain the body writer, committing the response on first use.
    pub fn writable_stream(&mut self) -> Result<&mut dyn ResponseWriter, CoreError> {
        if let WriterSlot::Pending(_) = self.state.writer {
            if let WriterSlot::Pending(factory) = std::mem::replace(&mut self.state.writer, WriterSlot::Closed) {
                self.timing.mark("commit");
                debug!(request_id = %self.request_id, status = self.state.status, "response committed");
                let writer = factory.create(self.state.status, &self.headers, &self.cookie);
                self.state.writer = WriterSlot::Open(writer);
            }
        }

        match &mut self.state.writer {
            WriterSlot::Open(writer) => Ok(writer.as_mut()),
            _ => Err(CoreError::StreamClosed),
        }
    }

    /// Write one body chunk, committing the response if needed.
    pub async fn write(&mut self, chunk: impl Into<Bytes>) -> anyhow::Result<()> {
        let writer = self.writable_stream()?;
        writer.write(chunk.into()).await?;
        Ok(())
    }

    /// Commit if nothing was written yet, then close the body.
    ///
    /// Closing twice is a no-op.
    pub async fn close_stream(&mut self) -> io::Result<()> {
        if let WriterSlot::Closed = self.state.writer {
            return Ok(());
        }
        if self.writable_stream().is_err() {
            return Ok(());
        }
        let slot = std::mem::replace(&mut self.state.writer, WriterSlot::Closed);
        if let WriterSlot::Open(mut writer) = slot {
            writer.close().await?;
        }
        Ok(())
    }

    /// Send a complete body and abort the chain.
    pub async fn send(&mut self, status: u16, body: impl Into<Bytes>) -> anyhow::Result<Flow> {
        self.check()?;
        self.state.status = Self::check_status(status)?;
        self.write(body).await?;
        self.close_stream().await?;
        Ok(Flow::Abort(AbortMessage))
    }

    /// Send a plain-text body.
    pub async fn text(&mut self, status: u16, text: impl Into<String>) -> anyhow::Result<Flow> {
        self.set_content_type(content_types::TEXT)?;
        self.send(status, text.into()).await
    }

    /// Send an HTML body.
    pub async fn html(&mut self, status: u16, html: impl Into<String>) -> anyhow::Result<Flow> {
        self.set_content_type(content_types::HTML)?;
        self.send(status, html.into()).await
    }

    /// Send a JSON body.
    pub async fn json<T: Serialize + ?Sized>(&mut self, status: u16, data: &T) -> anyhow::Result<Flow> {
        let body = serde_json::to_vec(data)?;
        self.set_content_type(content_types::JSON)?;
        self.send(status, body).await
    }

    fn set_content_type(&mut self, value: &str) -> Result<(), CoreError> {
        self.headers_mut()?.set(header_names::CONTENT_TYPE, value)
    }

    // === Loaders and actions ===

    /// Read the result of a loader or action.
    ///
    /// Never triggers a computation. A loader that has not been resolved is
    /// a contract error; an action yields `None` unless this request ran it.
    pub fn get_data(&self, server_fn: &dyn ServerFunction) -> Result<Option<&Value>, CoreError> {
        let value = self.state.loaders.get(server_fn.id());
        match server_fn.kind() {
            ServerFnKind::Loader => value
                .map(Some)
                .ok_or_else(|| CoreError::LoaderDataMissing(server_fn.id().to_string())),
            ServerFnKind::Action => Ok(value),
        }
    }

    /// Compute a loader at most once per request and return its value.
    pub async fn resolve_loader(&mut self, loader: &ServerLoader) -> anyhow::Result<&Value> {
        if !self.state.loaders.contains_key(loader.id()) {
            debug!(request_id = %self.request_id, loader = loader.name(), "resolving loader");
            let value = loader.run(self).await?;
            self.state.loaders.entry(loader.id().to_string()).or_insert(value);
        }
        self.state
            .loaders
            .get(loader.id())
            .ok_or_else(|| CoreError::LoaderDataMissing(loader.id().to_string()).into())
    }

    /// Run an action with the submitted form and record its result.
    pub async fn run_action(&mut self, action: &ServerAction, form: FormData) -> anyhow::Result<&Value> {
        debug!(request_id = %self.request_id, action = action.name(), "running action");
        self.state.action = Some(action.id().to_string());
        let value = action.run(form, self).await?;
        self.state.loaders.insert(action.id().to_string(), value);
        self.state
            .loaders
            .get(action.id())
            .ok_or_else(|| CoreError::LoaderDataMissing(action.id().to_string()).into())
    }

    /// Id of the action this request executed.
    pub fn action_id(&self) -> Option<&str> {
        self.state.action.as_deref()
    }

    /// Every resolved loader and action result, keyed by id.
    pub fn loader_results(&self) -> &HashMap<String, Value> {
        &self.state.loaders
    }

    // === Request data ===

    /// Data shared between handlers of this request.
    pub fn shared_map(&self) -> &Map<String, Value> {
        &self.shared
    }

    /// Mutable shared data.
    pub fn shared_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.shared
    }

    /// Route parameters.
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// One route parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Query parameters.
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Full request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL path.
    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.request.method
    }

    /// Inbound request.
    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    /// Host context downcast to `T`.
    pub fn platform<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.platform.downcast_ref::<T>()
    }

    /// Live or static rendering.
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Correlation id for logs.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Timing marks.
    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }
}

impl fmt::Debug for RequestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEvent")
            .field("request_id", &self.request_id)
            .field("method", &self.request.method)
            .field("url", &self.url.as_str())
            .field("status", &self.state.status)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use futures::FutureExt;
    use serde_json::json;

    use crate::cookie::CookieOptions;
    use crate::handler::{handler_fn, BoxedHandler};

    #[derive(Debug, Default)]
    struct Captured {
        status: u16,
        content_type: Option<String>,
        set_cookie: Vec<String>,
        body: Vec<u8>,
        closed: usize,
    }

    struct Recorder(Arc<Mutex<Captured>>);

    #[async_trait]
    impl ResponseWriter for Recorder {
        async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
            self.0.lock().unwrap().body.extend_from_slice(&chunk);
            Ok(())
        }

        async fn close(&mut self) -> io::Result<()> {
            self.0.lock().unwrap().closed += 1;
            Ok(())
        }
    }

    fn event_with(
        request: RequestContext,
        handlers: Vec<BoxedHandler>,
    ) -> (RequestEvent, Arc<Mutex<Captured>>) {
        let captured = Arc::new(Mutex::new(Captured::default()));
        let sink = captured.clone();
        let server_ev = ServerRequestEvent::new(request, move |status: u16, headers: &Headers, cookie: &Cookie| {
            {
                let mut c = sink.lock().unwrap();
                c.status = status;
                c.content_type = headers.get("content-type").map(str::to_string);
                c.set_cookie = cookie.headers();
            }
            Box::new(Recorder(sink)) as Box<dyn ResponseWriter>
        })
        .unwrap();
        (RequestEvent::new(server_ev, PathParams::new(), handlers.into()), captured)
    }

    fn event(handlers: Vec<BoxedHandler>) -> (RequestEvent, Arc<Mutex<Captured>>) {
        event_with(RequestContext::new(Method::GET, "http://localhost/pizza/?size=large"), handlers)
    }

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> BoxedHandler {
        let log = log.clone();
        handler_fn(move |_ev| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(name);
                Ok(Flow::Continue)
            }
            .boxed()
        })
    }

    // === Request Data Tests ===

    #[test]
    fn test_request_accessors() {
        let request = RequestContext::new(Method::GET, "http://localhost/pizza/?size=large&size=small")
            .with_header("Cookie", "crust=thin")
            .unwrap();
        let (ev, _) = event_with(request, vec![]);

        assert_eq!(ev.pathname(), "/pizza/");
        assert_eq!(ev.query().get("size").map(String::as_str), Some("small"));
        assert_eq!(ev.cookie().get("crust").unwrap().value(), "thin");
        assert_eq!(ev.method(), Method::GET);
        assert_eq!(ev.mode(), RequestMode::Server);
        assert_eq!(ev.locale(), "");
        assert_eq!(ev.status(), 200);
        assert_eq!(ev.state(), PipelineState::Running);
        assert!(ev.platform::<()>().is_some());
        assert!(ev.platform::<String>().is_none());
    }

    #[test]
    fn test_set_locale() {
        let (mut ev, _) = event(vec![]);
        assert_eq!(ev.set_locale("en-GB"), "en-GB");
        assert_eq!(ev.locale(), "en-GB");
    }

    // === Chain Ordering Tests ===

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut ev, _) = event(vec![
            recording(&log, "layout"),
            recording(&log, "group"),
            recording(&log, "route"),
        ]);

        let flow = ev.next().await.unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(*log.lock().unwrap(), vec!["layout", "group", "route"]);
        assert!(!ev.exited());
    }

    #[tokio::test]
    async fn test_layout_wraps_inner_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let wrap_log = log.clone();
        let layout = handler_fn(move |ev| {
            let log = wrap_log.clone();
            async move {
                log.lock().unwrap().push("layout:before");
                let flow = ev.next().await?;
                log.lock().unwrap().push("layout:after");
                anyhow::Ok(flow)
            }
            .boxed()
        });
        let (mut ev, _) = event(vec![layout, recording(&log, "route")]);

        ev.next().await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["layout:before", "route", "layout:after"]
        );
    }

    #[tokio::test]
    async fn test_nothing_runs_after_exit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let exit = handler_fn(|ev| async move { Ok(ev.exit()) }.boxed());
        let (mut ev, _) = event(vec![recording(&log, "layout"), exit, recording(&log, "route")]);

        let flow = ev.next().await.unwrap();

        assert_eq!(flow, Flow::Abort(AbortMessage));
        assert!(ev.exited());
        assert_eq!(ev.state(), PipelineState::Exited);
        assert_eq!(*log.lock().unwrap(), vec!["layout"]);

        assert_eq!(ev.next().await.unwrap(), Flow::Continue);
        assert_eq!(*log.lock().unwrap(), vec!["layout"]);
    }

    #[tokio::test]
    async fn test_nothing_runs_after_redirect_or_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let redirect = handler_fn(|ev| async move { anyhow::Ok(ev.redirect(302, "/login/")?) }.boxed());
        let (mut ev, _) = event(vec![redirect, recording(&log, "route")]);
        assert_eq!(ev.next().await.unwrap(), Flow::Redirect(RedirectMessage));
        assert!(log.lock().unwrap().is_empty());

        let error = handler_fn(|ev| async move { Ok(ev.error(404, "Not Found")) }.boxed());
        let (mut ev, _) = event(vec![error, recording(&log, "route")]);
        assert_eq!(
            ev.next().await.unwrap(),
            Flow::Error(ErrorResponse::new(404, "Not Found"))
        );
        assert_eq!(ev.status(), 404);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_propagates_and_stops_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let boom = handler_fn(|_ev| async { Err(anyhow::anyhow!("boom")) }.boxed());
        let (mut ev, _) = event(vec![boom, recording(&log, "route")]);

        let err = ev.next().await.unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert!(ev.exited());
        assert!(log.lock().unwrap().is_empty());
    }

    // === Commit-once Tests ===

    #[tokio::test]
    async fn test_second_send_fails() {
        let (mut ev, captured) = event(vec![]);

        let flow = ev.html(200, "<h1>pizza</h1>").await.unwrap();
        assert_eq!(flow, Flow::Abort(AbortMessage));

        let err = ev.text(200, "again").await.unwrap_err();
        assert_eq!(err.downcast_ref::<CoreError>(), Some(&CoreError::ResponseAlreadySent));

        let c = captured.lock().unwrap();
        assert_eq!(c.status, 200);
        assert_eq!(c.content_type.as_deref(), Some(content_types::HTML));
        assert_eq!(c.body, b"<h1>pizza</h1>");
        assert_eq!(c.closed, 1);
    }

    #[tokio::test]
    async fn test_mutations_fail_after_commit() {
        let (mut ev, _) = event(vec![]);
        ev.write("partial").await.unwrap();

        assert!(ev.headers_sent());
        assert_eq!(ev.state(), PipelineState::Committed);
        assert_eq!(ev.set_status(404), Err(CoreError::ResponseAlreadySent));
        assert_eq!(ev.headers_mut().err(), Some(CoreError::ResponseAlreadySent));
        assert_eq!(ev.cookie_mut().err(), Some(CoreError::ResponseAlreadySent));
        assert_eq!(
            ev.cache_control(CacheControl::no_store()),
            Err(CoreError::ResponseAlreadySent)
        );
        assert_eq!(ev.redirect(302, "/"), Err(CoreError::ResponseAlreadySent));
        assert_eq!(ev.fail(400, ()), Err(CoreError::ResponseAlreadySent));

        assert!(matches!(ev.error(500, "late"), Flow::Error(_)));
        assert_eq!(ev.status(), 200);
    }

    #[tokio::test]
    async fn test_writer_receives_status_headers_and_cookies() {
        let (mut ev, captured) = event(vec![]);
        ev.set_status(201).unwrap();
        ev.cookie_mut()
            .unwrap()
            .set("size", "large", &CookieOptions::new().with_path("/"));

        ev.close_stream().await.unwrap();
        ev.close_stream().await.unwrap();

        let c = captured.lock().unwrap();
        assert_eq!(c.status, 201);
        assert_eq!(c.set_cookie, vec!["size=large; Path=/".to_string()]);
        assert_eq!(c.closed, 1);
        drop(c);
        assert_eq!(ev.state(), PipelineState::Done);
        assert!(ev.timing().time_to_commit().is_some());
    }

    #[tokio::test]
    async fn test_json_body() {
        let (mut ev, captured) = event(vec![]);
        ev.json(200, &json!({"crust": "thin"})).await.unwrap();

        let c = captured.lock().unwrap();
        assert_eq!(c.content_type.as_deref(), Some(content_types::JSON));
        assert_eq!(c.body, br#"{"crust":"thin"}"#);
    }

    #[test]
    fn test_invalid_status_rejected() {
        let (mut ev, _) = event(vec![]);
        assert_eq!(ev.set_status(42), Err(CoreError::InvalidStatus(42)));
        assert_eq!(ev.status(), 200);
    }

    // === Redirect Tests ===

    #[test]
    fn test_redirect_302_clears_cache_control() {
        let (mut ev, _) = event(vec![]);
        ev.cache_control(CacheControl::public().with_max_age(60)).unwrap();

        ev.redirect(302, "/menu/").unwrap();

        assert_eq!(ev.status(), 302);
        assert_eq!(ev.headers().get("location"), Some("/menu/"));
        assert_eq!(ev.headers().get("cache-control"), Some("no-store"));
    }

    #[test]
    fn test_redirect_301_keeps_no_cache_control() {
        let (mut ev, _) = event(vec![]);
        ev.cache_control(CacheControl::public().with_max_age(60)).unwrap();

        ev.redirect(301, "/menu/").unwrap();

        assert!(!ev.headers().has("cache-control"));
    }

    #[test]
    fn test_redirect_303_sets_no_store() {
        let (mut ev, _) = event(vec![]);
        ev.redirect(303, "/thanks/").unwrap();
        assert_eq!(ev.headers().get("cache-control"), Some("no-store"));
    }

    #[test]
    fn test_fail_returns_payload() {
        let (mut ev, _) = event(vec![]);
        ev.cache_control(60u64).unwrap();

        let payload = ev.fail(400, json!({"message": "no toppings"})).unwrap();

        assert_eq!(payload["message"], "no toppings");
        assert_eq!(ev.status(), 400);
        assert!(!ev.headers().has("cache-control"));
        assert!(!ev.exited());
    }

    // === Loader Tests ===

    #[tokio::test]
    async fn test_loader_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let loader = ServerLoader::new("toppings", move |_ev| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!(["Pepperoni", "Bacon"]))
            }
            .boxed()
        });
        let (mut ev, _) = event(vec![]);

        assert_eq!(
            ev.get_data(&loader),
            Err(CoreError::LoaderDataMissing(loader.id().to_string()))
        );

        let first = ev.resolve_loader(&loader).await.unwrap().clone();
        let second = ev.resolve_loader(&loader).await.unwrap().clone();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(ev.get_data(&loader).unwrap(), Some(&json!(["Pepperoni", "Bacon"])));
    }

    #[tokio::test]
    async fn test_loader_can_depend_on_loader() {
        let size = ServerLoader::new("size", |_ev| async { Ok(json!("large")) }.boxed());
        let dep = size.clone();
        let price = ServerLoader::new("price", move |ev| {
            let dep = dep.clone();
            async move {
                let size = ev.resolve_loader(&dep).await?.clone();
                anyhow::Ok(json!(if size == "large" { 14 } else { 10 }))
            }
            .boxed()
        });
        let (mut ev, _) = event(vec![]);

        assert_eq!(ev.resolve_loader(&price).await.unwrap(), &json!(14));
        assert_eq!(ev.get_data(&size).unwrap(), Some(&json!("large")));
    }

    #[tokio::test]
    async fn test_action_data_only_when_executed() {
        let action = ServerAction::new("order", |form, _ev| {
            async move { Ok(json!({"crust": form.get("crust")})) }.boxed()
        });
        let other = ServerAction::new("cancel", |_form, _ev| async { Ok(Value::Null) }.boxed());
        let (mut ev, _) = event(vec![]);

        assert_eq!(ev.get_data(&action), Ok(None));

        ev.run_action(&action, FormData::from_pairs([("crust", "thin")]))
            .await
            .unwrap();

        assert_eq!(ev.action_id(), Some(action.id()));
        assert_eq!(ev.get_data(&action).unwrap(), Some(&json!({"crust": "thin"})));
        assert_eq!(ev.get_data(&other), Ok(None));
    }

    #[test]
    fn test_shared_map() {
        let (mut ev, _) = event(vec![]);
        ev.shared_map_mut().insert(Q_DATA_KEY.into(), json!({"isStatic": true}));
        assert_eq!(ev.shared_map()[Q_DATA_KEY]["isStatic"], true);
    }
}
