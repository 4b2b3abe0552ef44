//! The seam between the pipeline and a concrete transport.

use std::any::Any;
use std::fmt;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::context::RequestContext;
use crate::cookie::Cookie;
use crate::headers::Headers;

/// Whether a request is served live or rendered ahead of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    #[default]
    Server,
    Static,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Static => "static",
        }
    }
}

/// Opaque host context handed through to handlers.
pub type Platform = Arc<dyn Any + Send + Sync>;

/// Outbound body stream.
///
/// Obtained once per request, after status and headers are fixed.
#[async_trait]
pub trait ResponseWriter: Send {
    /// Write one chunk of the body.
    async fn write(&mut self, chunk: Bytes) -> io::Result<()>;

    /// Finish the body. Called exactly once by the pipeline.
    async fn close(&mut self) -> io::Result<()>;
}

/// Produces the response writer when the response is committed.
///
/// Consumed on use, so a transport can never be asked for two writers.
pub trait WritableStreamFactory: Send {
    fn create(self: Box<Self>, status: u16, headers: &Headers, cookie: &Cookie) -> Box<dyn ResponseWriter>;
}

impl<F> WritableStreamFactory for F
where
    F: FnOnce(u16, &Headers, &Cookie) -> Box<dyn ResponseWriter> + Send,
{
    fn create(self: Box<Self>, status: u16, headers: &Headers, cookie: &Cookie) -> Box<dyn ResponseWriter> {
        (*self)(status, headers, cookie)
    }
}

/// Everything the hosting layer supplies for one request.
pub struct ServerRequestEvent {
    /// Live or static rendering.
    pub mode: RequestMode,
    /// Locale resolved by the host, if any.
    pub locale: Option<String>,
    /// Parsed request URL.
    pub url: Url,
    /// Inbound request.
    pub request: RequestContext,
    /// Host context.
    pub platform: Platform,
    /// Writer factory, invoked on commit.
    pub writable: Box<dyn WritableStreamFactory>,
}

impl ServerRequestEvent {
    /// Create a server-mode event; the URL is parsed from the request.
    pub fn new(
        request: RequestContext,
        writable: impl WritableStreamFactory + 'static,
    ) -> Result<Self, url::ParseError> {
        let url = Url::parse(&request.url)?;
        Ok(Self {
            mode: RequestMode::Server,
            locale: None,
            url,
            request,
            platform: Arc::new(()),
            writable: Box::new(writable),
        })
    }

    /// Set the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the resolved locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Set the host context.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

impl fmt::Debug for ServerRequestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerRequestEvent")
            .field("mode", &self.mode)
            .field("locale", &self.locale)
            .field("url", &self.url.as_str())
            .field("method", &self.request.method)
            .finish_non_exhaustive()
    }
}
