//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use edge_handler::prelude::*;
//! ```

pub use crate::adapter::{self, serve, serve_streaming, BufferedResponse, ResponseHead, StreamingResponse};
pub use crate::{
    get_error_html, mark_dynamic, request_handler, resolve_request_handlers, CityApp, CityConfig, CityPlan,
    ComponentRenderer, HandledResponse, PageData, RenderContext, Renderer,
};
pub use edge_core::{
    handler_fn, BoxedHandler, CacheControl, CacheScope, ErrorResponse, Flow, FormData, PathParams,
    RequestContext, RequestEvent, ServerAction, ServerLoader,
};
pub use edge_router::{
    Component, ContentMenu, DocumentHead, HeadLink, HeadMeta, MenuData, MenuModule, ModuleLoader, RouteData,
    RouteModule,
};
pub use http::Method;
