//! Route modules: the unit a route is assembled from.
//!
//! A module is either a layout (wrapping everything below it) or the leaf
//! of a route. It may contribute request handlers, loaders, actions and a
//! component. A leaf with a component is a page; a leaf without one is an
//! endpoint.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use edge_core::{BoxedHandler, PathParams, RequestEvent, ServerAction, ServerLoader};
use futures::future::BoxFuture;
use http::Method;

use crate::head::DocumentHead;

/// Renders a module's markup.
///
/// Layouts receive the already-rendered markup of everything nested inside
/// them as `children`; a page receives an empty string.
pub trait Component: Send + Sync {
    fn render(&self, ev: &RequestEvent, children: &str) -> anyhow::Result<String>;
}

impl<F> Component for F
where
    F: Fn(&RequestEvent, &str) -> anyhow::Result<String> + Send + Sync,
{
    fn render(&self, ev: &RequestEvent, children: &str) -> anyhow::Result<String> {
        self(ev, children)
    }
}

/// Computes a module's document head for one request.
pub type HeadFn = Arc<dyn Fn(&RequestEvent) -> DocumentHead + Send + Sync>;

/// Enumerates the parameter sets a dynamic route is pre-rendered with.
pub type StaticPathsFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Vec<PathParams>>> + Send + Sync>;

/// One layout or leaf of a route.
#[derive(Clone, Default)]
pub struct RouteModule {
    name: String,
    on_request: Option<BoxedHandler>,
    method_handlers: HashMap<Method, BoxedHandler>,
    loaders: Vec<ServerLoader>,
    actions: Vec<ServerAction>,
    component: Option<Arc<dyn Component>>,
    head: Option<HeadFn>,
    static_paths: Option<StaticPathsFn>,
}

impl RouteModule {
    /// Create an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Handler run for every method, before the method handler.
    pub fn on_request(mut self, handler: BoxedHandler) -> Self {
        self.on_request = Some(handler);
        self
    }

    /// Handler for one method.
    pub fn on_method(mut self, method: Method, handler: BoxedHandler) -> Self {
        self.method_handlers.insert(method, handler);
        self
    }

    pub fn on_get(self, handler: BoxedHandler) -> Self {
        self.on_method(Method::GET, handler)
    }

    pub fn on_post(self, handler: BoxedHandler) -> Self {
        self.on_method(Method::POST, handler)
    }

    pub fn on_put(self, handler: BoxedHandler) -> Self {
        self.on_method(Method::PUT, handler)
    }

    pub fn on_patch(self, handler: BoxedHandler) -> Self {
        self.on_method(Method::PATCH, handler)
    }

    pub fn on_delete(self, handler: BoxedHandler) -> Self {
        self.on_method(Method::DELETE, handler)
    }

    pub fn on_head(self, handler: BoxedHandler) -> Self {
        self.on_method(Method::HEAD, handler)
    }

    pub fn on_options(self, handler: BoxedHandler) -> Self {
        self.on_method(Method::OPTIONS, handler)
    }

    /// Declare a loader resolved before rendering.
    pub fn loader(mut self, loader: ServerLoader) -> Self {
        self.loaders.push(loader);
        self
    }

    /// Declare an action reachable through `?qaction=<id>`.
    pub fn action(mut self, action: ServerAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Set the module's component.
    pub fn component(mut self, component: impl Component + 'static) -> Self {
        self.component = Some(Arc::new(component));
        self
    }

    /// Static document head.
    pub fn head(self, head: DocumentHead) -> Self {
        self.head_fn(move |_ev: &RequestEvent| head.clone())
    }

    /// Document head computed from the request, e.g. from loader data.
    pub fn head_fn<F>(mut self, head: F) -> Self
    where
        F: Fn(&RequestEvent) -> DocumentHead + Send + Sync + 'static,
    {
        self.head = Some(Arc::new(head));
        self
    }

    /// Parameter sets to pre-render a dynamic route with.
    pub fn static_paths<F>(mut self, paths: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, anyhow::Result<Vec<PathParams>>> + Send + Sync + 'static,
    {
        self.static_paths = Some(Arc::new(paths));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request_handler(&self) -> Option<&BoxedHandler> {
        self.on_request.as_ref()
    }

    pub fn method_handler(&self, method: &Method) -> Option<&BoxedHandler> {
        self.method_handlers.get(method)
    }

    pub fn loaders(&self) -> &[ServerLoader] {
        &self.loaders
    }

    pub fn actions(&self) -> &[ServerAction] {
        &self.actions
    }

    pub fn get_component(&self) -> Option<&Arc<dyn Component>> {
        self.component.as_ref()
    }

    /// Check if this module renders markup.
    pub fn has_component(&self) -> bool {
        self.component.is_some()
    }

    pub fn get_head(&self) -> Option<&HeadFn> {
        self.head.as_ref()
    }

    pub fn get_static_paths(&self) -> Option<&StaticPathsFn> {
        self.static_paths.as_ref()
    }
}

impl fmt::Debug for RouteModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.method_handlers.keys().map(Method::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("RouteModule")
            .field("name", &self.name)
            .field("on_request", &self.on_request.is_some())
            .field("methods", &methods)
            .field("loaders", &self.loaders)
            .field("actions", &self.actions)
            .field("component", &self.component.is_some())
            .field("head", &self.head.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::{handler_fn, Flow};
    use futures::FutureExt;

    fn noop() -> BoxedHandler {
        handler_fn(|_ev| async { Ok(Flow::Continue) }.boxed())
    }

    #[test]
    fn test_module_builder() {
        let module = RouteModule::new("actions")
            .on_request(noop())
            .on_get(noop())
            .on_post(noop())
            .loader(ServerLoader::new("toppings", |_ev| async { Ok(serde_json::json!([])) }.boxed()))
            .component(|_ev: &RequestEvent, _children: &str| anyhow::Ok(String::from("<form></form>")));

        assert_eq!(module.name(), "actions");
        assert!(module.request_handler().is_some());
        assert!(module.method_handler(&Method::GET).is_some());
        assert!(module.method_handler(&Method::DELETE).is_none());
        assert_eq!(module.loaders().len(), 1);
        assert!(module.actions().is_empty());
        assert!(module.has_component());
        assert!(module.get_static_paths().is_none());
    }

    #[test]
    fn test_endpoint_has_no_component() {
        let module = RouteModule::new("api").on_get(noop());
        assert!(!module.has_component());
    }
}
