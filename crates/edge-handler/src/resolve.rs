//! Handler-chain assembly.
//!
//! The chain for a matched route is, in order:
//! 1. every module's `on_request` handler followed by its handler for the
//!    request method, outermost layout first;
//! 2. for pages, the loaders stage (action then loaders);
//! 3. for pages, the render stage (page data JSON or streamed HTML).
//!
//! A request no handler can answer ends in a 405.

use std::sync::Arc;

use async_trait::async_trait;
use edge_core::{
    content_types, handler_fn, header_names, AbortMessage, BoxedHandler, Flow, HandlerChain, RedirectMessage,
    RequestEvent, RequestHandler, ServerFunction, QACTION_KEY, Q_DATA_KEY,
};
use edge_router::{ContentMenu, LoadedRoute, RouteModule};
use futures::FutureExt;
use http::Method;
use tracing::debug;

use crate::page_data::PageData;
use crate::render::{resolve_head, RenderContext, Renderer};

/// Build the handler chain for `route` and `method`.
///
/// `data_request` selects the JSON page-data response instead of HTML.
pub fn resolve_request_handlers(
    route: &LoadedRoute,
    method: &Method,
    renderer: Arc<dyn Renderer>,
    data_request: bool,
) -> HandlerChain {
    let mut handlers: Vec<BoxedHandler> = Vec::new();
    let mut answers_method = false;

    for module in &route.modules {
        if let Some(handler) = module.request_handler() {
            handlers.push(handler.clone());
        }
        if let Some(handler) = module.method_handler(method) {
            handlers.push(handler.clone());
            answers_method = true;
        }
    }

    let is_page = route.modules.last().is_some_and(|m| m.has_component());
    if is_page && renders_page(method) {
        handlers.push(Arc::new(LoadersStage {
            modules: route.modules.clone(),
        }));
        handlers.push(Arc::new(RenderStage {
            modules: route.modules.clone(),
            menu: route.menu.clone(),
            route_bundle_names: route.route_bundle_names.clone(),
            renderer,
            data_request,
        }));
        answers_method = true;
    }

    if !answers_method {
        debug!(route = %route.route_name, %method, "no handler for method");
        handlers.push(handler_fn(|ev| {
            async move { Ok(ev.error(405, "Method Not Allowed")) }.boxed()
        }));
    }

    handlers.into()
}

/// Methods a page answers by rendering.
pub fn renders_page(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::POST
}

/// Stop the chain when a loader or action already settled the response.
fn settled(ev: &RequestEvent) -> Option<Flow> {
    if ev.exited() || ev.headers_sent() {
        return Some(Flow::Abort(AbortMessage));
    }
    let redirected = (300..400).contains(&ev.status()) && ev.headers().has(header_names::LOCATION);
    redirected.then_some(Flow::Redirect(RedirectMessage))
}

/// Runs the requested action, then every loader once.
struct LoadersStage {
    modules: Vec<Arc<RouteModule>>,
}

#[async_trait]
impl RequestHandler for LoadersStage {
    async fn handle(&self, ev: &mut RequestEvent) -> anyhow::Result<Flow> {
        if *ev.method() == Method::POST {
            if let Some(action_id) = ev.query().get(QACTION_KEY).cloned() {
                let action = self
                    .modules
                    .iter()
                    .flat_map(|m| m.actions())
                    .find(|a| a.id() == action_id);
                match action {
                    Some(action) => {
                        let form = ev.request().form_data();
                        ev.run_action(action, form).await?;
                        if let Some(flow) = settled(ev) {
                            return Ok(flow);
                        }
                    }
                    None => debug!(action = %action_id, "no action with this id on route"),
                }
            }
        }

        for loader in self.modules.iter().flat_map(|m| m.loaders()) {
            ev.resolve_loader(loader).await?;
            if let Some(flow) = settled(ev) {
                return Ok(flow);
            }
        }

        Ok(Flow::Continue)
    }
}

/// Serves the page data or streams the page HTML.
struct RenderStage {
    modules: Vec<Arc<RouteModule>>,
    menu: Option<ContentMenu>,
    route_bundle_names: Vec<String>,
    renderer: Arc<dyn Renderer>,
    data_request: bool,
}

#[async_trait]
impl RequestHandler for RenderStage {
    async fn handle(&self, ev: &mut RequestEvent) -> anyhow::Result<Flow> {
        let page_data = PageData::collect(ev, &self.modules);

        if self.data_request {
            let status = ev.status();
            return ev.json(status, &page_data).await;
        }

        ev.shared_map_mut()
            .insert(Q_DATA_KEY.to_string(), serde_json::to_value(&page_data)?);
        if !ev.headers().has(header_names::CONTENT_TYPE) {
            ev.headers_mut()?.set(header_names::CONTENT_TYPE, content_types::HTML)?;
        }

        let ctx = RenderContext {
            modules: self.modules.clone(),
            menu: self.menu.clone(),
            head: resolve_head(ev, &self.modules),
            route_bundle_names: self.route_bundle_names.clone(),
            page_data,
        };
        self.renderer.render(ev, &ctx).await?;

        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use edge_core::{PathParams, ServerAction, ServerLoader};

    use crate::render::ComponentRenderer;

    fn tagged(tag: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> BoxedHandler {
        handler_fn(move |_ev| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(tag);
                Ok(Flow::Continue)
            }
            .boxed()
        })
    }

    fn route(modules: Vec<RouteModule>) -> LoadedRoute {
        LoadedRoute {
            params: PathParams::new(),
            modules: modules.into_iter().map(Arc::new).collect(),
            menu: None,
            route_bundle_names: Vec::new(),
            route_name: "/".to_string(),
        }
    }

    fn page(name: &str) -> RouteModule {
        RouteModule::new(name).component(|_ev: &RequestEvent, _children: &str| anyhow::Ok(String::new()))
    }

    fn renderer() -> Arc<dyn Renderer> {
        Arc::new(ComponentRenderer::default())
    }

    // === Chain Shape Tests ===

    #[test]
    fn test_page_get_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let layout = RouteModule::new("layout").on_request(tagged("layout", log.clone()));
        let index = page("index").on_get(tagged("index", log));

        let chain = resolve_request_handlers(&route(vec![layout, index]), &Method::GET, renderer(), false);

        // layout on_request, index on_get, loaders, render
        assert_eq!(chain.len(), 4);
    }

    #[test]
    fn test_endpoint_without_method_handler_gets_405() {
        let endpoint = RouteModule::new("api").on_get(handler_fn(|_ev| async { Ok(Flow::Continue) }.boxed()));

        let get = resolve_request_handlers(&route(vec![endpoint.clone()]), &Method::GET, renderer(), false);
        let delete = resolve_request_handlers(&route(vec![endpoint]), &Method::DELETE, renderer(), false);

        assert_eq!(get.len(), 1);
        assert_eq!(delete.len(), 1);
    }

    #[test]
    fn test_page_put_not_rendered() {
        let chain = resolve_request_handlers(&route(vec![page("index")]), &Method::PUT, renderer(), false);

        // only the 405 handler
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_renders_page_methods() {
        assert!(renders_page(&Method::GET));
        assert!(renders_page(&Method::HEAD));
        assert!(renders_page(&Method::POST));
        assert!(!renders_page(&Method::DELETE));
    }

    #[test]
    fn test_layout_actions_and_loaders_included() {
        let layout = RouteModule::new("layout")
            .loader(ServerLoader::new("server-time", |_ev| async { Ok(serde_json::json!(0)) }.boxed()));
        let leaf = page("actions")
            .action(ServerAction::new("add", |_form, _ev| async { Ok(serde_json::json!(true)) }.boxed()));
        let route = route(vec![layout, leaf]);

        let chain = resolve_request_handlers(&route, &Method::POST, renderer(), false);

        assert_eq!(chain.len(), 2);
        assert_eq!(route.modules.iter().flat_map(|m| m.loaders()).count(), 1);
    }
}
