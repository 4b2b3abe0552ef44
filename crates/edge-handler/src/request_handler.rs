//! Request driver.
//!
//! Matches a request to its route, runs the handler chain and turns the
//! resulting [`Flow`] into a committed response.

use edge_core::{ErrorResponse, Flow, HandlerChain, RequestEvent, ServerRequestEvent};
use edge_observability::{record_timing, request_span};
use edge_router::load_route;
use serde_json::json;
use tracing::{debug, error, field, warn, Instrument, Span};

use crate::error_page::get_error_html;
use crate::plan::CityPlan;
use crate::resolve::{renders_page, resolve_request_handlers};

/// Suffix of page-data requests.
pub const QDATA_JSON: &str = "q-data.json";

/// Outcome of one request that matched a route.
#[derive(Debug)]
pub struct HandledResponse {
    /// Final response status.
    pub status: u16,
    /// The event, with its writer closed unless `error` is set and nothing
    /// was sent.
    pub event: RequestEvent,
    /// Unexpected failure raised by the chain.
    ///
    /// When the response was not committed yet the caller decides what to
    /// send; otherwise the partial response already stands.
    pub error: Option<anyhow::Error>,
}

/// Split a pathname into its page path and whether page data was requested.
pub fn strip_data_suffix(pathname: &str) -> (&str, bool) {
    match pathname.strip_suffix(QDATA_JSON) {
        Some(page) => (page, true),
        None => (pathname, false),
    }
}

/// Serve one request.
///
/// Returns `Ok(None)` when no route matches. Route loading failures are
/// returned as errors; everything raised by the chain ends up in
/// [`HandledResponse::error`].
pub async fn request_handler(
    server_ev: ServerRequestEvent,
    plan: &CityPlan,
) -> anyhow::Result<Option<HandledResponse>> {
    let method = server_ev.request.method.clone();
    let span = request_span(method.as_str(), server_ev.url.path());

    async move {
        let (pathname, data_request) = strip_data_suffix(server_ev.url.path());
        let pathname = pathname.to_string();
        let config = plan.config();

        let Some(route) = load_route(plan.routes(), plan.menus(), config.cache_modules, &pathname, plan.cache()).await?
        else {
            return Ok(None);
        };

        let is_page = route.modules.last().is_some_and(|m| m.has_component());
        if is_page && !data_request && (method == http::Method::GET || method == http::Method::HEAD) {
            if let Some(location) = slash_redirect(&pathname, server_ev.url.query(), config.trailing_slash) {
                let empty: HandlerChain = Vec::new().into();
                let mut ev = RequestEvent::new(server_ev, route.params, empty);
                record_request_id(&ev);
                let result = ev.redirect(301, &location).map_err(anyhow::Error::from);
                return Ok(Some(finish(ev, result, false).await));
            }
        }

        let data_request = data_request && renders_page(&method);
        let chain = resolve_request_handlers(&route, &method, plan.renderer(), data_request);
        let mut ev = RequestEvent::new(server_ev, route.params, chain);
        record_request_id(&ev);

        let result = ev.next().await;
        Ok(Some(finish(ev, result, data_request).await))
    }
    .instrument(span)
    .await
}

fn record_request_id(ev: &RequestEvent) {
    Span::current().record("request_id", field::display(ev.request_id()));
}

/// Location enforcing the trailing-slash policy, if `pathname` violates it.
fn slash_redirect(pathname: &str, query: Option<&str>, trailing_slash: bool) -> Option<String> {
    let path = if trailing_slash && !pathname.ends_with('/') {
        format!("{}/", pathname)
    } else if !trailing_slash && pathname.len() > 1 && pathname.ends_with('/') {
        pathname.trim_end_matches('/').to_string()
    } else {
        return None;
    };
    Some(match query {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path,
    })
}

/// Convert the chain outcome into a committed response.
async fn finish(mut ev: RequestEvent, result: anyhow::Result<Flow>, data_request: bool) -> HandledResponse {
    let outcome = match result {
        Ok(Flow::Error(response)) => Ok(Some(response)),
        Ok(flow) => {
            debug!(flow = flow.name(), status = ev.status(), "chain finished");
            Ok(None)
        }
        Err(err) => err.downcast::<ErrorResponse>().map(Some),
    };

    let error = match outcome {
        Ok(None) => None,
        Ok(Some(response)) => send_error_response(&mut ev, &response, data_request).await.err(),
        Err(err) => Some(err),
    };

    match &error {
        None => {
            if let Err(err) = ev.close_stream().await {
                warn!(error = %err, "failed to close response stream");
            }
        }
        Some(err) if ev.headers_sent() => {
            error!(error = %format!("{:#}", err), "request failed after response was committed");
            if let Err(err) = ev.close_stream().await {
                warn!(error = %err, "failed to close response stream");
            }
        }
        Some(_) => {}
    }

    record_timing(&Span::current(), ev.status(), ev.timing());
    debug!(status = ev.status(), state = ev.state().as_str(), "request finished");

    HandledResponse {
        status: ev.status(),
        event: ev,
        error,
    }
}

async fn send_error_response(
    ev: &mut RequestEvent,
    response: &ErrorResponse,
    data_request: bool,
) -> anyhow::Result<()> {
    if ev.headers_sent() {
        warn!(status = response.status, message = %response.message, "error raised after commit, not rendered");
        return Ok(());
    }

    debug!(status = response.status, "rendering error response");
    if data_request {
        let body = json!({ "status": response.status, "message": response.message });
        ev.json(response.status, &body).await?;
    } else {
        ev.html(response.status, get_error_html(response.status, &response.message))
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Path Tests ===

    #[test]
    fn test_strip_data_suffix() {
        assert_eq!(strip_data_suffix("/actions/q-data.json"), ("/actions/", true));
        assert_eq!(strip_data_suffix("/q-data.json"), ("/", true));
        assert_eq!(strip_data_suffix("/actions/"), ("/actions/", false));
    }

    #[test]
    fn test_slash_redirect_adds_slash() {
        assert_eq!(slash_redirect("/actions", None, true).as_deref(), Some("/actions/"));
        assert_eq!(
            slash_redirect("/actions", Some("size=large"), true).as_deref(),
            Some("/actions/?size=large")
        );
        assert_eq!(slash_redirect("/actions/", None, true), None);
    }

    #[test]
    fn test_slash_redirect_removes_slash() {
        assert_eq!(slash_redirect("/actions/", None, false).as_deref(), Some("/actions"));
        assert_eq!(slash_redirect("/", None, false), None);
        assert_eq!(slash_redirect("/actions", None, false), None);
    }
}
