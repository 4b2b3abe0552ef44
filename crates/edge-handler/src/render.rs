//! Page rendering.
//!
//! The pipeline treats rendering as opaque: a [`Renderer`] receives the
//! event (already carrying every loader result) and streams HTML through
//! [`RequestEvent::write`]. [`ComponentRenderer`] is the default, composing
//! each module's [`Component`](edge_router::Component) into a document shell.

use std::sync::Arc;

use async_trait::async_trait;
use edge_core::RequestEvent;
use edge_router::{ContentMenu, ResolvedHead, RouteModule};

use crate::error_page::escape_html;
use crate::page_data::PageData;

/// Id of the script element carrying the serialized page data.
pub const PAGE_DATA_SCRIPT_ID: &str = "edge-city-data";

/// Everything a renderer needs besides the event.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Route modules, outermost layout first.
    pub modules: Vec<Arc<RouteModule>>,
    /// Menu of the current section.
    pub menu: Option<ContentMenu>,
    /// Merged document head.
    pub head: ResolvedHead,
    /// Client bundles the route needs.
    pub route_bundle_names: Vec<String>,
    /// Snapshot of loader and action results.
    pub page_data: PageData,
}

/// Streams a page's HTML into the response.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, ev: &mut RequestEvent, ctx: &RenderContext) -> anyhow::Result<()>;
}

/// Merge the document head of every module.
///
/// The leaf applies first, so layouts have the final say on keyed entries
/// and title.
pub fn resolve_head(ev: &RequestEvent, modules: &[Arc<RouteModule>]) -> ResolvedHead {
    let mut head = ResolvedHead::default();
    for module in modules.iter().rev() {
        if let Some(head_fn) = module.get_head() {
            head.apply(head_fn(ev));
        }
    }
    head
}

/// Default renderer: nests component output inside-out and wraps it in a
/// minimal HTML document.
#[derive(Debug, Clone)]
pub struct ComponentRenderer {
    lang: String,
    bundle_base: String,
}

impl Default for ComponentRenderer {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            bundle_base: "/build/".to_string(),
        }
    }
}

impl ComponentRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallback `lang` attribute when the request has no locale.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Path prefix for route bundle scripts.
    pub fn with_bundle_base(mut self, base: impl Into<String>) -> Self {
        self.bundle_base = base.into();
        self
    }

    fn shell_start(&self, ev: &RequestEvent, ctx: &RenderContext) -> String {
        let lang = if ev.locale().is_empty() { self.lang.as_str() } else { ev.locale() };

        let mut head = String::new();
        for meta in &ctx.head.meta {
            head.push_str(&format!(
                r#"<meta name="{}" content="{}">"#,
                escape_html(&meta.name),
                escape_html(&meta.content)
            ));
        }
        for link in &ctx.head.links {
            head.push_str(&format!(
                r#"<link rel="{}" href="{}">"#,
                escape_html(&link.rel),
                escape_html(&link.href)
            ));
        }
        for bundle in &ctx.route_bundle_names {
            head.push_str(&format!(
                r#"<link rel="modulepreload" href="{}{}">"#,
                escape_html(&self.bundle_base),
                escape_html(bundle)
            ));
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<title>{title}</title>
{head}
</head>
<body>
"#,
            lang = escape_html(lang),
            title = escape_html(&ctx.head.title),
        )
    }
}

#[async_trait]
impl Renderer for ComponentRenderer {
    async fn render(&self, ev: &mut RequestEvent, ctx: &RenderContext) -> anyhow::Result<()> {
        let mut body = String::new();
        for module in ctx.modules.iter().rev() {
            if let Some(component) = module.get_component() {
                body = component.render(ev, &body)?;
            }
        }

        // `</` must not appear inside the script element.
        let data = serde_json::to_string(&ctx.page_data)?.replace("</", "<\\/");

        let start = self.shell_start(ev, ctx);
        ev.write(start).await?;
        ev.write(body).await?;
        ev.write(format!(
            "\n<script type=\"application/json\" id=\"{}\">{}</script>\n</body>\n</html>\n",
            PAGE_DATA_SCRIPT_ID, data
        ))
        .await?;
        Ok(())
    }
}
