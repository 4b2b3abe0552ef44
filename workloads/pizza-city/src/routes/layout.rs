//! Root layout shared by every page.

use chrono::{SecondsFormat, Utc};
use edge_sdk::prelude::*;
use futures::FutureExt;
use serde_json::{json, Value};

/// Id of the root loader.
pub const ROOT_LOADER_ID: &str = "root";

/// Header naming the application on every response.
pub const POWERED_BY_HEADER: &str = "x-powered-by";

/// Loader shared by every page: the time the page was produced.
pub fn root_loader() -> ServerLoader {
    ServerLoader::new("rootLoader", |_ev| {
        async {
            Ok(json!({
                "serverTime": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }))
        }
        .boxed()
    })
    .with_id(ROOT_LOADER_ID)
}

pub fn layout() -> RouteModule {
    RouteModule::new("layout")
        .on_request(handler_fn(|ev| {
            async move {
                ev.headers_mut()?.set(POWERED_BY_HEADER, "edge-city")?;
                if ev.method() == Method::GET {
                    ev.cache_control(CacheControl::public().with_max_age(60).with_swr(300))?;
                }
                ev.next().await
            }
            .boxed()
        }))
        .loader(root_loader())
        .head(
            DocumentHead::new()
                .with_meta(HeadMeta::new("viewport", "width=device-width, initial-scale=1").with_key("viewport")),
        )
        .component(|ev: &RequestEvent, children: &str| {
            let server_time = ev
                .loader_results()
                .get(ROOT_LOADER_ID)
                .and_then(|root| root.get("serverTime"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            anyhow::Ok(format!(
                "<main><header><a href=\"/\">{}</a></header><time>{}</time><section>{}</section></main>",
                crate::APP_NAME,
                server_time,
                children
            ))
        })
}
