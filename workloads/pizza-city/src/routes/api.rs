//! JSON endpoint listing the menu.

use edge_sdk::prelude::*;
use futures::FutureExt;
use serde_json::json;

use super::PIZZAS;

pub fn menu_api() -> RouteModule {
    RouteModule::new("api").on_get(handler_fn(|ev| {
        async move {
            ev.cache_control(CacheScope::Public.with_ttl(std::time::Duration::from_secs(300)))?;
            let pizzas: Vec<_> = PIZZAS
                .iter()
                .map(|p| json!({ "slug": p.slug, "name": p.name, "price": p.price }))
                .collect();
            ev.json(200, &json!({ "pizzas": pizzas })).await
        }
        .boxed()
    }))
}
