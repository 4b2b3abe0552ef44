//! Landing page.

use edge_sdk::prelude::*;

pub fn index() -> RouteModule {
    RouteModule::new("index")
        .head(DocumentHead::new().with_title("Welcome"))
        .component(|_ev: &RequestEvent, _children: &str| {
            anyhow::Ok(
                "<h1>Welcome to Pizza City</h1><p><a href=\"/actions/\">Build your pizza</a></p>".to_string(),
            )
        })
}
