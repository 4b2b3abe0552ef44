//! `pizza-city render` - Render one request and print the response.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Args;
use edge_sdk::edge_core::header_names;
use edge_sdk::prelude::*;
use serde_json::json;

use crate::output::{status_badge, Output};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Request path, e.g. /actions/
    pub path: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Urlencoded form body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Origin the request is made against
    #[arg(long, default_value = "http://localhost")]
    pub origin: String,

    /// Print the status and headers only
    #[arg(short = 'I', long)]
    pub head: bool,
}

/// Build the request described by `args`.
pub fn build_request(args: &RenderArgs) -> Result<RequestContext> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid method: {}", args.method))?;
    let path = if args.path.starts_with('/') {
        args.path.clone()
    } else {
        format!("/{}", args.path)
    };
    let url = format!("{}{}", args.origin.trim_end_matches('/'), path);

    let mut request = RequestContext::new(method, url);
    if let Some(data) = &args.data {
        request = request
            .with_header(header_names::CONTENT_TYPE, "application/x-www-form-urlencoded")?
            .with_body(data.clone());
    }
    Ok(request)
}

pub async fn run(args: RenderArgs, output: &Output) -> Result<()> {
    let plan = pizza_city::plan().context("Failed to build the route plan")?;
    let request = build_request(&args)?;
    output.debug(&format!("{} {}", request.method, request.url));

    let response = serve(&plan, request).await?;
    let head = &response.head;

    if output.is_json() {
        let headers: BTreeMap<&str, &str> = head.headers.iter().collect();
        let body = (!args.head).then(|| response.text());
        output.json(&json!({
            "status": head.status,
            "headers": headers,
            "setCookies": head.set_cookies,
            "body": body,
        }));
        return Ok(());
    }

    output.info(&format!("Status {}", status_badge(head.status)));
    for (name, value) in head.headers.iter() {
        output.kv(name, value);
    }
    for cookie in &head.set_cookies {
        output.kv(header_names::SET_COOKIE, cookie);
    }
    if !args.head {
        output.raw("");
        output.raw(&response.text());
    }
    Ok(())
}
