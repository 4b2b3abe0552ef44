//! Page data snapshot (`qData`).
//!
//! The snapshot carries every loader result and the executed action's
//! output. It is written to the shared map under `qData` before rendering,
//! served as JSON for `q-data.json` requests and emitted next to the HTML
//! during static generation.

use std::collections::BTreeMap;
use std::sync::Arc;

use edge_core::{RequestEvent, ServerFunction};
use edge_router::RouteModule;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shared-map key marking a page as request-dependent.
pub const DYNAMIC_KEY: &str = "@dynamic";

/// Output of the action executed by this request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutput {
    pub id: String,
    pub status: u16,
    pub result: Value,
}

/// Data a page was rendered with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    /// Loader results keyed by loader id.
    pub loaders: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionOutput>,
    pub status: u16,
    pub href: String,
    /// Whether the page may be served as a pre-rendered file.
    pub is_static: bool,
}

impl PageData {
    /// Snapshot the loader and action results of `ev` for `modules`.
    pub fn collect(ev: &RequestEvent, modules: &[Arc<RouteModule>]) -> Self {
        let loaders = modules
            .iter()
            .flat_map(|m| m.loaders())
            .filter_map(|loader| {
                let value = ev.get_data(loader).ok().flatten()?;
                Some((loader.id().to_string(), value.clone()))
            })
            .collect();

        let action = ev.action_id().and_then(|id| {
            ev.loader_results().get(id).map(|result| ActionOutput {
                id: id.to_string(),
                status: ev.status(),
                result: result.clone(),
            })
        });

        let is_static = action.is_none() && !ev.shared_map().contains_key(DYNAMIC_KEY);

        Self {
            loaders,
            action,
            status: ev.status(),
            href: ev.url().to_string(),
            is_static,
        }
    }
}

/// Mark the current page as request-dependent so it is not treated as
/// static output.
pub fn mark_dynamic(ev: &mut RequestEvent) {
    ev.shared_map_mut().insert(DYNAMIC_KEY.to_string(), Value::Bool(true));
}
