//! Loader and action definitions.
//!
//! Every definition carries a stable id. The id keys the per-request loader
//! cache and is the value of the `qaction` query parameter that marks which
//! action a form submission targets.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::context::FormData;
use crate::request_event::RequestEvent;

/// Query parameter naming the submitted action.
pub const QACTION_KEY: &str = "qaction";

/// Loader or action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerFnKind {
    Loader,
    Action,
}

impl ServerFnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loader => "server_loader",
            Self::Action => "server_action",
        }
    }
}

/// Common view over loaders and actions.
pub trait ServerFunction {
    /// Stable identifier.
    fn id(&self) -> &str;

    /// Loader or action.
    fn kind(&self) -> ServerFnKind;
}

type LoaderFn = dyn for<'a> Fn(&'a mut RequestEvent) -> BoxFuture<'a, anyhow::Result<Value>> + Send + Sync;

type ActionFn =
    dyn for<'a> Fn(FormData, &'a mut RequestEvent) -> BoxFuture<'a, anyhow::Result<Value>> + Send + Sync;

/// Derive a stable id from a definition name: the first 10 hex digits of
/// `sha256("{kind}:{name}")`.
pub fn definition_hash(kind: ServerFnKind, name: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", kind.as_str(), name).as_bytes());
    digest.iter().take(5).map(|b| format!("{:02x}", b)).collect()
}

/// A server-only data fetch, memoized per request.
#[derive(Clone)]
pub struct ServerLoader {
    id: String,
    name: String,
    exec: Arc<LoaderFn>,
}

impl ServerLoader {
    /// Define a loader; its id is derived from `name`.
    pub fn new<F>(name: impl Into<String>, exec: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestEvent) -> BoxFuture<'a, anyhow::Result<Value>> + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            id: definition_hash(ServerFnKind::Loader, &name),
            name,
            exec: Arc::new(exec),
        }
    }

    /// Override the derived id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Definition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the loader. Callers go through [`RequestEvent::resolve_loader`]
    /// so the result is memoized.
    pub(crate) fn run<'a>(&self, ev: &'a mut RequestEvent) -> BoxFuture<'a, anyhow::Result<Value>> {
        (self.exec)(ev)
    }
}

impl ServerFunction for ServerLoader {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ServerFnKind {
        ServerFnKind::Loader
    }
}

impl fmt::Debug for ServerLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerLoader")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// A server-only mutation invoked on form submission.
#[derive(Clone)]
pub struct ServerAction {
    id: String,
    name: String,
    exec: Arc<ActionFn>,
}

impl ServerAction {
    /// Define an action; its id is derived from `name`.
    pub fn new<F>(name: impl Into<String>, exec: F) -> Self
    where
        F: for<'a> Fn(FormData, &'a mut RequestEvent) -> BoxFuture<'a, anyhow::Result<Value>>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        Self {
            id: definition_hash(ServerFnKind::Action, &name),
            name,
            exec: Arc::new(exec),
        }
    }

    /// Override the derived id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Definition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Form target for this action on `pathname`.
    pub fn action_path(&self, pathname: &str) -> String {
        format!("{}?{}={}", pathname, QACTION_KEY, self.id)
    }

    /// Run the action. Callers go through [`RequestEvent::run_action`].
    pub(crate) fn run<'a>(&self, form: FormData, ev: &'a mut RequestEvent) -> BoxFuture<'a, anyhow::Result<Value>> {
        (self.exec)(form, ev)
    }
}

impl ServerFunction for ServerAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ServerFnKind {
        ServerFnKind::Action
    }
}

impl fmt::Debug for ServerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerAction")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
