//! Worker protocol types.

use std::time::Duration;

use edge_core::PathParams;
use serde::{Deserialize, Serialize};

/// One pathname to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoute {
    /// Normalized pathname, base included.
    pub pathname: String,
    /// Parameters the pathname was built from.
    #[serde(default)]
    pub params: PathParams,
}

impl StaticRoute {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            params: PathParams::new(),
        }
    }

    pub fn with_params(mut self, params: PathParams) -> Self {
        self.params = params;
        self
    }
}

/// Outcome of rendering one pathname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticWorkerRenderResult {
    pub pathname: String,
    /// Absolute URL the page was requested at.
    pub url: String,
    /// Status was 2xx and the page was HTML.
    pub ok: bool,
    /// Normalized failure, if the render raised one.
    pub error: Option<String>,
    /// Page does not depend on the request.
    pub is_static: bool,
}

impl StaticWorkerRenderResult {
    /// A result that has not succeeded yet.
    pub fn new(pathname: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            url: url.into(),
            ok: false,
            error: None,
            is_static: true,
        }
    }
}

/// Message sent to a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Render one pathname.
    Render(StaticRoute),
    /// Finish every pending render, then acknowledge.
    Close,
}

impl WorkerMessage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Render(_) => "render",
            Self::Close => "close",
        }
    }
}

/// Reply from a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerResponse {
    Render(StaticWorkerRenderResult),
    Close,
}

/// Summary of a generation run.
#[derive(Debug, Clone, Default)]
pub struct StaticGenerateResult {
    /// Wall time of the whole run.
    pub duration: Duration,
    /// Pages written successfully.
    pub rendered: usize,
    /// Pages that raised an error.
    pub errors: usize,
    /// Pathnames that rendered and are request-independent.
    pub static_paths: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_is_pending() {
        let result = StaticWorkerRenderResult::new("/", "http://localhost/");

        assert!(!result.ok);
        assert!(result.error.is_none());
        assert!(result.is_static);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = StaticWorkerRenderResult::new("/", "http://localhost/");

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["isStatic"], true);
        assert!(json["error"].is_null());
    }
}
