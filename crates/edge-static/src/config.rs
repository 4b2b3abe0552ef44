//! Static generation configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use edge_handler::CityConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::StaticError;

/// Options for one static generation run.
///
/// Loaded from `edge.toml` (or `edge.json`):
///
/// ```toml
/// origin = "https://pizza.example"
/// out_dir = "dist"
/// max_workers = 4
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticGenerateOptions {
    /// Origin the synthetic requests are made against.
    pub origin: String,
    /// Output directory.
    pub out_dir: PathBuf,
    /// Write page HTML files.
    pub emit_html: bool,
    /// Write `q-data.json` files next to pages.
    pub emit_data: bool,
    /// Worker count; defaults to one less than the CPU count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    /// Renders in flight per worker.
    pub max_tasks_per_worker: usize,
    /// Page pathnames end with a slash.
    pub trailing_slash: bool,
    /// Path prefix every page lives under.
    pub base_pathname: String,
}

impl Default for StaticGenerateOptions {
    fn default() -> Self {
        Self {
            origin: "http://localhost".to_string(),
            out_dir: PathBuf::from("dist"),
            emit_html: true,
            emit_data: true,
            max_workers: None,
            max_tasks_per_worker: 20,
            trailing_slash: true,
            base_pathname: "/".to_string(),
        }
    }
}

impl StaticGenerateOptions {
    /// Create options writing to `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_emit_html(mut self, enabled: bool) -> Self {
        self.emit_html = enabled;
        self
    }

    pub fn with_emit_data(mut self, enabled: bool) -> Self {
        self.emit_data = enabled;
        self
    }

    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    pub fn with_max_tasks_per_worker(mut self, tasks: usize) -> Self {
        self.max_tasks_per_worker = tasks;
        self
    }

    pub fn with_trailing_slash(mut self, enabled: bool) -> Self {
        self.trailing_slash = enabled;
        self
    }

    pub fn with_base_pathname(mut self, base: impl Into<String>) -> Self {
        self.base_pathname = base.into();
        self
    }

    /// Worker count to spawn, at least one.
    pub fn worker_count(&self) -> usize {
        self.max_workers
            .unwrap_or_else(|| num_cpus::get().saturating_sub(1))
            .max(1)
    }

    /// Check that `origin` is an absolute http(s) URL with a host.
    pub fn validate(&self) -> Result<(), StaticError> {
        let invalid = |reason: &str| StaticError::InvalidOrigin {
            origin: self.origin.clone(),
            reason: reason.to_string(),
        };
        let url = Url::parse(&self.origin).map_err(|err| invalid(&err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host"));
        }
        Ok(())
    }

    /// Check that these options agree with the app being generated.
    ///
    /// The app redirects pathnames that break its slash policy, so a
    /// disagreeing run would render nothing but redirects.
    pub fn check_plan(&self, config: &CityConfig) -> Result<(), StaticError> {
        if self.trailing_slash != config.trailing_slash {
            return Err(StaticError::TrailingSlashMismatch {
                options: self.trailing_slash,
                plan: config.trailing_slash,
            });
        }
        Ok(())
    }
}

/// Load options from a TOML file, or JSON when the extension is `.json`.
pub fn load_options(path: impl AsRef<Path>) -> Result<StaticGenerateOptions> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
    } else {
        toml::from_str(&content).with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Default Tests ===

    #[test]
    fn test_defaults() {
        let options = StaticGenerateOptions::default();

        assert!(options.emit_html);
        assert!(options.emit_data);
        assert_eq!(options.max_tasks_per_worker, 20);
        assert!(options.trailing_slash);
        assert_eq!(options.base_pathname, "/");
        assert!(options.worker_count() >= 1);
    }

    #[test]
    fn test_worker_count_at_least_one() {
        let options = StaticGenerateOptions::default().with_max_workers(0);
        assert_eq!(options.worker_count(), 1);
    }

    // === Validation Tests ===

    #[test]
    fn test_validate_origin() {
        assert!(StaticGenerateOptions::default().validate().is_ok());
        assert!(StaticGenerateOptions::default()
            .with_origin("https://pizza.example:8443")
            .validate()
            .is_ok());

        let err = StaticGenerateOptions::default().with_origin("pizza.example").validate().unwrap_err();
        assert!(matches!(err, StaticError::InvalidOrigin { .. }));

        let err = StaticGenerateOptions::default().with_origin("ftp://pizza.example").validate().unwrap_err();
        assert!(err.to_string().contains("scheme must be http or https"));
    }

    #[test]
    fn test_check_plan_trailing_slash() {
        let config = CityConfig::default();
        assert!(StaticGenerateOptions::default().check_plan(&config).is_ok());

        let err = StaticGenerateOptions::default()
            .with_trailing_slash(false)
            .check_plan(&config)
            .unwrap_err();
        assert!(matches!(
            err,
            StaticError::TrailingSlashMismatch {
                options: false,
                plan: true
            }
        ));

        let config = CityConfig::default().with_trailing_slash(false);
        assert!(StaticGenerateOptions::default()
            .with_trailing_slash(false)
            .check_plan(&config)
            .is_ok());
    }

    // === Loading Tests ===

    #[test]
    fn test_load_toml_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.toml");
        std::fs::write(&path, "origin = \"https://pizza.example\"\nmax_workers = 3\nemit_data = false\n").unwrap();

        let options = load_options(&path).unwrap();

        assert_eq!(options.origin, "https://pizza.example");
        assert_eq!(options.max_workers, Some(3));
        assert!(!options.emit_data);
        assert!(options.emit_html);
        assert_eq!(options.out_dir, PathBuf::from("dist"));
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.json");
        std::fs::write(&path, r#"{"out_dir": "public", "trailing_slash": false}"#).unwrap();

        let options = load_options(&path).unwrap();

        assert_eq!(options.out_dir, PathBuf::from("public"));
        assert!(!options.trailing_slash);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_options("/nonexistent/edge.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.toml");
        std::fs::write(&path, "max_workers = \"many\"").unwrap();

        let err = load_options(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse TOML config"));
    }
}
