//! Inbound request context.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::Method;
use serde::de::DeserializeOwned;

use crate::error::CoreError;
use crate::headers::{header_names, Headers};

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extracted route parameters (e.g., `slug` from `/blog/[slug]/`).
pub type PathParams = BTreeMap<String, String>;

/// Query string parameters; the last value wins for repeated keys.
pub type QueryParams = BTreeMap<String, String>;

/// Decoded `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    /// Parse a urlencoded body.
    pub fn parse(body: &[u8]) -> Self {
        Self {
            entries: url::form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// Build from explicit pairs.
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            entries: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in submission order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// All entries.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert into a JSON object; repeated keys become arrays.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (k, v) in &self.entries {
            match map.get_mut(k) {
                Some(serde_json::Value::Array(items)) => items.push(v.clone().into()),
                Some(existing) => {
                    let first = existing.take();
                    *existing = serde_json::Value::Array(vec![first, v.clone().into()]);
                }
                None => {
                    map.insert(k.clone(), v.clone().into());
                }
            }
        }
        serde_json::Value::Object(map)
    }
}

/// The inbound request as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: String,
    /// Request headers.
    pub headers: Headers,
    /// Raw request body.
    pub body: Bytes,
}

impl RequestContext {
    /// Create a request with no headers and an empty body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, CoreError> {
        self.headers.set(name, value)?;
        Ok(self)
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The raw `Cookie` header.
    pub fn cookie_header(&self) -> Option<&str> {
        self.headers.get(header_names::COOKIE)
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<String, CoreError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| CoreError::InvalidBody(format!("Invalid UTF-8: {}", e)))
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CoreError> {
        serde_json::from_slice(&self.body).map_err(|e| CoreError::InvalidBody(e.to_string()))
    }

    /// Body decoded as urlencoded form data.
    pub fn form_data(&self) -> FormData {
        FormData::parse(&self.body)
    }
}
