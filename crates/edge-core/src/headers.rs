//! Case-insensitive header collection.

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::CoreError;

/// Well-known header names used by the pipeline.
pub mod header_names {
    pub const CACHE_CONTROL: &str = "Cache-Control";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const COOKIE: &str = "Cookie";
    pub const LOCATION: &str = "Location";
    pub const SET_COOKIE: &str = "Set-Cookie";
    pub const HOST: &str = "Host";
    pub const ACCEPT: &str = "Accept";
    pub const USER_AGENT: &str = "User-Agent";
}

/// Content types written by the pipeline.
pub mod content_types {
    pub const TEXT: &str = "text/plain; charset=utf-8";
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const JSON: &str = "application/json; charset=utf-8";
}

/// HTTP headers with case-insensitive lookup.
///
/// Thin wrapper over [`http::HeaderMap`]; names are normalised to lowercase
/// by the codec, so `get("content-type")` and `get("Content-Type")` agree.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: HeaderMap,
}

impl Headers {
    /// Create an empty header collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the first value for a header, if present and valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get every value for a header.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.inner
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Check whether a header is present.
    pub fn has(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Replace any existing values with `value`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), CoreError> {
        let (name, value) = parse_pair(name, value)?;
        self.inner.insert(name, value);
        Ok(())
    }

    /// Add a value without removing existing ones.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), CoreError> {
        let (name, value) = parse_pair(name, value)?;
        self.inner.append(name, value);
        Ok(())
    }

    /// Remove every value for a header.
    pub fn delete(&mut self, name: &str) {
        self.inner.remove(name);
    }

    /// Number of header values.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate `(name, value)` pairs; names are lowercase.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str(), v)))
    }

    /// Borrow the underlying map.
    pub fn as_header_map(&self) -> &HeaderMap {
        &self.inner
    }
}

impl From<HeaderMap> for Headers {
    fn from(inner: HeaderMap) -> Self {
        Self { inner }
    }
}

fn parse_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), CoreError> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| CoreError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| CoreError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.set("Content-Type", content_types::HTML).unwrap();

        assert_eq!(headers.get("content-type"), Some(content_types::HTML));
        assert_eq!(headers.get("CONTENT-TYPE"), Some(content_types::HTML));
        assert!(headers.has("Content-type"));
    }

    #[test]
    fn test_set_replaces_append_accumulates() {
        let mut headers = Headers::new();
        headers.set("X-Test", "a").unwrap();
        headers.set("X-Test", "b").unwrap();
        assert_eq!(headers.get_all("x-test"), vec!["b"]);

        headers.append("X-Test", "c").unwrap();
        assert_eq!(headers.get_all("x-test"), vec!["b", "c"]);
    }

    #[test]
    fn test_delete() {
        let mut headers = Headers::new();
        headers.set("Cache-Control", "no-store").unwrap();
        headers.delete("cache-control");

        assert!(!headers.has("Cache-Control"));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut headers = Headers::new();
        let err = headers.set("bad header", "x").unwrap_err();
        assert!(matches!(err, CoreError::InvalidHeader { .. }));

        let err = headers.set("X-Ok", "line\nbreak").unwrap_err();
        assert!(matches!(err, CoreError::InvalidHeader { .. }));
    }
}
