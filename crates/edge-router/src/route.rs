//! Route table entries.

use regex::Regex;

use crate::error::RouterError;
use crate::loader::ModuleLoader;
use crate::module::RouteModule;

/// One entry of the route table.
#[derive(Debug, Clone)]
pub struct RouteData {
    /// Anchored pattern matched against the pathname.
    pub pattern: Regex,
    /// Module loaders, outermost layout first, leaf last.
    pub loaders: Vec<ModuleLoader<RouteModule>>,
    /// Names of the pattern's capture groups, in order.
    pub param_names: Vec<String>,
    /// Declared path, e.g. `/blog/[slug]/`.
    pub original_pathname: String,
    /// Client bundles this route needs.
    pub bundle_names: Vec<String>,
}

impl RouteData {
    /// Create a route from an explicit regular expression.
    pub fn new(
        pattern: &str,
        loaders: Vec<ModuleLoader<RouteModule>>,
        param_names: Vec<String>,
        original_pathname: impl Into<String>,
    ) -> Result<Self, RouterError> {
        let pattern = Regex::new(pattern).map_err(|e| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern,
            loaders,
            param_names,
            original_pathname: original_pathname.into(),
            bundle_names: Vec::new(),
        })
    }

    /// Create a route from a declared path.
    ///
    /// `[name]` matches one segment, `[...name]` matches the rest of the
    /// path including slashes. A trailing slash is optional when matching.
    pub fn from_path(path: &str, loaders: Vec<ModuleLoader<RouteModule>>) -> Result<Self, RouterError> {
        let (pattern, param_names) = path_to_pattern(path);
        Self::new(&pattern, loaders, param_names, path)
    }

    /// Set the bundle names.
    pub fn with_bundle_names(mut self, names: Vec<String>) -> Self {
        self.bundle_names = names;
        self
    }

    /// Check if the route has no parameters.
    pub fn is_static(&self) -> bool {
        self.param_names.is_empty()
    }

    /// Build a concrete pathname by substituting `params` into the
    /// declared path. Returns `None` when a parameter is missing.
    pub fn build_pathname(&self, params: &edge_core::PathParams) -> Option<String> {
        let mut out = String::with_capacity(self.original_pathname.len());
        for (i, segment) in self.original_pathname.split('/').enumerate() {
            if i > 0 {
                out.push('/');
            }
            match parse_param(segment) {
                Some((name, _)) => out.push_str(params.get(name)?.trim_matches('/')),
                None => out.push_str(segment),
            }
        }
        Some(out)
    }
}

fn parse_param(segment: &str) -> Option<(&str, bool)> {
    let inner = segment.strip_prefix('[')?.strip_suffix(']')?;
    match inner.strip_prefix("...") {
        Some(rest) => Some((rest, true)),
        None => Some((inner, false)),
    }
}

fn path_to_pattern(path: &str) -> (String, Vec<String>) {
    let mut pattern = String::from("^");
    let mut names = Vec::new();
    let trimmed = path.trim_end_matches('/');

    for segment in trimmed.split('/').skip(1) {
        match parse_param(segment) {
            Some((name, true)) => {
                pattern.push_str("(?:/(.*))?");
                names.push(name.to_string());
            }
            Some((name, false)) => {
                pattern.push_str("/([^/]+?)");
                names.push(name.to_string());
            }
            None => {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }
    }
    pattern.push_str("/?$");
    (pattern, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::PathParams;

    #[test]
    fn test_root_pattern() {
        let route = RouteData::from_path("/", vec![]).unwrap();
        assert!(route.pattern.is_match("/"));
        assert!(!route.pattern.is_match("/about/"));
        assert!(route.is_static());
    }

    #[test]
    fn test_segment_param_pattern() {
        let route = RouteData::from_path("/blog/[slug]/", vec![]).unwrap();

        assert_eq!(route.param_names, vec!["slug"]);
        assert!(route.pattern.is_match("/blog/hello/"));
        assert!(route.pattern.is_match("/blog/hello"));
        assert!(!route.pattern.is_match("/blog/"));
        assert!(!route.pattern.is_match("/blog/a/b/"));
    }

    #[test]
    fn test_rest_param_pattern() {
        let route = RouteData::from_path("/docs/[...path]/", vec![]).unwrap();

        let caps = route.pattern.captures("/docs/guide/intro/").unwrap();
        assert_eq!(caps.get(1).map(|m| m.as_str()), Some("guide/intro/"));
        assert!(route.pattern.is_match("/docs/"));
    }

    #[test]
    fn test_literal_segments_are_escaped() {
        let route = RouteData::from_path("/a.b/", vec![]).unwrap();
        assert!(route.pattern.is_match("/a.b/"));
        assert!(!route.pattern.is_match("/axb/"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RouteData::new("(", vec![], vec![], "/").unwrap_err();
        assert!(matches!(err, RouterError::InvalidPattern { .. }));
    }

    #[test]
    fn test_build_pathname() {
        let route = RouteData::from_path("/blog/[slug]/", vec![]).unwrap();
        let mut params = PathParams::new();
        params.insert("slug".into(), "hello".into());

        assert_eq!(route.build_pathname(&params).as_deref(), Some("/blog/hello/"));
        assert_eq!(route.build_pathname(&PathParams::new()), None);
    }
}
