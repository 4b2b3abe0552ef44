//! Structured Cache-Control directive set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Seconds in one year, used by the `immutable` preset.
pub const ONE_YEAR_SECS: u64 = 31_536_000;

/// A structured set of Cache-Control directives.
///
/// Every unset option is omitted from the formatted header value. Directives
/// are always emitted in the same order so equal sets produce equal headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CacheControl {
    /// `public`: cacheable by shared caches.
    pub public: bool,
    /// `private`: cacheable by the browser only.
    pub private: bool,
    /// `no-cache`: revalidate before every use.
    pub no_cache: bool,
    /// `no-store`: never store.
    pub no_store: bool,
    /// `max-age` in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    /// `s-maxage` in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s_max_age: Option<u64>,
    /// `stale-while-revalidate` window in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_while_revalidate: Option<u64>,
    /// `stale-if-error` window in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_if_error: Option<u64>,
    /// `immutable`: the body never changes while fresh.
    pub immutable: bool,
    /// `must-revalidate`: stale responses must be revalidated.
    pub must_revalidate: bool,
}

impl CacheControl {
    /// An empty directive set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `public`.
    pub fn public() -> Self {
        Self {
            public: true,
            ..Default::default()
        }
    }

    /// Start from `private`.
    pub fn private() -> Self {
        Self {
            private: true,
            ..Default::default()
        }
    }

    /// `no-cache` only.
    pub fn no_cache() -> Self {
        Self {
            no_cache: true,
            ..Default::default()
        }
    }

    /// `no-store` only.
    pub fn no_store() -> Self {
        Self {
            no_store: true,
            ..Default::default()
        }
    }

    /// Long-lived immutable content: public, one year, immutable.
    pub fn immutable() -> Self {
        Self {
            public: true,
            immutable: true,
            max_age: Some(ONE_YEAR_SECS),
            stale_while_revalidate: Some(ONE_YEAR_SECS),
            ..Default::default()
        }
    }

    /// Numeric shorthand: the same number of seconds for `max-age`,
    /// `s-maxage` and `stale-while-revalidate`.
    pub fn from_seconds(secs: u64) -> Self {
        Self {
            max_age: Some(secs),
            s_max_age: Some(secs),
            stale_while_revalidate: Some(secs),
            ..Default::default()
        }
    }

    /// Set `max-age`.
    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age = Some(secs);
        self
    }

    /// Set `s-maxage`.
    pub fn with_s_max_age(mut self, secs: u64) -> Self {
        self.s_max_age = Some(secs);
        self
    }

    /// Set `stale-while-revalidate`.
    pub fn with_swr(mut self, secs: u64) -> Self {
        self.stale_while_revalidate = Some(secs);
        self
    }

    /// Set `stale-if-error`.
    pub fn with_stale_if_error(mut self, secs: u64) -> Self {
        self.stale_if_error = Some(secs);
        self
    }

    /// Add `immutable`.
    pub fn with_immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Add `must-revalidate`.
    pub fn with_must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    /// Merge another directive set into this one. Flags are OR-ed, numeric
    /// directives from `other` win when set.
    pub fn merge(mut self, other: &CacheControl) -> Self {
        self.public |= other.public;
        self.private |= other.private;
        self.no_cache |= other.no_cache;
        self.no_store |= other.no_store;
        self.immutable |= other.immutable;
        self.must_revalidate |= other.must_revalidate;
        self.max_age = other.max_age.or(self.max_age);
        self.s_max_age = other.s_max_age.or(self.s_max_age);
        self.stale_while_revalidate = other.stale_while_revalidate.or(self.stale_while_revalidate);
        self.stale_if_error = other.stale_if_error.or(self.stale_if_error);
        self
    }

    /// Check if no directive is set.
    pub fn is_empty(&self) -> bool {
        self.directives().is_empty()
    }

    /// The individual directives, in emission order.
    pub fn directives(&self) -> Vec<String> {
        let mut parts = Vec::new();

        if self.public {
            parts.push("public".to_string());
        }
        if self.private {
            parts.push("private".to_string());
        }
        if self.no_cache {
            parts.push("no-cache".to_string());
        }
        if self.no_store {
            parts.push("no-store".to_string());
        }
        if let Some(secs) = self.max_age {
            parts.push(format!("max-age={}", secs));
        }
        if let Some(secs) = self.s_max_age {
            parts.push(format!("s-maxage={}", secs));
        }
        if let Some(secs) = self.stale_while_revalidate {
            parts.push(format!("stale-while-revalidate={}", secs));
        }
        if let Some(secs) = self.stale_if_error {
            parts.push(format!("stale-if-error={}", secs));
        }
        if self.immutable {
            parts.push("immutable".to_string());
        }
        if self.must_revalidate {
            parts.push("must-revalidate".to_string());
        }

        parts
    }

    /// Format as a single `Cache-Control` header value.
    pub fn header_value(&self) -> String {
        self.directives().join(", ")
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}

impl From<u64> for CacheControl {
    fn from(secs: u64) -> Self {
        Self::from_seconds(secs)
    }
}
