//! Coarse cache scopes for routes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::CacheControl;

/// Cache scope determining who can cache the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Cacheable by CDN and browser (shared cache).
    Public,
    /// Cacheable by browser only (private cache).
    Private,
    /// No caching.
    #[default]
    None,
}

impl CacheScope {
    /// Get the Cache-Control directive for this scope.
    pub fn cache_control_directive(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::None => "no-store",
        }
    }

    /// Check if this scope allows any caching.
    pub fn allows_caching(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Build a directive set for this scope with the given TTL.
    pub fn with_ttl(&self, ttl: Duration) -> CacheControl {
        match self {
            Self::Public => CacheControl::public().with_max_age(ttl.as_secs()),
            Self::Private => CacheControl::private().with_max_age(ttl.as_secs()),
            Self::None => CacheControl::no_store(),
        }
    }
}

impl From<CacheScope> for CacheControl {
    fn from(scope: CacheScope) -> Self {
        match scope {
            CacheScope::Public => CacheControl::public(),
            CacheScope::Private => CacheControl::private(),
            CacheScope::None => CacheControl::no_store(),
        }
    }
}
