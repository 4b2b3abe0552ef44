//! Cross-request module cache.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;

/// Loaded modules keyed by loader id.
///
/// Shared by every request served by one app; entries are only ever added.
#[derive(Clone, Default)]
pub struct ModuleCache {
    inner: Arc<DashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl ModuleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached module for `id`, if it has type `T`.
    pub fn get<T: Send + Sync + 'static>(&self, id: &str) -> Option<Arc<T>> {
        let entry = self.inner.get(id)?;
        entry.value().clone().downcast::<T>().ok()
    }

    /// Store a module; an existing entry for `id` is kept.
    pub fn insert<T: Send + Sync + 'static>(&self, id: &str, module: Arc<T>) {
        self.inner.entry(id.to_string()).or_insert(module);
    }

    /// Number of cached modules.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for ModuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCache").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_lookup() {
        let cache = ModuleCache::new();
        cache.insert("crust", Arc::new(String::from("thin")));

        assert_eq!(cache.get::<String>("crust").as_deref().map(String::as_str), Some("thin"));
        assert!(cache.get::<u32>("crust").is_none());
        assert!(cache.get::<String>("size").is_none());
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = ModuleCache::new();
        cache.insert("crust", Arc::new(1u32));
        cache.insert("crust", Arc::new(2u32));

        assert_eq!(cache.get::<u32>("crust").map(|v| *v), Some(1));
        assert_eq!(cache.len(), 1);
    }
}
