//! Lazy module loaders.

use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

type LoadFn<T> = dyn Fn() -> BoxFuture<'static, anyhow::Result<Arc<T>>> + Send + Sync;

/// Produces a module on demand.
///
/// The id identifies the module in the [`ModuleCache`](crate::ModuleCache)
/// and deduplicates loads within one route resolution.
pub struct ModuleLoader<T> {
    id: String,
    load: Arc<LoadFn<T>>,
}

impl<T: Send + Sync + 'static> ModuleLoader<T> {
    /// Create a loader from an async factory.
    pub fn new<F>(id: impl Into<String>, load: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, anyhow::Result<Arc<T>>> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            load: Arc::new(load),
        }
    }

    /// Create a loader for an already-built module.
    pub fn ready(id: impl Into<String>, module: T) -> Self {
        let module = Arc::new(module);
        Self::new(id, move || {
            let module = module.clone();
            async move { Ok(module) }.boxed()
        })
    }

    /// Module identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Load the module.
    pub fn load(&self) -> BoxFuture<'static, anyhow::Result<Arc<T>>> {
        (self.load)()
    }
}

impl<T> Clone for ModuleLoader<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            load: self.load.clone(),
        }
    }
}

impl<T> fmt::Debug for ModuleLoader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader").field("id", &self.id).finish()
    }
}
