//! CityApp configuration and setup.

use std::fmt;
use std::sync::Arc;

use edge_router::{MenuData, ModuleCache, RouteData};

use crate::render::{ComponentRenderer, Renderer};

/// Configuration for a city app.
#[derive(Debug, Clone)]
pub struct CityConfig {
    /// Application name.
    pub name: String,
    /// Pages live at slash-terminated paths.
    pub trailing_slash: bool,
    /// Reuse loaded modules across requests.
    pub cache_modules: bool,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            name: "EdgeCity".to_string(),
            trailing_slash: true,
            cache_modules: true,
        }
    }
}

impl CityConfig {
    /// Create a new configuration with the given app name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Enable or disable slash-terminated page paths.
    pub fn with_trailing_slash(mut self, enabled: bool) -> Self {
        self.trailing_slash = enabled;
        self
    }

    /// Enable or disable the cross-request module cache.
    pub fn with_cache_modules(mut self, enabled: bool) -> Self {
        self.cache_modules = enabled;
        self
    }
}

/// City app builder.
///
/// # Example
///
/// ```rust,ignore
/// let plan = CityApp::new("pizza-city")
///     .with_trailing_slash(true)
///     .route(RouteData::from_path("/", vec![layout, index])?)
///     .build();
/// ```
pub struct CityApp {
    config: CityConfig,
    routes: Vec<RouteData>,
    menus: Vec<MenuData>,
    renderer: Arc<dyn Renderer>,
}

impl CityApp {
    /// Create a new app with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: CityConfig::new(name),
            routes: Vec::new(),
            menus: Vec::new(),
            renderer: Arc::new(ComponentRenderer::default()),
        }
    }

    /// Enable or disable slash-terminated page paths.
    pub fn with_trailing_slash(mut self, enabled: bool) -> Self {
        self.config = self.config.with_trailing_slash(enabled);
        self
    }

    /// Enable or disable the cross-request module cache.
    pub fn with_cache_modules(mut self, enabled: bool) -> Self {
        self.config = self.config.with_cache_modules(enabled);
        self
    }

    /// Replace the page renderer.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Register a route. Routes are matched in registration order.
    pub fn route(mut self, route: RouteData) -> Self {
        self.routes.push(route);
        self
    }

    /// Register a section menu.
    pub fn menu(mut self, menu: MenuData) -> Self {
        self.menus.push(menu);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &CityConfig {
        &self.config
    }

    /// Build the plan requests are served from.
    pub fn build(self) -> CityPlan {
        CityPlan {
            inner: Arc::new(PlanInner {
                config: self.config,
                routes: self.routes,
                menus: self.menus,
                renderer: self.renderer,
            }),
            cache: ModuleCache::new(),
        }
    }
}

struct PlanInner {
    config: CityConfig,
    routes: Vec<RouteData>,
    menus: Vec<MenuData>,
    renderer: Arc<dyn Renderer>,
}

/// Everything needed to serve requests for one app. Cheap to clone.
#[derive(Clone)]
pub struct CityPlan {
    inner: Arc<PlanInner>,
    cache: ModuleCache,
}

impl CityPlan {
    /// Get the configuration.
    pub fn config(&self) -> &CityConfig {
        &self.inner.config
    }

    /// Route table, in match order.
    pub fn routes(&self) -> &[RouteData] {
        &self.inner.routes
    }

    /// Section menus.
    pub fn menus(&self) -> &[MenuData] {
        &self.inner.menus
    }

    /// Page renderer.
    pub fn renderer(&self) -> Arc<dyn Renderer> {
        self.inner.renderer.clone()
    }

    /// Module cache shared by every request served from this plan.
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }
}

impl fmt::Debug for CityPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CityPlan")
            .field("config", &self.inner.config)
            .field("routes", &self.inner.routes.len())
            .field("menus", &self.inner.menus.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === CityConfig Tests ===

    #[test]
    fn test_city_config_default() {
        let config = CityConfig::default();

        assert_eq!(config.name, "EdgeCity");
        assert!(config.trailing_slash);
        assert!(config.cache_modules);
    }

    #[test]
    fn test_city_config_builder_chain() {
        let config = CityConfig::new("Pizza")
            .with_trailing_slash(false)
            .with_cache_modules(false);

        assert_eq!(config.name, "Pizza");
        assert!(!config.trailing_slash);
        assert!(!config.cache_modules);
    }

    // === CityApp Tests ===

    #[test]
    fn test_city_app_new() {
        let app = CityApp::new("TestApp");

        assert_eq!(app.config().name, "TestApp");
        assert!(app.config().trailing_slash);
    }

    #[test]
    fn test_city_app_build() {
        let plan = CityApp::new("BuildTest")
            .with_cache_modules(false)
            .route(RouteData::from_path("/", vec![]).unwrap())
            .route(RouteData::from_path("/actions/", vec![]).unwrap())
            .build();

        assert_eq!(plan.config().name, "BuildTest");
        assert!(!plan.config().cache_modules);
        assert_eq!(plan.routes().len(), 2);
        assert!(plan.menus().is_empty());
        assert!(plan.cache().is_empty());
    }

    #[test]
    fn test_plan_clones_share_cache() {
        let plan = CityApp::new("App").build();
        let clone = plan.clone();

        plan.cache().insert("m", Arc::new(1u8));

        assert_eq!(clone.cache().len(), 1);
    }
}
