//! Route resolution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use edge_core::{PathParams, ServerFunction};
use futures::future::try_join_all;
use regex::Captures;
use tracing::debug;

use crate::cache::ModuleCache;
use crate::error::RouterError;
use crate::loader::ModuleLoader;
use crate::menu::{ContentMenu, MenuData, MenuModule};
use crate::module::RouteModule;
use crate::route::RouteData;

/// A matched route with its modules loaded.
#[derive(Debug, Clone)]
pub struct LoadedRoute {
    /// Parameters extracted from the pathname.
    pub params: PathParams,
    /// Modules, outermost layout first, leaf last.
    pub modules: Vec<Arc<RouteModule>>,
    /// Menu of the section containing the pathname.
    pub menu: Option<ContentMenu>,
    /// Client bundles the route needs.
    pub route_bundle_names: Vec<String>,
    /// Declared path of the matched route.
    pub route_name: String,
}

/// Resolve `pathname` against the route table.
///
/// The first matching route wins. Modules are loaded concurrently; a
/// loader id appearing more than once is loaded once. With
/// `cache_modules` set, loaded modules are reused across calls through
/// `cache`. Fails when two loaders or two actions of the route share an id.
pub async fn load_route(
    routes: &[RouteData],
    menus: &[MenuData],
    cache_modules: bool,
    pathname: &str,
    cache: &ModuleCache,
) -> Result<Option<LoadedRoute>, RouterError> {
    let Some((route, captures)) = routes
        .iter()
        .find_map(|route| route.pattern.captures(pathname).map(|caps| (route, caps)))
    else {
        debug!(pathname, "no route matched");
        return Ok(None);
    };

    let params = get_path_params(&route.param_names, Some(&captures));

    let mut unique: Vec<&ModuleLoader<RouteModule>> = Vec::new();
    for loader in &route.loaders {
        if !unique.iter().any(|l| l.id() == loader.id()) {
            unique.push(loader);
        }
    }

    let loads = unique.iter().map(|loader| load_module(*loader, cache, cache_modules));
    let menu_load = async {
        match get_menu_loader(menus, pathname) {
            Some(loader) => load_module(loader, cache, cache_modules).await.map(Some),
            None => Ok(None),
        }
    };
    let (loaded, menu) = futures::try_join!(try_join_all(loads), menu_load)?;
    check_server_fn_ids(&route.original_pathname, &loaded)?;

    let by_id: HashMap<&str, Arc<RouteModule>> = unique
        .iter()
        .map(|l| l.id())
        .zip(loaded)
        .collect();
    let modules = route
        .loaders
        .iter()
        .filter_map(|l| by_id.get(l.id()).cloned())
        .collect();

    debug!(pathname, route = %route.original_pathname, "route matched");

    Ok(Some(LoadedRoute {
        params,
        modules,
        menu: menu.map(|m: Arc<MenuModule>| m.menu.clone()),
        route_bundle_names: route.bundle_names.clone(),
        route_name: route.original_pathname.clone(),
    }))
}

async fn load_module<T: Send + Sync + 'static>(
    loader: &ModuleLoader<T>,
    cache: &ModuleCache,
    cache_modules: bool,
) -> Result<Arc<T>, RouterError> {
    if let Some(module) = cache.get::<T>(loader.id()) {
        return Ok(module);
    }

    let module = loader.load().await.map_err(|e| RouterError::ModuleLoad {
        id: loader.id().to_string(),
        reason: format!("{:#}", e),
    })?;

    if cache_modules {
        cache.insert(loader.id(), module.clone());
    }
    Ok(module)
}

/// Every loader id, and every action id, must be unique across a route's
/// modules.
pub fn check_server_fn_ids(route: &str, modules: &[Arc<RouteModule>]) -> Result<(), RouterError> {
    fn unique<'a, F: ServerFunction + 'a>(
        route: &str,
        fns: impl Iterator<Item = &'a F>,
    ) -> Result<(), RouterError> {
        let mut seen = HashSet::new();
        for f in fns {
            if !seen.insert(f.id()) {
                return Err(RouterError::DuplicateServerFn {
                    route: route.to_string(),
                    kind: f.kind().as_str(),
                    id: f.id().to_string(),
                });
            }
        }
        Ok(())
    }

    unique(route, modules.iter().flat_map(|m| m.loaders()))?;
    unique(route, modules.iter().flat_map(|m| m.actions()))
}

/// Menu whose prefix covers `pathname`.
pub fn get_menu_loader<'a>(menus: &'a [MenuData], pathname: &str) -> Option<&'a ModuleLoader<MenuModule>> {
    let pathname = if pathname.ends_with('/') {
        pathname.to_string()
    } else {
        format!("{}/", pathname)
    };
    menus
        .iter()
        .find(|m| m.prefix == pathname || pathname.starts_with(&m.prefix))
        .map(|m| &m.loader)
}

/// Pair capture groups with parameter names.
///
/// A missing capture becomes `""`; one trailing `/` is trimmed per value.
pub fn get_path_params(param_names: &[String], captures: Option<&Captures<'_>>) -> PathParams {
    param_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let value = captures
                .and_then(|caps| caps.get(i + 1))
                .map(|m| m.as_str())
                .unwrap_or("");
            let value = value.strip_suffix('/').unwrap_or(value);
            (name.clone(), value.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use edge_core::{definition_hash, ServerFnKind, ServerLoader};
    use futures::FutureExt;
    use regex::Regex;

    fn module(name: &str) -> ModuleLoader<RouteModule> {
        ModuleLoader::ready(name, RouteModule::new(name))
    }

    fn counting(name: &'static str, calls: Arc<AtomicUsize>) -> ModuleLoader<RouteModule> {
        ModuleLoader::new(name, move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(RouteModule::new(name)))
            }
            .boxed()
        })
    }

    // === Path Param Tests ===

    #[test]
    fn test_trailing_slash_trimmed() {
        let re = Regex::new(r"^/blog/(.*)$").unwrap();
        let caps = re.captures("/blog/hello/").unwrap();

        let params = get_path_params(&["slug".to_string()], Some(&caps));

        assert_eq!(params.get("slug").map(String::as_str), Some("hello"));
    }

    #[test]
    fn test_only_one_slash_trimmed() {
        let re = Regex::new(r"^/docs/(.*)$").unwrap();
        let caps = re.captures("/docs/a//").unwrap();

        let params = get_path_params(&["path".to_string()], Some(&caps));

        assert_eq!(params["path"], "a/");
    }

    #[test]
    fn test_missing_capture_is_empty() {
        let names = vec!["a".to_string(), "b".to_string()];

        let params = get_path_params(&names, None);

        assert_eq!(params["a"], "");
        assert_eq!(params["b"], "");
    }

    // === Menu Tests ===

    #[test]
    fn test_menu_prefix_match() {
        let docs = MenuData::new("/docs/", ModuleLoader::ready("docs-menu", MenuModule::default()));
        let menus = vec![docs];

        assert_eq!(get_menu_loader(&menus, "/docs").map(|l| l.id()), Some("docs-menu"));
        assert_eq!(get_menu_loader(&menus, "/docs/guide/").map(|l| l.id()), Some("docs-menu"));
        assert!(get_menu_loader(&menus, "/documents/").is_none());
        assert!(get_menu_loader(&[], "/docs/").is_none());
    }

    // === Load Route Tests ===

    #[tokio::test]
    async fn test_first_matching_route_wins() {
        let routes = vec![
            RouteData::from_path("/blog/[slug]/", vec![module("layout"), module("post")]).unwrap(),
            RouteData::from_path("/blog/[...rest]/", vec![module("layout"), module("catch-all")]).unwrap(),
        ];
        let cache = ModuleCache::new();

        let loaded = load_route(&routes, &[], true, "/blog/hello/", &cache)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.params["slug"], "hello");
        assert_eq!(loaded.route_name, "/blog/[slug]/");
        let names: Vec<&str> = loaded.modules.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["layout", "post"]);
    }

    #[tokio::test]
    async fn test_no_match() {
        let routes = vec![RouteData::from_path("/", vec![module("index")]).unwrap()];
        let cache = ModuleCache::new();

        let loaded = load_route(&routes, &[], true, "/missing/", &cache).await.unwrap();

        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_modules_cached_across_requests() {
        let calls = Arc::new(AtomicUsize::new(0));
        let routes = vec![RouteData::from_path("/", vec![counting("index", calls.clone())]).unwrap()];
        let cache = ModuleCache::new();

        load_route(&routes, &[], true, "/", &cache).await.unwrap();
        load_route(&routes, &[], true, "/", &cache).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_bypassed_when_disabled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let routes = vec![RouteData::from_path("/", vec![counting("index", calls.clone())]).unwrap()];
        let cache = ModuleCache::new();

        load_route(&routes, &[], false, "/", &cache).await.unwrap();
        load_route(&routes, &[], false, "/", &cache).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_loader_loaded_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let shared = counting("shared", calls.clone());
        let routes = vec![RouteData::from_path("/", vec![shared.clone(), shared]).unwrap()];
        let cache = ModuleCache::new();

        let loaded = load_route(&routes, &[], false, "/", &cache)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(loaded.modules.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_loader_names_rejected() {
        let data = |value: &'static str| {
            ServerLoader::new("data", move |_ev| async move { Ok(serde_json::json!(value)) }.boxed())
        };
        let layout = ModuleLoader::ready("layout", RouteModule::new("layout").loader(data("layout-data")));
        let page = ModuleLoader::ready("page", RouteModule::new("page").loader(data("page-data")));
        let routes = vec![RouteData::from_path("/", vec![layout, page]).unwrap()];
        let cache = ModuleCache::new();

        let err = load_route(&routes, &[], true, "/", &cache).await.unwrap_err();

        match err {
            RouterError::DuplicateServerFn { route, kind, id } => {
                assert_eq!(route, "/");
                assert_eq!(kind, "server_loader");
                assert_eq!(id, definition_hash(ServerFnKind::Loader, "data"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_distinct_server_fn_ids_accepted() {
        let loader = |name: &str| ServerLoader::new(name, |_ev| async { Ok(serde_json::Value::Null) }.boxed());
        let modules = vec![
            Arc::new(RouteModule::new("layout").loader(loader("root"))),
            Arc::new(RouteModule::new("page").loader(loader("toppings")).loader(loader("crust"))),
        ];

        assert!(check_server_fn_ids("/", &modules).is_ok());
    }

    #[tokio::test]
    async fn test_menu_loaded() {
        let routes = vec![RouteData::from_path("/docs/[...path]/", vec![module("docs")]).unwrap()];
        let menu = MenuModule {
            menu: ContentMenu::new("Docs").with_item(ContentMenu::new("Intro").with_href("/docs/intro/")),
        };
        let menus = vec![MenuData::new("/docs/", ModuleLoader::ready("docs-menu", menu))];
        let cache = ModuleCache::new();

        let loaded = load_route(&routes, &menus, true, "/docs/intro/", &cache)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded.params["path"], "intro");
        assert_eq!(loaded.menu.map(|m| m.items.len()), Some(1));
    }

    #[tokio::test]
    async fn test_module_load_failure() {
        let failing = ModuleLoader::<RouteModule>::new("broken", || {
            async { Err::<Arc<RouteModule>, _>(anyhow::anyhow!("missing file")) }.boxed()
        });
        let routes = vec![RouteData::from_path("/", vec![failing]).unwrap()];
        let cache = ModuleCache::new();

        let err = load_route(&routes, &[], true, "/", &cache).await.unwrap_err();

        assert!(matches!(err, RouterError::ModuleLoad { ref id, .. } if id == "broken"));
    }
}
