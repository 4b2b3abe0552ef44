//! Pizza City - reference application for the edge request pipeline.
//!
//! This workload demonstrates:
//! - A root layout with a shared loader and request middleware
//! - A pizza builder page with several loaders and a form action
//! - Dynamic pizza pages enumerated for static generation
//! - A JSON endpoint living next to pages

mod routes;

use edge_sdk::edge_router::RouterError;
use edge_sdk::prelude::*;

pub use routes::*;

/// Name of the application.
pub const APP_NAME: &str = "Pizza City";

/// Application with every route and menu registered.
pub fn app() -> Result<CityApp, RouterError> {
    Ok(CityApp::new(APP_NAME)
        .route(RouteData::from_path("/", page("index", index()))?)
        .route(RouteData::from_path("/actions/", page("actions", actions()))?)
        .route(RouteData::from_path("/pizza/[slug]/", page("pizza", pizza()))?)
        .route(RouteData::from_path("/api/menu/", vec![ModuleLoader::ready("api", menu_api())])?)
        .menu(MenuData::new("/", ModuleLoader::ready("menu", MenuModule { menu: site_menu() }))))
}

/// Built plan of [`app`].
pub fn plan() -> Result<CityPlan, RouterError> {
    Ok(app()?.build())
}

fn page(name: &str, module: RouteModule) -> Vec<ModuleLoader<RouteModule>> {
    vec![ModuleLoader::ready("layout", layout()), ModuleLoader::ready(name, module)]
}

fn site_menu() -> ContentMenu {
    let pizzas = PIZZAS.iter().fold(ContentMenu::new("Pizzas"), |menu, pizza| {
        menu.with_item(ContentMenu::new(pizza.name).with_href(format!("/pizza/{}/", pizza.slug)))
    });
    ContentMenu::new(APP_NAME)
        .with_item(ContentMenu::new("Home").with_href("/"))
        .with_item(ContentMenu::new("Build your pizza").with_href("/actions/"))
        .with_item(pizzas)
}
