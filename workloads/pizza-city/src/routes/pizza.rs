//! One page per pizza on the menu.

use edge_sdk::edge_handler::escape_html;
use edge_sdk::prelude::*;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;

pub const PIZZA_LOADER_ID: &str = "pizza";

/// A pizza on the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pizza {
    pub slug: &'static str,
    pub name: &'static str,
    pub toppings: &'static [&'static str],
    /// Price in cents.
    pub price: u32,
}

pub static PIZZAS: [Pizza; 3] = [
    Pizza {
        slug: "margherita",
        name: "Margherita",
        toppings: &["Tomato", "Mozzarella", "Basil"],
        price: 900,
    },
    Pizza {
        slug: "marinara",
        name: "Marinara",
        toppings: &["Tomato", "Garlic", "Oregano"],
        price: 800,
    },
    Pizza {
        slug: "diavola",
        name: "Diavola",
        toppings: &["Tomato", "Mozzarella", "Pepperoni"],
        price: 1100,
    },
];

/// Look up a pizza by slug.
pub fn find_pizza(slug: &str) -> Option<&'static Pizza> {
    PIZZAS.iter().find(|p| p.slug == slug)
}

pub fn pizza() -> RouteModule {
    RouteModule::new("pizza")
        .static_paths(|| {
            async {
                Ok(PIZZAS
                    .iter()
                    .map(|p| PathParams::from([("slug".to_string(), p.slug.to_string())]))
                    .collect())
            }
            .boxed()
        })
        .loader(
            ServerLoader::new("pizzaLoader", |ev| {
                async move {
                    let slug = ev.param("slug").unwrap_or_default();
                    match find_pizza(slug) {
                        Some(pizza) => Ok(serde_json::to_value(pizza)?),
                        None => Err(ErrorResponse::new(404, format!("No pizza called {}", slug)).into()),
                    }
                }
                .boxed()
            })
            .with_id(PIZZA_LOADER_ID),
        )
        .head_fn(|ev| {
            let name = ev
                .param("slug")
                .and_then(find_pizza)
                .map(|p| p.name)
                .unwrap_or("Pizza");
            DocumentHead::new().with_title(name)
        })
        .component(|ev: &RequestEvent, _children: &str| {
            let Some(pizza) = ev.loader_results().get(PIZZA_LOADER_ID) else {
                return anyhow::Ok(String::new());
            };
            let name = pizza.get("name").and_then(Value::as_str).unwrap_or_default();
            let price = pizza.get("price").and_then(Value::as_u64).unwrap_or_default();
            let toppings: Vec<String> = pizza
                .get("toppings")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|t| format!("<li>{}</li>", escape_html(t)))
                        .collect()
                })
                .unwrap_or_default();
            anyhow::Ok(format!(
                "<article><h1>{}</h1><ul>{}</ul><p class=\"price\">${}.{:02}</p></article>",
                escape_html(name),
                toppings.concat(),
                price / 100,
                price % 100
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_pizza() {
        assert_eq!(find_pizza("marinara").map(|p| p.price), Some(800));
        assert!(find_pizza("hawaiian").is_none());
    }

    #[tokio::test]
    async fn test_static_paths_cover_menu() {
        let module = pizza();
        let static_paths = module.get_static_paths().unwrap();

        let params = static_paths().await.unwrap();

        let slugs: Vec<&str> = params.iter().filter_map(|p| p.get("slug")).map(String::as_str).collect();
        assert_eq!(slugs, vec!["margherita", "marinara", "diavola"]);
    }
}
