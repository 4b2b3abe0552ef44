//! Pizza builder: option loaders and the toppings form action.

use edge_sdk::edge_handler::escape_html;
use edge_sdk::prelude::*;
use futures::FutureExt;
use serde_json::{json, Value};
use tracing::info;

pub const TOPPINGS_LOADER_ID: &str = "toppings";
pub const CRUST_LOADER_ID: &str = "crust";
pub const SIZE_LOADER_ID: &str = "size";
pub const TOPPINGS_ACTION_ID: &str = "set-toppings";

pub const TOPPINGS: [&str; 3] = ["Pepperoni", "Sausage", "Bacon"];
pub const CRUSTS: [&str; 2] = ["Thin", "Deep Dish"];
pub const SIZES: [&str; 3] = ["Small", "Medium", "Large"];

fn list_loader(name: &str, id: &str, items: &'static [&'static str]) -> ServerLoader {
    ServerLoader::new(name, move |_ev| async move { Ok(json!(items)) }.boxed()).with_id(id)
}

/// Accepts the submitted `toppings`. Unknown toppings fail the action
/// with 400.
pub fn toppings_action() -> ServerAction {
    ServerAction::new("toppingsAction", |form, ev| {
        async move {
            let selected: Vec<String> = form.get_all("toppings").into_iter().map(str::to_string).collect();
            if let Some(unknown) = selected.iter().find(|t| !TOPPINGS.contains(&t.as_str())) {
                let error = format!("Unknown topping: {}", unknown);
                return Ok(ev.fail(400, json!({ "success": false, "error": error }))?);
            }

            info!(toppings = ?selected, "toppings selected");
            Ok(json!({
                "success": true,
                "toppings": selected,
                "form": form.to_json(),
            }))
        }
        .boxed()
    })
    .with_id(TOPPINGS_ACTION_ID)
}

pub fn actions() -> RouteModule {
    RouteModule::new("actions")
        .loader(list_loader("toppingsLoader", TOPPINGS_LOADER_ID, &TOPPINGS))
        .loader(list_loader("crustLoader", CRUST_LOADER_ID, &CRUSTS))
        .loader(list_loader("sizeLoader", SIZE_LOADER_ID, &SIZES))
        .action(toppings_action())
        .head(DocumentHead::new().with_title("Actions"))
        .component(render_actions)
}

fn strings<'a>(ev: &'a RequestEvent, id: &str) -> Vec<&'a str> {
    ev.loader_results()
        .get(id)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn render_actions(ev: &RequestEvent, _children: &str) -> anyhow::Result<String> {
    let outcome = ev.loader_results().get(TOPPINGS_ACTION_ID);
    let selected: Vec<&str> = outcome
        .and_then(|v| v.get("toppings"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let error = outcome.and_then(|v| v.get("error")).and_then(Value::as_str);

    let mut html = String::from("<div class=\"actions\"><section class=\"input\"><h1>Edge Pizza</h1>");

    html.push_str(&format!(
        "<form method=\"post\" action=\"?qaction={}\" data-test-toppings><h2>Toppings</h2><p>{}</p>",
        TOPPINGS_ACTION_ID,
        escape_html(&selected.join(", "))
    ));
    if let Some(error) = error {
        html.push_str(&format!("<p class=\"error\">{}</p>", escape_html(error)));
    }
    for topping in strings(ev, TOPPINGS_LOADER_ID) {
        let checked = if selected.contains(&topping) { " checked" } else { "" };
        html.push_str(&format!(
            "<label><input type=\"checkbox\" name=\"toppings\" value=\"{0}\"{1}><span>{0}</span></label>",
            escape_html(topping),
            checked
        ));
    }
    html.push_str("<p><button>Set Toppings</button></p></form>");

    html.push_str("<form method=\"post\" data-test-crust><h2>Crust</h2>");
    for crust in strings(ev, CRUST_LOADER_ID) {
        html.push_str(&format!(
            "<label><input type=\"radio\" name=\"crust\" value=\"{0}\"><span>{0}</span></label>",
            escape_html(crust)
        ));
    }
    html.push_str("<p><button>Set Crust</button></p></form>");

    html.push_str("<form method=\"post\" data-test-size><h2>Size</h2><label><select name=\"size\">");
    for size in strings(ev, SIZE_LOADER_ID) {
        html.push_str(&format!("<option value=\"{0}\">{0}</option>", escape_html(size)));
    }
    html.push_str("</select></label><p><button>Set Size</button></p></form>");

    html.push_str("</section><section class=\"output\"></section></div>");
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_sdk::edge_core::ServerFunction;

    #[test]
    fn test_action_id_is_stable() {
        assert_eq!(toppings_action().id(), TOPPINGS_ACTION_ID);
        assert_eq!(toppings_action().name(), "toppingsAction");
    }

    #[test]
    fn test_actions_module_registers_loaders() {
        let module = actions();

        let ids: Vec<&str> = module.loaders().iter().map(|l| l.id()).collect();

        assert_eq!(ids, vec![TOPPINGS_LOADER_ID, CRUST_LOADER_ID, SIZE_LOADER_ID]);
        assert_eq!(module.actions().len(), 1);
        assert!(module.has_component());
    }
}
