//! Section menus.

use serde::{Deserialize, Serialize};

use crate::loader::ModuleLoader;

/// A navigation tree for one section of the site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMenu {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ContentMenu>,
}

impl ContentMenu {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_item(mut self, item: ContentMenu) -> Self {
        self.items.push(item);
        self
    }
}

/// A loaded menu module.
#[derive(Debug, Clone, Default)]
pub struct MenuModule {
    pub menu: ContentMenu,
}

/// Menu registered for every pathname under `prefix`.
#[derive(Debug, Clone)]
pub struct MenuData {
    /// Path prefix, with a trailing slash.
    pub prefix: String,
    pub loader: ModuleLoader<MenuModule>,
}

impl MenuData {
    pub fn new(prefix: impl Into<String>, loader: ModuleLoader<MenuModule>) -> Self {
        Self {
            prefix: prefix.into(),
            loader,
        }
    }
}
