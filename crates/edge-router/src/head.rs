//! Document head contributed by route modules.

use serde::{Deserialize, Serialize};

/// A `<meta>` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadMeta {
    /// Entries with the same key replace each other when heads merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    pub content: String,
}

impl HeadMeta {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: None,
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// A `<link>` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub rel: String,
    pub href: String,
}

impl HeadLink {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            key: None,
            rel: rel.into(),
            href: href.into(),
        }
    }
}

/// Head values one module contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHead {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub meta: Vec<HeadMeta>,
    #[serde(default)]
    pub links: Vec<HeadLink>,
}

impl DocumentHead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_meta(mut self, meta: HeadMeta) -> Self {
        self.meta.push(meta);
        self
    }

    pub fn with_link(mut self, link: HeadLink) -> Self {
        self.links.push(link);
        self
    }
}

/// Head after every module's contribution has been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedHead {
    pub title: String,
    pub meta: Vec<HeadMeta>,
    pub links: Vec<HeadLink>,
}

impl ResolvedHead {
    /// Apply one module's head on top of this one.
    pub fn apply(&mut self, head: DocumentHead) {
        if let Some(title) = head.title {
            self.title = title;
        }
        merge_keyed(&mut self.meta, head.meta, |m| m.key.as_deref());
        merge_keyed(&mut self.links, head.links, |l| l.key.as_deref());
    }
}

fn merge_keyed<T>(existing: &mut Vec<T>, incoming: Vec<T>, key: impl Fn(&T) -> Option<&str>) {
    for item in incoming {
        let position = key(&item).and_then(|k| existing.iter().position(|e| key(e) == Some(k)));
        match position {
            Some(i) => existing[i] = item,
            None => existing.push(item),
        }
    }
}
