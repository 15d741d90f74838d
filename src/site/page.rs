//! A single content unit: identity, raw content, render metadata.

use crate::error::{Result, SiltError};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// All pages of a site, keyed by name.
pub type PageTable = FxHashMap<String, Page>;

/// Source format of a page's raw content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Markdown,
    Html,
}

/// One renderable content unit.
///
/// `name` is a slash-separated relative path without extension, unique within
/// the owning site, and doubles as the output file's relative path. Reserved
/// front-matter keys (`template`, `collections`, `ctx`, `markdown`,
/// `has_tera`) are split out at construction; any other metadata is inert.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub name: String,
    pub content: String,
    pub content_format: ContentFormat,

    /// Render template name; the site default applies when absent.
    pub template: Option<String>,

    /// Names of the collections this page belongs to.
    pub collections: Vec<String>,

    /// Arbitrary values accessible to templates as `page.ctx`.
    pub ctx: Map<String, Value>,

    /// Per-page Markdown settings, merged over the site defaults at render.
    #[serde(skip)]
    pub markdown: Option<Map<String, Value>>,

    /// Raw content contains embedded template directives and must pass
    /// through the template engine before any Markdown conversion.
    pub has_tera: bool,

    /// Neighbor links relative to a collection's current order. Never
    /// persisted; recomputed by `Collection::page_by_name`.
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl Page {
    /// Build a page from raw content and front-matter metadata.
    ///
    /// Fails with a validation error only when `name` is empty.
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        mut metadata: Map<String, Value>,
        content_format: ContentFormat,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(SiltError::Validation(
                "page name must not be empty".to_string(),
            ));
        }

        let template = take_string(&mut metadata, "template");
        let collections = take_string_list(&mut metadata, "collections");
        let ctx = take_map(&mut metadata, "ctx").unwrap_or_default();
        let markdown = take_map(&mut metadata, "markdown");
        let has_tera = matches!(metadata.remove("has_tera"), Some(Value::Bool(true)));

        Ok(Self {
            name,
            content: content.into(),
            content_format,
            template,
            collections,
            ctx,
            markdown,
            has_tera,
            previous: None,
            next: None,
        })
    }

    /// Three-tier lookup: direct attribute, then `ctx` entry, then `default`.
    /// Never fails.
    pub fn get(&self, key: &str, default: Value) -> Value {
        let direct = match key {
            "name" => Some(Value::String(self.name.clone())),
            "content" => Some(Value::String(self.content.clone())),
            "template" => self.template.clone().map(Value::String),
            "collections" => Some(Value::Array(
                self.collections
                    .iter()
                    .map(|c| Value::String(c.clone()))
                    .collect(),
            )),
            "has_tera" => Some(Value::Bool(self.has_tera)),
            "previous" => self.previous.clone().map(Value::String),
            "next" => self.next.clone().map(Value::String),
            _ => None,
        };

        direct
            .or_else(|| self.ctx.get(key).cloned())
            .unwrap_or(default)
    }
}

fn take_string(metadata: &mut Map<String, Value>, key: &str) -> Option<String> {
    match metadata.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn take_string_list(metadata: &mut Map<String, Value>, key: &str) -> Vec<String> {
    match metadata.remove(key) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        // A bare string is accepted as a single-element list.
        Some(Value::String(s)) => vec![s],
        _ => Vec::new(),
    }
}

fn take_map(metadata: &mut Map<String, Value>, key: &str) -> Option<Map<String, Value>> {
    match metadata.remove(key) {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_reserved_keys_extracted() {
        let meta = metadata(json!({
            "template": "post.html",
            "collections": ["news", "featured"],
            "ctx": { "date": "2026-01-02", "title": "Hello" },
            "has_tera": true,
            "markdown": { "enable_toc": true },
            "author": "inert leftover"
        }));
        let page = Page::new("posts/hello", "body", meta, ContentFormat::Markdown).unwrap();

        assert_eq!(page.template.as_deref(), Some("post.html"));
        assert_eq!(page.collections, vec!["news", "featured"]);
        assert_eq!(page.ctx.get("title"), Some(&json!("Hello")));
        assert!(page.has_tera);
        assert_eq!(
            page.markdown.as_ref().unwrap().get("enable_toc"),
            Some(&json!(true))
        );
        // Non-reserved metadata is dropped, not surfaced through ctx.
        assert_eq!(page.get("author", Value::Null), Value::Null);
    }

    #[test]
    fn test_empty_metadata() {
        let page = Page::new("about", "<p>hi</p>", Map::new(), ContentFormat::Html).unwrap();
        assert!(page.template.is_none());
        assert!(page.collections.is_empty());
        assert!(page.ctx.is_empty());
        assert!(!page.has_tera);
        assert!(page.previous.is_none() && page.next.is_none());
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = Page::new("", "body", Map::new(), ContentFormat::Markdown);
        assert!(matches!(result, Err(SiltError::Validation(_))));
    }

    #[test]
    fn test_get_three_tier_lookup() {
        let meta = metadata(json!({ "ctx": { "date": "2026-01-02", "name": "shadowed" } }));
        let page = Page::new("a", "body", meta, ContentFormat::Markdown).unwrap();

        // Direct attribute wins over ctx.
        assert_eq!(page.get("name", Value::Null), json!("a"));
        // ctx entry.
        assert_eq!(page.get("date", Value::Null), json!("2026-01-02"));
        // Default on total miss.
        assert_eq!(page.get("weight", json!(0)), json!(0));
    }

    #[test]
    fn test_get_none_attribute_falls_through_to_ctx() {
        let meta = metadata(json!({ "ctx": { "template": "from-ctx" } }));
        let page = Page::new("a", "", meta, ContentFormat::Markdown).unwrap();
        assert_eq!(page.get("template", Value::Null), json!("from-ctx"));
    }

    #[test]
    fn test_bare_string_collection() {
        let meta = metadata(json!({ "collections": "news" }));
        let page = Page::new("a", "", meta, ContentFormat::Markdown).unwrap();
        assert_eq!(page.collections, vec!["news"]);
    }
}
