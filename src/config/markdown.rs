//! `[markdown]` section configuration.
//!
//! Controls the Markdown renderer: output format, tab width, and per-extension
//! toggles, each with its own free-form option table.

use crate::error::{Result, SiltError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// `[markdown]` section in settings.toml.
///
/// # Example
/// ```toml
/// [markdown]
/// output_format = "html5"
/// tab_length = 2
/// enable_toc = true
///
/// [markdown.codehilite_options]
/// css_class = "highlight"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkdownSettings {
    /// Output flavor, `html5` or `xhtml`. Validated for compatibility;
    /// the pulldown-cmark emitter produces HTML5 markup either way.
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Number of spaces a literal tab expands to. Must be positive.
    #[serde(default = "default_tab_length")]
    pub tab_length: u32,

    /// Render `- [ ]` items as checkboxes.
    #[serde(default)]
    pub enable_checklist: bool,

    /// Wrap fenced code blocks in a highlight container.
    #[serde(default)]
    pub enable_codehilite: bool,
    #[serde(default = "default_codehilite_options")]
    pub codehilite_options: Map<String, Value>,

    /// Fenced code block support. Fenced blocks are part of
    /// pulldown-cmark's core grammar and cannot be switched off; the
    /// toggle is accepted for settings compatibility.
    #[serde(default = "default_true")]
    pub enable_fenced_code: bool,

    /// Footnote references and definitions.
    #[serde(default = "default_true")]
    pub enable_footnotes: bool,
    #[serde(default = "default_footnotes_options")]
    pub footnotes_options: Map<String, Value>,

    /// Smart punctuation (curly quotes, dashes, ellipses).
    #[serde(default)]
    pub enable_smartypants: bool,
    #[serde(default)]
    pub smartypants_options: Map<String, Value>,

    /// Anchor ids on headings for tables of contents.
    #[serde(default)]
    pub enable_toc: bool,
    #[serde(default = "default_toc_options")]
    pub toc_options: Map<String, Value>,

    /// Tighter list handling. The effect comes entirely from `tab_length`
    /// expansion before parsing; the toggle and option table are accepted
    /// for settings compatibility.
    #[serde(default = "default_true")]
    pub enable_truly_sane_lists: bool,
    #[serde(default = "default_truly_sane_lists_options")]
    pub truly_sane_lists_options: Map<String, Value>,
}

fn default_output_format() -> String {
    "html5".to_string()
}

fn default_tab_length() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

fn default_codehilite_options() -> Map<String, Value> {
    as_map(json!({ "css_class": "highlight", "guess_lang": false }))
}

fn default_footnotes_options() -> Map<String, Value> {
    as_map(json!({ "backlink_text": "&#x2191;" }))
}

fn default_toc_options() -> Map<String, Value> {
    as_map(json!({ "anchorlink": true }))
}

fn default_truly_sane_lists_options() -> Map<String, Value> {
    as_map(json!({ "truly_sane": true }))
}

fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl Default for MarkdownSettings {
    fn default() -> Self {
        Self {
            output_format: default_output_format(),
            tab_length: default_tab_length(),
            enable_checklist: false,
            enable_codehilite: false,
            codehilite_options: default_codehilite_options(),
            enable_fenced_code: true,
            enable_footnotes: true,
            footnotes_options: default_footnotes_options(),
            enable_smartypants: false,
            smartypants_options: Map::new(),
            enable_toc: false,
            toc_options: default_toc_options(),
            enable_truly_sane_lists: true,
            truly_sane_lists_options: default_truly_sane_lists_options(),
        }
    }
}

impl MarkdownSettings {
    /// Validate enum-like fields after parsing.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.output_format.as_str(), "html5" | "xhtml") {
            return Err(SiltError::Validation(format!(
                "markdown output_format must be `html5` or `xhtml`, got `{}`",
                self.output_format
            )));
        }
        if self.tab_length == 0 {
            return Err(SiltError::Validation(
                "markdown tab_length must be an integer greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = MarkdownSettings::default();
        assert_eq!(settings.output_format, "html5");
        assert_eq!(settings.tab_length, 2);
        assert!(!settings.enable_checklist);
        assert!(settings.enable_fenced_code);
        assert!(settings.enable_footnotes);
        assert!(settings.enable_truly_sane_lists);
        assert_eq!(
            settings.codehilite_options.get("css_class"),
            Some(&json!("highlight"))
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_output_format() {
        let settings: MarkdownSettings =
            toml::from_str("output_format = \"commonmark\"").unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_tab_length_rejected() {
        let settings: MarkdownSettings = toml::from_str("tab_length = 0").unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_xhtml_accepted() {
        let settings: MarkdownSettings = toml::from_str("output_format = \"xhtml\"").unwrap();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_option_table_parsing() {
        let settings: MarkdownSettings = toml::from_str(
            r#"
            enable_toc = true

            [toc_options]
            anchorlink = false
            "#,
        )
        .unwrap();
        assert!(settings.enable_toc);
        assert_eq!(settings.toc_options.get("anchorlink"), Some(&json!(false)));
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: std::result::Result<MarkdownSettings, _> =
            toml::from_str("enable_tables = true");
        assert!(result.is_err());
    }
}
