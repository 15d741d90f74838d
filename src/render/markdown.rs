//! Markdown-to-HTML conversion configured from `MarkdownSettings`.
//!
//! Renderer configuration is fixed at construction, so a per-page settings
//! override materializes a fresh renderer via [`MarkdownRenderer::with_overrides`].

use crate::config::MarkdownSettings;
use crate::error::{Result, SiltError};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use serde_json::{Map, Value};

/// Markdown converter driven by a validated settings object.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    settings: MarkdownSettings,
}

impl MarkdownRenderer {
    pub fn new(settings: MarkdownSettings) -> Self {
        Self { settings }
    }

    /// A renderer whose settings are the site defaults with `overrides`
    /// merged over them, page values winning per key. The merged settings
    /// are re-validated.
    pub fn with_overrides(base: &MarkdownSettings, overrides: &Map<String, Value>) -> Result<Self> {
        let mut merged = match serde_json::to_value(base) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        let settings: MarkdownSettings = serde_json::from_value(Value::Object(merged))
            .map_err(|err| SiltError::Validation(format!("invalid markdown override: {err}")))?;
        settings.validate()?;
        Ok(Self::new(settings))
    }

    /// Convert Markdown text to HTML.
    pub fn convert(&self, text: &str) -> String {
        let text = self.expand_tabs(text);

        let mut options = Options::empty();
        if self.settings.enable_footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.settings.enable_smartypants {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        if self.settings.enable_checklist {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if self.settings.enable_toc {
            options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }

        let mut events: Vec<Event> = Parser::new_ext(&text, options).collect();
        if self.settings.enable_toc && self.anchorlink_enabled() {
            add_heading_anchors(&mut events);
        }
        if self.settings.enable_codehilite {
            wrap_code_blocks(&mut events, self.codehilite_class());
        }

        let mut output = String::with_capacity(text.len() * 2);
        html::push_html(&mut output, events.into_iter());
        output
    }

    /// Expand literal tabs to the configured width.
    fn expand_tabs(&self, text: &str) -> String {
        if text.contains('\t') {
            text.replace('\t', &" ".repeat(self.settings.tab_length as usize))
        } else {
            text.to_string()
        }
    }

    fn anchorlink_enabled(&self) -> bool {
        self.settings
            .toc_options
            .get("anchorlink")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    fn codehilite_class(&self) -> &str {
        self.settings
            .codehilite_options
            .get("css_class")
            .and_then(Value::as_str)
            .unwrap_or("highlight")
    }
}

/// Assign slug ids to headings that carry none.
fn add_heading_anchors(events: &mut [Event]) {
    let mut index = 0;
    while index < events.len() {
        if let Event::Start(Tag::Heading { id: None, .. }) = &events[index] {
            let mut text = String::new();
            for event in events[index + 1..].iter() {
                match event {
                    Event::Text(t) | Event::Code(t) => text.push_str(t),
                    Event::End(TagEnd::Heading(_)) => break,
                    _ => {}
                }
            }
            let slug = slugify(&text);
            if !slug.is_empty() {
                if let Event::Start(Tag::Heading { id, .. }) = &mut events[index] {
                    *id = Some(CowStr::from(slug));
                }
            }
        }
        index += 1;
    }
}

/// Replace fenced code block tags with a classed `<pre>` wrapper.
fn wrap_code_blocks(events: &mut Vec<Event>, css_class: &str) {
    for event in events.iter_mut() {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                        format!(" class=\"language-{lang}\"")
                    }
                    _ => String::new(),
                };
                *event = Event::Html(
                    format!("<pre class=\"{css_class}\"><code{lang}>").into(),
                );
            }
            Event::End(TagEnd::CodeBlock) => {
                *event = Event::Html("</code></pre>\n".into());
            }
            _ => {}
        }
    }
}

/// Lowercased, hyphen-separated anchor slug from heading text.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_hyphen = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}
