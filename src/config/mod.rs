//! Site settings management for `settings.toml`.
//!
//! # Sections
//!
//! | Section            | Purpose                                        |
//! |--------------------|------------------------------------------------|
//! | top level          | Directory layout, default template, site link  |
//! | `[sass]`           | Optional stylesheet pipeline                   |
//! | `[markdown]`       | Markdown renderer toggles                      |
//! | `[collections.*]`  | Named collection sort specs                    |
//! | `[[feed]]`         | Declarative feed definitions                   |
//! | `[ctx]`            | Free-form values merged into the site context  |
//!
//! # Example
//!
//! ```toml
//! input_dir = "src"
//! output_dir = "dist"
//! default_template = "default.html"
//!
//! [markdown]
//! enable_toc = true
//!
//! [collections.news]
//! sort_key = "date"
//!
//! [ctx]
//! site_title = "My Site"
//! ```

mod collections;
mod feeds;
mod markdown;
mod sass;

pub use collections::CollectionSettings;
pub use feeds::FeedSettings;
pub use markdown::MarkdownSettings;
pub use sass::SassSettings;

use crate::error::{Result, SiltError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Root settings structure representing settings.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSettings {
    /// Root of the source tree; template, content and sass dirs live under it.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Where the built site is written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Template directory, relative to `input_dir`.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Content directory, relative to `input_dir`.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Template used by pages that name none themselves.
    #[serde(default = "default_template")]
    pub default_template: String,

    /// Absolute base URL of the published site, when known.
    #[serde(default)]
    pub absolute_link: Option<String>,

    /// Optional stylesheet pipeline.
    #[serde(default)]
    pub sass: Option<SassSettings>,

    /// Markdown renderer settings.
    #[serde(default)]
    pub markdown: MarkdownSettings,

    /// Named collection specs. BTreeMap keeps template-visible order stable.
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionSettings>,

    /// Declarative feed definitions.
    #[serde(default, rename = "feed")]
    pub feeds: Vec<FeedSettings>,

    /// Free-form values merged verbatim into the site render context.
    #[serde(default)]
    pub ctx: Map<String, Value>,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_template() -> String {
    "default.html".to_string()
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            template_dir: default_template_dir(),
            content_dir: default_content_dir(),
            default_template: default_template(),
            absolute_link: None,
            sass: None,
            markdown: MarkdownSettings::default(),
            collections: BTreeMap::new(),
            feeds: Vec::new(),
            ctx: Map::new(),
        }
    }
}

impl SiteSettings {
    /// Parse settings from a TOML string and validate them.
    pub fn from_str(content: &str) -> Result<Self> {
        let settings: SiteSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file, applying an optional output-dir override.
    pub fn from_path(path: &Path, output_dir: Option<&Path>) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| SiltError::Io(path.to_path_buf(), err))?;
        let mut settings = Self::from_str(&content)?;
        if let Some(dir) = output_dir {
            settings.output_dir = dir.to_path_buf();
        }
        Ok(settings)
    }

    /// Validate enum-like fields across all sections. Fails fast, before any
    /// content scan.
    pub fn validate(&self) -> Result<()> {
        self.markdown.validate()?;
        if let Some(sass) = &self.sass {
            sass.validate()?;
        }
        Ok(())
    }

    /// Template directory resolved against the input directory.
    pub fn template_dir(&self) -> PathBuf {
        self.input_dir.join(&self.template_dir)
    }

    /// Content directory resolved against the input directory.
    pub fn content_dir(&self) -> PathBuf {
        self.input_dir.join(&self.content_dir)
    }

    /// Stylesheet source directory, when the sass pipeline is configured.
    pub fn sass_in(&self) -> Option<PathBuf> {
        self.sass.as_ref().map(|s| self.input_dir.join(&s.sass_in))
    }

    /// Compiled css directory, when the sass pipeline is configured.
    pub fn sass_out(&self) -> Option<PathBuf> {
        self.sass.as_ref().map(|s| self.output_dir.join(&s.sass_out))
    }
}
