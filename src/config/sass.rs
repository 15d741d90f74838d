//! `[sass]` section configuration.
//!
//! Optional stylesheet pipeline: when the section is absent, stylesheet
//! compilation is a no-op.

use crate::error::{Result, SiltError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Accepted `output_style` values.
pub const OUTPUT_STYLES: &[&str] = &["nested", "expanded", "compact", "compressed"];

/// `[sass]` section in settings.toml.
///
/// # Example
/// ```toml
/// [sass]
/// sass_in = "sass"
/// sass_out = "css"
/// output_style = "compressed"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SassSettings {
    /// Stylesheet source directory, relative to the input directory.
    #[serde(default = "default_sass_in")]
    pub sass_in: PathBuf,

    /// Compiled css directory, relative to the output directory.
    #[serde(default = "default_sass_out")]
    pub sass_out: PathBuf,

    /// One of `nested`, `expanded`, `compact`, `compressed`.
    #[serde(default = "default_output_style")]
    pub output_style: String,
}

fn default_sass_in() -> PathBuf {
    PathBuf::from("sass")
}

fn default_sass_out() -> PathBuf {
    PathBuf::from("css")
}

fn default_output_style() -> String {
    "nested".to_string()
}

impl Default for SassSettings {
    fn default() -> Self {
        Self {
            sass_in: default_sass_in(),
            sass_out: default_sass_out(),
            output_style: default_output_style(),
        }
    }
}

impl SassSettings {
    pub fn validate(&self) -> Result<()> {
        if !OUTPUT_STYLES.contains(&self.output_style.as_str()) {
            return Err(SiltError::Validation(format!(
                "sass output_style must be one of {}, got `{}`",
                OUTPUT_STYLES.join(", "),
                self.output_style
            )));
        }
        Ok(())
    }
}
