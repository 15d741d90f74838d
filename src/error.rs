//! Error types shared across the site model and build engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the site model, scan, and render pipeline.
#[derive(Debug, Error)]
pub enum SiltError {
    #[error("site is not initialized; initialize() must run before build operations")]
    NotInitialized,

    #[error("no page named `{0}`")]
    PageNotFound(String),

    #[error("no collection named `{0}`")]
    CollectionNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("content collision: two source files map to the page name `{0}`")]
    ContentCollision(String),

    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("settings file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("malformed front matter in `{0}`")]
    FrontMatter(PathBuf, #[source] serde_yaml::Error),

    #[error("template error")]
    Template(#[from] tera::Error),

    #[error("stylesheet compilation failed: {0}")]
    Sass(String),
}

pub type Result<T> = std::result::Result<T, SiltError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_error_display() {
        let io_err = SiltError::Io(
            PathBuf::from("content/a.md"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("content/a.md"));

        let collision = SiltError::ContentCollision("notes/a".to_string());
        assert!(format!("{collision}").contains("notes/a"));

        let missing = SiltError::PageNotFound("about".to_string());
        assert!(format!("{missing}").contains("about"));
    }
}
