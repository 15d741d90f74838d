//! `[[feed]]` section configuration.
//!
//! Feed definitions are loaded from settings and exposed to templates as the
//! `feeds` global; silt generates no feed XML itself.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One declarative feed over a collection.
///
/// # Example
/// ```toml
/// [[feed]]
/// collection = "news"
/// filename = "feed.xml"
/// sort_on = "date"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedSettings {
    /// Collection the feed draws its entries from.
    pub collection: String,

    /// Output filename, relative to the output directory.
    pub filename: PathBuf,

    /// Page attribute or ctx entry entries are ordered by.
    pub sort_on: String,

    /// Sort direction.
    #[serde(default = "default_descending")]
    pub descending: bool,
}

const fn default_descending() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_parsing() {
        let feed: FeedSettings = toml::from_str(
            r#"
            collection = "news"
            filename = "feed.xml"
            sort_on = "date"
            "#,
        )
        .unwrap();
        assert_eq!(feed.collection, "news");
        assert_eq!(feed.filename, PathBuf::from("feed.xml"));
        assert_eq!(feed.sort_on, "date");
        assert!(feed.descending);
    }

    #[test]
    fn test_missing_required_field() {
        let result: Result<FeedSettings, _> = toml::from_str("collection = \"news\"");
        assert!(result.is_err());
    }
}
