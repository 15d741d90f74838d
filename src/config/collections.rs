//! `[collections.<name>]` section configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative spec for one named collection.
///
/// # Example
/// ```toml
/// [collections.news]
/// sort_key = "date"
/// sort_descending = true
/// sort_default = "1970-01-01"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionSettings {
    /// Page attribute or ctx entry to sort members by. Unsorted when absent.
    #[serde(default)]
    pub sort_key: Option<String>,

    /// Sort direction when `sort_key` is set.
    #[serde(default = "default_descending")]
    pub sort_descending: bool,

    /// Value used for members that lack the sort key.
    #[serde(default)]
    pub sort_default: Option<Value>,
}

const fn default_descending() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings: CollectionSettings = toml::from_str("").unwrap();
        assert!(settings.sort_key.is_none());
        assert!(settings.sort_descending);
        assert!(settings.sort_default.is_none());
    }

    #[test]
    fn test_full_section() {
        let settings: CollectionSettings = toml::from_str(
            r#"
            sort_key = "date"
            sort_descending = false
            sort_default = "1970-01-01"
            "#,
        )
        .unwrap();
        assert_eq!(settings.sort_key.as_deref(), Some("date"));
        assert!(!settings.sort_descending);
        assert_eq!(settings.sort_default, Some(json!("1970-01-01")));
    }
}
