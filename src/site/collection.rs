//! A named, optionally sorted group of pages.
//!
//! A collection stores member page names in insertion order. When a sort
//! spec is configured, the observable order is always the sort order,
//! recomputed from the current member set on every read. This keeps
//! external sort-key mutations visible without an explicit re-sort call, at
//! the cost of an O(n log n) recomputation per access.

use crate::config::CollectionSettings;
use crate::error::{Result, SiltError};
use crate::site::page::{Page, PageTable};
use serde_json::Value;
use std::cmp::Ordering;

/// Sort spec for a collection's observable order.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub key: String,
    pub descending: bool,
    pub default: Value,
}

/// A named, ordered group of page references. Membership is a set: a page
/// appears at most once.
#[derive(Debug, Clone)]
pub struct Collection {
    pub name: String,
    members: Vec<String>,
    sort: Option<SortSpec>,
}

impl Collection {
    /// An empty, unsorted collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            sort: None,
        }
    }

    /// An empty collection configured from a declarative spec.
    pub fn from_settings(name: &str, settings: &CollectionSettings) -> Self {
        let sort = settings.sort_key.as_ref().map(|key| SortSpec {
            key: key.clone(),
            descending: settings.sort_descending,
            default: settings.sort_default.clone().unwrap_or(Value::Null),
        });
        Self {
            name: name.to_string(),
            members: Vec::new(),
            sort,
        }
    }

    /// Add a page to the backing sequence. Appending an existing member is a
    /// no-op, keeping set semantics.
    pub fn append(&mut self, page: &Page) {
        if !self.contains(&page.name) {
            self.members.push(page.name.clone());
        }
    }

    /// Remove a member by name.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        match self.members.iter().position(|m| m == name) {
            Some(index) => {
                self.members.remove(index);
                Ok(())
            }
            None => Err(SiltError::PageNotFound(name.to_string())),
        }
    }

    /// Membership test by name.
    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The current ordered view: stable-sorted by the configured key, or
    /// insertion order when no sort spec is set. Members missing from the
    /// page table are skipped.
    pub fn pages<'a>(&self, table: &'a PageTable) -> Vec<&'a Page> {
        let mut pages: Vec<&Page> = self
            .members
            .iter()
            .filter_map(|name| table.get(name))
            .collect();

        if let Some(sort) = &self.sort {
            // sort_by is stable: equal keys keep insertion order.
            pages.sort_by(|a, b| {
                let va = a.get(&sort.key, sort.default.clone());
                let vb = b.get(&sort.key, sort.default.clone());
                let ordering = cmp_values(&va, &vb);
                if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        pages
    }

    /// Member names in the current observable order.
    pub fn page_names(&self, table: &PageTable) -> Vec<String> {
        self.pages(table).iter().map(|p| p.name.clone()).collect()
    }

    /// Resolve a member page by name and set its `previous`/`next` links
    /// relative to the collection's current order (`None` at either
    /// boundary). The links exist only meaningfully in the context of the
    /// collection used to fetch them.
    pub fn page_by_name<'a>(&self, name: &str, table: &'a mut PageTable) -> Result<&'a Page> {
        let order = self.page_names(table);
        let index = order
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| SiltError::PageNotFound(name.to_string()))?;

        let previous = index.checked_sub(1).map(|i| order[i].clone());
        let next = order.get(index + 1).cloned();

        let page = table
            .get_mut(name)
            .ok_or_else(|| SiltError::PageNotFound(name.to_string()))?;
        page.previous = previous;
        page.next = next;
        Ok(page)
    }
}

/// Total order over JSON values for sort keys: values of the same kind
/// compare naturally, mixed kinds compare by kind rank.
pub(crate) fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => value_rank(a).cmp(&value_rank(b)),
    }
}

const fn value_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
