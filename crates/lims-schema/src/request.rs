//! Flat request model: every input name maps to one or more raw strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel input denoting an explicit null.
pub const NONE_SENTINEL: &str = "__none__";

/// Trim a raw input; blank or the sentinel becomes `None`.
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NONE_SENTINEL {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestValues(BTreeMap<String, Vec<String>>);

impl RequestValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `key`, keeping earlier ones.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// First value of `key`.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of `key`, in submission order.
    #[must_use]
    pub fn all(&self, key: &str) -> &[String] {
        self.0.get(key).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether any key starts with `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0
            .range(prefix.to_string()..)
            .next()
            .is_some_and(|(key, _)| key.starts_with(prefix))
    }

    pub fn remove(&mut self, key: &str) -> Vec<String> {
        self.0.remove(key).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge another set of values into this one.
    pub fn extend(&mut self, other: Self) {
        for (key, values) in other.0 {
            self.0.entry(key).or_default().extend(values);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for RequestValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.insert(key, value);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_blank_and_sentinel() {
        assert_eq!(normalize("  abc "), Some("abc".into()));
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("__none__"), None);
        assert_eq!(normalize(" __none__ "), None);
    }

    #[test]
    fn multi_values_keep_order() {
        let values: RequestValues = [("tag", "b"), ("tag", "a"), ("name", "x")]
            .into_iter()
            .collect();
        assert_eq!(values.all("tag"), ["b".to_string(), "a".to_string()]);
        assert_eq!(values.first("tag"), Some("b"));
        assert_eq!(values.first("missing"), None);
        assert!(values.all("missing").is_empty());
    }

    #[test]
    fn prefix_lookup() {
        let values = RequestValues::new().with("grid_arrangement_1_1", "s1");
        assert!(values.has_prefix("grid_arrangement_"));
        assert!(!values.has_prefix("grid_rows"));
        assert!(!RequestValues::new().has_prefix("grid"));
    }

    #[test]
    fn extend_appends() {
        let mut a = RequestValues::new().with("k", "1");
        a.extend(RequestValues::new().with("k", "2").with("j", "3"));
        assert_eq!(a.all("k").len(), 2);
        assert_eq!(a.first("j"), Some("3"));
    }
}
