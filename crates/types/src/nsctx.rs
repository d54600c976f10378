//! Namespace contexts: ordered prefix → namespace URI bindings.

use indexmap::IndexMap;
use std::fmt;

/// Key used internally for the default (unprefixed) binding. An empty string is never a
/// valid XML prefix, so it cannot collide with a real one.
const DEFAULT_KEY: &str = "";

/// An ordered mapping from namespace prefix to namespace URI.
///
/// The default namespace is addressed with `None`. Lookup is independent of insertion
/// order, but iteration follows it so that serialized contexts and debug output are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    bindings: IndexMap<String, String>,
}

impl NamespaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`NamespaceContext::insert`].
    pub fn with(mut self, prefix: Option<&str>, uri: impl Into<String>) -> Self {
        self.insert(prefix, uri);
        self
    }

    /// Binds `prefix` to `uri`, returning the URI previously bound to that prefix.
    pub fn insert(&mut self, prefix: Option<&str>, uri: impl Into<String>) -> Option<String> {
        self.bindings
            .insert(prefix.unwrap_or(DEFAULT_KEY).to_string(), uri.into())
    }

    /// Resolves a prefix (or the default binding, for `None`) to its namespace URI.
    pub fn get(&self, prefix: Option<&str>) -> Option<&str> {
        self.bindings
            .get(prefix.unwrap_or(DEFAULT_KEY))
            .map(String::as_str)
    }

    pub fn contains_prefix(&self, prefix: Option<&str>) -> bool {
        self.bindings.contains_key(prefix.unwrap_or(DEFAULT_KEY))
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.get(None)
    }

    /// Reverse lookup: the first prefix bound to `uri`, in insertion order.
    /// The outer `Option` is `None` when no binding uses the URI at all.
    pub fn prefix_for(&self, uri: &str) -> Option<Option<&str>> {
        self.bindings
            .iter()
            .find(|(_, bound)| bound.as_str() == uri)
            .map(|(prefix, _)| to_prefix(prefix))
    }

    /// Iterates over `(prefix, uri)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> + '_ {
        self.bindings
            .iter()
            .map(|(prefix, uri)| (to_prefix(prefix), uri.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn to_prefix(key: &str) -> Option<&str> {
    (key != DEFAULT_KEY).then_some(key)
}

impl<'a> FromIterator<(Option<&'a str>, &'a str)> for NamespaceContext {
    fn from_iter<I: IntoIterator<Item = (Option<&'a str>, &'a str)>>(iter: I) -> Self {
        let mut nsc = NamespaceContext::new();
        for (prefix, uri) in iter {
            nsc.insert(prefix, uri);
        }
        nsc
    }
}

/// Renders the context as `xmlns` attribute declarations, e.g.
/// `xmlns="urn:a" xmlns:b="urn:b"`.
impl fmt::Display for NamespaceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (prefix, uri)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match prefix {
                Some(p) => write!(f, "xmlns:{}=\"{}\"", p, uri)?,
                None => write!(f, "xmlns=\"{}\"", uri)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_prefixed_bindings() {
        let nsc = NamespaceContext::new()
            .with(None, "urn:example:default")
            .with(Some("x"), "urn:example:x");

        assert_eq!(nsc.get(None), Some("urn:example:default"));
        assert_eq!(nsc.default_namespace(), Some("urn:example:default"));
        assert_eq!(nsc.get(Some("x")), Some("urn:example:x"));
        assert_eq!(nsc.get(Some("y")), None);
        assert!(nsc.contains_prefix(None));
        assert_eq!(nsc.len(), 2);
    }

    #[test]
    fn test_insert_overwrites_and_returns_previous() {
        let mut nsc = NamespaceContext::new();
        assert_eq!(nsc.insert(Some("a"), "urn:one"), None);
        assert_eq!(nsc.insert(Some("a"), "urn:two"), Some("urn:one".to_string()));
        assert_eq!(nsc.get(Some("a")), Some("urn:two"));
        assert_eq!(nsc.len(), 1);
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let nsc = NamespaceContext::new()
            .with(Some("z"), "urn:z")
            .with(None, "urn:d")
            .with(Some("a"), "urn:a");
        let pairs: Vec<_> = nsc.iter().collect();
        assert_eq!(
            pairs,
            vec![(Some("z"), "urn:z"), (None, "urn:d"), (Some("a"), "urn:a")]
        );
        assert_eq!(
            nsc.to_string(),
            "xmlns:z=\"urn:z\" xmlns=\"urn:d\" xmlns:a=\"urn:a\""
        );
    }

    #[test]
    fn test_prefix_for_reverse_lookup() {
        let nsc = NamespaceContext::new()
            .with(None, "urn:d")
            .with(Some("a"), "urn:a");
        assert_eq!(nsc.prefix_for("urn:a"), Some(Some("a")));
        assert_eq!(nsc.prefix_for("urn:d"), Some(None));
        assert_eq!(nsc.prefix_for("urn:missing"), None);
    }
}
