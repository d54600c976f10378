//! Switches that change how queries are evaluated.

/// Options for a single query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Match element and attribute names by local part only, ignoring prefixes and
    /// namespaces. Not standard XPath; useful for operator-typed paths on the CLI.
    pub local_only: bool,
}

impl QueryOptions {
    pub fn local_only() -> Self {
        Self { local_only: true }
    }
}
