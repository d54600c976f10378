//! XPath 1.0 for NETCONF configuration trees.
//!
//! The workspace is split the way the pieces are used:
//!
//! - `netxpath-types`: namespace contexts, the YANG module registry, node flags.
//! - `netxpath-xpath1`: parser, evaluator, prefix canonicalizer and expression tree tools,
//!   generic over [`DataSourceNode`].
//! - `netxpath-xml`: an owned XML tree implementing [`DataSourceNode`].
//!
//! This crate adds the one-call query API in [`query`], string-level canonicalization in
//! [`canonical`], and the `netxpath` command-line tool.
//!
//! ```
//! use netxpath::{XmlTree, query};
//!
//! let tree = XmlTree::parse("<a><b>x</b><b>y</b></a>").unwrap();
//! assert_eq!(query::count(tree.root(), None, "/a/b").unwrap(), 2);
//! ```

pub mod canonical;
pub mod config;
pub mod error;
pub mod query;

pub use canonical::{CanonicalXPath, xpath_to_canonical};
pub use config::QueryOptions;
pub use error::NetXPathError;

pub use netxpath_types::{ModuleRegistry, NamespaceContext, NodeFlags, YangModule};
pub use netxpath_xml::{NodeId, XmlNode, XmlTree};
pub use netxpath_xpath1::{
    DataSourceNode, Expression, NodeType, XPathError, XPathValue, parse_expression,
};
