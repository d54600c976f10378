//! An in-memory XML tree for configuration data, queryable with `netxpath-xpath1`.
//!
//! Trees are loaded from text with [`XmlTree::parse`] or assembled with the builder
//! methods, and every node is reachable as an [`XmlNode`] handle implementing
//! [`netxpath_xpath1::DataSourceNode`].

pub mod error;
pub mod node;
pub mod tree;

pub use error::XmlError;
pub use node::XmlNode;
pub use tree::{NodeId, XML_NAMESPACE, XmlTree};
