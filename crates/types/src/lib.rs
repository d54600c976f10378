//! Foundation types shared across the netxpath workspace.
//!
//! - [`NamespaceContext`]: an ordered prefix → namespace URI mapping, as carried by a
//!   NETCONF `<filter>` element or built from the in-scope declarations of an XML node.
//! - [`ModuleRegistry`]: the YANG module index (namespace URI → module → canonical prefix)
//!   consulted when canonicalizing XPath prefixes.
//! - [`NodeFlags`]: marker bits an embedding application sets on tree nodes.

pub mod error;
pub mod flags;
pub mod nsctx;
pub mod yang;

pub use error::{RegistryError, UnknownFlagError};
pub use flags::NodeFlags;
pub use nsctx::NamespaceContext;
pub use yang::{ModuleRegistry, YangModule};
