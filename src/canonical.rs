//! String-level canonicalization: parse, rewrite prefixes, print back.

use crate::error::NetXPathError;
use netxpath_types::{ModuleRegistry, NamespaceContext};
use netxpath_xpath1::{Canonicalized, canonicalize, parse_expression, unparse};

/// The canonical text of an expression, or the reason it has none.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalXPath {
    Canonical {
        xpath: String,
        namespaces: NamespaceContext,
    },
    Failed {
        reason: String,
    },
}

/// Rewrites `xpath` to use the canonical module prefixes of `registry`.
///
/// A syntax error is an `Err`; a prefix or module that cannot be resolved is a
/// [`CanonicalXPath::Failed`] carrying a message fit for a NETCONF `<error-message>`.
pub fn xpath_to_canonical(
    xpath: &str,
    nsc: &NamespaceContext,
    registry: &ModuleRegistry,
) -> Result<CanonicalXPath, NetXPathError> {
    let expr = parse_expression(xpath)?;
    Ok(match canonicalize(expr, registry, nsc) {
        Canonicalized::Rewritten { expr, namespaces } => {
            let canonical = unparse(&expr);
            log::debug!("'{}' canonicalized to '{}'", xpath, canonical);
            CanonicalXPath::Canonical {
                xpath: canonical,
                namespaces,
            }
        }
        Canonicalized::Failed { reason } => CanonicalXPath::Failed { reason },
    })
}
