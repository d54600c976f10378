//! Rewrites the prefixes of an expression to the canonical prefixes of the YANG
//! modules that own their namespaces.
//!
//! Given `/x:a` with `x` bound to `urn:example:a`, and a module `example-a` declaring
//! `prefix ex; namespace urn:example:a;`, the result is `/ex:a` together with a fresh
//! namespace context holding exactly `ex -> urn:example:a`.

use crate::ast::{Axis, Expression, NodeTest};
use netxpath_types::{ModuleRegistry, NamespaceContext};

/// The outcome of canonicalization. A failure carries a reason meant for the peer that
/// supplied the expression, e.g. in a NETCONF `<error-message>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Canonicalized {
    Rewritten {
        expr: Expression,
        /// Bindings for the canonical prefixes used by `expr`, and nothing else.
        namespaces: NamespaceContext,
    },
    Failed {
        reason: String,
    },
}

impl Canonicalized {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, Canonicalized::Rewritten { .. })
    }
}

/// Canonicalizes every name test in `expr`.
///
/// Unprefixed names resolve through the default binding of `nsc`. Exempt are node type
/// tests, unprefixed attribute names (attributes do not take the default namespace) and
/// wildcards. A prefixed wildcard is rewritten when its prefix resolves, and never makes
/// the whole rewrite fail.
pub fn canonicalize(
    mut expr: Expression,
    modules: &ModuleRegistry,
    nsc: &NamespaceContext,
) -> Canonicalized {
    let mut output = NamespaceContext::new();
    let result = expr.try_for_each_node_test_mut(&mut |axis: Axis, test: &mut NodeTest| {
        canonicalize_node_test(axis, test, modules, nsc, &mut output)
    });
    match result {
        Ok(()) => Canonicalized::Rewritten {
            expr,
            namespaces: output,
        },
        Err(reason) => {
            log::debug!("canonicalization failed: {}", reason);
            Canonicalized::Failed { reason }
        }
    }
}

fn canonicalize_node_test(
    axis: Axis,
    test: &mut NodeTest,
    modules: &ModuleRegistry,
    nsc: &NamespaceContext,
    output: &mut NamespaceContext,
) -> Result<(), String> {
    match test {
        NodeTest::NodeType(_) | NodeTest::Wildcard { prefix: None } => Ok(()),
        NodeTest::Name { prefix: None, .. } if axis == Axis::Attribute => Ok(()),
        NodeTest::Name { prefix, .. } => canonicalize_prefix(prefix, modules, nsc, output),
        // Wildcards need no namespace. A resolvable prefix is still rewritten, anything
        // else is left as written.
        NodeTest::Wildcard { prefix } => {
            if let Err(reason) = canonicalize_prefix(prefix, modules, nsc, output) {
                log::debug!(
                    "leaving wildcard {}:* as is: {}",
                    prefix.as_deref().unwrap_or_default(),
                    reason
                );
            }
            Ok(())
        }
    }
}

fn canonicalize_prefix(
    prefix: &mut Option<String>,
    modules: &ModuleRegistry,
    nsc: &NamespaceContext,
    output: &mut NamespaceContext,
) -> Result<(), String> {
    let namespace = nsc.get(prefix.as_deref()).ok_or_else(|| match prefix {
        Some(p) => format!("No namespace found for prefix: {}", p),
        None => "No namespace found for default prefix".to_string(),
    })?;
    let module = modules
        .find_by_namespace(namespace)
        .ok_or_else(|| format!("No modules found for namespace: {}", namespace))?;
    let canonical = module
        .prefix
        .as_deref()
        .ok_or_else(|| format!("No prefix found in module: {}", module.name))?;

    match output.get(Some(canonical)) {
        None => {
            output.insert(Some(canonical), namespace);
        }
        Some(bound) if bound != namespace => {
            return Err(format!(
                "Prefix collision: '{}' is the prefix of both {} and {}",
                canonical, bound, namespace
            ));
        }
        Some(_) => {}
    }

    if prefix.as_deref() != Some(canonical) {
        log::debug!(
            "rewriting prefix {} to {} ({})",
            prefix.as_deref().unwrap_or("<default>"),
            canonical,
            namespace
        );
        *prefix = Some(canonical.to_string());
    }
    Ok(())
}
