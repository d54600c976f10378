//! Convenience entry points: parse an XPath string, evaluate it once from a node and
//! return the result in the shape the caller needs.
//!
//! Every call parses afresh; nothing is cached between calls. The evaluation starts
//! with `node` as context node and initial node (`current()`), at position 1 of 1, and
//! `/` refers to the topmost ancestor of `node`.

use crate::config::QueryOptions;
use crate::error::NetXPathError;
use netxpath_types::{NamespaceContext, NodeFlags};
use netxpath_xpath1::{DataSourceNode, EvaluationContext, XPathValue, evaluate, parse_expression};

/// Evaluates `xpath` and returns the raw typed result.
pub fn evaluate_ctx<'a, N>(
    node: N,
    nsc: Option<&NamespaceContext>,
    xpath: &str,
    options: &QueryOptions,
) -> Result<XPathValue<N>, NetXPathError>
where
    N: DataSourceNode<'a>,
{
    let expr = parse_expression(xpath)?;
    let e_ctx = EvaluationContext::new(node)
        .with_namespaces(nsc)
        .with_local_only(options.local_only);
    let value = evaluate(&expr, &e_ctx)?;
    log::debug!("'{}' evaluated to a {}", xpath, value.type_name());
    Ok(value)
}

fn first_with<'a, N>(
    node: N,
    nsc: Option<&NamespaceContext>,
    xpath: &str,
    options: &QueryOptions,
) -> Option<N>
where
    N: DataSourceNode<'a>,
{
    match evaluate_ctx(node, nsc, xpath, options) {
        Ok(XPathValue::NodeSet(nodes)) => nodes.into_iter().next(),
        Ok(_) => None,
        Err(e) => {
            log::warn!("'{}' failed, no node returned: {}", xpath, e);
            None
        }
    }
}

/// The first node of the result, or `None` if the result is empty, is not a node-set,
/// or the expression failed. Failures are logged, not returned.
pub fn first<'a, N>(node: N, nsc: Option<&NamespaceContext>, xpath: &str) -> Option<N>
where
    N: DataSourceNode<'a>,
{
    first_with(node, nsc, xpath, &QueryOptions::default())
}

/// Like [`first`], comparing names by local part only.
pub fn first_local_only<'a, N>(node: N, xpath: &str) -> Option<N>
where
    N: DataSourceNode<'a>,
{
    first_with(node, None, xpath, &QueryOptions::local_only())
}

/// All nodes of the result. A result that is not a node-set gives an empty vector.
pub fn nodes<'a, N>(
    node: N,
    nsc: Option<&NamespaceContext>,
    xpath: &str,
) -> Result<Vec<N>, NetXPathError>
where
    N: DataSourceNode<'a>,
{
    match evaluate_ctx(node, nsc, xpath, &QueryOptions::default())? {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        other => {
            log::debug!("'{}' gave a {}, not a node-set", xpath, other.type_name());
            Ok(vec![])
        }
    }
}

/// Like [`nodes`], keeping only nodes that carry at least one of `flags`. An empty
/// mask keeps everything.
pub fn nodes_with_flags<'a, N>(
    node: N,
    nsc: Option<&NamespaceContext>,
    xpath: &str,
    flags: NodeFlags,
) -> Result<Vec<N>, NetXPathError>
where
    N: DataSourceNode<'a>,
{
    let mut result = nodes(node, nsc, xpath)?;
    retain_flagged(&mut result, flags);
    Ok(result)
}

/// Keeps the nodes carrying any bit of `flags`. An empty mask keeps everything.
pub fn retain_flagged<'a, N>(nodes: &mut Vec<N>, flags: NodeFlags)
where
    N: DataSourceNode<'a>,
{
    if !flags.is_empty() {
        nodes.retain(|n| n.flags().intersects(flags));
    }
}

/// The result converted with the XPath `boolean()` rules.
pub fn boolean<'a, N>(
    node: N,
    nsc: Option<&NamespaceContext>,
    xpath: &str,
) -> Result<bool, NetXPathError>
where
    N: DataSourceNode<'a>,
{
    Ok(evaluate_ctx(node, nsc, xpath, &QueryOptions::default())?.to_bool())
}

/// Evaluates `count(<xpath>)`. `xpath` must therefore select a node-set, or the call
/// fails with a type error.
pub fn count<'a, N>(
    node: N,
    nsc: Option<&NamespaceContext>,
    xpath: &str,
) -> Result<u32, NetXPathError>
where
    N: DataSourceNode<'a>,
{
    let wrapped = format!("count({})", xpath);
    match evaluate_ctx(node, nsc, &wrapped, &QueryOptions::default())? {
        // count() only returns whole non-negative numbers; NaN is clamped all the same.
        XPathValue::Number(n) if !n.is_nan() => Ok(n as u32),
        _ => Ok(0),
    }
}
