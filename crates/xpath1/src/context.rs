//! Evaluation values and the context they are computed in.

use crate::datasource::DataSourceNode;
use crate::error::XPathError;
use netxpath_types::NamespaceContext;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Represents the possible result types of an XPath expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    /// Coerces the XPath value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the XPath value to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => string_to_number(s),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => string_to_number(&first_string_value(nodes)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            XPathValue::NodeSet(_) => "node-set",
            XPathValue::String(_) => "string",
            XPathValue::Number(_) => "number",
            XPathValue::Boolean(_) => "boolean",
        }
    }

    /// Unwraps a node-set, or reports which value type was found instead.
    pub fn into_node_set(self, what: &str) -> Result<Vec<N>, XPathError> {
        match self {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::TypeError(format!(
                "{} must be a node-set, got a {}",
                what,
                other.type_name()
            ))),
        }
    }
}

/// String value of the node that comes first in document order, or "" for an empty set.
pub(crate) fn first_string_value<'a, N: DataSourceNode<'a>>(nodes: &[N]) -> String {
    nodes.iter().min().map(|n| n.string_value()).unwrap_or_default()
}

impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    /// Coerces the XPath value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(f, "{}", first_string_value(nodes)),
            XPathValue::String(s) => write!(f, "{}", s),
            XPathValue::Number(n) => write!(f, "{}", format_number(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Formats a number the way XPath's `string()` does: no exponent, no trailing `.0`,
/// `NaN`, `Infinity` and `-Infinity` spelled out, and negative zero printed as `0`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

fn is_xpath_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Converts a string with XPath `number()` semantics: optional whitespace, an optional
/// minus sign, digits with an optional fraction. Anything else is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_xpath_whitespace);
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let mut digits = 0;
    let mut dots = 0;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return f64::NAN,
        }
    }
    if digits == 0 || dots > 1 {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// A container for all state needed during expression evaluation.
/// `'a` is the lifetime of the underlying data source.
/// `'d` is the lifetime of the borrowed bindings (namespaces, variables).
pub struct EvaluationContext<'a, 'd, N: DataSourceNode<'a>> {
    pub context_node: N,
    /// The node evaluation started from; what `current()` returns.
    pub initial_node: N,
    pub root_node: N,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
    /// Prefix bindings for name tests. Without them, prefixes are compared literally
    /// against the prefixes written in the document.
    pub namespaces: Option<&'d NamespaceContext>,
    pub variables: Option<&'d HashMap<String, XPathValue<N>>>,
    /// Compare element and attribute names by local part only.
    pub local_only: bool,
    _marker: PhantomData<&'a ()>,
}

impl<'a, 'd, N: DataSourceNode<'a>> EvaluationContext<'a, 'd, N> {
    /// A context focused on `node`, at position 1 of 1, with no bindings.
    pub fn new(node: N) -> Self {
        Self {
            context_node: node,
            initial_node: node,
            root_node: document_root(node),
            context_position: 1,
            context_size: 1,
            namespaces: None,
            variables: None,
            local_only: false,
            _marker: PhantomData,
        }
    }

    pub fn with_namespaces(mut self, namespaces: Option<&'d NamespaceContext>) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn with_variables(mut self, variables: &'d HashMap<String, XPathValue<N>>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_local_only(mut self, local_only: bool) -> Self {
        self.local_only = local_only;
        self
    }

    /// The same context refocused on another node, as done for each predicate test.
    pub fn focus(&self, node: N, position: usize, size: usize) -> Self {
        Self {
            context_node: node,
            initial_node: self.initial_node,
            root_node: self.root_node,
            context_position: position,
            context_size: size,
            namespaces: self.namespaces,
            variables: self.variables,
            local_only: self.local_only,
            _marker: PhantomData,
        }
    }
}

/// The topmost ancestor of `node`.
pub fn document_root<'a, N: DataSourceNode<'a>>(node: N) -> N {
    let mut current = node;
    while let Some(parent) = current.parent() {
        current = parent;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, create_test_tree};

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-12.25), "-12.25");
        assert_eq!(format_number(1e21), "1000000000000000000000");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number("-1.5"), -1.5);
        assert_eq!(string_to_number(".5"), 0.5);
        assert!(string_to_number("1e3").is_nan());
        assert!(string_to_number("+1").is_nan());
        assert!(string_to_number("").is_nan());
        assert!(string_to_number("1.2.3").is_nan());
        assert!(string_to_number("-").is_nan());
    }

    #[test]
    fn test_coercions() {
        let tree = create_test_tree();
        let paras = XPathValue::NodeSet(vec![tree.node(8), tree.node(1)]);
        // First in document order, not first in the vector.
        assert_eq!(paras.to_string(), "Hello");
        assert!(paras.to_bool());
        assert!(paras.to_number().is_nan());

        let empty = XPathValue::<MockNode>::NodeSet(vec![]);
        assert_eq!(empty.to_string(), "");
        assert!(!empty.to_bool());

        assert!(!XPathValue::<MockNode>::Number(f64::NAN).to_bool());
        assert_eq!(XPathValue::<MockNode>::Boolean(true).to_number(), 1.0);
        assert_eq!(XPathValue::<MockNode>::Boolean(false).to_string(), "false");
        assert_eq!(XPathValue::<MockNode>::Number(2.0).to_string(), "2");
    }

    #[test]
    fn test_context_root_and_focus() {
        let tree = create_test_tree();
        let ctx = EvaluationContext::new(tree.node(4));
        assert_eq!(ctx.root_node, tree.root());
        let focused = ctx.focus(tree.node(8), 2, 3);
        assert_eq!(focused.initial_node, tree.node(4));
        assert_eq!(focused.context_position, 2);
        assert_eq!(focused.context_size, 3);
    }
}
