//! Contains pure functions for evaluating XPath binary operators.
//!
//! `and` and `or` short-circuit, so the evaluator handles them before both operands
//! exist; they are still accepted here for callers that already hold both values.

use crate::ast::BinaryOperator;
use crate::context::{XPathValue, string_to_number};
use crate::datasource::DataSourceNode;
use crate::error::XPathError;

pub fn evaluate<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    use BinaryOperator::*;
    match op {
        Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            Ok(XPathValue::Boolean(compare(op, &left, &right)))
        }
        Plus => Ok(XPathValue::Number(left.to_number() + right.to_number())),
        Minus => Ok(XPathValue::Number(left.to_number() - right.to_number())),
        Multiply => Ok(XPathValue::Number(left.to_number() * right.to_number())),
        Divide => Ok(XPathValue::Number(left.to_number() / right.to_number())),
        // Truncating remainder, sign of the dividend, as in XPath.
        Modulo => Ok(XPathValue::Number(left.to_number() % right.to_number())),
        Union => evaluate_union(left, right),
    }
}

/// Compares two values with XPath 1.0 semantics.
///
/// A node-set compared with anything is true if some member satisfies the comparison
/// (against a boolean, the node-set is converted to a boolean first). Between scalars,
/// `=` and `!=` compare as booleans if either side is one, else as numbers if either
/// side is one, else as strings. Relational operators always compare numbers.
pub fn compare<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
            let right_values: Vec<String> = r.iter().map(|n| n.string_value()).collect();
            l.iter().any(|ln| {
                let lv = XPathValue::<N>::String(ln.string_value());
                right_values
                    .iter()
                    .any(|rv| compare_scalars(op, &lv, &XPathValue::String(rv.clone())))
            })
        }
        (XPathValue::NodeSet(nodes), XPathValue::Boolean(_)) => {
            compare_scalars(op, &XPathValue::Boolean(!nodes.is_empty()), right)
        }
        (XPathValue::Boolean(_), XPathValue::NodeSet(nodes)) => {
            compare_scalars(op, left, &XPathValue::Boolean(!nodes.is_empty()))
        }
        (XPathValue::NodeSet(nodes), scalar) => nodes
            .iter()
            .any(|n| compare_scalars(op, &node_as(n, scalar), scalar)),
        (scalar, XPathValue::NodeSet(nodes)) => nodes
            .iter()
            .any(|n| compare_scalars(op, scalar, &node_as(n, scalar))),
        _ => compare_scalars(op, left, right),
    }
}

/// Converts a node to the type of the scalar it is compared against.
fn node_as<'a, N: DataSourceNode<'a>>(node: &N, other: &XPathValue<N>) -> XPathValue<N> {
    let value = node.string_value();
    match other {
        XPathValue::Number(_) => XPathValue::Number(string_to_number(&value)),
        _ => XPathValue::String(value),
    }
}

fn compare_scalars<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    use BinaryOperator::*;
    match op {
        Equals | NotEquals => {
            let want_equal = op == Equals;
            if is_boolean(left) || is_boolean(right) {
                (left.to_bool() == right.to_bool()) == want_equal
            } else if is_number(left) || is_number(right) {
                // NaN is unequal to everything, itself included.
                let (l, r) = (left.to_number(), right.to_number());
                if want_equal { l == r } else { l != r }
            } else {
                (left.to_string() == right.to_string()) == want_equal
            }
        }
        LessThan => left.to_number() < right.to_number(),
        LessThanOrEqual => left.to_number() <= right.to_number(),
        GreaterThan => left.to_number() > right.to_number(),
        GreaterThanOrEqual => left.to_number() >= right.to_number(),
        _ => false,
    }
}

fn is_boolean<N>(value: &XPathValue<N>) -> bool {
    matches!(value, XPathValue::Boolean(_))
}

fn is_number<N>(value: &XPathValue<N>) -> bool {
    matches!(value, XPathValue::Number(_))
}

fn evaluate_union<'a, N: DataSourceNode<'a>>(
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    let mut merged = left.into_node_set("Left-hand side of '|'")?;
    merged.extend(right.into_node_set("Right-hand side of '|'")?);
    merged.sort();
    merged.dedup();
    Ok(XPathValue::NodeSet(merged))
}
