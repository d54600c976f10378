//! The evaluation engine for executing a parsed XPath AST against a generic `DataSourceNode`.

use super::ast::{
    Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, Step, UnaryOperator,
};
use super::{axes, functions, operators};
use crate::context::{EvaluationContext, XPathValue};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use std::collections::HashSet;

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a>,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(n.value)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::Variable(name) => e_ctx
            .variables
            .and_then(|vars| vars.get(name))
            .cloned()
            .ok_or_else(|| XPathError::UnknownVariable(name.clone())),
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::BinaryOp { left, op, right } => match op {
            BinaryOperator::Or => {
                if evaluate(left, e_ctx)?.to_bool() {
                    return Ok(XPathValue::Boolean(true));
                }
                Ok(XPathValue::Boolean(evaluate(right, e_ctx)?.to_bool()))
            }
            BinaryOperator::And => {
                if !evaluate(left, e_ctx)?.to_bool() {
                    return Ok(XPathValue::Boolean(false));
                }
                Ok(XPathValue::Boolean(evaluate(right, e_ctx)?.to_bool()))
            }
            _ => {
                let left_val = evaluate(left, e_ctx)?;
                let right_val = evaluate(right, e_ctx)?;
                operators::evaluate(*op, left_val, right_val)
            }
        },
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number())),
            }
        }
        Expression::Filter {
            primary,
            predicates,
        } => {
            let mut nodes = evaluate(primary, e_ctx)?.into_node_set("A filtered expression")?;
            nodes.sort();
            nodes.dedup();
            Ok(XPathValue::NodeSet(apply_predicates(nodes, predicates, e_ctx)?))
        }
        Expression::Capture(inner) => evaluate(inner, e_ctx),
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a>,
{
    let initial_context = if let Some(start_expr) = &path.start_point {
        // The path starts from the result of another expression.
        evaluate(start_expr, e_ctx)?.into_node_set("The start of a path")?
    } else if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    let mut current_nodes = initial_context;
    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
        if current_nodes.is_empty() {
            break;
        }
    }
    Ok(current_nodes)
}

/// Evaluates a single step: for every context node, collect the axis, apply the node
/// test, then the predicates (positions counted along the axis). The union of the
/// per-node results is returned without duplicates, in document order for forward axes
/// and in reverse document order for reverse ones.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a>,
{
    let mut results = Vec::new();
    let mut seen = HashSet::new();

    for &node in context_nodes {
        let mut axis_nodes = Vec::new();
        axes::collect(step.axis, node, &mut axis_nodes);
        let tested = filter_by_node_test(axis_nodes, &step.node_test, step.axis, e_ctx)?;
        for selected in apply_predicates(tested, &step.predicates, e_ctx)? {
            if seen.insert(selected) {
                results.push(selected);
            }
        }
    }

    if context_nodes.len() > 1 {
        results.sort();
        if step.axis.is_reverse() {
            results.reverse();
        }
    }
    log::trace!(
        "step {}::{:?} selected {} nodes",
        step.axis.name(),
        step.node_test,
        results.len()
    );
    Ok(results)
}

/// The node type a name test or `*` selects on an axis.
fn principal_node_type(axis: Axis) -> NodeType {
    match axis {
        Axis::Attribute => NodeType::Attribute,
        Axis::Namespace => NodeType::Namespace,
        _ => NodeType::Element,
    }
}

/// Filters nodes by a `NodeTest`, resolving name prefixes through the context's
/// namespace bindings.
fn filter_by_node_test<'a, N>(
    nodes: Vec<N>,
    test: &NodeTest,
    axis: Axis,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a>,
{
    let principal = principal_node_type(axis);
    let mut kept = Vec::with_capacity(nodes.len());
    for node in nodes {
        let keep = match test {
            NodeTest::NodeType(ntt) => match ntt {
                NodeTypeTest::Node => true,
                NodeTypeTest::Text => node.node_type() == NodeType::Text,
                NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
                NodeTypeTest::ProcessingInstruction(target) => {
                    node.node_type() == NodeType::ProcessingInstruction
                        && target.as_deref().is_none_or(|t| {
                            node.name().is_some_and(|q| q.local_part == t)
                        })
                }
            },
            NodeTest::Wildcard { prefix } => {
                node.node_type() == principal
                    && match prefix {
                        Some(p) => namespace_matches(Some(p), node, principal, e_ctx)?,
                        None => true,
                    }
            }
            NodeTest::Name { prefix, local } => {
                node.node_type() == principal
                    && node.name().is_some_and(|q| q.local_part == local)
                    && namespace_matches(prefix.as_deref(), node, principal, e_ctx)?
            }
        };
        if keep {
            kept.push(node);
        }
    }
    Ok(kept)
}

/// Decides whether the namespace part of a name test matches `node`.
///
/// - In local-only mode every namespace matches.
/// - Without namespace bindings the test prefix is compared with the prefix written
///   in the document.
/// - With bindings the test prefix is resolved and compared with the node's namespace
///   URI. An unprefixed element test uses the default binding; an unprefixed attribute
///   test only matches attributes in no namespace.
fn namespace_matches<'a, N>(
    prefix: Option<&str>,
    node: N,
    principal: NodeType,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<bool, XPathError>
where
    N: DataSourceNode<'a>,
{
    if e_ctx.local_only || principal == NodeType::Namespace {
        return Ok(true);
    }
    let Some(nsc) = e_ctx.namespaces else {
        return Ok(node.name().and_then(|q| q.prefix) == prefix);
    };
    let expected = match prefix {
        Some(p) => Some(
            nsc.get(Some(p))
                .ok_or_else(|| XPathError::UnresolvedPrefix(p.to_string()))?,
        ),
        None if principal == NodeType::Attribute => None,
        None => nsc.default_namespace(),
    };
    Ok(expected == node.namespace_uri())
}

/// Filters a node list by a series of predicates. Each predicate sees the survivors of
/// the previous one, numbered 1..n in list order. A numeric result keeps the node whose
/// position equals it; any other result is converted to a boolean.
fn apply_predicates<'a, N>(
    nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a>,
{
    let mut final_nodes = nodes;
    for predicate in predicates {
        let context_size = final_nodes.len();
        let mut predicate_results = Vec::with_capacity(context_size);
        for (i, node) in final_nodes.into_iter().enumerate() {
            let predicate_e_ctx = e_ctx.focus(node, i + 1, context_size);
            let keep = match evaluate(predicate, &predicate_e_ctx)? {
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_bool(),
            };
            if keep {
                predicate_results.push(node);
            }
        }
        final_nodes = predicate_results;
    }
    Ok(final_nodes)
}
