//! Structural matching of an expression against a pattern with capture points.
//!
//! A pattern is an ordinary expression in which some subtrees are wrapped in
//! [`Expression::Capture`]. Matching compares kinds, payloads and children node by
//! node. Under a capture point only the kind is compared; the candidate's subtree is
//! then recorded instead of being descended into.
//!
//! String and number literals count as the same kind, so a capture placed on either
//! accepts both.

use super::{TreeNode, TreeNodeMut, traverse_mut};
use crate::ast::Expression;
use crate::error::XPathError;
use crate::parser::parse_expression;

/// The outcome of matching a candidate against a pattern. `captures` holds the
/// candidate subtrees found at the pattern's capture points, in pre-order; it is
/// empty when the match failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'c> {
    pub matched: bool,
    pub captures: Vec<&'c Expression>,
}

pub fn tree_match<'c>(pattern: &Expression, candidate: &'c Expression) -> Match<'c> {
    let mut captures = Vec::new();
    let matched = match_node(
        TreeNode::Expression(pattern),
        TreeNode::Expression(candidate),
        &mut captures,
    );
    if !matched {
        captures.clear();
    }
    Match { matched, captures }
}

fn is_literal_kind(kind: &str) -> bool {
    kind == "primaryexpr str" || kind == "primaryexpr nr"
}

fn same_kind(pattern: TreeNode<'_>, candidate: TreeNode<'_>) -> bool {
    let (p, c) = (pattern.kind_name(), candidate.kind_name());
    p == c || (is_literal_kind(p) && is_literal_kind(c))
}

fn match_node<'c>(
    pattern: TreeNode<'_>,
    candidate: TreeNode<'c>,
    captures: &mut Vec<&'c Expression>,
) -> bool {
    let pattern = match pattern {
        TreeNode::Expression(Expression::Capture(inner)) => {
            let inner = TreeNode::Expression(inner);
            if !same_kind(inner, candidate) {
                log::trace!(
                    "capture kind {} vs {}",
                    inner.kind_name(),
                    candidate.kind_name()
                );
                return false;
            }
            return match candidate {
                TreeNode::Expression(expr) => {
                    captures.push(expr);
                    true
                }
                TreeNode::Step(_) => false,
            };
        }
        other => other,
    };

    if !same_kind(pattern, candidate) {
        log::trace!("kind {} vs {}", pattern.kind_name(), candidate.kind_name());
        return false;
    }
    if !same_payload(pattern, candidate) {
        log::trace!("payload of {} differs", pattern.kind_name());
        return false;
    }

    let pattern_children = pattern.children();
    let candidate_children = candidate.children();
    if pattern_children.len() != candidate_children.len() {
        log::trace!(
            "{} has {} children vs {}",
            pattern.kind_name(),
            pattern_children.len(),
            candidate_children.len()
        );
        return false;
    }
    pattern_children
        .into_iter()
        .zip(candidate_children)
        .all(|(p, c)| match_node(p, c, captures))
}

/// Compares what a node carries besides its children. Nodes of different variants
/// never agree here, which is what keeps a string and a number apart outside capture
/// points.
fn same_payload(pattern: TreeNode<'_>, candidate: TreeNode<'_>) -> bool {
    match (pattern, candidate) {
        (TreeNode::Step(p), TreeNode::Step(c)) => p.axis == c.axis && p.node_test == c.node_test,
        (TreeNode::Expression(p), TreeNode::Expression(c)) => match (p, c) {
            (Expression::Literal(a), Expression::Literal(b)) => a == b,
            (Expression::Number(a), Expression::Number(b)) => a.value == b.value,
            (Expression::Variable(a), Expression::Variable(b)) => a == b,
            (Expression::FunctionCall { name: a, .. }, Expression::FunctionCall { name: b, .. }) => {
                a == b
            }
            (Expression::BinaryOp { op: a, .. }, Expression::BinaryOp { op: b, .. }) => a == b,
            (Expression::UnaryOp { op: a, .. }, Expression::UnaryOp { op: b, .. }) => a == b,
            (Expression::LocationPath(a), Expression::LocationPath(b)) => {
                a.is_absolute == b.is_absolute
                    && a.start_point.is_some() == b.start_point.is_some()
            }
            (Expression::Filter { .. }, Expression::Filter { .. }) => true,
            _ => false,
        },
        _ => false,
    }
}

/// An expression template with capture points, built from parsed XPath.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    expr: Expression,
}

impl Pattern {
    pub fn new(expr: Expression) -> Self {
        Self { expr }
    }

    pub fn parse(xpath: &str) -> Result<Self, XPathError> {
        parse_expression(xpath).map(Self::new)
    }

    /// Marks the expression at `path` (see [`super::traverse`]) as a capture point.
    /// Returns false if the path does not lead to an expression. Paths are resolved
    /// against the current pattern, in which earlier capture points add one level
    /// (`[inner]`) to the tree.
    pub fn capture_at(&mut self, path: &[usize]) -> bool {
        match traverse_mut(&mut self.expr, path) {
            Some(TreeNodeMut::Expression(Expression::Capture(_))) => true,
            Some(TreeNodeMut::Expression(target)) => {
                let inner = std::mem::replace(target, Expression::Literal(String::new()));
                *target = Expression::Capture(Box::new(inner));
                true
            }
            Some(TreeNodeMut::Step(_)) | None => false,
        }
    }

    pub fn matches<'c>(&self, candidate: &'c Expression) -> Match<'c> {
        tree_match(&self.expr, candidate)
    }

    pub fn expr(&self) -> &Expression {
        &self.expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xpath: &str) -> Expression {
        parse_expression(xpath).unwrap()
    }

    #[test]
    fn test_plain_structural_equality() {
        let pattern = parse("/a/b[c = 'x']");
        let same = parse("/a/b[c='x']");
        let result = tree_match(&pattern, &same);
        assert!(result.matched);
        assert!(result.captures.is_empty());

        assert!(!tree_match(&pattern, &parse("/a/b[c = 'y']")).matched);
        assert!(!tree_match(&pattern, &parse("/a/b[c != 'x']")).matched);
        assert!(!tree_match(&pattern, &parse("a/b[c = 'x']")).matched);
        assert!(!tree_match(&pattern, &parse("/a/b[c = 'x'][1]")).matched);
        // Literal kinds are compatible, but their payloads never compare equal.
        assert!(!tree_match(&parse("1"), &parse("'1'")).matched);
    }

    #[test]
    fn test_capture_records_candidate_subtree() {
        let mut pattern = Pattern::parse("/a[b = 'v']").unwrap();
        // step a, its first predicate, right-hand side of '='
        assert!(pattern.capture_at(&[0, 0, 1]));

        let candidate = parse("/a[b = 'other']");
        let result = pattern.matches(&candidate);
        assert!(result.matched);
        assert_eq!(result.captures, vec![&Expression::literal("other")]);

        // A number fits a literal capture point.
        let numeric = parse("/a[b = 42]");
        let result = pattern.matches(&numeric);
        assert!(result.matched);
        assert_eq!(result.captures, vec![&Expression::number(42.0)]);

        // A variable does not.
        assert!(!pattern.matches(&parse("/a[b = $v]")).matched);
        // Outside the capture point, the tree must still match exactly.
        assert!(!pattern.matches(&parse("/a[c = 'other']")).matched);
    }

    #[test]
    fn test_captures_come_in_pre_order() {
        let mut pattern = Pattern::parse("concat('a', 'b')").unwrap();
        assert!(pattern.capture_at(&[1]));
        assert!(pattern.capture_at(&[0]));
        // Capturing twice is a no-op.
        assert!(pattern.capture_at(&[0]));

        let candidate = parse("concat('p', 2)");
        let result = pattern.matches(&candidate);
        assert!(result.matched);
        assert_eq!(
            result.captures,
            vec![&Expression::literal("p"), &Expression::number(2.0)]
        );

        let longer = parse("concat('p', 2, 3)");
        let failed = pattern.matches(&longer);
        assert!(!failed.matched);
        assert!(failed.captures.is_empty());
    }

    #[test]
    fn test_capture_of_whole_subexpression() {
        let mut pattern = Pattern::parse("count(/x) > 0").unwrap();
        assert!(pattern.capture_at(&[0, 0]));
        let candidate = parse("count(/if:interfaces/if:interface) > 0");
        let result = pattern.matches(&candidate);
        assert!(result.matched);
        assert_eq!(result.captures.len(), 1);
        assert_eq!(result.captures[0].to_string(), "/if:interfaces/if:interface");
        // The capture point keeps its kind: a relative path is not an absolute one.
        assert!(!pattern.matches(&parse("count(a/b) > 0")).matched);
    }

    #[test]
    fn test_capture_at_rejects_steps_and_bad_paths() {
        let mut pattern = Pattern::parse("/a[1]").unwrap();
        assert!(!pattern.capture_at(&[0]));
        assert!(!pattern.capture_at(&[3]));
        assert!(pattern.capture_at(&[0, 0]));
        assert_eq!(pattern.expr().to_string(), "/a[1]");
    }
}
