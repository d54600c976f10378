//! Utilities over parsed expressions: a debug printer, the unparser, structural
//! matching with capture points, and positional traversal.
//!
//! All of them see the expression through the same child order, given by
//! [`TreeNode::children`]:
//!
//! | node            | children                         |
//! |-----------------|----------------------------------|
//! | binary operator | `[left, right]`                  |
//! | unary minus     | `[operand]`                      |
//! | function call   | arguments                        |
//! | filter          | `[primary, predicates...]`       |
//! | location path   | `[start point (if any), steps...]` |
//! | step            | predicates                       |
//! | capture         | `[inner]`                        |

pub mod pattern;
pub mod print;
pub mod unparse;

use crate::ast::{Expression, Step};

/// A borrowed node of an expression tree. Steps are nodes of their own so that their
/// predicates can be addressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeNode<'e> {
    Expression(&'e Expression),
    Step(&'e Step),
}

impl<'e> TreeNode<'e> {
    pub fn kind_name(self) -> &'static str {
        match self {
            TreeNode::Expression(expr) => expr.kind_name(),
            TreeNode::Step(_) => "step",
        }
    }

    pub fn as_expression(self) -> Option<&'e Expression> {
        match self {
            TreeNode::Expression(expr) => Some(expr),
            TreeNode::Step(_) => None,
        }
    }

    pub fn as_step(self) -> Option<&'e Step> {
        match self {
            TreeNode::Step(step) => Some(step),
            TreeNode::Expression(_) => None,
        }
    }

    pub fn children(self) -> Vec<TreeNode<'e>> {
        match self {
            TreeNode::Step(step) => step.predicates.iter().map(TreeNode::Expression).collect(),
            TreeNode::Expression(expr) => match expr {
                Expression::Literal(_) | Expression::Number(_) | Expression::Variable(_) => {
                    vec![]
                }
                Expression::FunctionCall { args, .. } => {
                    args.iter().map(TreeNode::Expression).collect()
                }
                Expression::BinaryOp { left, right, .. } => {
                    vec![TreeNode::Expression(left), TreeNode::Expression(right)]
                }
                Expression::UnaryOp { expr, .. } => vec![TreeNode::Expression(expr)],
                Expression::Capture(inner) => vec![TreeNode::Expression(inner)],
                Expression::Filter {
                    primary,
                    predicates,
                } => std::iter::once(&**primary)
                    .chain(predicates)
                    .map(TreeNode::Expression)
                    .collect(),
                Expression::LocationPath(lp) => lp
                    .start_point
                    .as_deref()
                    .map(TreeNode::Expression)
                    .into_iter()
                    .chain(lp.steps.iter().map(TreeNode::Step))
                    .collect(),
            },
        }
    }

    pub fn child(self, index: usize) -> Option<TreeNode<'e>> {
        self.children().get(index).copied()
    }
}

/// Walks from `root` down an index path, one child index per level. An empty path
/// returns the root itself; an index past the last child returns `None`.
pub fn traverse<'e>(root: &'e Expression, path: &[usize]) -> Option<TreeNode<'e>> {
    path.iter()
        .try_fold(TreeNode::Expression(root), |node, &index| node.child(index))
}

/// Mutable counterpart of [`TreeNode`], used to rewrite a node found by index path.
pub(crate) enum TreeNodeMut<'e> {
    Expression(&'e mut Expression),
    Step(&'e mut Step),
}

impl<'e> TreeNodeMut<'e> {
    pub(crate) fn into_child(self, index: usize) -> Option<TreeNodeMut<'e>> {
        match self {
            TreeNodeMut::Step(step) => step.predicates.get_mut(index).map(TreeNodeMut::Expression),
            TreeNodeMut::Expression(expr) => match expr {
                Expression::Literal(_) | Expression::Number(_) | Expression::Variable(_) => None,
                Expression::FunctionCall { args, .. } => {
                    args.get_mut(index).map(TreeNodeMut::Expression)
                }
                Expression::BinaryOp { left, right, .. } => match index {
                    0 => Some(TreeNodeMut::Expression(left)),
                    1 => Some(TreeNodeMut::Expression(right)),
                    _ => None,
                },
                Expression::UnaryOp { expr, .. } | Expression::Capture(expr) => {
                    (index == 0).then_some(TreeNodeMut::Expression(expr))
                }
                Expression::Filter {
                    primary,
                    predicates,
                } => match index {
                    0 => Some(TreeNodeMut::Expression(primary)),
                    n => predicates.get_mut(n - 1).map(TreeNodeMut::Expression),
                },
                Expression::LocationPath(lp) => match lp.start_point.as_deref_mut() {
                    Some(start) if index == 0 => Some(TreeNodeMut::Expression(start)),
                    Some(_) => lp.steps.get_mut(index - 1).map(TreeNodeMut::Step),
                    None => lp.steps.get_mut(index).map(TreeNodeMut::Step),
                },
            },
        }
    }
}

pub(crate) fn traverse_mut<'e>(root: &'e mut Expression, path: &[usize]) -> Option<TreeNodeMut<'e>> {
    path.iter()
        .try_fold(TreeNodeMut::Expression(root), |node, &index| node.into_child(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Axis, NodeTest};
    use crate::parser::parse_expression;

    #[test]
    fn test_traverse_binary_and_function() {
        let expr = parse_expression("count(a/b) = 3").unwrap();
        assert_eq!(traverse(&expr, &[]), Some(TreeNode::Expression(&expr)));

        let count = traverse(&expr, &[0]).and_then(TreeNode::as_expression).unwrap();
        assert_eq!(count.kind_name(), "primaryexpr fn");
        let three = traverse(&expr, &[1]).and_then(TreeNode::as_expression).unwrap();
        assert_eq!(three, &Expression::number(3.0));

        let b = traverse(&expr, &[0, 0, 1]).and_then(TreeNode::as_step).unwrap();
        assert_eq!(b.node_test, NodeTest::name(None, "b"));
        assert_eq!(traverse(&expr, &[2]), None);
        assert_eq!(traverse(&expr, &[1, 0]), None);
    }

    #[test]
    fn test_traverse_paths_and_predicates() {
        let expr = parse_expression("$x[1]/child::a[@id='k']").unwrap();
        // [start point, step a]
        let start = traverse(&expr, &[0]).unwrap();
        assert_eq!(start.kind_name(), "filterexpr");
        assert_eq!(
            traverse(&expr, &[0, 0]).and_then(TreeNode::as_expression),
            Some(&Expression::Variable("x".to_string()))
        );
        let step = traverse(&expr, &[1]).and_then(TreeNode::as_step).unwrap();
        assert_eq!(step.axis, Axis::Child);
        let predicate = traverse(&expr, &[1, 0]).unwrap();
        assert_eq!(predicate.kind_name(), "eqexpr");
    }

    #[test]
    fn test_traverse_mut_reaches_same_node() {
        let mut expr = parse_expression("a[1] or not(b)").unwrap();
        let path = [1, 0];
        let expected = traverse(&expr, &path)
            .and_then(TreeNode::as_expression)
            .cloned()
            .unwrap();
        match traverse_mut(&mut expr, &path) {
            Some(TreeNodeMut::Expression(found)) => assert_eq!(*found, expected),
            _ => panic!("expected an expression at {:?}", path),
        }
        assert!(traverse_mut(&mut expr, &[0, 1]).is_none());
    }
}
