//! Contains pure functions for collecting nodes along each XPath axis.
//!
//! Every collector appends the axis of a single context node in axis order: document
//! order for forward axes, nearest-first for the reverse ones.

use crate::ast::Axis;
use crate::datasource::{DataSourceNode, NodeType};

/// Appends the nodes on `axis` from `node` to `results`.
pub fn collect<'a, N: DataSourceNode<'a>>(axis: Axis, node: N, results: &mut Vec<N>) {
    match axis {
        Axis::Ancestor => collect_ancestor_nodes(node, results),
        Axis::AncestorOrSelf => {
            results.push(node);
            collect_ancestor_nodes(node, results);
        }
        Axis::Attribute => results.extend(node.attributes()),
        Axis::Child => results.extend(node.children()),
        Axis::Descendant => collect_descendant_nodes(node, results),
        Axis::DescendantOrSelf => {
            results.push(node);
            collect_descendant_nodes(node, results);
        }
        Axis::Following => collect_following_nodes(node, results),
        Axis::FollowingSibling => collect_following_sibling_nodes(node, results),
        Axis::Namespace => collect_namespace_nodes(node, results),
        Axis::Parent => results.extend(node.parent()),
        Axis::Preceding => collect_preceding_nodes(node, results),
        Axis::PrecedingSibling => collect_preceding_sibling_nodes(node, results),
        Axis::SelfAxis => results.push(node),
    }
}

fn is_attached_leaf<'a, N: DataSourceNode<'a>>(node: N) -> bool {
    matches!(node.node_type(), NodeType::Attribute | NodeType::Namespace)
}

pub fn collect_descendant_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(current) = stack.pop() {
        results.push(current);
        let start = stack.len();
        stack.extend(current.children());
        stack[start..].reverse();
    }
}

pub fn collect_ancestor_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node.parent();
    while let Some(p) = current {
        results.push(p);
        current = p.parent();
    }
}

pub fn collect_following_sibling_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if is_attached_leaf(node) {
        return;
    }
    if let Some(parent) = node.parent() {
        results.extend(parent.children().skip_while(|sibling| *sibling != node).skip(1));
    }
}

pub fn collect_preceding_sibling_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if is_attached_leaf(node) {
        return;
    }
    if let Some(parent) = node.parent() {
        let mut siblings: Vec<N> = parent.children().take_while(|sibling| *sibling != node).collect();
        siblings.reverse();
        results.extend(siblings);
    }
}

pub fn collect_following_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node;
    // The content of an attribute's element follows the attribute.
    if is_attached_leaf(node) {
        let Some(element) = node.parent() else {
            return;
        };
        for child in element.children() {
            results.push(child);
            collect_descendant_nodes(child, results);
        }
        current = element;
    }

    let mut level = Some(current);
    while let Some(c) = level {
        let parent = c.parent();
        if let Some(p) = parent {
            for sibling in p.children().skip_while(|s| *s != c).skip(1) {
                results.push(sibling);
                collect_descendant_nodes(sibling, results);
            }
        }
        level = parent;
    }
}

pub fn collect_preceding_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let start = if is_attached_leaf(node) {
        match node.parent() {
            Some(element) => element,
            None => return,
        }
    } else {
        node
    };

    let mut found = Vec::new();
    let mut level = Some(start);
    while let Some(c) = level {
        let parent = c.parent();
        if let Some(p) = parent {
            for sibling in p.children().take_while(|s| *s != c) {
                found.push(sibling);
                collect_descendant_nodes(sibling, &mut found);
            }
        }
        level = parent;
    }
    found.sort();
    found.reverse();
    results.extend(found);
}

/// The namespace nodes of an element, one per binding in scope.
pub fn collect_namespace_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if node.node_type() == NodeType::Element {
        results.extend(node.namespaces());
    }
}
