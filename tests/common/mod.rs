pub mod fixtures;

use netxpath::{DataSourceNode, NodeId, XmlNode, XmlTree};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Parses a fixture document, panicking with the parser's message on malformed input.
pub fn parse_tree(xml: &str) -> XmlTree {
    XmlTree::parse(xml).unwrap_or_else(|e| panic!("fixture does not parse: {}", e))
}

/// String values of a node list, for compact assertions.
pub fn string_values(nodes: &[XmlNode<'_>]) -> Vec<String> {
    nodes.iter().map(|n| n.string_value()).collect()
}

/// Local names of a node list.
pub fn local_names(nodes: &[XmlNode<'_>]) -> Vec<String> {
    nodes
        .iter()
        .map(|n| n.name().map(|q| q.local_part.to_string()).unwrap_or_default())
        .collect()
}

/// The id of the first node `xpath` selects, for mutating the tree afterwards.
pub fn id_of(tree: &XmlTree, xpath: &str) -> NodeId {
    netxpath::query::first(tree.root(), None, xpath)
        .unwrap_or_else(|| panic!("'{}' selects nothing", xpath))
        .id()
}
