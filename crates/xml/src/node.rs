//! Node handles into an [`XmlTree`] and their `DataSourceNode` implementation.

use crate::tree::{NodeData, NodeId, XmlTree};
use netxpath_types::NodeFlags;
use netxpath_xpath1::{DataSourceNode, NodeType, QName};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A cheap, copyable reference to one node of an [`XmlTree`].
#[derive(Clone, Copy)]
pub struct XmlNode<'a> {
    tree: &'a XmlTree,
    id: NodeId,
}

impl<'a> XmlNode<'a> {
    pub(crate) fn new(tree: &'a XmlTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a XmlTree {
        self.tree
    }

    pub fn to_xml_string(&self) -> String {
        self.tree.to_xml_string(self.id)
    }

    fn data(&self) -> &'a NodeData {
        self.tree.data(self.id)
    }

    fn handles(&self, ids: &'a [NodeId]) -> Box<dyn Iterator<Item = XmlNode<'a>> + 'a> {
        let tree = self.tree;
        Box::new(ids.iter().map(move |&id| XmlNode { tree, id }))
    }

    fn collect_text(&self, out: &mut String) {
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            let data = self.tree.data(id);
            if data.node_type == NodeType::Text {
                out.push_str(&data.value);
            }
            stack.extend(data.children.iter().rev());
        }
    }
}

impl fmt::Debug for XmlNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        f.debug_struct("XmlNode")
            .field("id", &self.id)
            .field("type", &data.node_type)
            .field("name", &data.name)
            .finish()
    }
}

impl PartialEq for XmlNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for XmlNode<'_> {}

impl Hash for XmlNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for XmlNode<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Document order. Nodes of different trees are ordered by tree address, which is
/// arbitrary but consistent.
impl Ord for XmlNode<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        if !std::ptr::eq(self.tree, other.tree) {
            let (a, b): (*const XmlTree, *const XmlTree) = (self.tree, other.tree);
            return a.cmp(&b);
        }
        self.tree
            .document_position(self.id)
            .cmp(&other.tree.document_position(other.id))
    }
}

impl<'a> DataSourceNode<'a> for XmlNode<'a> {
    fn node_type(&self) -> NodeType {
        self.data().node_type
    }

    fn name(&self) -> Option<QName<'a>> {
        let data = self.data();
        match data.node_type {
            NodeType::Element | NodeType::Attribute => Some(QName {
                prefix: data.prefix.as_deref(),
                local_part: &data.name,
            }),
            NodeType::ProcessingInstruction | NodeType::Namespace => Some(QName {
                prefix: None,
                local_part: &data.name,
            }),
            NodeType::Root | NodeType::Text | NodeType::Comment => None,
        }
    }

    fn namespace_uri(&self) -> Option<&'a str> {
        self.data().namespace.as_deref()
    }

    fn string_value(&self) -> String {
        let data = self.data();
        match data.node_type {
            NodeType::Root | NodeType::Element => {
                let mut out = String::new();
                self.collect_text(&mut out);
                out
            }
            _ => data.value.clone(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        self.handles(&self.data().attributes)
    }

    fn namespaces(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let data = self.data();
        Box::new(self.handles(&data.namespaces).chain(self.handles(&data.inherited)))
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        self.handles(&self.data().children)
    }

    fn parent(&self) -> Option<Self> {
        self.data().parent.map(|id| XmlNode::new(self.tree, id))
    }

    fn flags(&self) -> NodeFlags {
        self.data().flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_order_includes_attributes() {
        let mut tree = XmlTree::new();
        let a = tree.add_element(NodeId::ROOT, "a").unwrap();
        let b = tree.add_element(a, "b").unwrap();
        // Added after <b>, but precedes it in document order.
        let attr = tree.add_attribute(a, "id", "1").unwrap();
        let ns = tree.declare_namespace(a, Some("p"), "urn:p").unwrap();

        let mut nodes = vec![tree.node(b), tree.node(attr), tree.node(a), tree.node(ns)];
        nodes.sort();
        let ids: Vec<NodeId> = nodes.iter().map(XmlNode::id).collect();
        assert_eq!(ids, vec![a, ns, attr, b]);
        assert!(tree.root() < tree.node(a));
    }

    #[test]
    fn test_node_identity_and_navigation() {
        let tree = XmlTree::parse(r#"<r><x k="v">t</x></r>"#).unwrap();
        let r = tree.document_element().unwrap();
        let x = r.children().next().unwrap();
        assert_eq!(x.parent(), Some(r));
        assert_eq!(r.parent(), Some(tree.root()));
        assert_eq!(tree.root().parent(), None);

        let k = x.attributes().next().unwrap();
        assert_eq!(k.parent(), Some(x));
        assert_eq!(k.string_value(), "v");
        assert_eq!(k.to_xml_string(), r#"k="v""#);
        assert_eq!(tree.root().string_value(), "t");
        assert!(k.children().next().is_none());
    }

    #[test]
    fn test_flags_are_visible_through_handles() {
        let mut tree = XmlTree::parse("<a><b/><c/></a>").unwrap();
        let b = tree
            .document_element()
            .and_then(|a| a.children().next())
            .map(|b| b.id())
            .unwrap();
        tree.set_flags(b, NodeFlags::MARK);
        tree.insert_flags(b, NodeFlags::CHANGE);
        let flags = tree.node(b).flags();
        assert!(flags.contains(NodeFlags::MARK | NodeFlags::CHANGE));
        assert!(tree.root().flags().is_empty());
    }
}
