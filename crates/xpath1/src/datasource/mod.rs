//! Defines the core abstraction for a navigable, read-only data source tree.
use netxpath_types::NodeFlags;
use std::hash::Hash;

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

impl std::fmt::Display for QName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local_part),
            None => write!(f, "{}", self.local_part),
        }
    }
}

/// The type of a node in the data source tree, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Namespace,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The contract for a node in a read-only, hierarchical data source.
///
/// The evaluator is written exclusively against this trait, so it can run over any
/// tree (a parsed configuration document, a datastore snapshot, a test fixture) that
/// implements it.
///
/// `'a` is the lifetime of the underlying tree. `Ord` must be document order.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord + 'a
{
    /// The type of the node (Element, Text, Attribute, etc.).
    fn node_type(&self) -> NodeType;

    /// The qualified name of the node as written in the document (e.g., `if:name`).
    /// Returns `None` for node types that do not have names, such as text or root nodes.
    /// For a processing-instruction this is its target; for a namespace node the local
    /// part is the declared prefix (empty for the default namespace).
    fn name(&self) -> Option<QName<'a>>;

    /// The namespace URI the node's name resolves to, if any.
    fn namespace_uri(&self) -> Option<&'a str>;

    /// The string value of the node, as defined by the XPath 1.0 `string()` function.
    /// - For a text node, this is its content.
    /// - For an element or the root, this is the concatenation of the string values of
    ///   all its descendant text nodes.
    /// - For an attribute, this is its value; for a namespace node, its URI.
    /// - For a comment or processing instruction, this is its content.
    fn string_value(&self) -> String;

    /// An iterator over the attribute nodes of this node.
    /// The iterator will be empty for non-element nodes. Namespace declarations are
    /// not attributes.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The namespace nodes of this element: its own declarations, then one node for each
    /// binding it inherits without redeclaring. Every one of them has this element as
    /// its parent, so two elements never share a namespace node.
    fn namespaces(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        Box::new(std::iter::empty())
    }

    /// An iterator over the child nodes of this node.
    /// The iterator will be empty for leaf nodes (like text or attributes).
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node. Returns `None` only for the root of the tree. The parent of an
    /// attribute or namespace node is its element.
    fn parent(&self) -> Option<Self>;

    /// Application marker bits. Only consulted when filtering query results.
    fn flags(&self) -> NodeFlags {
        NodeFlags::empty()
    }
}

// Test utilities - publicly available for integration testing in downstream crates
pub mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::hash::Hasher;

    // --- Mock Implementation ---

    #[derive(Debug, Clone)]
    struct MockNodeData<'a> {
        node_type: NodeType,
        name: Option<QName<'a>>,
        namespace: Option<&'a str>,
        value: String,
        children: Vec<usize>,
        attributes: Vec<usize>,
        namespaces: Vec<usize>,
        parent: Option<usize>,
        flags: NodeFlags,
    }

    impl<'a> MockNodeData<'a> {
        fn new(node_type: NodeType, parent: Option<usize>) -> Self {
            Self {
                node_type,
                name: None,
                namespace: None,
                value: String::new(),
                children: vec![],
                attributes: vec![],
                namespaces: vec![],
                parent,
                flags: NodeFlags::empty(),
            }
        }
    }

    /// An arena of nodes addressed by id. Ids are handed out in insertion order and
    /// double as document order, so trees must be built top to bottom. The copies made
    /// by [`MockTree::inherit_namespaces`] are the exception and sort last.
    #[derive(Debug)]
    pub struct MockTree<'a> {
        nodes: Vec<MockNodeData<'a>>,
    }

    impl<'a> Default for MockTree<'a> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<'a> MockTree<'a> {
        /// A tree holding only its root node (id 0).
        pub fn new() -> Self {
            Self {
                nodes: vec![MockNodeData::new(NodeType::Root, None)],
            }
        }

        pub fn node(&'a self, id: usize) -> MockNode<'a> {
            MockNode { id, tree: self }
        }

        pub fn root(&'a self) -> MockNode<'a> {
            self.node(0)
        }

        fn push(&mut self, data: MockNodeData<'a>) -> usize {
            self.nodes.push(data);
            self.nodes.len() - 1
        }

        pub fn add_element(
            &mut self,
            parent: usize,
            prefix: Option<&'a str>,
            local_part: &'a str,
            namespace: Option<&'a str>,
        ) -> usize {
            let mut data = MockNodeData::new(NodeType::Element, Some(parent));
            data.name = Some(QName { prefix, local_part });
            data.namespace = namespace;
            let id = self.push(data);
            self.nodes[parent].children.push(id);
            id
        }

        pub fn add_attribute(
            &mut self,
            element: usize,
            prefix: Option<&'a str>,
            local_part: &'a str,
            value: &str,
        ) -> usize {
            let mut data = MockNodeData::new(NodeType::Attribute, Some(element));
            data.name = Some(QName { prefix, local_part });
            data.value = value.to_string();
            let id = self.push(data);
            self.nodes[element].attributes.push(id);
            id
        }

        pub fn add_namespace(&mut self, element: usize, prefix: Option<&'a str>, uri: &'a str) -> usize {
            let mut data = MockNodeData::new(NodeType::Namespace, Some(element));
            data.name = Some(QName {
                prefix: None,
                local_part: prefix.unwrap_or(""),
            });
            data.value = uri.to_string();
            let id = self.push(data);
            self.nodes[element].namespaces.push(id);
            id
        }

        /// Gives every element below the root its own copies of the bindings declared
        /// on its ancestors and not redeclared. Call once the tree is complete.
        pub fn inherit_namespaces(&mut self) {
            let mut stack: Vec<(usize, Vec<(&'a str, usize)>)> = vec![(0, vec![])];
            while let Some((id, in_scope)) = stack.pop() {
                let mut scope = in_scope.clone();
                if self.nodes[id].node_type == NodeType::Element {
                    let declared: Vec<usize> = self.nodes[id].namespaces.clone();
                    let declared_names: Vec<&'a str> = declared
                        .iter()
                        .filter_map(|&ns| self.nodes[ns].name.map(|q| q.local_part))
                        .collect();
                    for &(prefix, source) in &in_scope {
                        if declared_names.contains(&prefix) {
                            continue;
                        }
                        let mut data = MockNodeData::new(NodeType::Namespace, Some(id));
                        data.name = self.nodes[source].name;
                        data.value = self.nodes[source].value.clone();
                        let copy = self.push(data);
                        self.nodes[id].namespaces.push(copy);
                    }
                    scope.retain(|(prefix, _)| !declared_names.contains(prefix));
                    scope.extend(declared_names.into_iter().zip(declared));
                }
                for &child in self.nodes[id].children.iter().rev() {
                    stack.push((child, scope.clone()));
                }
            }
        }

        pub fn add_text(&mut self, parent: usize, text: &str) -> usize {
            self.add_leaf(parent, NodeType::Text, None, text)
        }

        pub fn add_comment(&mut self, parent: usize, text: &str) -> usize {
            self.add_leaf(parent, NodeType::Comment, None, text)
        }

        pub fn add_processing_instruction(&mut self, parent: usize, target: &'a str, value: &str) -> usize {
            let name = QName {
                prefix: None,
                local_part: target,
            };
            self.add_leaf(parent, NodeType::ProcessingInstruction, Some(name), value)
        }

        fn add_leaf(
            &mut self,
            parent: usize,
            node_type: NodeType,
            name: Option<QName<'a>>,
            value: &str,
        ) -> usize {
            let mut data = MockNodeData::new(node_type, Some(parent));
            data.name = name;
            data.value = value.to_string();
            let id = self.push(data);
            self.nodes[parent].children.push(id);
            id
        }

        pub fn set_flags(&mut self, id: usize, flags: NodeFlags) {
            self.nodes[id].flags = flags;
        }

        fn collect_text(&self, id: usize, out: &mut String) {
            for &child in &self.nodes[id].children {
                match self.nodes[child].node_type {
                    NodeType::Text => out.push_str(&self.nodes[child].value),
                    NodeType::Element => self.collect_text(child, out),
                    _ => {}
                }
            }
        }
    }

    /// A node handle: the tree plus an index into it.
    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree<'a>,
    }

    impl<'a> PartialEq for MockNode<'a> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl<'a> Eq for MockNode<'a> {}

    impl<'a> PartialOrd for MockNode<'a> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl<'a> Ord for MockNode<'a> {
        fn cmp(&self, other: &Self) -> Ordering {
            self.id.cmp(&other.id)
        }
    }

    impl<'a> Hash for MockNode<'a> {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl<'a> MockNode<'a> {
        fn data(&self) -> &'a MockNodeData<'a> {
            &self.tree.nodes[self.id]
        }

        fn handles(&self, ids: &'a [usize]) -> Box<dyn Iterator<Item = MockNode<'a>> + 'a> {
            let tree = self.tree;
            Box::new(ids.iter().map(move |&id| MockNode { id, tree }))
        }
    }

    impl<'a> DataSourceNode<'a> for MockNode<'a> {
        fn node_type(&self) -> NodeType {
            self.data().node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            self.data().name
        }

        fn namespace_uri(&self) -> Option<&'a str> {
            self.data().namespace
        }

        fn string_value(&self) -> String {
            match self.node_type() {
                NodeType::Root | NodeType::Element => {
                    let mut out = String::new();
                    self.tree.collect_text(self.id, &mut out);
                    out
                }
                _ => self.data().value.clone(),
            }
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            self.handles(&self.data().attributes)
        }

        fn namespaces(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            self.handles(&self.data().namespaces)
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            self.handles(&self.data().children)
        }

        fn parent(&self) -> Option<Self> {
            self.data().parent.map(|id| MockNode {
                id,
                tree: self.tree,
            })
        }

        fn flags(&self) -> NodeFlags {
            self.data().flags
        }
    }

    /// Creates a simple mock tree for testing:
    /// ```text
    /// (root)                                      id 0
    ///   <para id="p1" xml:lang="en">Hello</para>  id 1, attrs 2 & 3, text 4
    ///   <!-- comment node -->                     id 5
    ///   <div></div>                               id 6
    ///   <?pi-target pi-value?>                    id 7
    ///   <para>World</para>                        id 8, text 9
    /// ```
    pub fn create_test_tree<'a>() -> MockTree<'a> {
        let mut tree = MockTree::new();
        let para = tree.add_element(0, None, "para", None);
        tree.add_attribute(para, None, "id", "p1");
        tree.add_attribute(para, Some("xml"), "lang", "en");
        tree.add_text(para, "Hello");
        tree.add_comment(0, " comment node ");
        tree.add_element(0, None, "div", None);
        tree.add_processing_instruction(0, "pi-target", "pi-value");
        let para2 = tree.add_element(0, None, "para", None);
        tree.add_text(para2, "World");
        tree
    }

    pub const DEFAULT_NS: &str = "urn:example:default";
    pub const X_NS: &str = "urn:example:x";

    /// Creates a namespaced configuration-style tree. Each item also owns copies of the
    /// two bindings of `<config>`, appended as ids 10 to 15:
    /// ```text
    /// (root)                                                      id 0
    ///   <config xmlns="urn:example:default" xmlns:x="urn:example:x">  id 1, ns 2 & 3
    ///     <x:item>A</x:item>                                      id 4, text 5
    ///     <item>B</item>                                          id 6, text 7 (CHANGE flag)
    ///     <x:item>C</x:item>                                      id 8, text 9
    ///   </config>
    /// ```
    pub fn create_namespaced_tree<'a>() -> MockTree<'a> {
        let mut tree = MockTree::new();
        let config = tree.add_element(0, None, "config", Some(DEFAULT_NS));
        tree.add_namespace(config, None, DEFAULT_NS);
        tree.add_namespace(config, Some("x"), X_NS);
        let a = tree.add_element(config, Some("x"), "item", Some(X_NS));
        tree.add_text(a, "A");
        let b = tree.add_element(config, None, "item", Some(DEFAULT_NS));
        tree.add_text(b, "B");
        tree.set_flags(b, NodeFlags::CHANGE);
        let c = tree.add_element(config, Some("x"), "item", Some(X_NS));
        tree.add_text(c, "C");
        tree.inherit_namespaces();
        tree
    }

    #[test]
    fn test_mock_tree_navigation() {
        let tree = create_test_tree();
        let root = tree.root();
        let children: Vec<usize> = root.children().map(|n| n.id).collect();
        assert_eq!(children, vec![1, 5, 6, 7, 8]);
        assert_eq!(root.string_value(), "HelloWorld");

        let para = tree.node(1);
        assert_eq!(para.attributes().count(), 2);
        assert_eq!(tree.node(3).parent(), Some(para));
        assert_eq!(
            tree.node(3).name().map(|q| q.to_string()),
            Some("xml:lang".to_string())
        );
    }

    #[test]
    fn test_mock_namespace_nodes() {
        let tree = create_namespaced_tree();
        let config = tree.node(1);
        let declared: Vec<(String, String)> = config
            .namespaces()
            .map(|ns| (ns.name().unwrap().local_part.to_string(), ns.string_value()))
            .collect();
        assert_eq!(
            declared,
            vec![
                (String::new(), DEFAULT_NS.to_string()),
                ("x".to_string(), X_NS.to_string())
            ]
        );
        assert_eq!(tree.node(4).namespace_uri(), Some(X_NS));
        assert!(tree.node(6).flags().contains(NodeFlags::CHANGE));

        let inherited: Vec<usize> = tree.node(4).namespaces().map(|ns| ns.id).collect();
        assert_eq!(inherited, vec![10, 11]);
        assert_eq!(tree.node(11).string_value(), X_NS);
        assert_eq!(tree.node(11).parent(), Some(tree.node(4)));
    }
}
