//! An arena-allocated XML tree.
//!
//! Nodes live in one vector and refer to each other by [`NodeId`]. Attributes and
//! namespace declarations are nodes of their own, owned by their element, so that the
//! XPath `attribute` and `namespace` axes can hand them out like any other node.

use crate::error::XmlError;
use crate::node::XmlNode;
use netxpath_types::{NamespaceContext, NodeFlags};
use netxpath_xpath1::NodeType;
use std::fmt;
use std::sync::OnceLock;

/// The namespace permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Index of a node in its [`XmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) node_type: NodeType,
    pub(crate) prefix: Option<String>,
    /// Local name, processing-instruction target, or the prefix a namespace node
    /// declares ("" for the default namespace).
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    /// Text and comment content, attribute value, PI data, or a namespace node's URI.
    pub(crate) value: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attributes: Vec<NodeId>,
    /// Declarations made on this element.
    pub(crate) namespaces: Vec<NodeId>,
    /// This element's copies of the bindings it inherits without redeclaring them.
    pub(crate) inherited: Vec<NodeId>,
    pub(crate) flags: NodeFlags,
}

impl NodeData {
    fn new(node_type: NodeType, name: &str, value: &str) -> Self {
        Self {
            node_type,
            prefix: None,
            name: name.to_string(),
            namespace: None,
            value: value.to_string(),
            parent: None,
            children: vec![],
            attributes: vec![],
            namespaces: vec![],
            inherited: vec![],
            flags: NodeFlags::empty(),
        }
    }

    fn named(
        node_type: NodeType,
        prefix: Option<&str>,
        local: &str,
        namespace: Option<&str>,
        value: &str,
    ) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            namespace: namespace.map(str::to_string),
            ..Self::new(node_type, local, value)
        }
    }

    fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.name),
            None => self.name.clone(),
        }
    }
}

/// An owned XML document. Node handles ([`XmlNode`]) borrow the tree; all mutation goes
/// through `&mut XmlTree`, so a tree is never changed while it is being queried.
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<NodeData>,
    /// Document-order rank of every node, built on first comparison.
    order: OnceLock<Vec<u32>>,
}

impl Default for XmlTree {
    fn default() -> Self {
        Self::new()
    }
}

fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

impl XmlTree {
    /// A tree holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeType::Root, "", "")],
            order: OnceLock::new(),
        }
    }

    /// Parses an XML document. Whitespace text between elements is kept, as the XPath
    /// data model requires.
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let doc = roxmltree::Document::parse(text)?;
        let mut tree = XmlTree::new();
        for child in doc.root().children() {
            tree.import(NodeId::ROOT, child)?;
        }
        log::debug!("parsed XML document into {} nodes", tree.len());
        Ok(tree)
    }

    fn import(&mut self, parent: NodeId, node: roxmltree::Node<'_, '_>) -> Result<(), XmlError> {
        match node.node_type() {
            roxmltree::NodeType::Element => {
                let tag = node.tag_name();
                let prefix = element_prefix(node);
                let id = self.add_element_ns(parent, prefix.as_deref(), tag.name(), tag.namespace())?;

                let inherited: Vec<(Option<&str>, &str)> = node
                    .parent_element()
                    .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
                    .unwrap_or_default();
                for ns in node.namespaces() {
                    if ns.name() == Some("xml") || inherited.contains(&(ns.name(), ns.uri())) {
                        continue;
                    }
                    self.declare_namespace(id, ns.name(), ns.uri())?;
                }

                for attr in node.attributes() {
                    let prefix = attr.namespace().and_then(|uri| attribute_prefix(node, uri));
                    self.push_attribute(id, prefix.as_deref(), attr.name(), attr.namespace(), attr.value())?;
                }
                for child in node.children() {
                    self.import(id, child)?;
                }
            }
            roxmltree::NodeType::Text => {
                self.add_text(parent, node.text().unwrap_or_default())?;
            }
            roxmltree::NodeType::Comment => {
                self.add_comment(parent, node.text().unwrap_or_default())?;
            }
            roxmltree::NodeType::PI => {
                if let Some(pi) = node.pi() {
                    self.add_processing_instruction(parent, pi.target, pi.value.unwrap_or_default())?;
                }
            }
            roxmltree::NodeType::Root => {}
        }
        Ok(())
    }

    pub fn root(&self) -> XmlNode<'_> {
        XmlNode::new(self, NodeId::ROOT)
    }

    /// The handle for `id`.
    ///
    /// # Panics
    ///
    /// If `id` was not handed out by this tree. Use [`XmlTree::get`] for ids of unknown
    /// origin.
    pub fn node(&self, id: NodeId) -> XmlNode<'_> {
        assert!(id.index() < self.nodes.len(), "node {} is not in this tree", id);
        XmlNode::new(self, id)
    }

    /// The handle for `id`, or `None` when the tree has no such node.
    pub fn get(&self, id: NodeId) -> Option<XmlNode<'_>> {
        (id.index() < self.nodes.len()).then(|| XmlNode::new(self, id))
    }

    /// The first element child of the root.
    pub fn document_element(&self) -> Option<XmlNode<'_>> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|&id| self.data(id).node_type == NodeType::Element)
            .map(|id| self.node(id))
    }

    /// Number of nodes, the root and attribute and namespace nodes included. Every
    /// element counts one namespace node per binding in scope.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub(crate) fn document_position(&self, id: NodeId) -> u32 {
        self.order.get_or_init(|| self.compute_order())[id.index()]
    }

    /// Pre-order ranks: an element, then its declared and inherited namespace nodes, then
    /// its attributes, then its content.
    fn compute_order(&self) -> Vec<u32> {
        let mut order = vec![0; self.nodes.len()];
        let mut rank = 0;
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let data = self.data(id);
            order[id.index()] = rank;
            rank += 1;
            let leaves = data.namespaces.iter().chain(&data.inherited).chain(&data.attributes);
            for &owned in leaves {
                order[owned.index()] = rank;
                rank += 1;
            }
            stack.extend(data.children.iter().rev());
        }
        order
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            parent: Some(parent),
            ..data
        });
        self.order = OnceLock::new();
        id
    }

    fn check_container(&self, id: NodeId, allow_root: bool) -> Result<(), XmlError> {
        match self.data(id).node_type {
            NodeType::Element => Ok(()),
            NodeType::Root if allow_root => Ok(()),
            _ => Err(XmlError::NotAnElement(id.0)),
        }
    }

    fn push_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, XmlError> {
        self.check_container(parent, true)?;
        let id = self.push(parent, data);
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    fn push_attribute(
        &mut self,
        element: NodeId,
        prefix: Option<&str>,
        local: &str,
        namespace: Option<&str>,
        value: &str,
    ) -> Result<NodeId, XmlError> {
        self.check_container(element, false)?;
        let data = NodeData::named(NodeType::Attribute, prefix, local, namespace, value);
        let id = self.push(element, data);
        self.nodes[element.index()].attributes.push(id);
        Ok(id)
    }

    /// Resolves a prefix (or the default namespace, for `None`) against the declarations
    /// in scope at `id`.
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        let key = prefix.unwrap_or_default();
        let mut current = Some(id);
        while let Some(node) = current {
            let data = self.data(node);
            if let Some(&ns) = data.namespaces.iter().find(|&&ns| self.data(ns).name == key) {
                return Some(&self.data(ns).value);
            }
            current = data.parent;
        }
        None
    }

    /// Adds an element whose name is resolved against the declarations in scope at
    /// `parent`. An unprefixed name takes the default namespace.
    pub fn add_element(&mut self, parent: NodeId, qname: &str) -> Result<NodeId, XmlError> {
        let (prefix, local) = split_qname(qname);
        let namespace = match (prefix, self.lookup_namespace(parent, prefix)) {
            (Some(p), None) => return Err(XmlError::UnboundPrefix(p.to_string())),
            (_, namespace) => namespace.map(str::to_string),
        };
        self.add_element_ns(parent, prefix, local, namespace.as_deref())
    }

    /// Adds an element with an explicit namespace, as when the element declares the
    /// namespace of its own prefix.
    pub fn add_element_ns(
        &mut self,
        parent: NodeId,
        prefix: Option<&str>,
        local: &str,
        namespace: Option<&str>,
    ) -> Result<NodeId, XmlError> {
        let data = NodeData::named(NodeType::Element, prefix, local, namespace, "");
        let id = self.push_child(parent, data)?;
        let in_scope = self.namespace_context(parent);
        for (prefix, uri) in in_scope.iter() {
            let data = NodeData::new(NodeType::Namespace, prefix.unwrap_or_default(), uri);
            let copy = self.push(id, data);
            self.nodes[id.index()].inherited.push(copy);
        }
        Ok(id)
    }

    /// Adds an attribute. An unprefixed attribute is in no namespace.
    pub fn add_attribute(
        &mut self,
        element: NodeId,
        qname: &str,
        value: &str,
    ) -> Result<NodeId, XmlError> {
        let (prefix, local) = split_qname(qname);
        let namespace = match prefix {
            Some(p) => Some(
                self.lookup_namespace(element, Some(p))
                    .ok_or_else(|| XmlError::UnboundPrefix(p.to_string()))?
                    .to_string(),
            ),
            None => None,
        };
        self.push_attribute(element, prefix, local, namespace.as_deref(), value)
    }

    /// Declares `xmlns:prefix="uri"` (or `xmlns="uri"` for `None`) on an element.
    ///
    /// The binding also reaches the namespace nodes of descendants that do not declare
    /// the prefix themselves.
    pub fn declare_namespace(
        &mut self,
        element: NodeId,
        prefix: Option<&str>,
        uri: &str,
    ) -> Result<NodeId, XmlError> {
        self.check_container(element, false)?;
        let key = prefix.unwrap_or_default();
        // A redeclared binding turns the element's inherited copy into its declaration.
        let id = match self.inherited_position(element, key) {
            Some(pos) => {
                let id = self.nodes[element.index()].inherited.remove(pos);
                self.nodes[id.index()].value = uri.to_string();
                self.order = OnceLock::new();
                id
            }
            None => self.push(element, NodeData::new(NodeType::Namespace, key, uri)),
        };
        self.nodes[element.index()].namespaces.push(id);
        let children = self.data(element).children.clone();
        for child in children {
            self.inherit_binding(child, key, uri);
        }
        Ok(id)
    }

    fn inherited_position(&self, element: NodeId, key: &str) -> Option<usize> {
        self.data(element)
            .inherited
            .iter()
            .position(|&ns| self.data(ns).name == key)
    }

    /// Points the inherited copy of `key` at `uri` in `id` and below, stopping at
    /// elements that declare `key` themselves.
    fn inherit_binding(&mut self, id: NodeId, key: &str, uri: &str) {
        let data = self.data(id);
        if data.node_type != NodeType::Element
            || data.namespaces.iter().any(|&ns| self.data(ns).name == key)
        {
            return;
        }
        match self.inherited_position(id, key) {
            Some(pos) => {
                let copy = self.data(id).inherited[pos];
                self.nodes[copy.index()].value = uri.to_string();
            }
            None => {
                let copy = self.push(id, NodeData::new(NodeType::Namespace, key, uri));
                self.nodes[id.index()].inherited.push(copy);
            }
        }
        let children = self.data(id).children.clone();
        for child in children {
            self.inherit_binding(child, key, uri);
        }
    }

    pub fn add_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, XmlError> {
        self.push_child(parent, NodeData::new(NodeType::Text, "", text))
    }

    pub fn add_comment(&mut self, parent: NodeId, text: &str) -> Result<NodeId, XmlError> {
        self.push_child(parent, NodeData::new(NodeType::Comment, "", text))
    }

    pub fn add_processing_instruction(
        &mut self,
        parent: NodeId,
        target: &str,
        value: &str,
    ) -> Result<NodeId, XmlError> {
        let data = NodeData::new(NodeType::ProcessingInstruction, target, value);
        self.push_child(parent, data)
    }

    /// Replaces the marker flags of a node.
    ///
    /// # Panics
    ///
    /// If `id` was not handed out by this tree.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        self.nodes[id.index()].flags = flags;
    }

    /// Adds marker flags to a node, keeping those already set. Panics like
    /// [`XmlTree::set_flags`].
    pub fn insert_flags(&mut self, id: NodeId, flags: NodeFlags) {
        self.nodes[id.index()].flags.insert(flags);
    }

    /// The namespace bindings in scope at a node, nearest declaration first. For an
    /// attribute or text node, those of its element.
    pub fn namespace_context(&self, id: NodeId) -> NamespaceContext {
        let mut nsc = NamespaceContext::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let data = self.data(node);
            for &ns in &data.namespaces {
                let decl = self.data(ns);
                let prefix = (!decl.name.is_empty()).then_some(decl.name.as_str());
                if !nsc.contains_prefix(prefix) {
                    nsc.insert(prefix, decl.value.as_str());
                }
            }
            current = data.parent;
        }
        nsc
    }

    /// Serializes a node and its subtree. Attribute and namespace nodes come out as
    /// the `name="value"` text of their declaration.
    pub fn to_xml_string(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_xml(id, &mut out);
        out
    }

    fn write_xml(&self, id: NodeId, out: &mut String) {
        let data = self.data(id);
        match data.node_type {
            NodeType::Root => {
                for &child in &data.children {
                    self.write_xml(child, out);
                }
            }
            NodeType::Element => {
                let qname = data.qualified_name();
                out.push('<');
                out.push_str(&qname);
                for &owned in data.namespaces.iter().chain(&data.attributes) {
                    out.push(' ');
                    self.write_xml(owned, out);
                }
                if data.children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in &data.children {
                    self.write_xml(child, out);
                }
                out.push_str("</");
                out.push_str(&qname);
                out.push('>');
            }
            NodeType::Attribute => {
                out.push_str(&data.qualified_name());
                push_quoted(out, &data.value);
            }
            NodeType::Namespace => {
                out.push_str("xmlns");
                if !data.name.is_empty() {
                    out.push(':');
                    out.push_str(&data.name);
                }
                push_quoted(out, &data.value);
            }
            NodeType::Text => out.push_str(&quick_xml::escape::escape(data.value.as_str())),
            NodeType::Comment => {
                out.push_str("<!--");
                out.push_str(&data.value);
                out.push_str("-->");
            }
            NodeType::ProcessingInstruction => {
                out.push_str("<?");
                out.push_str(&data.name);
                if !data.value.is_empty() {
                    out.push(' ');
                    out.push_str(&data.value);
                }
                out.push_str("?>");
            }
        }
    }
}

fn push_quoted(out: &mut String, value: &str) {
    out.push_str("=\"");
    out.push_str(&quick_xml::escape::escape(value));
    out.push('"');
}

/// The prefix an element was written with. roxmltree only exposes the resolved
/// namespace, so the prefix is recovered from the bindings in scope; an element in the
/// default namespace is taken to be unprefixed.
fn element_prefix(node: roxmltree::Node<'_, '_>) -> Option<String> {
    let uri = node.tag_name().namespace()?;
    if node.default_namespace() == Some(uri) {
        return None;
    }
    node.lookup_prefix(uri).map(str::to_string)
}

/// A namespaced attribute is always prefixed, so only prefixed bindings qualify.
fn attribute_prefix(element: roxmltree::Node<'_, '_>, uri: &str) -> Option<String> {
    if uri == XML_NAMESPACE {
        return Some("xml".to_string());
    }
    element
        .namespaces()
        .find(|ns| ns.name().is_some() && ns.uri() == uri)
        .and_then(|ns| ns.name())
        .map(str::to_string)
}
