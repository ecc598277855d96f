//! Arena-backed document tree

use std::fmt;

use crate::core::DiagramError;

/// Handle to a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single attribute, value already entity-decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Tag name and attributes of an element node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute, keeping its original position if it already exists
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(&name))
        {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Whitespace-separated tokens of the `class` attribute
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// Payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The document itself; always [`Document::root`]
    Root,
    Doctype {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    Element(ElementData),
    Text(String),
    Comment(String),
}

impl NodeData {
    fn can_have_children(&self) -> bool {
        matches!(self, NodeData::Root | NodeData::Element(_))
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// A page as a tree of nodes
///
/// Replaced nodes stay in the arena but are unreachable from the root;
/// every query walks from the root, so they are invisible to callers.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

const ROOT: NodeId = NodeId(0);

impl Document {
    /// Create an empty document containing only the root node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.push(NodeData::Element(ElementData::new(name)))
    }

    /// Create a detached element from already-built element data
    pub fn create_element_with(&mut self, data: ElementData) -> NodeId {
        self.push(NodeData::Element(data))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    /// Create a detached doctype node
    pub fn create_doctype(
        &mut self,
        name: impl Into<String>,
        public_id: Option<String>,
        system_id: Option<String>,
    ) -> NodeId {
        self.push(NodeData::Doctype {
            name: name.into(),
            public_id,
            system_id,
        })
    }

    /// Append a detached node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DiagramError> {
        self.check_insertable(parent, child)?;
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
        Ok(())
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DiagramError> {
        if child == ROOT {
            return Err(DiagramError::dom_error("the root node cannot be inserted"));
        }
        if self.node(child).parent.is_some() {
            return Err(DiagramError::dom_error(format!(
                "node {} is already attached",
                child
            )));
        }
        if !self.node(parent).data.can_have_children() {
            return Err(DiagramError::dom_error(format!(
                "node {} cannot have children",
                parent
            )));
        }
        if self.ancestors(parent).any(|a| a == child) || parent == child {
            return Err(DiagramError::dom_error("insertion would create a cycle"));
        }
        Ok(())
    }

    /// Put `replacement` where `target` is, detaching `target`
    ///
    /// The replacement takes the exact slot of the target in its parent's
    /// child list. Fails if the target has no parent.
    pub fn replace_node(&mut self, target: NodeId, replacement: NodeId) -> Result<(), DiagramError> {
        let parent = self
            .parent(target)
            .ok_or_else(|| DiagramError::dom_error(format!("node {} has no parent", target)))?;
        self.check_insertable(parent, replacement)?;
        let slot = self
            .node(parent)
            .children
            .iter()
            .position(|&c| c == target)
            .ok_or_else(|| DiagramError::dom_error("parent does not list its child"))?;

        self.node_mut(parent).children[slot] = replacement;
        self.node_mut(replacement).parent = Some(parent);
        self.node_mut(target).parent = None;
        Ok(())
    }

    /// Remove a node from its parent, keeping its subtree intact
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id).data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DiagramError> {
        self.element_mut(id)
            .ok_or_else(|| DiagramError::dom_error(format!("node {} is not an element", id)))?
            .set_attribute(name, value);
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Parent, grandparent, ... up to and including the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&a| self.parent(a))
    }

    /// True if the node is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == ROOT || self.ancestors(id).any(|a| a == ROOT)
    }

    /// Nearest element named `name`, starting with the node itself
    pub fn closest(&self, id: NodeId, name: &str) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.tag_name(n).is_some_and(|t| t.eq_ignore_ascii_case(name)))
    }

    /// Every node below `id` in document order, `id` itself excluded
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants {
            document: self,
            stack,
        }
    }

    /// Elements below the root matching `predicate`, in document order
    pub fn select<F>(&self, mut predicate: F) -> Vec<NodeId>
    where
        F: FnMut(NodeId, &ElementData) -> bool,
    {
        self.descendants(ROOT)
            .filter(|&id| self.element(id).is_some_and(|el| predicate(id, el)))
            .collect()
    }

    /// Elements carrying `class` as one of their class tokens
    pub fn select_by_class(&self, class: &str) -> Vec<NodeId> {
        self.select(|_, el| el.has_class(class))
    }

    /// Concatenated text of the node and all its descendants
    ///
    /// Comments and doctypes contribute nothing.
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.node(id).data {
            NodeData::Text(text) => text.clone(),
            NodeData::Comment(_) | NodeData::Doctype { .. } => String::new(),
            NodeData::Root | NodeData::Element(_) => self
                .descendants(id)
                .filter_map(|d| match &self.node(d).data {
                    NodeData::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Replace all children of an element with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DiagramError> {
        if !self.node(id).data.can_have_children() {
            return Err(DiagramError::dom_error(format!(
                "node {} cannot hold text",
                id
            )));
        }
        for child in std::mem::take(&mut self.node_mut(id).children) {
            self.node_mut(child).parent = None;
        }
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(id, text_node)?;
        }
        Ok(())
    }

    /// Number of nodes reachable from the root, root excluded
    pub fn len(&self) -> usize {
        self.descendants(ROOT).count()
    }

    pub fn is_empty(&self) -> bool {
        self.children(ROOT).is_empty()
    }

    fn subtree_eq(&self, id: NodeId, other: &Document, other_id: NodeId) -> bool {
        let a = self.node(id);
        let b = other.node(other_id);
        a.data == b.data
            && a.children.len() == b.children.len()
            && a
                .children
                .iter()
                .zip(&b.children)
                .all(|(&x, &y)| self.subtree_eq(x, other, y))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: same reachable tree, node for node
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(ROOT, other, ROOT)
    }
}

impl Eq for Document {}

/// Pre-order walk over a subtree
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.document.children(id).iter().rev().copied());
        Some(id)
    }
}
