//! DOM Tree (arena-based allocation)
//!
//! appendChild, insertBefore, detach, attribute and text manipulation.

use crate::{DomError, DomResult, InternedString, Node, NodeData, NodeId, StringInterner};

/// Arena-based DOM tree for memory efficiency
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    interner: StringInterner,
}

impl DomTree {
    /// Create a new tree holding only the document root
    pub fn new() -> Self {
        Self::with_capacity(16)
    }

    /// Create a tree with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(Node::document());
        Self {
            nodes,
            interner: StringInterner::new(),
        }
    }

    /// The document root node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Name interner
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Mutable name interner
    pub fn interner_mut(&mut self) -> &mut StringInterner {
        &mut self.interner
    }

    /// Resolve an interned name
    #[inline]
    pub fn resolve(&self, id: InternedString) -> &str {
        self.interner.get(id)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = self.interner.intern(&tag.to_ascii_lowercase());
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text.to_string()))
    }

    /// Create a detached doctype node
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        let name = self.interner.intern(name);
        self.push(Node::doctype(name))
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.valid())
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether a node is reachable from the document root
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.get(id).is_some() && self.is_inclusive_ancestor(NodeId::ROOT, id)
    }

    /// Append a child, detaching it from any previous parent first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        let parent_node = self.get(parent).ok_or(DomError::NotFound(parent))?;
        if !parent_node.can_have_children() {
            return Err(DomError::InvalidNodeType(parent));
        }
        if self.get(child).is_none() {
            return Err(DomError::NotFound(child));
        }
        if child == NodeId::ROOT || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        let reference = reference.and_then(NodeId::valid);
        if let Some(r) = reference {
            if r == child {
                return Ok(child);
            }
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild { parent, child: r });
            }
        }

        self.detach(child);

        let prev = match reference {
            Some(r) => self.nodes[r.index()].prev_sibling,
            None => self.nodes[parent.index()].last_child,
        };
        let next = reference.unwrap_or(NodeId::NONE);

        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }

        Ok(child)
    }

    /// Remove a child from a specific parent
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(child)
    }

    /// Unlink a node from its parent. No-op when already detached.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    /// Detach every child of a node
    pub fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).map(|(child, _)| child).collect();
        for child in children {
            self.detach(child);
        }
    }

    /// Iterate over direct children
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let next = self.get(parent).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    /// Direct element children
    pub fn element_children(&self, parent: NodeId) -> Vec<NodeId> {
        self.children(parent)
            .filter(|(_, node)| node.is_element())
            .map(|(id, _)| id)
            .collect()
    }

    /// First direct element child
    pub fn first_element_child(&self, parent: NodeId) -> Option<NodeId> {
        self.children(parent)
            .find(|(_, node)| node.is_element())
            .map(|(id, _)| id)
    }

    /// Pre-order iteration over all descendants (excluding `root`)
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let next = self.get(root).map_or(NodeId::NONE, |n| n.first_child);
        Descendants {
            tree: self,
            root,
            next,
        }
    }

    // ------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)
            .and_then(Node::as_element)
            .map(|e| self.resolve(e.name))
    }

    /// Get an attribute value
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name = self.interner.lookup(name)?;
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Set an attribute, keeping the id/class caches in sync
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let interned = self.interner.intern(name);
        let elem = self
            .nodes
            .get_mut(id.index())
            .ok_or(DomError::NotFound(id))?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;

        match name {
            "id" => elem.id = Some(value.to_string()),
            "class" => elem.classes = value.split_whitespace().map(str::to_string).collect(),
            _ => {}
        }
        elem.set_attr(interned, value.to_string());
        Ok(())
    }

    /// Remove an attribute. No-op when absent.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        let Some(interned) = self.interner.lookup(name) else {
            return;
        };
        let Some(elem) = self.get_mut(id).and_then(Node::as_element_mut) else {
            return;
        };
        match name {
            "id" => elem.id = None,
            "class" => elem.classes.clear(),
            _ => {}
        }
        elem.remove_attr(interned);
    }

    /// Add a class to an element's class list
    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        let elem = self
            .get(id)
            .ok_or(DomError::NotFound(id))?
            .as_element()
            .ok_or(DomError::InvalidNodeType(id))?;
        if elem.has_class(class) {
            return Ok(());
        }
        let mut classes = elem.classes.clone();
        classes.push(class.to_string());
        self.set_attribute(id, "class", &classes.join(" "))
    }

    /// Remove a class from an element's class list
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(elem) = self.get(id).and_then(Node::as_element) else {
            return;
        };
        if !elem.has_class(class) {
            return;
        }
        let classes: Vec<&str> = elem
            .classes
            .iter()
            .map(String::as_str)
            .filter(|c| *c != class)
            .collect();
        let joined = classes.join(" ");
        // The node is known to be an element here.
        let _ = self.set_attribute(id, "class", &joined);
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Concatenated text of a node and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(t)) => t.content.clone(),
            Some(NodeData::Comment(c)) => c.clone(),
            Some(_) => self
                .descendants(id)
                .filter_map(|child| self.get(child).and_then(Node::as_text))
                .collect(),
            None => String::new(),
        }
    }

    /// Replace the children of a node with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        let node = self.get_mut(id).ok_or(DomError::NotFound(id))?;
        match &mut node.data {
            NodeData::Text(t) => {
                t.content = text.to_string();
                return Ok(());
            }
            NodeData::Comment(c) => {
                *c = text.to_string();
                return Ok(());
            }
            NodeData::Doctype { .. } => return Err(DomError::InvalidNodeType(id)),
            NodeData::Element(_) | NodeData::Document => {}
        }

        self.clear_children(id);
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(id, text_node)?;
        }
        Ok(())
    }

    /// Approximate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let text: usize = self
            .nodes
            .iter()
            .map(|n| match &n.data {
                NodeData::Text(t) => t.content.capacity(),
                NodeData::Comment(c) => c.capacity(),
                NodeData::Element(e) => {
                    e.attrs.iter().map(|a| a.value.capacity()).sum::<usize>()
                        + e.attrs.capacity() * std::mem::size_of::<crate::Attribute>()
                }
                _ => 0,
            })
            .sum();
        self.nodes.capacity() * std::mem::size_of::<Node>() + text + self.interner.memory_usage()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.valid()?;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Pre-order iterator over descendants
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next.valid()?;
        let node = self.tree.get(current)?;

        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            let mut cursor = current;
            loop {
                if cursor == self.root {
                    break NodeId::NONE;
                }
                let Some(n) = self.tree.get(cursor) else {
                    break NodeId::NONE;
                };
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                if !n.parent.is_valid() {
                    break NodeId::NONE;
                }
                cursor = n.parent;
            }
        };

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_before_reorders() {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        let a = tree.create_element("li");
        let b = tree.create_element("li");
        tree.append_child(tree.root(), ul).unwrap();
        tree.append_child(ul, b).unwrap();
        tree.insert_before(ul, a, Some(b)).unwrap();

        let order: Vec<_> = tree.children(ul).map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_append_moves_instead_of_duplicating() {
        let mut tree = DomTree::new();
        let first = tree.create_element("div");
        let second = tree.create_element("div");
        let item = tree.create_element("span");
        tree.append_child(first, item).unwrap();
        tree.append_child(second, item).unwrap();

        assert_eq!(tree.children(first).count(), 0);
        assert_eq!(tree.children(second).count(), 1);
        assert_eq!(tree.parent(item), Some(second));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();

        let err = tree.append_child(inner, outer).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest { .. }));
    }

    #[test]
    fn test_text_cannot_hold_children() {
        let mut tree = DomTree::new();
        let text = tree.create_text("hi");
        let span = tree.create_element("span");
        assert_eq!(tree.append_child(text, span), Err(DomError::InvalidNodeType(text)));
    }

    #[test]
    fn test_detach_twice_is_noop() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.append_child(tree.root(), div).unwrap();
        tree.detach(div);
        tree.detach(div);
        assert!(!tree.is_connected(div));
        assert_eq!(tree.children(tree.root()).count(), 0);
    }

    #[test]
    fn test_attribute_caches() {
        let mut tree = DomTree::new();
        let div = tree.create_element("DIV");
        tree.set_attribute(div, "id", "main").unwrap();
        tree.set_attribute(div, "class", "a  b").unwrap();
        tree.add_class(div, "c").unwrap();
        tree.remove_class(div, "a");

        let elem = tree.get(div).unwrap().as_element().unwrap();
        assert_eq!(elem.id.as_deref(), Some("main"));
        assert_eq!(elem.classes, vec!["b", "c"]);
        assert_eq!(tree.get_attribute(div, "class"), Some("b c"));
        assert_eq!(tree.tag_name(div), Some("div"));

        tree.remove_attribute(div, "id");
        assert!(tree.get(div).unwrap().as_element().unwrap().id.is_none());
    }

    #[test]
    fn test_text_content_roundtrip() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let b = tree.create_element("b");
        let t1 = tree.create_text("Hello, ");
        let t2 = tree.create_text("World");
        tree.append_child(p, t1).unwrap();
        tree.append_child(p, b).unwrap();
        tree.append_child(b, t2).unwrap();
        assert_eq!(tree.text_content(p), "Hello, World");

        tree.set_text_content(p, "Replaced").unwrap();
        assert_eq!(tree.text_content(p), "Replaced");
        assert_eq!(tree.children(p).count(), 1);
    }

    #[test]
    fn test_descendants_preorder_stays_in_subtree() {
        let mut tree = DomTree::new();
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        let c = tree.create_element("div");
        let sibling = tree.create_element("div");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(tree.root(), sibling).unwrap();
        tree.append_child(a, b).unwrap();
        tree.append_child(b, c).unwrap();

        let found: Vec<_> = tree.descendants(a).collect();
        assert_eq!(found, vec![b, c]);
    }
}
