//! Document - High-level document API

use crate::{DomTree, Listener, ListenerRegistry, NodeId};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
    /// Element-level event listeners
    listeners: ListenerRegistry,
}

impl Document {
    /// Create a new document with an html/head/body skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Freshly created nodes under the root can always be linked.
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Locate html/head/body after the tree was filled by a parser
    pub fn finalize(&mut self) {
        let tree = &self.tree;
        self.html_element = tree
            .children(tree.root())
            .find(|(_, n)| n.as_element().is_some_and(|e| tree.resolve(e.name) == "html"))
            .map_or(NodeId::NONE, |(id, _)| id);

        let find = |tag: &str| {
            tree.element_children(self.html_element)
                .into_iter()
                .find(|&id| tree.tag_name(id) == Some(tag))
                .unwrap_or(NodeId::NONE)
        };
        self.head_element = find("head");
        self.body_element = find("body");
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get document title
    pub fn title(&self) -> String {
        if !self.head_element.is_valid() {
            return String::new();
        }
        self.tree
            .get_elements_by_tag_name(self.head_element, "title")
            .first()
            .map(|&id| self.tree.text_content(id))
            .unwrap_or_default()
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Get a connected element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.get_element_by_id(self.tree.root(), id)
    }

    /// Whether a node is part of the live document
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.is_connected(node)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Element listener registry
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Register an element listener
    pub fn add_listener(&mut self, node: NodeId, event_type: &str, listener: Listener, capture: bool) -> bool {
        if self.tree.get(node).is_none() {
            return false;
        }
        self.listeners.add(node, event_type, listener, capture)
    }

    /// Unregister an element listener
    pub fn remove_listener(&mut self, node: NodeId, event_type: &str, listener: &Listener, capture: bool) -> bool {
        self.listeners.remove(node, event_type, listener, capture)
    }

    /// Drop all listeners of a node
    pub fn clear_listeners(&mut self, node: NodeId) {
        self.listeners.clear(node);
    }

    /// Memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        self.tree.memory_usage() + self.url.capacity()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_structure() {
        let doc = Document::new("about:blank");
        assert!(doc.document_element().is_valid());
        assert!(doc.head().is_valid());
        assert!(doc.body().is_valid());
        assert!(doc.is_connected(doc.body()));
        assert_eq!(doc.url(), "about:blank");
    }

    #[test]
    fn test_finalize_finds_skeleton() {
        let mut doc = Document::empty("about:blank");
        let tree = doc.tree_mut();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let title = tree.create_element("title");
        let body = tree.create_element("body");
        tree.append_child(tree.root(), html).unwrap();
        tree.append_child(html, head).unwrap();
        tree.append_child(head, title).unwrap();
        tree.set_text_content(title, "Hello").unwrap();
        tree.append_child(html, body).unwrap();

        doc.finalize();
        assert_eq!(doc.document_element(), html);
        assert_eq!(doc.head(), head);
        assert_eq!(doc.body(), body);
        assert_eq!(doc.title(), "Hello");
    }

    #[test]
    fn test_get_element_by_id_only_connected() {
        let mut doc = Document::default();
        let body = doc.body();
        let tree = doc.tree_mut();
        let div = tree.create_element("div");
        tree.set_attribute(div, "id", "app").unwrap();
        assert_eq!(doc.get_element_by_id("app"), None);

        doc.tree_mut().append_child(body, div).unwrap();
        assert_eq!(doc.get_element_by_id("app"), Some(div));
    }
}
