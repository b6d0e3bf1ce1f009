//! Element Queries
//!
//! getElementById, getElementsByClassName, getElementsByTagName and a
//! simple-selector `querySelector`.

use crate::{DomTree, Node, NodeId};

/// Simple selector for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Tag(String),
    Class(String),
    Id(String),
    Universal,
}

impl SimpleSelector {
    /// Parse a simple selector string
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if s == "*" {
            Some(Self::Universal)
        } else if let Some(id) = s.strip_prefix('#') {
            (!id.is_empty()).then(|| Self::Id(id.to_string()))
        } else if let Some(class) = s.strip_prefix('.') {
            (!class.is_empty()).then(|| Self::Class(class.to_string()))
        } else {
            Some(Self::Tag(s.to_ascii_lowercase()))
        }
    }

    /// Check whether a node matches this selector
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        let Some(elem) = tree.get(id).and_then(Node::as_element) else {
            return false;
        };
        match self {
            Self::Universal => true,
            Self::Tag(tag) => tree.resolve(elem.name).eq_ignore_ascii_case(tag),
            Self::Id(wanted) => elem.id.as_deref() == Some(wanted.as_str()),
            Self::Class(class) => elem.has_class(class),
        }
    }
}

impl DomTree {
    /// First descendant of `root` matching the selector
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let selector = SimpleSelector::parse(selector)?;
        self.descendants(root).find(|&id| selector.matches(self, id))
    }

    /// All descendants of `root` matching the selector
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(selector) = SimpleSelector::parse(selector) else {
            return Vec::new();
        };
        self.descendants(root)
            .filter(|&id| selector.matches(self, id))
            .collect()
    }

    /// Find the element with a given id under `root`
    pub fn get_element_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(root).find(|&node| {
            self.get(node)
                .and_then(Node::as_element)
                .is_some_and(|e| e.id.as_deref() == Some(id))
        })
    }

    /// Get elements by class name
    pub fn get_elements_by_class_name(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.query_elements(root, |node| node.as_element().is_some_and(|e| e.has_class(class)))
    }

    /// Get elements by tag name
    pub fn get_elements_by_tag_name(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        if tag == "*" {
            return self.query_elements(root, Node::is_element);
        }
        self.query_elements(root, |node| {
            node.as_element()
                .is_some_and(|e| self.resolve(e.name).eq_ignore_ascii_case(tag))
        })
    }

    fn query_elements(&self, root: NodeId, predicate: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|&id| self.get(id).is_some_and(&predicate))
            .collect()
    }
}
