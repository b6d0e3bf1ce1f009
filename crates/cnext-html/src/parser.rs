//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it into the arena DOM.

use cnext_dom::{Document, DomTree, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// HTML5 parser
#[derive(Debug, Clone, Copy)]
pub struct HtmlParser {
    /// Keep text nodes made only of whitespace
    pub keep_whitespace: bool,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self {
            keep_whitespace: false,
        }
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = Self::parse_rcdom(html);
        let mut document = Document::empty(url);
        let root = document.tree().root();
        for child in dom.document.children.borrow().iter() {
            self.convert_node(child, document.tree_mut(), root);
        }
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        document
    }

    /// Parse markup as body content and append the resulting top-level
    /// nodes to `parent`. Returns the appended nodes in order.
    pub fn parse_fragment_into(&self, tree: &mut DomTree, parent: NodeId, html: &str) -> Vec<NodeId> {
        let dom = Self::parse_rcdom(html);
        let Some(body) = find_element(&dom.document, "html").and_then(|html| find_element(&html, "body"))
        else {
            return Vec::new();
        };

        let created: Vec<NodeId> = body
            .children
            .borrow()
            .iter()
            .filter_map(|child| self.convert_node(child, tree, parent))
            .collect();

        tracing::trace!("Parsed fragment into {} top-level nodes", created.len());
        created
    }

    fn parse_rcdom(html: &str) -> RcDom {
        parse_document(RcDom::default(), Default::default()).one(html)
    }

    /// Convert an RcDom node, returning the created node if any
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) -> Option<NodeId> {
        let id = match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent);
                }
                return None;
            }
            RcNodeData::Doctype { name, .. } => tree.create_doctype(name),
            RcNodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if !self.keep_whitespace && text.trim().is_empty() {
                    return None;
                }
                tree.create_text(&text)
            }
            RcNodeData::Comment { contents } => tree.create_comment(contents),
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    // Freshly created element; setting attributes cannot fail.
                    let _ = tree.set_attribute(id, &attr.name.local, &attr.value);
                }
                id
            }
            RcNodeData::ProcessingInstruction { .. } => return None,
        };

        tree.append_child(parent, id).ok()?;

        if matches!(handle.data, RcNodeData::Element { .. }) {
            for child in handle.children.borrow().iter() {
                self.convert_node(child, tree, id);
            }
        }

        Some(id)
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, RcNodeData::Element { name, .. } if &*name.local == tag))
        .cloned()
}
