//! cnext HTML
//!
//! Markup parsing built on html5ever, converting into the arena DOM, and
//! serialization of nodes back into markup (outer/inner HTML).

mod parser;
mod serializer;

pub use cnext_dom::{Document, DomTree, Node, NodeId};
pub use parser::HtmlParser;
pub use serializer::{get_inner_html, get_outer_html, HtmlSerializer};

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Document {
    HtmlParser::new().parse(html)
}

/// Parse an HTML fragment and append the resulting nodes to `parent`
pub fn parse_fragment_into(tree: &mut DomTree, parent: NodeId, html: &str) -> Vec<NodeId> {
    HtmlParser::new().parse_fragment_into(tree, parent, html)
}
