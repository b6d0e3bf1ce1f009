//! Markup serialization
//!
//! Writes arena nodes back out as HTML. Void elements get no end tag,
//! `script`/`style` content is written verbatim and everything else is
//! escaped. Pretty output puts each element on its own indented line.

use cnext_dom::{DomTree, NodeData, NodeId};

/// Elements that never have an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text is written unescaped
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Markup writer settings
#[derive(Debug, Clone)]
pub struct HtmlSerializer {
    /// Break and indent before every nested element
    pub pretty_print: bool,
    /// One level of indentation
    pub indent: String,
}

impl Default for HtmlSerializer {
    fn default() -> Self {
        Self {
            pretty_print: false,
            indent: "  ".to_string(),
        }
    }
}

impl HtmlSerializer {
    /// Compact output
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output
    pub fn pretty() -> Self {
        Self {
            pretty_print: true,
            ..Self::default()
        }
    }

    /// Markup of the children of `node_id`
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut writer = Writer::new(self, tree);
        writer.children(node_id, 0);
        writer.out
    }

    /// Markup of `node_id` itself
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut writer = Writer::new(self, tree);
        writer.node(node_id, 0);
        writer.out
    }
}

struct Writer<'a> {
    options: &'a HtmlSerializer,
    tree: &'a DomTree,
    out: String,
}

impl<'a> Writer<'a> {
    fn new(options: &'a HtmlSerializer, tree: &'a DomTree) -> Self {
        Self {
            options,
            tree,
            out: String::new(),
        }
    }

    fn node(&mut self, id: NodeId, depth: usize) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Document => self.children(id, depth),
            NodeData::Element(elem) => {
                let tag = tree.resolve(elem.name);
                if depth > 0 {
                    self.break_line(depth);
                }
                self.out.push('<');
                self.out.push_str(tag);
                for attr in &elem.attrs {
                    self.out.push(' ');
                    self.out.push_str(tree.resolve(attr.name));
                    if !attr.value.is_empty() {
                        self.out.push_str("=\"");
                        escape_into(&mut self.out, &attr.value, true);
                        self.out.push('"');
                    }
                }
                if VOID_ELEMENTS.contains(&tag) {
                    self.out.push_str(" />");
                    return;
                }
                self.out.push('>');
                if RAW_TEXT_ELEMENTS.contains(&tag) {
                    self.raw_children(id);
                } else {
                    self.children(id, depth + 1);
                    if !tree.element_children(id).is_empty() {
                        self.break_line(depth);
                    }
                }
                self.out.push_str("</");
                self.out.push_str(tag);
                self.out.push('>');
            }
            NodeData::Text(text) => escape_into(&mut self.out, &text.content, false),
            NodeData::Comment(text) => {
                self.out.push_str("<!--");
                self.out.push_str(text);
                self.out.push_str("-->");
            }
            NodeData::Doctype { name } => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(tree.resolve(*name));
                self.out.push('>');
            }
        }
    }

    fn children(&mut self, parent: NodeId, depth: usize) {
        let tree = self.tree;
        for (child, _) in tree.children(parent) {
            self.node(child, depth);
        }
    }

    fn raw_children(&mut self, parent: NodeId) {
        for (_, child) in self.tree.children(parent) {
            if let NodeData::Text(text) = &child.data {
                self.out.push_str(&text.content);
            }
        }
    }

    /// No-op in compact mode
    fn break_line(&mut self, depth: usize) {
        if !self.options.pretty_print {
            return;
        }
        self.out.push('\n');
        self.out.push_str(&self.options.indent.repeat(depth));
    }
}

/// Escape `&`, `<` and `>`, plus `"` inside attribute values
fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Compact inner markup of `node_id`
pub fn get_inner_html(tree: &DomTree, node_id: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(tree, node_id)
}

/// Compact outer markup of `node_id`
pub fn get_outer_html(tree: &DomTree, node_id: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(tree, node_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(text: &str, attribute: bool) -> String {
        let mut out = String::new();
        escape_into(&mut out, text, attribute);
        out
    }

    #[test]
    fn test_escape_text_keeps_quotes() {
        assert_eq!(
            escaped("Hello <world> & \"friends\"", false),
            "Hello &lt;world&gt; &amp; \"friends\""
        );
    }

    #[test]
    fn test_escape_attribute_quotes() {
        assert_eq!(
            escaped("Hello <world> & \"friends\"", true),
            "Hello &lt;world&gt; &amp; &quot;friends&quot;"
        );
    }

    #[test]
    fn test_outer_html_element_with_text() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.set_attribute(div, "id", "test").unwrap();
        tree.set_text_content(div, "Test Content").unwrap();

        assert_eq!(get_outer_html(&tree, div), r#"<div id="test">Test Content</div>"#);
        assert_eq!(get_inner_html(&tree, div), "Test Content");
    }

    #[test]
    fn test_void_and_raw_children() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let br = tree.create_element("br");
        let script = tree.create_element("script");
        let code = tree.create_text("a < b && c");
        tree.append_child(div, br).unwrap();
        tree.append_child(div, script).unwrap();
        tree.append_child(script, code).unwrap();

        assert_eq!(
            get_outer_html(&tree, div),
            "<div><br /><script>a < b && c</script></div>"
        );
    }

    #[test]
    fn test_pretty_print_indents_elements() {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        let li = tree.create_element("li");
        tree.append_child(ul, li).unwrap();
        tree.set_text_content(li, "one").unwrap();

        let html = HtmlSerializer::pretty().serialize_outer(&tree, ul);
        assert_eq!(html, "<ul>\n  <li>one</li>\n</ul>");
    }
}
