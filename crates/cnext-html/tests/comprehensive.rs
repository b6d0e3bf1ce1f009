//! Comprehensive tests for cnext-html
//!
//! Parsing edge cases, fragment insertion and serialization round trips.

use cnext_html::{get_inner_html, get_outer_html, parse, parse_fragment_into, DomTree, HtmlParser, HtmlSerializer};

// ============================================================================
// DOCUMENT PARSING
// ============================================================================

#[test]
fn test_parse_minimal_html() {
    let doc = HtmlParser::new().parse("");
    assert!(doc.tree().len() >= 1, "Even empty HTML should have root");
    assert!(doc.body().is_valid(), "html5ever always synthesizes a body");
}

#[test]
fn test_parse_text_only() {
    let doc = parse("Hello World");
    assert_eq!(doc.tree().text_content(doc.body()), "Hello World");
}

#[test]
fn test_parse_malformed_html() {
    let html = r#"
        <div>
            <p>Unclosed paragraph
            <span>Unclosed span
        </div>
        <p>Another paragraph without closing
    "#;

    let doc = parse(html);
    let paragraphs = doc.tree().get_elements_by_tag_name(doc.body(), "p");
    assert_eq!(paragraphs.len(), 2);
}

#[test]
fn test_parse_with_attributes() {
    let html = r#"
        <div id="main" class="container primary" data-value="123">
            <a href="https://example.com" target="_blank">Link</a>
        </div>
    "#;

    let doc = parse(html);
    let main = doc.get_element_by_id("main").expect("main div");
    assert_eq!(doc.tree().get_attribute(main, "data-value"), Some("123"));
    assert_eq!(doc.tree().query_selector_all(main, "a").len(), 1);
    assert_eq!(doc.tree().get_elements_by_class_name(doc.body(), "primary"), vec![main]);
}

#[test]
fn test_parse_entities() {
    let doc = parse(r#"<p>&lt;tag&gt; &amp; &quot;quotes&quot;</p>"#);
    assert_eq!(doc.tree().text_content(doc.body()), r#"<tag> & "quotes""#);
}

#[test]
fn test_parse_large_document() {
    let mut html = String::from("<html><body>");
    for i in 0..1000 {
        html.push_str(&format!(r#"<div id="div-{i}" class="item"><p>Paragraph {i}</p></div>"#));
    }
    html.push_str("</body></html>");

    let doc = parse(&html);
    assert!(doc.tree().len() > 3000);
    assert!(doc.get_element_by_id("div-999").is_some());
}

// ============================================================================
// FRAGMENTS
// ============================================================================

#[test]
fn test_fragment_appends_after_existing_children() {
    let mut tree = DomTree::new();
    let host = tree.create_element("section");
    let existing = tree.create_element("header");
    tree.append_child(host, existing).unwrap();

    let nodes = parse_fragment_into(&mut tree, host, "<p>a</p>text<!--c-->");
    assert_eq!(nodes.len(), 3);
    let order: Vec<_> = tree.children(host).map(|(id, _)| id).collect();
    assert_eq!(order[0], existing);
    assert_eq!(&order[1..], &nodes[..]);
}

#[test]
fn test_fragment_whitespace_only_is_empty() {
    let mut tree = DomTree::new();
    let host = tree.create_element("div");
    assert!(parse_fragment_into(&mut tree, host, "   \n  ").is_empty());
    assert_eq!(tree.children(host).count(), 0);
}

// ============================================================================
// SERIALIZATION
// ============================================================================

#[test]
fn test_serialize_round_trip() {
    let markup = r#"<ul class="list"><li>one</li><li>two &amp; three</li></ul>"#;
    let mut tree = DomTree::new();
    let host = tree.create_element("div");
    let nodes = parse_fragment_into(&mut tree, host, markup);

    assert_eq!(get_outer_html(&tree, nodes[0]), markup);
    assert_eq!(get_inner_html(&tree, host), markup);
}

#[test]
fn test_serialize_whole_document() {
    let doc = parse("<!DOCTYPE html><html><head><title>T</title></head><body><p>x</p></body></html>");
    let html = HtmlSerializer::new().serialize_outer(doc.tree(), doc.tree().root());
    assert_eq!(
        html,
        "<!DOCTYPE html><html><head><title>T</title></head><body><p>x</p></body></html>"
    );
}
