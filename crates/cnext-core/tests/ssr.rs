//! Server rendering and hydration tests

use std::cell::Cell;
use std::rc::Rc;

use cnext_core::{
    event_type, listener, Component, ComponentError, DomContext, DomHelper, Event, HydrationMode,
    ServerComponent, SsrOptions, View,
};
use cnext_html::HtmlSerializer;
use serde_json::json;

struct Content;

impl View for Content {
    fn create_dom(&self, cx: &mut DomContext<'_>) -> anyhow::Result<()> {
        cx.set_text("Test Content")?;
        Ok(())
    }
}

fn server_markup() -> String {
    let server = ServerComponent::with_view(DomHelper::detached(), Content);
    server.set_id("test").unwrap();
    server.render_to_string().unwrap()
}

#[test]
fn test_render_to_string() {
    assert_eq!(server_markup(), r#"<div id="test">Test Content</div>"#);
}

#[test]
fn test_render_to_string_pretty() {
    let dom = DomHelper::detached();
    let list = ServerComponent::new(dom.clone()).with_serializer(HtmlSerializer::pretty());
    list.add_child(&Component::with_view(dom, Content)).unwrap();

    assert_eq!(
        list.render_to_string().unwrap(),
        "<div>\n  <div>Test Content</div>\n</div>"
    );
}

#[test]
fn test_hydrate_markup_adopts_server_element() {
    let dom = DomHelper::detached();
    let container = dom.create_element("main");
    dom.append_child(dom.body(), container).unwrap();

    let client = ServerComponent::with_view(dom.clone(), Content);
    let changes = Rc::new(Cell::new(0));
    let c = changes.clone();
    client.add_event_listener(event_type::STATECHANGE, listener(move |_| {
        c.set(c.get() + 1);
        Ok(())
    }));

    client.hydrate_markup(container, &server_markup()).unwrap();

    let element = client.get_element().expect("hydrated element");
    assert_eq!(dom.first_element_child(container), Some(element));
    assert_eq!(dom.element_children(container).len(), 1);
    assert_eq!(dom.text_content(element), "Test Content");
    assert!(client.is_in_document());
    assert_eq!(changes.get(), 1);
}

#[test]
fn test_hydrate_by_id() {
    let dom = DomHelper::detached();
    dom.set_inner_html(dom.body(), r#"<section><div id="app">old</div></section>"#).unwrap();

    let client = ServerComponent::with_view(dom.clone(), Content);
    client.set_id("app").unwrap();
    client.hydrate(None).unwrap();

    let element = client.get_element().unwrap();
    assert_eq!(dom.get_element("app"), Some(element));
    assert_eq!(dom.text_content(element), "Test Content");
}

#[test]
fn test_hydrated_element_forwards_dom_events() {
    let dom = DomHelper::detached();
    let container = dom.create_element("div");
    dom.append_child(dom.body(), container).unwrap();

    let client = ServerComponent::with_view(dom.clone(), Content);
    let clicks = Rc::new(Cell::new(0));
    let c = clicks.clone();
    client.add_event_listener("click", listener(move |_| {
        c.set(c.get() + 1);
        Ok(())
    }));
    client.hydrate_markup(container, &server_markup()).unwrap();

    dom.dispatch_event(client.get_element().unwrap(), &mut Event::new("click"));
    assert_eq!(clicks.get(), 1);
}

#[test]
fn test_hydrate_failure_is_descriptive() {
    let dom = DomHelper::detached();
    let empty = dom.create_element("div");
    let client = ServerComponent::new(dom);

    let err = client.hydrate(Some(empty)).unwrap_err();
    assert!(matches!(err, ComponentError::HydrationTarget(_)));
    assert!(err.to_string().contains("no element child"));
    assert_eq!(client.get_element(), None);
}

#[test]
fn test_hydrate_with_modes() {
    let dom = DomHelper::detached();
    let container = dom.create_element("div");
    dom.append_child(dom.body(), container).unwrap();

    let fresh = ServerComponent::with_view(dom.clone(), Content);
    let client_only = SsrOptions {
        hydration: HydrationMode::ClientOnly,
        ..SsrOptions::default()
    };
    fresh.hydrate_with(container, &client_only).unwrap();
    assert_eq!(dom.element_children(container), vec![fresh.get_element().unwrap()]);

    let server_side = dom.create_element("div");
    dom.append_child(dom.body(), server_side).unwrap();
    dom.set_inner_html(server_side, &server_markup()).unwrap();
    let adopting = ServerComponent::with_view(dom.clone(), Content);
    adopting.hydrate_with(server_side, &SsrOptions::default()).unwrap();
    assert_eq!(adopting.get_element(), dom.first_element_child(server_side));
    assert_eq!(dom.element_children(server_side).len(), 1);
}

#[test]
fn test_disposed_component_cannot_hydrate() {
    let dom = DomHelper::detached();
    let container = dom.create_element("div");
    let client = ServerComponent::new(dom);
    client.dispose();

    assert!(matches!(
        client.hydrate_markup(container, "<div></div>"),
        Err(ComponentError::Disposed { .. })
    ));
}

struct Count;

impl View for Count {
    fn tag_name(&self) -> &str {
        "p"
    }

    fn create_dom(&self, cx: &mut DomContext<'_>) -> anyhow::Result<()> {
        let count = cx.state().get("count").and_then(|v| v.as_i64()).unwrap_or(0);
        cx.set_text(&format!("count: {count}"))?;
        Ok(())
    }
}

#[test]
fn test_render_to_string_reflects_state_change() {
    let server = ServerComponent::with_view(DomHelper::detached(), Count);
    assert_eq!(server.render_to_string().unwrap(), "<p>count: 0</p>");

    server.set_state(json!({"count": 7})).unwrap();
    assert_eq!(server.render_to_string().unwrap(), "<p>count: 7</p>");
}

#[test]
fn test_hydrate_after_render_moves_to_server_element() {
    let dom = DomHelper::detached();
    let body = dom.body();
    let client = ServerComponent::new(dom.clone());
    client.render(Some(body)).unwrap();
    let rendered = client.get_element().unwrap();

    let container = dom.create_element("section");
    dom.append_child(body, container).unwrap();
    dom.set_inner_html(container, "<div>server</div>").unwrap();
    let server_element = dom.first_element_child(container).unwrap();

    client.hydrate(Some(container)).unwrap();

    assert_eq!(client.get_element(), Some(server_element));
    assert_eq!(dom.parent_node(rendered), None);
    assert_eq!(dom.element_children(body), vec![container]);
    assert_eq!(dom.element_children(container), vec![server_element]);
    assert_eq!(dom.inner_html(body), "<section><div>server</div></section>");
    assert!(client.is_in_document());
}

#[test]
fn test_hydrate_matches_children_to_server_markup() {
    let server = ServerComponent::new(DomHelper::detached());
    server.add_child(&Component::new(server.dom().clone())).unwrap();
    let markup = server.render_to_string().unwrap();
    assert_eq!(markup, "<div><div></div></div>");

    let dom = DomHelper::detached();
    let container = dom.create_element("main");
    dom.append_child(dom.body(), container).unwrap();
    let client = ServerComponent::new(dom.clone());
    let child = Component::new(dom.clone());
    client.add_child(&child).unwrap();

    client.hydrate_markup(container, &markup).unwrap();

    assert_eq!(dom.inner_html(container), markup);
    let element = client.get_element().unwrap();
    assert_eq!(dom.element_children(element), vec![child.get_element().unwrap()]);
    assert!(child.is_in_document());
}

#[test]
fn test_hydrate_creates_children_missing_from_markup() {
    let dom = DomHelper::detached();
    let container = dom.create_element("main");
    dom.append_child(dom.body(), container).unwrap();
    let client = ServerComponent::new(dom.clone());
    let first = Component::new(dom.clone());
    let second = Component::with_view(dom.clone(), Count);
    client.add_child(&first).unwrap();
    client.add_child(&second).unwrap();

    client.hydrate_markup(container, "<div><div></div></div>").unwrap();

    assert_eq!(dom.inner_html(container), "<div><div></div><p>count: 0</p></div>");
    assert!(second.is_in_document());
}
