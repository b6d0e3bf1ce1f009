//! DOM helper
//!
//! Thin façade over a shared [`Document`]. Every method borrows the document
//! only for its own duration and tolerates detached nodes.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use cnext_dom::{dispatch, Document, DomError, DomResult, Event, Listener, NodeId};
use cnext_html::HtmlSerializer;

thread_local! {
    static GLOBAL_DOCUMENT: Rc<RefCell<Document>> = Rc::new(RefCell::new(Document::default()));
}

/// Shared handle to a document
#[derive(Clone)]
pub struct DomHelper {
    document: Rc<RefCell<Document>>,
}

impl DomHelper {
    /// Bind to an explicit document
    pub fn new(document: Rc<RefCell<Document>>) -> Self {
        Self { document }
    }

    /// Bind to a fresh `about:blank` document
    pub fn detached() -> Self {
        Self::new(Rc::new(RefCell::new(Document::default())))
    }

    /// Bind to this thread's global document
    pub fn global() -> Self {
        Self::new(GLOBAL_DOCUMENT.with(Rc::clone))
    }

    /// The bound document
    pub fn get_document(&self) -> Rc<RefCell<Document>> {
        self.document.clone()
    }

    /// Borrow the bound document
    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    /// Whether both helpers share one document
    pub fn same_document(&self, other: &DomHelper) -> bool {
        Rc::ptr_eq(&self.document, &other.document)
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.document.borrow_mut().tree_mut().create_element(tag)
    }

    pub fn create_text_node(&self, text: &str) -> NodeId {
        self.document.borrow_mut().tree_mut().create_text(text)
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Connected element with the given `id` attribute
    pub fn get_element(&self, id: &str) -> Option<NodeId> {
        self.document.borrow().get_element_by_id(id)
    }

    /// Elements with `class` under `root` (the whole document by default)
    pub fn get_elements_by_class(&self, class: &str, root: Option<NodeId>) -> Vec<NodeId> {
        let doc = self.document.borrow();
        let tree = doc.tree();
        tree.get_elements_by_class_name(root.unwrap_or(tree.root()), class)
    }

    /// First element with `class` under `root`
    pub fn get_element_by_class(&self, class: &str, root: Option<NodeId>) -> Option<NodeId> {
        self.get_elements_by_class(class, root).into_iter().next()
    }

    pub fn get_elements_by_tag(&self, tag: &str, root: Option<NodeId>) -> Vec<NodeId> {
        let doc = self.document.borrow();
        let tree = doc.tree();
        tree.get_elements_by_tag_name(root.unwrap_or(tree.root()), tag)
    }

    /// First match for a simple selector (`tag`, `.class`, `#id`, `*`)
    pub fn query_selector(&self, selector: &str, root: Option<NodeId>) -> Option<NodeId> {
        let doc = self.document.borrow();
        let tree = doc.tree();
        tree.query_selector(root.unwrap_or(tree.root()), selector)
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Append `child` to `parent`, moving it from any previous parent
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.document.borrow_mut().tree_mut().append_child(parent, child)
    }

    /// Insert `child` before `reference`, or append when `reference` is `None`
    pub fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> DomResult<NodeId> {
        self.document
            .borrow_mut()
            .tree_mut()
            .insert_before(parent, child, reference)
    }

    /// Detach a node from its parent. No-op when already detached.
    pub fn remove_node(&self, node: NodeId) {
        self.document.borrow_mut().tree_mut().detach(node);
    }

    pub fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.document.borrow().tree().parent(node)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.document
            .borrow()
            .tree()
            .get(node)
            .and_then(|n| n.next_sibling.valid())
    }

    pub fn first_element_child(&self, node: NodeId) -> Option<NodeId> {
        self.document.borrow().tree().first_element_child(node)
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.document.borrow().tree().element_children(node)
    }

    /// Whether the node is reachable from the document root
    pub fn is_in_document(&self, node: NodeId) -> bool {
        self.document.borrow().is_connected(node)
    }

    /// The `<body>` element
    pub fn body(&self) -> NodeId {
        self.document.borrow().body()
    }

    // ------------------------------------------------------------------
    // Attributes and text
    // ------------------------------------------------------------------

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.document
            .borrow_mut()
            .tree_mut()
            .set_attribute(node, name, value)
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.document
            .borrow()
            .tree()
            .get_attribute(node, name)
            .map(str::to_string)
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        self.document.borrow_mut().tree_mut().remove_attribute(node, name);
    }

    pub fn add_class(&self, node: NodeId, class: &str) -> DomResult<()> {
        self.document.borrow_mut().tree_mut().add_class(node, class)
    }

    pub fn remove_class(&self, node: NodeId, class: &str) {
        self.document.borrow_mut().tree_mut().remove_class(node, class);
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.document
            .borrow()
            .tree()
            .get(node)
            .and_then(|n| n.as_element())
            .is_some_and(|e| e.has_class(class))
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.document.borrow().tree().tag_name(node).map(str::to_string)
    }

    pub fn set_text_content(&self, node: NodeId, text: &str) -> DomResult<()> {
        self.document.borrow_mut().tree_mut().set_text_content(node, text)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.document.borrow().tree().text_content(node)
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Register a bubble-phase listener on a node
    pub fn add_event_listener(&self, node: NodeId, event_type: &str, listener: Listener) -> bool {
        self.add_event_listener_with_capture(node, event_type, listener, false)
    }

    pub fn add_event_listener_with_capture(
        &self,
        node: NodeId,
        event_type: &str,
        listener: Listener,
        use_capture: bool,
    ) -> bool {
        self.document
            .borrow_mut()
            .add_listener(node, event_type, listener, use_capture)
    }

    pub fn remove_event_listener(
        &self,
        node: NodeId,
        event_type: &str,
        listener: &Listener,
        use_capture: bool,
    ) -> bool {
        self.document
            .borrow_mut()
            .remove_listener(node, event_type, listener, use_capture)
    }

    /// Drop every listener attached to a node
    pub fn clear_listeners(&self, node: NodeId) {
        self.document.borrow_mut().clear_listeners(node);
    }

    /// Dispatch through capture, target and bubble phases.
    /// Returns `false` if a listener prevented the default action.
    pub fn dispatch_event(&self, node: NodeId, event: &mut Event) -> bool {
        dispatch(&self.document, node, event)
    }

    // ------------------------------------------------------------------
    // Markup
    // ------------------------------------------------------------------

    pub fn outer_html(&self, node: NodeId) -> String {
        self.outer_html_with(node, &HtmlSerializer::new())
    }

    pub fn outer_html_with(&self, node: NodeId, serializer: &HtmlSerializer) -> String {
        serializer.serialize_outer(self.document.borrow().tree(), node)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        HtmlSerializer::new().serialize_inner(self.document.borrow().tree(), node)
    }

    /// Replace the children of `node` with parsed markup
    pub fn set_inner_html(&self, node: NodeId, markup: &str) -> DomResult<Vec<NodeId>> {
        let mut doc = self.document.borrow_mut();
        let tree = doc.tree_mut();
        let target = tree.get(node).ok_or(DomError::NotFound(node))?;
        if !target.can_have_children() {
            return Err(DomError::InvalidNodeType(node));
        }
        tree.clear_children(node);
        Ok(cnext_html::parse_fragment_into(tree, node, markup))
    }
}

impl Default for DomHelper {
    fn default() -> Self {
        Self::global()
    }
}

impl std::fmt::Debug for DomHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let doc = self.document.borrow();
        f.debug_struct("DomHelper")
            .field("url", &doc.url())
            .field("nodes", &doc.tree().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnext_dom::listener;
    use std::cell::Cell;

    fn mounted(dom: &DomHelper, tag: &str) -> NodeId {
        let node = dom.create_element(tag);
        dom.append_child(dom.body(), node).unwrap();
        node
    }

    #[test]
    fn test_lookups() {
        let dom = DomHelper::detached();
        let list = mounted(&dom, "ul");
        dom.set_attribute(list, "id", "items").unwrap();
        for i in 0..3 {
            let li = dom.create_element("li");
            dom.add_class(li, "item").unwrap();
            dom.set_text_content(li, &format!("item {i}")).unwrap();
            dom.append_child(list, li).unwrap();
        }

        assert_eq!(dom.get_element("items"), Some(list));
        assert_eq!(dom.get_elements_by_class("item", None).len(), 3);
        assert_eq!(dom.get_elements_by_tag("li", Some(list)).len(), 3);
        let first = dom.get_element_by_class("item", Some(list)).unwrap();
        assert_eq!(dom.text_content(first), "item 0");
        assert_eq!(dom.query_selector("#items", None), Some(list));
        assert_eq!(dom.get_element_by_class("missing", None), None);
    }

    #[test]
    fn test_remove_node_is_repeatable() {
        let dom = DomHelper::detached();
        let div = mounted(&dom, "div");
        assert!(dom.is_in_document(div));

        dom.remove_node(div);
        dom.remove_node(div);
        assert!(!dom.is_in_document(div));
        assert_eq!(dom.parent_node(div), None);
    }

    #[test]
    fn test_listener_passthrough_defaults_to_bubble() {
        let dom = DomHelper::detached();
        let outer = mounted(&dom, "div");
        let inner = dom.create_element("button");
        dom.append_child(outer, inner).unwrap();

        let order = Rc::new(RefCell::new(Vec::new()));
        let o = order.clone();
        dom.add_event_listener(outer, "click", listener(move |_| {
            o.borrow_mut().push("bubble");
            Ok(())
        }));
        let o = order.clone();
        dom.add_event_listener_with_capture(outer, "click", listener(move |_| {
            o.borrow_mut().push("capture");
            Ok(())
        }), true);
        let o = order.clone();
        dom.add_event_listener(inner, "click", listener(move |_| {
            o.borrow_mut().push("target");
            Ok(())
        }));

        assert!(dom.dispatch_event(inner, &mut Event::new("click")));
        assert_eq!(*order.borrow(), vec!["capture", "target", "bubble"]);
    }

    #[test]
    fn test_remove_event_listener() {
        let dom = DomHelper::detached();
        let button = mounted(&dom, "button");
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let l = listener(move |_| {
            h.set(h.get() + 1);
            Ok(())
        });

        dom.add_event_listener(button, "click", l.clone());
        dom.dispatch_event(button, &mut Event::new("click"));
        assert!(dom.remove_event_listener(button, "click", &l, false));
        dom.dispatch_event(button, &mut Event::new("click"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_inner_html_roundtrip() {
        let dom = DomHelper::detached();
        let host = mounted(&dom, "div");
        dom.set_inner_html(host, "<p class=\"a\">one</p><p>two</p>").unwrap();
        assert_eq!(dom.element_children(host).len(), 2);
        assert_eq!(dom.inner_html(host), "<p class=\"a\">one</p><p>two</p>");

        dom.set_inner_html(host, "").unwrap();
        assert!(dom.first_element_child(host).is_none());

        let text = dom.create_text_node("x");
        assert_eq!(dom.set_inner_html(text, "<b></b>"), Err(DomError::InvalidNodeType(text)));
    }

    #[test]
    fn test_global_document_is_shared() {
        let a = DomHelper::global();
        let b = DomHelper::default();
        assert!(a.same_document(&b));
        assert!(!a.same_document(&DomHelper::detached()));
    }
}
