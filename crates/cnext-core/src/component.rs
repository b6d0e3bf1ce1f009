//! Component lifecycle and tree
//!
//! A [`Component`] owns at most one element in its [`DomHelper`]'s document
//! and an ordered list of child components. Rendering is customised through
//! a [`View`]; the base behaviour (element creation, id assignment, event
//! bridging) always runs before the view's `create_dom` hook.
//!
//! Lifecycle: `Uninitialized -> Initialized -> InDocument <-> Initialized`,
//! with `Disposed` reachable from every phase and terminal.
//!
//! No `RefCell` borrow of a component is held while listeners, view hooks or
//! other components run, so all of those may call back into the component.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use cnext_dom::{listener, DomResult, Event, Listener, NodeId};
use serde_json::{Map, Value};

use crate::events::{event_type, EventTarget};
use crate::{ComponentError, DomHelper, IdGenerator, Result, StateFlags};

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No element yet
    #[default]
    Uninitialized,
    /// Element created, not attached
    Initialized,
    /// Element attached under a container
    InDocument,
    /// Terminal
    Disposed,
}

/// Rendering hooks
///
/// All hooks default to no-ops, so an empty `impl View for X {}` renders a
/// bare `<div>`.
pub trait View {
    /// Tag of the element created for the component
    fn tag_name(&self) -> &str {
        "div"
    }

    /// Build the element's content. Runs after the element was created and
    /// the id applied, and again on every rebuild and on hydration, so it
    /// should set content rather than append to it.
    fn create_dom(&self, cx: &mut DomContext<'_>) -> anyhow::Result<()> {
        let _ = cx;
        Ok(())
    }

    /// Runs once the element was attached
    fn enter_document(&self, component: &Component) -> anyhow::Result<()> {
        let _ = component;
        Ok(())
    }

    /// Runs after the children left the document, before the element is
    /// detached
    fn exit_document(&self, component: &Component) -> anyhow::Result<()> {
        let _ = component;
        Ok(())
    }
}

/// View used by [`Component::new`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultView;

impl View for DefaultView {}

/// Access handed to [`View::create_dom`]
pub struct DomContext<'a> {
    component: &'a Component,
    element: NodeId,
}

impl<'a> DomContext<'a> {
    /// Element being built
    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn component(&self) -> &'a Component {
        self.component
    }

    pub fn dom(&self) -> &'a DomHelper {
        self.component.dom()
    }

    /// Snapshot of the component state
    pub fn state(&self) -> Map<String, Value> {
        self.component.get_state()
    }

    /// Snapshot of the component props
    pub fn props(&self) -> Map<String, Value> {
        self.component.get_props()
    }

    /// Replace the element's children with a text node
    pub fn set_text(&mut self, text: &str) -> DomResult<()> {
        self.dom().set_text_content(self.element, text)
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) -> DomResult<()> {
        self.dom().set_attribute(self.element, name, value)
    }

    pub fn add_class(&mut self, class: &str) -> DomResult<()> {
        self.dom().add_class(self.element, class)
    }

    /// Create an element and append it to the element being built
    pub fn append_element(&mut self, tag: &str) -> DomResult<NodeId> {
        let dom = self.dom();
        let child = dom.create_element(tag);
        dom.append_child(self.element, child)
    }

    /// Replace the element's children with parsed markup
    pub fn set_markup(&mut self, markup: &str) -> DomResult<Vec<NodeId>> {
        self.dom().set_inner_html(self.element, markup)
    }
}

/// Capability setter used by [`Component::set_property`]
pub type Setter = Rc<dyn Fn(&Component, Value) -> anyhow::Result<()>>;

struct Inner {
    id: Option<String>,
    fallback_id: Option<String>,
    element: Option<NodeId>,
    container: Option<NodeId>,
    parent: Weak<ComponentNode>,
    children: Vec<Component>,
    child_index: Option<usize>,
    props: Map<String, Value>,
    state: Map<String, Value>,
    phase: Phase,
    disposing: bool,
    flags: StateFlags,
    setters: HashMap<String, Setter>,
    bridge: Option<Listener>,
}

struct ComponentNode {
    dom: DomHelper,
    view: Rc<dyn View>,
    events: EventTarget,
    inner: RefCell<Inner>,
}

/// Handle to a component. Clones share the same component.
#[derive(Clone)]
pub struct Component {
    node: Rc<ComponentNode>,
}

impl Component {
    /// A component rendering a bare `<div>`
    pub fn new(dom: DomHelper) -> Self {
        Self::with_view(dom, DefaultView)
    }

    pub fn with_view(dom: DomHelper, view: impl View + 'static) -> Self {
        Self::from_view(dom, Rc::new(view))
    }

    pub fn from_view(dom: DomHelper, view: Rc<dyn View>) -> Self {
        Self {
            node: Rc::new(ComponentNode {
                dom,
                view,
                events: EventTarget::new(),
                inner: RefCell::new(Inner {
                    id: None,
                    fallback_id: None,
                    element: None,
                    container: None,
                    parent: Weak::new(),
                    children: Vec::new(),
                    child_index: None,
                    props: Map::new(),
                    state: Map::new(),
                    phase: Phase::Uninitialized,
                    disposing: false,
                    flags: StateFlags::empty(),
                    setters: HashMap::new(),
                    bridge: None,
                }),
            }),
        }
    }

    /// Whether both handles refer to the same component
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    pub fn dom(&self) -> &DomHelper {
        &self.node.dom
    }

    /// The component's own event target
    pub fn events(&self) -> &EventTarget {
        &self.node.events
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(ComponentError::Disposed { id: self.get_id() });
        }
        Ok(())
    }

    fn set_phase(&self, phase: Phase) {
        self.node.inner.borrow_mut().phase = phase;
    }

    // ------------------------------------------------------------------
    // Identity and queries
    // ------------------------------------------------------------------

    /// Explicit id, or a generated fallback that stays stable afterwards
    pub fn get_id(&self) -> String {
        let mut inner = self.node.inner.borrow_mut();
        if let Some(id) = &inner.id {
            return id.clone();
        }
        inner
            .fallback_id
            .get_or_insert_with(|| IdGenerator::get_instance().get_next_unique_id())
            .clone()
    }

    /// Explicit id only
    pub fn id(&self) -> Option<String> {
        self.node.inner.borrow().id.clone()
    }

    /// Set the explicit id, updating the live element if there is one
    pub fn set_id(&self, id: impl Into<String>) -> Result<()> {
        self.ensure_alive()?;
        let id = id.into();
        let element = {
            let mut inner = self.node.inner.borrow_mut();
            inner.id = Some(id.clone());
            inner.element
        };
        if let Some(element) = element {
            self.dom().set_attribute(element, "id", &id)?;
        }
        Ok(())
    }

    pub fn get_element(&self) -> Option<NodeId> {
        self.node.inner.borrow().element
    }

    /// Attached and reachable from the document root
    pub fn is_in_document(&self) -> bool {
        let (phase, element) = {
            let inner = self.node.inner.borrow();
            (inner.phase, inner.element)
        };
        phase == Phase::InDocument && element.is_some_and(|el| self.dom().is_in_document(el))
    }

    pub fn phase(&self) -> Phase {
        self.node.inner.borrow().phase
    }

    pub fn is_disposed(&self) -> bool {
        self.phase() == Phase::Disposed
    }

    pub fn get_parent(&self) -> Option<Component> {
        self.node
            .inner
            .borrow()
            .parent
            .upgrade()
            .map(|node| Component { node })
    }

    pub fn get_children(&self) -> Vec<Component> {
        self.node.inner.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.node.inner.borrow().children.len()
    }

    pub fn get_child_at(&self, index: usize) -> Option<Component> {
        self.node.inner.borrow().children.get(index).cloned()
    }

    /// Child whose [`get_id`](Self::get_id) equals `id`
    pub fn get_child(&self, id: &str) -> Option<Component> {
        self.get_children().into_iter().find(|c| c.get_id() == id)
    }

    /// Position within the parent's children, `None` when unparented
    pub fn child_index(&self) -> Option<usize> {
        self.node.inner.borrow().child_index
    }

    pub fn get_state(&self) -> Map<String, Value> {
        self.node.inner.borrow().state.clone()
    }

    pub fn get_props(&self) -> Map<String, Value> {
        self.node.inner.borrow().props.clone()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create the element. No-op when it already exists.
    pub fn create_dom(&self) -> Result<()> {
        self.ensure_alive()?;
        if self.get_element().is_some() {
            return Ok(());
        }

        let element = self.dom().create_element(self.node.view.tag_name());
        tracing::debug!(id = %self.get_id(), %element, "Creating component DOM");
        self.adopt_element(element)?;
        Ok(())
    }

    /// Make `element` the component's element: apply the id, bridge DOM
    /// events and run the view's `create_dom` hook on it.
    pub(crate) fn adopt_element(&self, element: NodeId) -> Result<()> {
        let (id, previous) = {
            let mut inner = self.node.inner.borrow_mut();
            let previous = inner.element.replace(element);
            if inner.phase == Phase::Uninitialized {
                inner.phase = Phase::Initialized;
            }
            (inner.id.clone(), previous)
        };
        if let Some(old) = previous.filter(|&old| old != element) {
            self.dom().remove_node(old);
            self.dom().clear_listeners(old);
        }
        if let Some(id) = id {
            self.dom().set_attribute(element, "id", &id)?;
        }
        self.bridge_events(element);

        let view = self.node.view.clone();
        let mut cx = DomContext {
            component: self,
            element,
        };
        view.create_dom(&mut cx)?;
        Ok(())
    }

    /// Adopt `element` and match child `i` to its `i`-th element child,
    /// recursively. Children without a matching node keep their own element
    /// or get a fresh one when they enter the document.
    pub(crate) fn adopt_tree(&self, element: NodeId) -> Result<()> {
        let dom = self.dom();
        let server_children = dom.element_children(element);
        self.adopt_element(element)?;
        if let Some(parent) = dom.parent_node(element) {
            self.node.inner.borrow_mut().container = Some(parent);
        }
        for (child, node) in self.get_children().iter().zip(server_children) {
            child.ensure_alive()?;
            child.adopt_tree(node)?;
        }
        Ok(())
    }

    /// Create the element if needed, attach it to `container` (or the last
    /// container, or `<body>`), render every child into it and emit
    /// `statechange`.
    pub fn render(&self, container: Option<NodeId>) -> Result<()> {
        self.ensure_alive()?;
        let element = self.attach(container)?;
        for child in self.get_children() {
            child.render(Some(element))?;
        }
        self.emit_state_change(Value::Object(self.get_state()));
        Ok(())
    }

    /// Re-attach to the stored container and enter the children
    pub fn enter_document(&self) -> Result<()> {
        self.ensure_alive()?;
        self.enter_tree(None)
    }

    fn enter_tree(&self, container: Option<NodeId>) -> Result<()> {
        let element = self.attach(container)?;
        for child in self.get_children() {
            child.enter_tree(Some(element))?;
        }
        Ok(())
    }

    /// Attach the own element without touching children
    fn attach(&self, container: Option<NodeId>) -> Result<NodeId> {
        self.create_dom()?;
        let (element, stored) = {
            let inner = self.node.inner.borrow();
            (inner.element, inner.container)
        };
        let element = element.ok_or_else(|| ComponentError::Disposed { id: self.get_id() })?;

        let dom = self.dom();
        let target = container
            .or(stored)
            .or_else(|| dom.parent_node(element))
            .unwrap_or_else(|| dom.body());
        if dom.parent_node(element) != Some(target) {
            dom.append_child(target, element)?;
        }

        let entering = {
            let mut inner = self.node.inner.borrow_mut();
            inner.container = Some(target);
            let entering = inner.phase != Phase::InDocument;
            inner.phase = Phase::InDocument;
            entering
        };
        if entering {
            tracing::debug!(id = %self.get_id(), container = %target, "Component entered document");
            self.node.view.clone().enter_document(self)?;
        }
        Ok(element)
    }

    /// Exit children, run the view hook, then detach the own element.
    /// The element is kept for a later [`enter_document`](Self::enter_document).
    pub fn exit_document(&self) -> Result<()> {
        self.ensure_alive()?;
        for child in self.get_children() {
            child.exit_document()?;
        }

        if self.phase() == Phase::InDocument {
            self.node.view.clone().exit_document(self)?;
            self.set_phase(Phase::Initialized);
            tracing::debug!(id = %self.get_id(), "Component exited document");
        }
        if let Some(element) = self.get_element() {
            self.dom().remove_node(element);
        }
        Ok(())
    }

    /// Tear down and rebuild the element at the same position.
    ///
    /// Only an entered component exits and re-enters. An element without a
    /// DOM parent that never entered is dropped, and the next `create_dom`
    /// builds it from the current state.
    fn rebuild(&self) -> Result<()> {
        let Some(old) = self.get_element() else {
            return Ok(());
        };
        let dom = self.dom();
        let parent = dom.parent_node(old);
        let next = dom.next_sibling(old);
        let entered = self.phase() == Phase::InDocument;

        tracing::trace!(id = %self.get_id(), entered, "Rebuilding component DOM");
        if entered {
            self.exit_document()?;
        } else {
            dom.remove_node(old);
        }
        dom.clear_listeners(old);
        self.node.inner.borrow_mut().element = None;
        if !entered && parent.is_none() {
            return Ok(());
        }

        self.create_dom()?;
        let element = self
            .get_element()
            .ok_or_else(|| ComponentError::Disposed { id: self.get_id() })?;
        if let Some(parent) = parent {
            let next = next.filter(|&n| dom.parent_node(n) == Some(parent));
            dom.insert_before(parent, element, next)?;
        }
        if entered {
            return self.enter_tree(parent);
        }
        for child in self.get_children() {
            if let Some(child_element) = child.get_element() {
                if dom.parent_node(child_element) == Some(old) {
                    dom.append_child(element, child_element)?;
                }
            }
        }
        Ok(())
    }

    /// Release the component. Safe to call repeatedly.
    pub fn dispose(&self) {
        {
            let mut inner = self.node.inner.borrow_mut();
            if inner.disposing || inner.phase == Phase::Disposed {
                return;
            }
            inner.disposing = true;
        }

        if let Err(err) = self.exit_document() {
            tracing::error!(id = %self.get_id(), "Error exiting document during dispose: {err}");
        }

        let children = std::mem::take(&mut self.node.inner.borrow_mut().children);
        for child in &children {
            {
                let mut inner = child.node.inner.borrow_mut();
                inner.parent = Weak::new();
                inner.child_index = None;
            }
            child.dispose();
        }

        if let Some(parent) = self.get_parent() {
            parent.unlink_child(self);
        }

        let element = {
            let mut inner = self.node.inner.borrow_mut();
            inner.container = None;
            inner.bridge = None;
            inner.setters.clear();
            inner.phase = Phase::Disposed;
            inner.element.take()
        };
        if let Some(element) = element {
            self.dom().remove_node(element);
            self.dom().clear_listeners(element);
        }

        let id = self.get_id();
        tracing::debug!(%id, "Component disposed");
        let mut event = Event::new(event_type::DISPOSE);
        event.target = Some(id);
        self.node.events.dispose_with(&event);
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    /// Append a child. Does not render it.
    ///
    /// A child that already has another parent is removed from it first.
    pub fn add_child(&self, child: &Component) -> Result<()> {
        self.ensure_alive()?;
        child.ensure_alive()?;
        if self.ptr_eq(child) {
            return Err(ComponentError::SelfParent);
        }
        let mut ancestor = self.get_parent();
        while let Some(a) = ancestor {
            if a.ptr_eq(child) {
                return Err(ComponentError::Cycle {
                    parent: self.get_id(),
                    child: child.get_id(),
                });
            }
            ancestor = a.get_parent();
        }

        match child.get_parent() {
            Some(current) if current.ptr_eq(self) => return Ok(()),
            Some(current) => {
                current.remove_child(child)?;
            }
            None => {}
        }

        let index = {
            let mut inner = self.node.inner.borrow_mut();
            inner.children.push(child.clone());
            inner.children.len() - 1
        };
        let mut child_inner = child.node.inner.borrow_mut();
        child_inner.parent = Rc::downgrade(&self.node);
        child_inner.child_index = Some(index);
        Ok(())
    }

    /// Exit and unparent a child. Returns `false` when it is not a child.
    pub fn remove_child(&self, child: &Component) -> Result<bool> {
        self.ensure_alive()?;
        let present = self
            .node
            .inner
            .borrow()
            .children
            .iter()
            .any(|c| c.ptr_eq(child));
        if !present {
            return Ok(false);
        }
        if !child.is_disposed() {
            child.exit_document()?;
        }
        Ok(self.unlink_child(child))
    }

    fn unlink_child(&self, child: &Component) -> bool {
        let removed = {
            let mut inner = self.node.inner.borrow_mut();
            let Some(pos) = inner.children.iter().position(|c| c.ptr_eq(child)) else {
                return false;
            };
            let removed = inner.children.remove(pos);
            for (i, c) in inner.children.iter().enumerate().skip(pos) {
                c.node.inner.borrow_mut().child_index = Some(i);
            }
            removed
        };
        let mut inner = removed.node.inner.borrow_mut();
        inner.parent = Weak::new();
        inner.child_index = None;
        inner.container = None;
        true
    }

    // ------------------------------------------------------------------
    // State and props
    // ------------------------------------------------------------------

    /// Shallow-merge `patch` into the state.
    ///
    /// Returns `Ok(false)` without side effects when nothing changed.
    /// Otherwise rebuilds an existing element and emits `statechange`
    /// carrying the new state.
    pub fn set_state(&self, patch: Value) -> Result<bool> {
        self.ensure_alive()?;
        let changed = {
            let mut inner = self.node.inner.borrow_mut();
            merge(&mut inner.state, patch)?
        };
        if !changed {
            return Ok(false);
        }
        self.rebuild()?;
        self.emit_state_change(Value::Object(self.get_state()));
        Ok(true)
    }

    /// Shallow-merge `patch` into the props, with the same effects as
    /// [`set_state`](Self::set_state)
    pub fn set_props(&self, patch: Value) -> Result<bool> {
        self.ensure_alive()?;
        let changed = {
            let mut inner = self.node.inner.borrow_mut();
            merge(&mut inner.props, patch)?
        };
        if !changed {
            return Ok(false);
        }
        self.rebuild()?;
        self.emit_state_change(Value::Object(self.get_props()));
        Ok(true)
    }

    /// Register a setter for [`set_property`](Self::set_property)
    pub fn register_setter<F>(&self, key: impl Into<String>, setter: F)
    where
        F: Fn(&Component, Value) -> anyhow::Result<()> + 'static,
    {
        self.node
            .inner
            .borrow_mut()
            .setters
            .insert(key.into(), Rc::new(setter));
    }

    /// Route `value` to the setter registered for `key`, or merge it into
    /// the state under `key`
    pub fn set_property(&self, key: &str, value: Value) -> Result<()> {
        self.ensure_alive()?;
        let setter = self.node.inner.borrow().setters.get(key).cloned();
        match setter {
            Some(setter) => setter(self, value)?,
            None => {
                let mut patch = Map::new();
                patch.insert(key.to_string(), value);
                self.set_state(Value::Object(patch))?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // UI flags
    // ------------------------------------------------------------------

    pub fn flags(&self) -> StateFlags {
        self.node.inner.borrow().flags
    }

    pub fn has_flag(&self, flag: StateFlags) -> bool {
        self.flags().contains(flag)
    }

    /// Switch flags on or off, emitting the matching event for each flag
    /// that changed. Returns whether anything changed.
    pub fn set_flag(&self, flag: StateFlags, on: bool) -> Result<bool> {
        self.ensure_alive()?;
        let changed = {
            let mut inner = self.node.inner.borrow_mut();
            let before = inner.flags;
            inner.flags.set(flag, on);
            before ^ inner.flags
        };
        for single in changed.iter() {
            if let Some(ty) = single.transition_event(on) {
                self.emit(ty, Value::Null);
            }
        }
        Ok(!changed.is_empty())
    }

    pub fn is_enabled(&self) -> bool {
        !self.has_flag(StateFlags::DISABLED)
    }

    pub fn is_visible(&self) -> bool {
        !self.has_flag(StateFlags::HIDDEN)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register a component listener. Warns and returns `false` after
    /// disposal.
    ///
    /// Listeners for DOM event types also receive events dispatched on the
    /// element or its descendants.
    pub fn add_event_listener(&self, event_type: &str, listener: Listener) -> bool {
        if self.is_disposed() {
            tracing::warn!(id = %self.get_id(), event_type, "Listener added to a disposed component");
            return false;
        }
        let added = self.node.events.add_event_listener(event_type, listener);
        if added {
            if let Some(element) = self.get_element() {
                self.bridge_type(element, event_type);
            }
        }
        added
    }

    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener) -> bool {
        self.node.events.remove_event_listener(event_type, listener)
    }

    /// Dispatch on the component, stamping `target` with the component id
    pub fn dispatch_event(&self, mut event: Event) -> bool {
        if event.target.is_none() {
            event.target = Some(self.get_id());
        }
        self.node.events.dispatch_event(&event)
    }

    pub fn emit(&self, event_type: &str, data: Value) -> bool {
        self.dispatch_event(Event::with_data(event_type, data))
    }

    fn emit_state_change(&self, data: Value) {
        self.emit(event_type::STATECHANGE, data);
    }

    fn bridge_listener(&self) -> Listener {
        if let Some(bridge) = &self.node.inner.borrow().bridge {
            return bridge.clone();
        }
        let weak = Rc::downgrade(&self.node);
        let bridge = listener(move |event| {
            let Some(node) = weak.upgrade() else {
                return Ok(());
            };
            let component = Component { node };
            let mut forwarded = event.clone();
            forwarded.target = Some(component.get_id());
            if !component.node.events.dispatch_event(&forwarded) {
                event.prevent_default();
            }
            Ok(())
        });
        self.node.inner.borrow_mut().bridge = Some(bridge.clone());
        bridge
    }

    fn bridge_type(&self, element: NodeId, ty: &str) {
        if event_type::is_component_only(ty) {
            return;
        }
        let bridge = self.bridge_listener();
        self.dom()
            .add_event_listener_with_capture(element, ty, bridge, true);
    }

    fn bridge_events(&self, element: NodeId) {
        for ty in self.node.events.event_types() {
            self.bridge_type(element, &ty);
        }
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::new(DomHelper::global())
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Component {}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.node.inner.borrow();
        f.debug_struct("Component")
            .field("id", &inner.id)
            .field("element", &inner.element)
            .field("phase", &inner.phase)
            .field("children", &inner.children.len())
            .finish()
    }
}

/// Shallow merge. Returns whether any key changed.
fn merge(target: &mut Map<String, Value>, patch: Value) -> Result<bool> {
    let Value::Object(patch) = patch else {
        return Err(ComponentError::InvalidPatch(patch.to_string()));
    };
    let mut changed = false;
    for (key, value) in patch {
        if target.get(&key) != Some(&value) {
            target.insert(key, value);
            changed = true;
        }
    }
    Ok(changed)
}
