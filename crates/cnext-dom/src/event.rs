//! DOM Events
//!
//! Event objects, listener handles, the per-node listener registry and
//! capture/target/bubble dispatch over the tree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde_json::Value;

use crate::{Document, NodeId};

/// Event listener callback.
///
/// Listeners are compared by pointer identity, so registering the same
/// `Listener` twice for one type stores it once.
pub type Listener = Rc<dyn Fn(&mut Event) -> anyhow::Result<()>>;

/// Wrap a closure into a [`Listener`]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&mut Event) -> anyhow::Result<()> + 'static,
{
    Rc::new(f)
}

/// Identity comparison for listeners
#[inline]
pub fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Dispatch phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// Event passed to listeners
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    /// Identifier of the emitting object (component id), if any
    pub target: Option<String>,
    /// Node the event was dispatched on (DOM dispatch only)
    pub target_node: Option<NodeId>,
    /// Node whose listeners are currently running (DOM dispatch only)
    pub current_node: Option<NodeId>,
    /// Payload
    pub data: Value,
    pub bubbles: bool,
    pub phase: EventPhase,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    /// Create an event with no payload
    pub fn new(event_type: impl Into<String>) -> Self {
        Self::with_data(event_type, Value::Null)
    }

    /// Create an event carrying a payload
    pub fn with_data(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            target: None,
            target_node: None,
            current_node: None,
            data,
            bubbles: true,
            phase: EventPhase::None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Builder: set whether the event bubbles
    pub fn bubbling(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Event type name
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Check if default was prevented
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop propagation to further nodes
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Check if propagation was stopped
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Run a listener, isolating errors and panics.
///
/// Returns `false` when the listener failed. Failures are logged and never
/// propagate to the dispatcher.
pub fn invoke_listener(listener: &Listener, event: &mut Event) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            tracing::error!(event_type = %event.event_type(), "Error in event listener: {err:#}");
            false
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(event_type = %event.event_type(), "Event listener panicked: {message}");
            false
        }
    }
}

#[derive(Clone)]
struct RegisteredListener {
    event_type: String,
    listener: Listener,
    capture: bool,
}

/// Listeners attached to individual nodes
#[derive(Default)]
pub struct ListenerRegistry {
    by_node: HashMap<NodeId, Vec<RegisteredListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener; returns `false` for an exact duplicate
    pub fn add(&mut self, node: NodeId, event_type: &str, listener: Listener, capture: bool) -> bool {
        let entries = self.by_node.entry(node).or_default();
        let duplicate = entries.iter().any(|r| {
            r.capture == capture && r.event_type == event_type && same_listener(&r.listener, &listener)
        });
        if duplicate {
            return false;
        }
        entries.push(RegisteredListener {
            event_type: event_type.to_string(),
            listener,
            capture,
        });
        true
    }

    /// Remove a listener; returns whether it was present
    pub fn remove(&mut self, node: NodeId, event_type: &str, listener: &Listener, capture: bool) -> bool {
        let Some(entries) = self.by_node.get_mut(&node) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|r| {
            !(r.capture == capture && r.event_type == event_type && same_listener(&r.listener, listener))
        });
        let removed = entries.len() < before;
        if entries.is_empty() {
            self.by_node.remove(&node);
        }
        removed
    }

    /// Drop every listener on a node
    pub fn clear(&mut self, node: NodeId) {
        self.by_node.remove(&node);
    }

    /// Listeners of one phase for a node, in registration order
    pub fn collect(&self, node: NodeId, event_type: &str, capture: bool) -> Vec<Listener> {
        self.by_node
            .get(&node)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|r| r.capture == capture && r.event_type == event_type)
                    .map(|r| r.listener.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of listeners registered on a node
    pub fn count(&self, node: NodeId) -> usize {
        self.by_node.get(&node).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("nodes", &self.by_node.len())
            .finish()
    }
}

/// Dispatch an event on a node: capture from the root down, then the
/// target, then bubble back up.
///
/// The document is only borrowed while collecting listeners, so listeners
/// are free to mutate it. Returns `false` if default was prevented.
pub fn dispatch(document: &RefCell<Document>, target: NodeId, event: &mut Event) -> bool {
    let plan: Vec<(NodeId, EventPhase, Vec<Listener>)> = {
        let doc = document.borrow();
        let tree = doc.tree();
        if tree.get(target).is_none() {
            return true;
        }

        // target first, then ancestors
        let mut path = vec![target];
        let mut current = tree.parent(target);
        while let Some(id) = current {
            path.push(id);
            current = tree.parent(id);
        }

        let registry = doc.listeners();
        let ty = event.event_type();
        let mut plan = Vec::new();
        for &node in path.iter().skip(1).rev() {
            plan.push((node, EventPhase::Capturing, registry.collect(node, ty, true)));
        }
        let mut at_target = registry.collect(target, ty, true);
        at_target.extend(registry.collect(target, ty, false));
        plan.push((target, EventPhase::AtTarget, at_target));
        if event.bubbles {
            for &node in path.iter().skip(1) {
                plan.push((node, EventPhase::Bubbling, registry.collect(node, ty, false)));
            }
        }
        plan
    };

    tracing::trace!(event_type = %event.event_type(), %target, "Dispatching DOM event");

    event.target_node = Some(target);
    for (node, phase, listeners) in plan {
        if event.propagation_stopped() {
            break;
        }
        event.current_node = Some(node);
        event.phase = phase;
        for listener in &listeners {
            invoke_listener(listener, event);
        }
    }
    event.current_node = None;
    event.phase = EventPhase::None;

    !event.default_prevented()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_same_listener_identity() {
        let a = listener(|_| Ok(()));
        let b = listener(|_| Ok(()));
        assert!(same_listener(&a, &a.clone()));
        assert!(!same_listener(&a, &b));
    }

    #[test]
    fn test_invoke_listener_isolates_errors_and_panics() {
        let failing = listener(|_| Err(anyhow::anyhow!("boom")));
        let panicking = listener(|_| panic!("listener panic"));
        let mut event = Event::new("test");
        assert!(!invoke_listener(&failing, &mut event));
        assert!(!invoke_listener(&panicking, &mut event));
    }

    #[test]
    fn test_registry_dedup_and_cleanup() {
        let mut registry = ListenerRegistry::new();
        let node = NodeId(3);
        let l = listener(|_| Ok(()));
        assert!(registry.add(node, "click", l.clone(), false));
        assert!(!registry.add(node, "click", l.clone(), false));
        assert!(registry.add(node, "click", l.clone(), true));
        assert_eq!(registry.count(node), 2);

        assert!(registry.remove(node, "click", &l, false));
        assert!(registry.remove(node, "click", &l, true));
        assert_eq!(registry.count(node), 0);
        assert!(!registry.remove(node, "click", &l, true));
    }

    #[test]
    fn test_dispatch_order_capture_target_bubble() {
        let document = RefCell::new(Document::new("about:blank"));
        let (outer, inner) = {
            let mut doc = document.borrow_mut();
            let body = doc.body();
            let tree = doc.tree_mut();
            let outer = tree.create_element("div");
            let inner = tree.create_element("button");
            tree.append_child(body, outer).unwrap();
            tree.append_child(outer, inner).unwrap();
            (outer, inner)
        };

        let log = Rc::new(RefCell::new(Vec::new()));
        let record = |tag: &'static str| {
            let log = log.clone();
            listener(move |event| {
                log.borrow_mut().push((tag, event.phase));
                Ok(())
            })
        };
        {
            let mut doc = document.borrow_mut();
            doc.add_listener(outer, "click", record("outer-bubble"), false);
            doc.add_listener(outer, "click", record("outer-capture"), true);
            doc.add_listener(inner, "click", record("inner"), false);
        }

        let mut event = Event::new("click");
        assert!(dispatch(&document, inner, &mut event));
        assert_eq!(
            *log.borrow(),
            vec![
                ("outer-capture", EventPhase::Capturing),
                ("inner", EventPhase::AtTarget),
                ("outer-bubble", EventPhase::Bubbling),
            ]
        );
    }

    #[test]
    fn test_stop_propagation_and_prevent_default() {
        let document = RefCell::new(Document::new("about:blank"));
        let (outer, inner) = {
            let mut doc = document.borrow_mut();
            let tree = doc.tree_mut();
            let outer = tree.create_element("div");
            let inner = tree.create_element("span");
            tree.append_child(outer, inner).unwrap();
            (outer, inner)
        };
        let outer_calls = Rc::new(Cell::new(0));
        {
            let mut doc = document.borrow_mut();
            doc.add_listener(
                inner,
                "click",
                listener(|event| {
                    event.prevent_default();
                    event.stop_propagation();
                    Ok(())
                }),
                false,
            );
            let calls = outer_calls.clone();
            doc.add_listener(
                outer,
                "click",
                listener(move |_| {
                    calls.set(calls.get() + 1);
                    Ok(())
                }),
                false,
            );
        }

        let mut event = Event::new("click");
        assert!(!dispatch(&document, inner, &mut event));
        assert_eq!(outer_calls.get(), 0);
    }
}
