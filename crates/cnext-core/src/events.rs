//! Component-level event target
//!
//! A per-type listener table with synchronous dispatch. Every listener gets
//! its own clone of the event, so one listener calling `prevent_default`
//! cannot change what the next one observes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use cnext_dom::{invoke_listener, same_listener, Event, Listener};
use serde_json::Value;

/// Well-known event type names
pub mod event_type {
    /// Wildcard: listeners registered under this type see every event
    pub const ALL: &str = "all";
    pub const STATECHANGE: &str = "statechange";
    pub const DISPOSE: &str = "dispose";

    pub const DISABLE: &str = "disable";
    pub const ENABLE: &str = "enable";
    pub const ENTER: &str = "enter";
    pub const LEAVE: &str = "leave";
    pub const ACTIVATE: &str = "activate";
    pub const DEACTIVATE: &str = "deactivate";
    pub const SELECT: &str = "select";
    pub const UNSELECT: &str = "unselect";
    pub const CHECK: &str = "check";
    pub const UNCHECK: &str = "uncheck";
    pub const FOCUS: &str = "focus";
    pub const BLUR: &str = "blur";
    pub const OPEN: &str = "open";
    pub const CLOSE: &str = "close";
    pub const HIGHLIGHT: &str = "highlight";
    pub const UNHIGHLIGHT: &str = "unhighlight";
    pub const HIDE: &str = "hide";
    pub const SHOW: &str = "show";

    /// Types that only exist on the component and are never forwarded from
    /// the DOM
    pub fn is_component_only(ty: &str) -> bool {
        matches!(ty, ALL | STATECHANGE | DISPOSE)
    }
}

#[derive(Default)]
struct ListenerTable {
    by_type: HashMap<String, Vec<Listener>>,
    disposed: bool,
}

/// Shared handle to a listener table
#[derive(Clone, Default)]
pub struct EventTarget {
    inner: Rc<RefCell<ListenerTable>>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns `false` if it was already registered
    /// for this type or the target is disposed.
    pub fn add_event_listener(&self, event_type: &str, listener: Listener) -> bool {
        let mut table = self.inner.borrow_mut();
        if table.disposed {
            return false;
        }
        let entry = table.by_type.entry(event_type.to_string()).or_default();
        if entry.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        entry.push(listener);
        true
    }

    /// Unregister a listener, dropping the type entry once it is empty
    pub fn remove_event_listener(&self, event_type: &str, listener: &Listener) -> bool {
        let mut table = self.inner.borrow_mut();
        let Some(entry) = table.by_type.get_mut(event_type) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|l| !same_listener(l, listener));
        let removed = entry.len() != before;
        if entry.is_empty() {
            table.by_type.remove(event_type);
        }
        removed
    }

    /// Whether any listener is registered for `event_type`
    pub fn has_listeners(&self, event_type: &str) -> bool {
        self.inner.borrow().by_type.contains_key(event_type)
    }

    /// Number of listeners registered for `event_type`
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.inner
            .borrow()
            .by_type
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Registered event types (order unspecified)
    pub fn event_types(&self) -> Vec<String> {
        self.inner.borrow().by_type.keys().cloned().collect()
    }

    /// Invoke the listeners for `event`'s type, then the wildcard listeners.
    ///
    /// Returns `false` if any listener prevented the default action.
    pub fn dispatch_event(&self, event: &Event) -> bool {
        let listeners: Vec<Listener> = {
            let table = self.inner.borrow();
            let ty = event.event_type();
            let mut listeners = table.by_type.get(ty).cloned().unwrap_or_default();
            if ty != event_type::ALL {
                if let Some(all) = table.by_type.get(event_type::ALL) {
                    listeners.extend(all.iter().cloned());
                }
            }
            listeners
        };

        let mut allowed = true;
        for listener in &listeners {
            let mut copy = event.clone();
            invoke_listener(listener, &mut copy);
            if copy.default_prevented() {
                allowed = false;
            }
        }
        allowed
    }

    /// Build and dispatch an event carrying `data`
    pub fn emit(&self, event_type: &str, data: Value) -> bool {
        self.dispatch_event(&Event::with_data(event_type, data))
    }

    /// Emit `dispose` to current listeners, then drop them all
    pub fn dispose(&self) {
        self.dispose_with(&Event::new(event_type::DISPOSE));
    }

    pub(crate) fn dispose_with(&self, event: &Event) {
        if self.is_disposed() {
            return;
        }
        self.dispatch_event(event);
        let mut table = self.inner.borrow_mut();
        table.by_type.clear();
        table.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.inner.borrow();
        f.debug_struct("EventTarget")
            .field("types", &table.by_type.len())
            .field("disposed", &table.disposed)
            .finish()
    }
}
