//! Server rendering and hydration
//!
//! [`ServerComponent`] renders a component subtree to markup without
//! attaching it anywhere, and later adopts server-rendered markup as the
//! component's live element.

use std::ops::Deref;

use cnext_dom::NodeId;
use cnext_html::HtmlSerializer;
use serde_json::Value;

use crate::component::{DefaultView, View};
use crate::events::event_type;
use crate::{Component, ComponentError, DomHelper, Result};

/// How [`ServerComponent::hydrate_with`] treats the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HydrationMode {
    /// Ignore server markup and render a fresh element into the container
    ClientOnly,
    /// Adopt the server-rendered element
    #[default]
    ServerFirst,
}

/// Server rendering switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsrOptions {
    /// Produce markup in [`ServerComponent::render_to_string_with`]
    pub ssr: bool,
    pub hydration: HydrationMode,
}

impl Default for SsrOptions {
    fn default() -> Self {
        Self {
            ssr: true,
            hydration: HydrationMode::ServerFirst,
        }
    }
}

/// Component with server rendering support
#[derive(Debug, Clone)]
pub struct ServerComponent {
    component: Component,
    serializer: HtmlSerializer,
}

impl ServerComponent {
    pub fn new(dom: DomHelper) -> Self {
        Self::with_view(dom, DefaultView)
    }

    pub fn with_view(dom: DomHelper, view: impl View + 'static) -> Self {
        Self::from(Component::with_view(dom, view))
    }

    /// Serialize with `serializer` instead of compact markup
    pub fn with_serializer(mut self, serializer: HtmlSerializer) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    /// Build the subtree's DOM without attaching it and return the
    /// element's outer markup
    pub fn render_to_string(&self) -> Result<String> {
        let element = build_detached(&self.component)?;
        let html = self.dom().outer_html_with(element, &self.serializer);
        tracing::debug!(id = %self.get_id(), bytes = html.len(), "Rendered component to string");
        Ok(html)
    }

    /// Like [`render_to_string`](Self::render_to_string), but returns an
    /// empty string when server rendering is switched off
    pub fn render_to_string_with(&self, options: &SsrOptions) -> Result<String> {
        if !options.ssr {
            return Ok(String::new());
        }
        self.render_to_string()
    }

    /// Adopt an existing element as this component's element.
    ///
    /// With a container, its first element child is adopted; otherwise the
    /// connected element whose id equals the component's explicit id.
    /// Children adopt the element children of the adopted node in order.
    /// An element the component owned before is exited and detached.
    pub fn hydrate(&self, container: Option<NodeId>) -> Result<()> {
        if self.is_disposed() {
            return Err(ComponentError::Disposed { id: self.get_id() });
        }
        let dom = self.dom();
        let element = match container {
            Some(container) => dom.first_element_child(container).ok_or_else(|| {
                ComponentError::HydrationTarget(format!("container {container} has no element child"))
            })?,
            None => {
                let id = self.id().ok_or_else(|| {
                    ComponentError::HydrationTarget(
                        "no container given and the component has no id".to_string(),
                    )
                })?;
                dom.get_element(&id).ok_or_else(|| {
                    ComponentError::HydrationTarget(format!("no element with id `{id}` in the document"))
                })?
            }
        };

        if self.get_element().is_some_and(|old| old != element) {
            self.component.exit_document()?;
        }
        self.component.adopt_tree(element)?;
        if dom.is_in_document(element) {
            self.component.enter_document()?;
        }

        tracing::debug!(id = %self.get_id(), %element, "Hydrated component");
        self.emit(event_type::STATECHANGE, Value::Object(self.get_state()));
        Ok(())
    }

    /// Parse server markup into `container`, then hydrate from it
    pub fn hydrate_markup(&self, container: NodeId, markup: &str) -> Result<()> {
        self.dom().set_inner_html(container, markup)?;
        self.hydrate(Some(container))
    }

    /// Hydrate or render according to `options.hydration`
    pub fn hydrate_with(&self, container: NodeId, options: &SsrOptions) -> Result<()> {
        match options.hydration {
            HydrationMode::ClientOnly => self.render(Some(container)),
            HydrationMode::ServerFirst => self.hydrate(Some(container)),
        }
    }
}

impl From<Component> for ServerComponent {
    fn from(component: Component) -> Self {
        Self {
            component,
            serializer: HtmlSerializer::new(),
        }
    }
}

impl Deref for ServerComponent {
    type Target = Component;

    fn deref(&self) -> &Component {
        &self.component
    }
}

/// Create the DOM of `component` and its descendants, nesting child
/// elements without attaching the root
fn build_detached(component: &Component) -> Result<NodeId> {
    component.create_dom()?;
    let element = component
        .get_element()
        .ok_or_else(|| ComponentError::Disposed { id: component.get_id() })?;
    let dom = component.dom();
    for child in component.get_children() {
        let child_element = build_detached(&child)?;
        if dom.parent_node(child_element) != Some(element) {
            dom.append_child(element, child_element)?;
        }
    }
    Ok(element)
}
