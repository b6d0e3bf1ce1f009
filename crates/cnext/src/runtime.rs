//! Runtime - Main entry point

use std::cell::RefCell;
use std::rc::Rc;

use cnext_core::{Component, DomHelper, NodeId, ServerComponent, View};
use cnext_dom::Document;
use cnext_html::HtmlSerializer;

use crate::Config;

/// A document plus the components rendered into it
pub struct Runtime {
    config: Config,
    dom: DomHelper,
}

impl Runtime {
    /// Create a runtime with a fresh document at `config.document_url`
    pub fn new(config: Config) -> Self {
        let document = Rc::new(RefCell::new(Document::new(&config.document_url)));
        tracing::info!("cnext {} runtime initialized for {}", crate::VERSION, config.document_url);
        Self {
            config,
            dom: DomHelper::new(document),
        }
    }

    /// Install logging with `config.log_filter`, then create the runtime
    pub fn with_logging(config: Config) -> Self {
        crate::init_logging(&config.log_filter);
        Self::new(config)
    }

    /// Parse `html` as the runtime's document
    pub fn from_html(config: Config, html: &str) -> Self {
        let document = cnext_html::HtmlParser::new().parse_with_url(html, &config.document_url);
        tracing::info!("cnext {} runtime initialized from markup", crate::VERSION);
        Self {
            config,
            dom: DomHelper::new(Rc::new(RefCell::new(document))),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dom(&self) -> &DomHelper {
        &self.dom
    }

    pub fn body(&self) -> NodeId {
        self.dom.body()
    }

    /// A component rendering a bare `<div>` into this runtime's document
    pub fn component(&self) -> Component {
        Component::new(self.dom.clone())
    }

    pub fn component_with_view(&self, view: impl View + 'static) -> Component {
        Component::with_view(self.dom.clone(), view)
    }

    /// A server component serializing with the configured serializer
    pub fn server_component(&self, view: impl View + 'static) -> ServerComponent {
        ServerComponent::with_view(self.dom.clone(), view).with_serializer(self.serializer())
    }

    pub fn serializer(&self) -> HtmlSerializer {
        if self.config.pretty_markup {
            HtmlSerializer::pretty()
        } else {
            HtmlSerializer::new()
        }
    }

    /// Markup of the whole document
    pub fn markup(&self) -> String {
        let root = self.dom.document().tree().root();
        self.dom.outer_html_with(root, &self.serializer())
    }

    /// Outer markup of one node
    pub fn node_markup(&self, node: NodeId) -> String {
        self.dom.outer_html_with(node, &self.serializer())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("dom", &self.dom)
            .finish()
    }
}
