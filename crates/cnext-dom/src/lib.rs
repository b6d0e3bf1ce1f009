//! cnext DOM - Document Object Model
//!
//! Headless, arena-based DOM tree used as the live document for components.
//! Nodes are addressed by [`NodeId`] and never freed; detaching a node only
//! unlinks it from its parent.

mod document;
mod error;
mod event;
mod interner;
mod node;
mod query;
mod tree;

pub use document::Document;
pub use error::{DomError, DomResult};
pub use event::{
    dispatch, invoke_listener, listener, same_listener, Event, EventPhase, Listener,
    ListenerRegistry,
};
pub use interner::{InternedString, StringInterner};
pub use node::{Attribute, ElementData, Node, NodeData, TextData};
pub use query::SimpleSelector;
pub use tree::{Children, Descendants, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check whether this ID refers to a node slot
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Convert into an `Option`, mapping [`NodeId::NONE`] to `None`
    #[inline]
    pub fn valid(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#none")
        }
    }
}
