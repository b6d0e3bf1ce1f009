//! cnext core
//!
//! Component lifecycle and event dispatch on top of the cnext DOM:
//! - [`EventTarget`]: per-type listener sets with isolated, synchronous dispatch
//! - [`DomHelper`]: façade over a shared document
//! - [`IdGenerator`]: process-wide fallback ids
//! - [`Component`]: element ownership, child tree, state, disposal
//! - [`ServerComponent`]: markup rendering and hydration

pub mod component;
mod dom_helper;
mod error;
pub mod events;
mod flags;
mod id;
pub mod server;

pub use component::{Component, DomContext, Phase, Setter, View};
pub use dom_helper::DomHelper;
pub use error::{ComponentError, Result};
pub use events::{event_type, EventTarget};
pub use flags::StateFlags;
pub use id::IdGenerator;
pub use server::{HydrationMode, ServerComponent, SsrOptions};

pub use cnext_dom::{listener, Event, Listener, NodeId};
