//! Component errors

use cnext_dom::DomError;
use thiserror::Error;

/// Lifecycle misuse and DOM failures surfaced by components
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("component `{id}` is disposed")]
    Disposed { id: String },

    #[error("a component cannot be added as its own child")]
    SelfParent,

    #[error("adding `{child}` under `{parent}` would create a cycle")]
    Cycle { parent: String, child: String },

    #[error("state and props patches must be JSON objects, got `{0}`")]
    InvalidPatch(String),

    #[error("no element to hydrate: {0}")]
    HydrationTarget(String),

    #[error(transparent)]
    Dom(#[from] DomError),

    /// Failure raised by a view hook
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = ComponentError> = std::result::Result<T, E>;
