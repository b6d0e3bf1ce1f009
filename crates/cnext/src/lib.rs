//! cnext
//!
//! Component lifecycle and event dispatch on a headless, arena-based DOM.
//!
//! # Example
//! ```rust,ignore
//! use cnext::{Config, Runtime};
//!
//! let runtime = Runtime::new(Config::default());
//! let app = runtime.component();
//! app.set_id("app")?;
//! app.render(None)?;
//! println!("{}", runtime.markup());
//! ```

mod config;
mod runtime;

pub use config::{Config, ConfigError};
pub use runtime::Runtime;

pub use cnext_core::{
    event_type, listener, Component, ComponentError, DomContext, DomHelper, Event, EventTarget,
    HydrationMode, IdGenerator, Listener, NodeId, Phase, ServerComponent, SsrOptions, StateFlags,
    View,
};

// Re-export sub-crates for advanced usage
pub use cnext_core as core;
pub use cnext_dom as dom;
pub use cnext_html as html;

use tracing_subscriber::EnvFilter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install a formatted `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` when a
/// global subscriber was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}
