//! Unique id generation

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix used by the process-wide generator
pub const DEFAULT_PREFIX: &str = "cnext";

static INSTANCE: OnceLock<IdGenerator> = OnceLock::new();

/// Monotonic `"<prefix>-<n>"` id source
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl IdGenerator {
    /// A local generator with its own counter
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// The process-wide generator
    pub fn get_instance() -> &'static IdGenerator {
        INSTANCE.get_or_init(|| IdGenerator::new(DEFAULT_PREFIX))
    }

    /// Next id; the first call returns `<prefix>-1`
    pub fn get_next_unique_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
