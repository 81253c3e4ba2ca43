//! Contract for the persistent macro store plus an in-memory implementation.
//!
//! Persistence, CRUD UI and sync live outside the engine; the engine only
//! lists macros and reports usage.

mod config;
mod memory;

pub use config::{parse_macros_toml, unknown_variables, MacroConfigError};
pub use memory::MemoryStore;

use crate::field::FieldKind;
use crate::macros::{Macro, MacroId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("macro store unavailable: {0}")]
    Unavailable(String),
    #[error("no macro with id {0}")]
    NotFound(MacroId),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] MacroConfigError),
}

pub trait MacroStore {
    fn list(&self) -> Result<Vec<Macro>, StoreError>;

    fn increment_usage(&mut self, id: &MacroId, now_ms: u64) -> Result<(), StoreError>;

    fn record_context_usage(
        &mut self,
        id: &MacroId,
        context_key: &str,
        field_type: FieldKind,
        domain: &str,
    ) -> Result<(), StoreError>;

    /// Change counter. Any mutation bumps it; callers compare revisions to
    /// learn that their cached list is out of date.
    fn revision(&self) -> u64;
}
