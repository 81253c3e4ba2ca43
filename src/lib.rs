//! Inline macro suggestions for editable surfaces.
//!
//! - `macro_core`: settings, macro model, field classifier, ranking, store
//! - `macro_session`: the `AutocompleteEngine` state machine and surfaces
//! - [`driver`]: a single-threaded host that runs the engine's timers,
//!   store reads and body expansions

pub mod driver;
pub mod trace_init;

pub use driver::{AsyncMode, HostDriver};
pub use macro_core::store::{MacroStore, MemoryStore, StoreError};
pub use macro_core::variables::{BodyExpander, VariableExpander, Verbatim};
pub use macro_core::{Macro, MacroId, Settings};
pub use macro_session::AutocompleteEngine;
pub use trace_init::init_tracing;
