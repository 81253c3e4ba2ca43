pub mod config_ops;
pub mod rank_ops;
pub mod simulate_ops;

use std::path::Path;

use macro_core::settings::{parse_settings_toml, Settings};
use macro_core::store::{MemoryStore, StoreError};
use macro_core::variables::VariableExpander;

/// Settings from `path`, or the embedded defaults.
pub fn load_settings(path: Option<&str>) -> Result<Settings, String> {
    match path {
        None => Ok(Settings::default()),
        Some(p) => {
            let content =
                std::fs::read_to_string(p).map_err(|e| format!("Error reading {p}: {e}"))?;
            parse_settings_toml(&content).map_err(|e| format!("Error in {p}: {e}"))
        }
    }
}

/// Names the builtin expander resolves.
pub fn builtin_variables() -> Vec<String> {
    VariableExpander::new(Default::default()).known_names()
}

/// Macros file loaded into a store.
pub fn load_store(path: &str) -> Result<MemoryStore, StoreError> {
    MemoryStore::from_path(Path::new(path), &builtin_variables())
}
