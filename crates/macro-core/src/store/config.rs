use std::collections::HashSet;

use serde::Deserialize;
use tracing::warn;

use crate::macros::Macro;
use crate::variables::variable_names;

#[derive(Debug, thiserror::Error)]
pub enum MacroConfigError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("duplicate macro id '{0}'")]
    DuplicateId(String),
    #[error("macro '{0}' has an empty name")]
    EmptyName(String),
}

#[derive(Deserialize)]
struct MacroFile {
    #[serde(rename = "macro", default)]
    macros: Vec<Macro>,
}

/// Parse a macros file (`[[macro]]` tables).
/// Validates ids and names. References to unknown variables are inserted
/// literally, so they only warn.
pub fn parse_macros_toml(
    toml_str: &str,
    known_variables: &[String],
) -> Result<Vec<Macro>, MacroConfigError> {
    let file: MacroFile =
        toml::from_str(toml_str).map_err(|e| MacroConfigError::Parse(e.to_string()))?;

    let mut seen = HashSet::new();
    for m in &file.macros {
        if !seen.insert(m.id.as_str()) {
            return Err(MacroConfigError::DuplicateId(m.id.to_string()));
        }
        if m.name.trim().is_empty() {
            return Err(MacroConfigError::EmptyName(m.id.to_string()));
        }
        for name in unknown_variables(m, known_variables) {
            warn!(id = %m.id, variable = %name, "unknown variable kept literally");
        }
    }

    Ok(file.macros)
}

/// Variables `m` references that no expander defines.
pub fn unknown_variables(m: &Macro, known_variables: &[String]) -> Vec<String> {
    variable_names(&m.body)
        .into_iter()
        .filter(|name| !known_variables.contains(name))
        .collect()
}
