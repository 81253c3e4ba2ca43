//! Pure building blocks of the macro suggestion engine: settings, the macro
//! model, field classification, fuzzy matching, ranking, the candidate cache,
//! and the store / body-expansion contracts.

pub mod cache;
pub mod field;
pub mod fuzzy;
pub mod macros;
pub mod ranking;
pub mod settings;
pub mod store;
pub mod text;
pub mod variables;

pub use field::{FieldContext, FieldKind, SurfaceDescriptor};
pub use macros::{Macro, MacroId};
pub use ranking::Suggestion;
pub use settings::Settings;
