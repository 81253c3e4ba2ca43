//! The macro record as the engine sees it. The store owns persistence;
//! the engine only reads macros and asks for counter increments.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::field::{FieldContext, FieldKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacroId(pub String);

impl MacroId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named, reusable block of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    pub id: MacroId,
    pub name: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default)]
    pub last_used: Option<u64>,
    /// `domain:fieldType` → number of insertions in that context.
    #[serde(default)]
    pub context_usage: BTreeMap<String, u32>,
    /// Declared field-type affinities.
    #[serde(default)]
    pub field_types: Vec<FieldKind>,
    /// Declared domain affinities (matched as substrings of the page domain).
    #[serde(default)]
    pub domains: Vec<String>,
}

impl Macro {
    pub fn new(id: impl Into<String>, name: impl Into<String>, body: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: MacroId::new(id),
            name: name.into(),
            body: body.into(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            usage_count: 0,
            last_used: None,
            context_usage: BTreeMap::new(),
            field_types: Vec::new(),
            domains: Vec::new(),
        }
    }

    pub fn with_field_types(mut self, kinds: impl IntoIterator<Item = FieldKind>) -> Self {
        self.field_types = kinds.into_iter().collect();
        self
    }

    pub fn with_domains<S: Into<String>>(mut self, domains: impl IntoIterator<Item = S>) -> Self {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_usage(mut self, count: u32, last_used: Option<u64>) -> Self {
        self.usage_count = count;
        self.last_used = last_used;
        self
    }

    pub fn context_usage_for(&self, ctx: &FieldContext) -> u32 {
        self.context_usage
            .get(&ctx.context_key())
            .copied()
            .unwrap_or(0)
    }
}

/// Key under which per-context usage is recorded: `domain:fieldType`.
pub fn context_key(domain: &str, kind: FieldKind) -> String {
    format!("{domain}:{}", kind.as_str())
}

pub fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
