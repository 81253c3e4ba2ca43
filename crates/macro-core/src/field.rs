//! Field classification: which kind of editable surface is active and what
//! it is probably for. Pure functions over a surface descriptor plus a label
//! lookup into the hosting document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::macros::context_key;

/// Semantic category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Url,
    Search,
    Name,
    Address,
    Message,
    Subject,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Url => "url",
            Self::Search => "search",
            Self::Name => "name",
            Self::Address => "address",
            Self::Message => "message",
            Self::Subject => "subject",
        }
    }

    /// Kinds the browser's own autofill commonly targets.
    pub fn is_autofill_target(&self) -> bool {
        matches!(self, Self::Email | Self::Phone | Self::Name | Self::Address)
    }
}

/// Ordered keyword families. First family with a substring hit wins.
static KEYWORD_FAMILIES: &[(FieldKind, &[&str])] = &[
    (FieldKind::Email, &["email", "e-mail", "mail"]),
    (FieldKind::Phone, &["phone", "tel", "mobile", "cell"]),
    (FieldKind::Name, &["name", "first", "last", "surname"]),
    (
        FieldKind::Address,
        &["address", "street", "city", "zip", "postal"],
    ),
    (
        FieldKind::Message,
        &["message", "comment", "body", "content", "reply", "note"],
    ),
    (FieldKind::Subject, &["subject", "title", "topic"]),
];

/// Input kinds that accept free text. Anything else is ignored.
static TEXT_INPUT_TYPES: &[&str] = &["", "text", "email", "tel", "url", "search"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Input,
    TextArea,
    ContentEditable,
    Other,
}

/// What the host reports about an editable element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceDescriptor {
    pub element: ElementKind,
    /// Declared input kind (`type` attribute); "text" when absent.
    #[serde(default = "default_input_type")]
    pub input_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub aria_label: Option<String>,
    /// Text of the closest label-like ancestor, if any.
    #[serde(default)]
    pub enclosing_label: Option<String>,
    /// Browser autocomplete hint attribute.
    #[serde(default)]
    pub autocomplete: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub hidden: bool,
}

fn default_input_type() -> String {
    "text".to_string()
}

impl SurfaceDescriptor {
    pub fn input(input_type: &str, name: &str) -> Self {
        Self {
            element: ElementKind::Input,
            input_type: input_type.to_string(),
            name: name.to_string(),
            ..Self::blank(ElementKind::Input)
        }
    }

    pub fn textarea(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::blank(ElementKind::TextArea)
        }
    }

    pub fn content_editable() -> Self {
        Self::blank(ElementKind::ContentEditable)
    }

    fn blank(element: ElementKind) -> Self {
        Self {
            element,
            input_type: default_input_type(),
            name: String::new(),
            id: String::new(),
            placeholder: String::new(),
            aria_label: None,
            enclosing_label: None,
            autocomplete: None,
            disabled: false,
            read_only: false,
            hidden: false,
        }
    }

    /// Whether the engine should attach to this element at all.
    pub fn is_eligible(&self) -> bool {
        if self.disabled || self.read_only || self.hidden {
            return false;
        }
        match self.element {
            ElementKind::Input => {
                let ty = self.input_type.to_ascii_lowercase();
                TEXT_INPUT_TYPES.contains(&ty.as_str())
            }
            ElementKind::TextArea | ElementKind::ContentEditable => true,
            ElementKind::Other => false,
        }
    }

    /// True when the browser is expected to offer its own autofill here.
    pub fn expects_native_autocomplete(&self, kind: FieldKind) -> bool {
        match self.autocomplete.as_deref() {
            None => false,
            Some(hint) => !hint.eq_ignore_ascii_case("off") && kind.is_autofill_target(),
        }
    }
}

/// Document-side label lookup (`<label for=...>`).
pub trait LabelSource {
    fn label_for(&self, id: &str) -> Option<String>;
}

/// A document without explicit labels.
pub struct NoLabels;

impl LabelSource for NoLabels {
    fn label_for(&self, _id: &str) -> Option<String> {
        None
    }
}

impl LabelSource for HashMap<String, String> {
    fn label_for(&self, id: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

/// Derived, ephemeral description of the active field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldContext {
    pub kind: FieldKind,
    /// Raw field name (falls back to the id).
    pub name: String,
    pub placeholder: String,
    pub label: String,
    pub domain: String,
}

impl FieldContext {
    pub fn context_key(&self) -> String {
        context_key(&self.domain, self.kind)
    }
}

pub fn classify(desc: &SurfaceDescriptor, labels: &dyn LabelSource, domain: &str) -> FieldContext {
    let label = resolve_label(desc, labels);
    let kind = infer_kind(desc, &label);
    let name = if desc.name.is_empty() {
        desc.id.clone()
    } else {
        desc.name.clone()
    };
    FieldContext {
        kind,
        name,
        placeholder: desc.placeholder.clone(),
        label,
        domain: domain.to_string(),
    }
}

fn infer_kind(desc: &SurfaceDescriptor, label: &str) -> FieldKind {
    if desc.element == ElementKind::Input {
        if let Some(kind) = declared_kind(&desc.input_type) {
            return kind;
        }
    }

    let name_id = format!("{} {}", desc.name, desc.id).to_lowercase();
    let placeholder = desc.placeholder.to_lowercase();
    let label = label.to_lowercase();

    [name_id, placeholder, label]
        .iter()
        .find_map(|haystack| keyword_family(haystack))
        .unwrap_or(FieldKind::Text)
}

fn declared_kind(input_type: &str) -> Option<FieldKind> {
    match input_type.to_ascii_lowercase().as_str() {
        "email" => Some(FieldKind::Email),
        "tel" => Some(FieldKind::Phone),
        "url" => Some(FieldKind::Url),
        "search" => Some(FieldKind::Search),
        _ => None,
    }
}

fn keyword_family(haystack: &str) -> Option<FieldKind> {
    if haystack.trim().is_empty() {
        return None;
    }
    KEYWORD_FAMILIES
        .iter()
        .find(|(_, words)| words.iter().any(|w| haystack.contains(w)))
        .map(|(kind, _)| *kind)
}

fn resolve_label(desc: &SurfaceDescriptor, labels: &dyn LabelSource) -> String {
    let explicit = if desc.id.is_empty() {
        None
    } else {
        labels.label_for(&desc.id)
    };
    explicit
        .or_else(|| desc.enclosing_label.clone())
        .or_else(|| desc.aria_label.clone())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
