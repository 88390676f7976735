//! Mention types.
//!
//! A mention is a raw textual reference to something that may or may not
//! already exist in the graph. Mentions are produced by an upstream
//! extractor and are immutable once handed to the resolution service.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a mention within one request.
///
/// Resolutions reference the mention they answer by this id, which lets the
/// caller correlate output with input even after reordering on its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentionId(Uuid);

impl MentionId {
    /// Creates a new random mention ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a mention ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MentionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MentionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of graph element the extractor expects a mention to denote.
///
/// This is a closed classification: the resolver's decision table matches on
/// it exhaustively, so new kinds are a compile-time change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// A reference to a graph vertex ("Acme Corp", "John Doe").
    NodeReference,
    /// A reference to a relationship between vertices ("works at").
    EdgeReference,
    /// A literal value ("42", "2024-01-01").
    LiteralValue,
    /// A reference to schema vocabulary itself ("the Person label").
    SchemaReference,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeReference => write!(f, "node_reference"),
            Self::EdgeReference => write!(f, "edge_reference"),
            Self::LiteralValue => write!(f, "literal_value"),
            Self::SchemaReference => write!(f, "schema_reference"),
        }
    }
}

/// A free-text entity mention extracted from one user request.
///
/// # Examples
///
/// ```
/// use graphlink::{ElementKind, Mention};
///
/// let mention = Mention::new("Acme Corp", ElementKind::NodeReference)
///     .with_label_hint("Organization")
///     .with_context("John Doe works at Acme Corp in Berlin");
/// assert_eq!(mention.surface_form, "Acme Corp");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    /// Identifier correlating this mention with its resolution.
    pub id: MentionId,

    /// The raw surface form as extracted from the text.
    pub surface_form: String,

    /// What kind of element the extractor expects this to be.
    pub expected_kind: ElementKind,

    /// Optional label/type hint from the extractor ("Person", "Organization").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_hint: Option<String>,

    /// Structured properties the extractor pulled from the surrounding text.
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,

    /// Free-form surrounding text (the sentence the mention occurred in).
    #[serde(default)]
    pub context: String,
}

impl Mention {
    /// Creates a new mention with the given surface form and expected kind.
    #[must_use]
    pub fn new(surface_form: impl Into<String>, expected_kind: ElementKind) -> Self {
        Self {
            id: MentionId::new(),
            surface_form: surface_form.into(),
            expected_kind,
            label_hint: None,
            properties: BTreeMap::new(),
            context: String::new(),
        }
    }

    /// Sets the extractor's label hint.
    #[must_use]
    pub fn with_label_hint(mut self, hint: impl Into<String>) -> Self {
        self.label_hint = Some(hint.into());
        self
    }

    /// Sets the surrounding context text.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Adds a structured property extracted alongside the mention.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Returns true if the surface form is empty or whitespace-only.
    ///
    /// Such mentions are malformed and resolve to `CreateNew` with a
    /// rationale flagging the empty input; they never abort a batch.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.surface_form.trim().is_empty()
    }

    /// Normalized surface form used for coreference matching within a batch.
    ///
    /// Lowercased with runs of whitespace collapsed to a single space, so
    /// `"Acme Corp"` and `"acme  corp"` normalize identically.
    #[must_use]
    pub fn normalized_surface(&self) -> String {
        normalize_surface(&self.surface_form)
    }
}

/// Lowercases and collapses whitespace. Shared by the coreference memo and
/// the lexical similarity signal so both agree on what "same form" means.
#[must_use]
pub(crate) fn normalize_surface(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
        } else {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for lc in c.to_lowercase() {
                out.push(lc);
            }
        }
    }
    out
}
