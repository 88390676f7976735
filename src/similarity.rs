//! Multi-signal similarity scoring.
//!
//! The scorer computes a four-dimensional [`Confidence`] between a mention
//! and each candidate vertex: lexical name similarity, label/type agreement,
//! property overlap, and graph-context overlap. The combination weights and
//! cutoffs are validated once at construction; scoring itself is pure and
//! deterministic.
//!
//! The lexical formula is fixed and documented: the maximum of normalized
//! Levenshtein similarity (`1 - distance / max_len`) and token-set Jaccard
//! overlap, both computed on case-folded, whitespace-collapsed strings. Both
//! components are symmetric and bounded in [0, 1], so the maximum is too.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::confidence::{Confidence, SignalWeights};
use crate::context::GraphContext;
use crate::error::ConfigError;
use crate::graph::Vertex;
use crate::mention::{normalize_surface, ElementKind, Mention};

/// A candidate vertex paired with its confidence against one mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The candidate vertex.
    pub vertex: Vertex,
    /// Its confidence against the mention.
    pub confidence: Confidence,
}

/// Which of the four signals a custom similarity implementation replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Lexical name similarity.
    Name,
    /// Label/type agreement.
    Type,
    /// Property overlap.
    Property,
    /// Graph-context overlap.
    Context,
}

/// A pluggable similarity signal.
///
/// Implementations must return a value in [0, 1]; out-of-range or NaN
/// results are clamped before combination. Signals are selected at scorer
/// construction, never swapped at runtime.
pub trait SimilaritySignal: Send + Sync {
    /// Scores one candidate against one mention within a context.
    fn score(&self, mention: &Mention, vertex: &Vertex, context: &GraphContext) -> f64;
}

/// Levenshtein edit distance over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn token_jaccard(a: &str, b: &str) -> f64 {
    let ta: std::collections::BTreeSet<&str> = a.split(' ').filter(|t| !t.is_empty()).collect();
    let tb: std::collections::BTreeSet<&str> = b.split(' ').filter(|t| !t.is_empty()).collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    #[allow(clippy::cast_precision_loss)]
    {
        intersection as f64 / union as f64
    }
}

/// Normalized lexical similarity between two names.
///
/// `max(1 - levenshtein / max_len, token_jaccard)` on normalized strings.
/// Exact case-insensitive matches score 1.0; fully disjoint strings 0.0.
#[must_use]
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_surface(a);
    let b = normalize_surface(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    #[allow(clippy::cast_precision_loss)]
    let edit_sim = 1.0 - (levenshtein(&a, &b) as f64 / max_len as f64);

    edit_sim.max(token_jaccard(&a, &b)).clamp(0.0, 1.0)
}

/// Built-in name signal: best lexical similarity over canonical name and
/// aliases.
fn name_score(mention: &Mention, vertex: &Vertex) -> f64 {
    vertex.best_name_similarity(&mention.surface_form)
}

/// Built-in type signal.
///
/// With a label hint: 1.0 on case-insensitive equality; 0.5 when both labels
/// are known to the schema and share a normalized token (the closest
/// approximation of subtype/alias kinship the schema surface allows); 0.0
/// otherwise. Without a hint, node-reference mentions score 1.0 against any
/// vertex and other kinds 0.0.
fn type_score(mention: &Mention, vertex: &Vertex, context: &GraphContext) -> f64 {
    let Some(hint) = mention.label_hint.as_deref() else {
        return match mention.expected_kind {
            ElementKind::NodeReference => 1.0,
            ElementKind::EdgeReference
            | ElementKind::LiteralValue
            | ElementKind::SchemaReference => 0.0,
        };
    };

    let hint_key = normalize_surface(hint);
    let label_key = normalize_surface(&vertex.label);
    if hint_key == label_key {
        return 1.0;
    }

    let schema = context.schema();
    if schema.knows_label(hint) && schema.knows_label(&vertex.label) {
        let hint_tokens: std::collections::BTreeSet<&str> =
            hint_key.split(' ').filter(|t| !t.is_empty()).collect();
        if label_key.split(' ').any(|t| hint_tokens.contains(t)) {
            return 0.5;
        }
    }
    0.0
}

/// Built-in property signal: matched over compared, 0.0 when the mention
/// carries no structured properties.
fn property_score(mention: &Mention, vertex: &Vertex) -> f64 {
    if mention.properties.is_empty() {
        return 0.0;
    }
    let matched = mention
        .properties
        .iter()
        .filter(|(key, value)| vertex.properties.get(*key) == Some(value))
        .count();
    #[allow(clippy::cast_precision_loss)]
    {
        matched as f64 / mention.properties.len() as f64
    }
}

/// Built-in context signal.
///
/// Of the snapshot vertices whose names occur in the mention's surrounding
/// text, the fraction adjacent to the candidate. 0.0 when the context text
/// names no known vertex.
fn context_score(mention: &Mention, vertex: &Vertex, context: &GraphContext) -> f64 {
    let text = normalize_surface(&mention.context);
    if text.is_empty() {
        return 0.0;
    }

    let snapshot = context.snapshot();
    let mut named = 0usize;
    let mut adjacent = 0usize;
    for other in snapshot.vertices() {
        if other.id == vertex.id {
            continue;
        }
        let name = normalize_surface(&other.name);
        if name.is_empty() || !text.contains(&name) {
            continue;
        }
        named += 1;
        if snapshot.are_neighbors(vertex.id, other.id) {
            adjacent += 1;
        }
    }

    if named == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        adjacent as f64 / named as f64
    }
}

/// The multi-signal similarity scorer.
///
/// Construction validates the weights and cutoffs; per-candidate scoring is
/// pure. Custom [`SimilaritySignal`] implementations can replace any of the
/// four built-in signals.
pub struct SimilarityScorer {
    weights: SignalWeights,
    min_similarity_threshold: f64,
    max_candidates: usize,
    custom_name: Option<Arc<dyn SimilaritySignal>>,
    custom_type: Option<Arc<dyn SimilaritySignal>>,
    custom_property: Option<Arc<dyn SimilaritySignal>>,
    custom_context: Option<Arc<dyn SimilaritySignal>>,
}

impl std::fmt::Debug for SimilarityScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityScorer")
            .field("weights", &self.weights)
            .field("min_similarity_threshold", &self.min_similarity_threshold)
            .field("max_candidates", &self.max_candidates)
            .finish_non_exhaustive()
    }
}

impl SimilarityScorer {
    /// Creates a scorer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ThresholdOutOfRange`] when the similarity
    /// threshold is outside [0, 1] and [`ConfigError::ZeroMaxCandidates`]
    /// when `max_candidates` is 0. Weight validation happens in
    /// [`SignalWeights::new`].
    pub fn new(
        weights: SignalWeights,
        min_similarity_threshold: f64,
        max_candidates: usize,
    ) -> Result<Self, ConfigError> {
        if !min_similarity_threshold.is_finite()
            || !(0.0..=1.0).contains(&min_similarity_threshold)
        {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "min_similarity_threshold",
                value: min_similarity_threshold,
            });
        }
        if max_candidates == 0 {
            return Err(ConfigError::ZeroMaxCandidates);
        }

        Ok(Self {
            weights,
            min_similarity_threshold,
            max_candidates,
            custom_name: None,
            custom_type: None,
            custom_property: None,
            custom_context: None,
        })
    }

    /// Replaces one built-in signal with a custom implementation.
    #[must_use]
    pub fn with_signal(mut self, kind: SignalKind, signal: Arc<dyn SimilaritySignal>) -> Self {
        match kind {
            SignalKind::Name => self.custom_name = Some(signal),
            SignalKind::Type => self.custom_type = Some(signal),
            SignalKind::Property => self.custom_property = Some(signal),
            SignalKind::Context => self.custom_context = Some(signal),
        }
        self
    }

    /// The configured weights.
    #[must_use]
    pub const fn weights(&self) -> &SignalWeights {
        &self.weights
    }

    /// The configured candidate cutoff.
    #[must_use]
    pub const fn min_similarity_threshold(&self) -> f64 {
        self.min_similarity_threshold
    }

    /// The configured candidate cap.
    #[must_use]
    pub const fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    /// Scores one candidate against one mention.
    #[must_use]
    pub fn score(&self, mention: &Mention, vertex: &Vertex, context: &GraphContext) -> Confidence {
        let name = match &self.custom_name {
            Some(signal) => signal.score(mention, vertex, context),
            None => name_score(mention, vertex),
        };
        let r#type = match &self.custom_type {
            Some(signal) => signal.score(mention, vertex, context),
            None => type_score(mention, vertex, context),
        };
        let property = match &self.custom_property {
            Some(signal) => signal.score(mention, vertex, context),
            None => property_score(mention, vertex),
        };
        let ctx = match &self.custom_context {
            Some(signal) => signal.score(mention, vertex, context),
            None => context_score(mention, vertex, context),
        };
        Confidence::from_signals(&self.weights, name, r#type, property, ctx)
    }

    /// Scores every candidate, drops those below the threshold, sorts the
    /// survivors strictly descending by `overall` (equal scores keep their
    /// original candidate order), and truncates to `max_candidates`.
    #[must_use]
    pub fn score_candidates(
        &self,
        mention: &Mention,
        candidates: &[Vertex],
        context: &GraphContext,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|vertex| ScoredCandidate {
                vertex: vertex.clone(),
                confidence: self.score(mention, vertex, context),
            })
            .filter(|sc| sc.confidence.overall >= self.min_similarity_threshold)
            .collect();

        // Stable sort preserves candidate order on equal scores.
        scored.sort_by(|a, b| {
            b.confidence
                .overall
                .partial_cmp(&a.confidence.overall)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(self.max_candidates);
        scored
    }
}
