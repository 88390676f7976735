//! Batch resolution orchestration.
//!
//! The service consumes an ordered batch of mentions from one request plus
//! one [`GraphContext`], and returns one [`Resolution`] per mention in input
//! order. Within a batch it enforces coreference consistency: mentions that
//! normalize to the same surface form receive the same decision, with the
//! first occurrence authoritative. The memo lives in one `resolve_batch`
//! call and is written by the single sequential reconciliation pass — it is
//! never a process-wide cache.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::confidence::SignalWeights;
use crate::context::{ContextBuilder, GraphContext};
use crate::error::ConfigError;
use crate::graph::VertexId;
use crate::mention::Mention;
use crate::resolver::{decide, DecisionThresholds, Resolution};
use crate::similarity::SimilarityScorer;
use crate::store::GraphStore;

/// Note appended when a decision is replayed from the coreference memo.
const COREFERENCE_NOTE: &str =
    " Decision memoized from an earlier mention with the same surface form.";

/// The full configuration surface, validated at construction.
#[derive(Debug, Clone)]
pub struct ResolutionConfig {
    /// Signal combination weights.
    pub weights: SignalWeights,
    /// Scorer cutoff: candidates below this overall are dropped.
    pub min_similarity_threshold: f64,
    /// Cap on surviving candidates per mention.
    pub max_candidates: usize,
    /// Decision thresholds (low, high, ambiguity margin).
    pub thresholds: DecisionThresholds,
    /// Neighborhood depth for context retrieval.
    pub context_depth: u32,
    /// Bounded timeout for context retrieval.
    pub context_timeout: Duration,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            min_similarity_threshold: 0.4,
            max_candidates: 5,
            thresholds: DecisionThresholds::default(),
            context_depth: 2,
            context_timeout: Duration::from_millis(500),
        }
    }
}

/// Orchestrates mention resolution for one request at a time.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use graphlink::{
///     ElementKind, MemoryGraphStore, Mention, ResolutionConfig, ResolutionService, Vertex,
/// };
///
/// let store = Arc::new(MemoryGraphStore::new());
/// store.insert_vertex(Vertex::new("Acme Corp", "Organization")).unwrap();
///
/// let service = ResolutionService::new(store, ResolutionConfig::default()).unwrap();
/// let mentions = vec![Mention::new("Acme Corp", ElementKind::NodeReference)];
/// let resolutions = service.resolve(&mentions, &Default::default());
/// assert_eq!(resolutions.len(), 1);
/// ```
pub struct ResolutionService {
    scorer: SimilarityScorer,
    thresholds: DecisionThresholds,
    context_builder: ContextBuilder,
}

impl std::fmt::Debug for ResolutionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionService")
            .field("scorer", &self.scorer)
            .field("thresholds", &self.thresholds)
            .finish_non_exhaustive()
    }
}

impl ResolutionService {
    /// Creates a service over a graph store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any part of the configuration is
    /// invalid. Resolution itself never fails after construction.
    pub fn new(store: Arc<dyn GraphStore>, config: ResolutionConfig) -> Result<Self, ConfigError> {
        let scorer = SimilarityScorer::new(
            config.weights,
            config.min_similarity_threshold,
            config.max_candidates,
        )?;
        let context_builder =
            ContextBuilder::new(store, config.context_depth, config.context_timeout)?;
        Ok(Self {
            scorer,
            thresholds: config.thresholds,
            context_builder,
        })
    }

    /// Creates a service with a pre-built scorer (custom signals installed).
    ///
    /// The scorer's own weights and cutoffs stand; only the decision
    /// thresholds and retrieval settings are taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] for a zero retrieval timeout.
    pub fn with_scorer(
        store: Arc<dyn GraphStore>,
        scorer: SimilarityScorer,
        config: ResolutionConfig,
    ) -> Result<Self, ConfigError> {
        let context_builder =
            ContextBuilder::new(store, config.context_depth, config.context_timeout)?;
        Ok(Self {
            scorer,
            thresholds: config.thresholds,
            context_builder,
        })
    }

    /// Builds the graph context for one batch.
    ///
    /// Never fails: a slow or failing store degrades the context to an empty
    /// snapshot, which only biases resolution toward `CreateNew`.
    #[must_use]
    pub fn build_context(&self, mentions: &[Mention], seeds: &BTreeSet<VertexId>) -> GraphContext {
        self.context_builder.build(mentions, seeds)
    }

    /// Resolves a batch of mentions against a prepared context.
    ///
    /// The output is one-to-one and order-preserving with the input, and a
    /// single low-confidence or malformed mention never fails the batch:
    /// the worst case for any mention is a well-formed `CreateNew`.
    #[must_use]
    pub fn resolve_batch(&self, mentions: &[Mention], context: &GraphContext) -> Vec<Resolution> {
        let started = Instant::now();

        // Coreference memo, scoped to this call. The sequential pass is the
        // single writer.
        let mut memo: HashMap<String, Resolution> = HashMap::new();
        let mut resolutions = Vec::with_capacity(mentions.len());

        for mention in mentions {
            let key = mention.normalized_surface();

            if !mention.is_blank() {
                if let Some(earlier) = memo.get(&key) {
                    debug!(surface = %mention.surface_form, "coreference memo hit");
                    let mut replay = earlier.clone();
                    replay.mention_id = mention.id;
                    replay.rationale.push_str(COREFERENCE_NOTE);
                    resolutions.push(replay);
                    continue;
                }
            }

            let scored = self.scorer.score_candidates(
                mention,
                context.candidates_for(mention.id),
                context,
            );
            let resolution = decide(mention, &scored, &self.thresholds, context.is_degraded());

            if !mention.is_blank() {
                memo.insert(key, resolution.clone());
            }
            resolutions.push(resolution);
        }

        let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        debug!(
            mentions = mentions.len(),
            degraded = context.is_degraded(),
            elapsed_us,
            "batch resolved"
        );
        resolutions
    }

    /// Convenience: builds the context, then resolves the batch.
    #[must_use]
    pub fn resolve(&self, mentions: &[Mention], seeds: &BTreeSet<VertexId>) -> Vec<Resolution> {
        let context = self.build_context(mentions, seeds);
        self.resolve_batch(mentions, &context)
    }

    /// The decision thresholds in effect.
    #[must_use]
    pub const fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }

    /// The scorer in effect.
    #[must_use]
    pub const fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }
}
