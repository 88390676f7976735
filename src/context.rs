//! Graph context retrieval and the per-batch context unit.
//!
//! A [`GraphContext`] is everything one resolution pass reads: the immutable
//! snapshot, schema metadata, and precomputed per-mention candidate lists.
//! Retrieval runs on a named worker thread behind a bounded channel with
//! `recv_timeout`; a slow or failing store degrades the batch to an empty
//! snapshot instead of failing it. An empty context only biases resolution
//! toward `CreateNew`, never toward an incorrect match.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::graph::{GraphSnapshot, SchemaInfo, Vertex, VertexId};
use crate::mention::{Mention, MentionId};
use crate::store::GraphStore;

/// The read-only unit of context for one resolution pass.
///
/// Built once per batch and never mutated while mentions are being resolved.
#[derive(Debug, Clone)]
pub struct GraphContext {
    snapshot: GraphSnapshot,
    schema: SchemaInfo,
    candidates: HashMap<MentionId, Vec<Vertex>>,
    degraded: bool,
}

impl GraphContext {
    /// Creates a context around a snapshot and schema.
    #[must_use]
    pub fn new(snapshot: GraphSnapshot, schema: SchemaInfo, degraded: bool) -> Self {
        Self {
            snapshot,
            schema,
            candidates: HashMap::new(),
            degraded,
        }
    }

    /// A fully degraded context: empty snapshot, empty schema.
    #[must_use]
    pub fn degraded() -> Self {
        Self::new(GraphSnapshot::empty(), SchemaInfo::default(), true)
    }

    /// The snapshot this context was built from.
    #[must_use]
    pub const fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    /// Schema metadata (known labels, relationship types).
    #[must_use]
    pub const fn schema(&self) -> &SchemaInfo {
        &self.schema
    }

    /// True when retrieval timed out or the store failed and the batch is
    /// running against an empty snapshot.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Stores the precomputed candidate list for a mention.
    pub fn set_candidates(&mut self, mention: MentionId, candidates: Vec<Vertex>) {
        self.candidates.insert(mention, candidates);
    }

    /// The precomputed candidates for a mention. Empty when none were
    /// retrieved (or the context is degraded).
    #[must_use]
    pub fn candidates_for(&self, mention: MentionId) -> &[Vertex] {
        self.candidates
            .get(&mention)
            .map_or(&[], Vec::as_slice)
    }
}

/// What the retrieval worker sends back over the reply channel.
struct RetrievedContext {
    snapshot: GraphSnapshot,
    schema: SchemaInfo,
    candidates: Vec<(MentionId, Vec<Vertex>)>,
}

/// Timeout-bounded context retrieval.
///
/// All store calls for one batch (neighborhood fetch, schema read, candidate
/// recall per mention) run on a single worker thread; the caller waits at
/// most `timeout` for the complete result. This is the only blocking
/// operation in the crate.
pub struct ContextBuilder {
    store: Arc<dyn GraphStore>,
    depth: u32,
    timeout: Duration,
}

impl std::fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("depth", &self.depth)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ContextBuilder {
    /// Creates a context builder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] for a zero timeout, which would
    /// degrade every batch unconditionally.
    pub fn new(
        store: Arc<dyn GraphStore>,
        depth: u32,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self {
            store,
            depth,
            timeout,
        })
    }

    /// Builds the context for one batch of mentions.
    ///
    /// Never fails: on timeout or store error the context degrades to an
    /// empty snapshot with empty candidate lists.
    #[must_use]
    pub fn build(&self, mentions: &[Mention], seeds: &BTreeSet<VertexId>) -> GraphContext {
        let (tx, rx) = bounded::<Result<RetrievedContext, crate::error::StoreError>>(1);

        let store = Arc::clone(&self.store);
        let depth = self.depth;
        let seeds = seeds.clone();
        let worker_mentions: Vec<(MentionId, String, Option<String>)> = mentions
            .iter()
            .map(|m| (m.id, m.surface_form.clone(), m.label_hint.clone()))
            .collect();

        let spawned = thread::Builder::new()
            .name("graphlink-context".to_string())
            .spawn(move || {
                let result = (|| {
                    let snapshot = store.fetch_neighborhood(&seeds, depth)?;
                    let schema = store.schema_info()?;
                    let mut candidates = Vec::with_capacity(worker_mentions.len());
                    for (id, surface, hint) in worker_mentions {
                        let found =
                            store.find_candidates_by_name(&surface, hint.as_deref())?;
                        candidates.push((id, found));
                    }
                    Ok(RetrievedContext {
                        snapshot,
                        schema,
                        candidates,
                    })
                })();
                // Receiver may already have timed out and gone away.
                let _ = tx.send(result);
            });

        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn context retrieval worker, degrading");
            return GraphContext::degraded();
        }

        let retrieved = match rx.recv_timeout(self.timeout) {
            Ok(Ok(retrieved)) => retrieved,
            Ok(Err(e)) => {
                warn!(error = %e, "graph store failed during context retrieval, degrading");
                return GraphContext::degraded();
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms, "context retrieval timed out, degrading to empty snapshot");
                return GraphContext::degraded();
            }
        };

        debug!(
            vertices = retrieved.snapshot.vertex_count(),
            depth = retrieved.snapshot.depth(),
            mentions = mentions.len(),
            "graph context materialized"
        );

        let mut context = GraphContext::new(retrieved.snapshot, retrieved.schema, false);
        for (mention_id, store_candidates) in retrieved.candidates {
            let mention = mentions.iter().find(|m| m.id == mention_id);
            let merged = merge_candidates(
                store_candidates,
                mention.map_or(Vec::new(), |m| {
                    context
                        .snapshot()
                        .fuzzy_search(&m.surface_form)
                        .into_iter()
                        .cloned()
                        .collect()
                }),
            );
            context.set_candidates(mention_id, merged);
        }
        context
    }
}

/// Store recall first, snapshot fuzzy hits after, deduplicated by id with
/// first-seen order preserved.
fn merge_candidates(store_hits: Vec<Vertex>, snapshot_hits: Vec<Vertex>) -> Vec<Vertex> {
    let mut seen: BTreeSet<VertexId> = BTreeSet::new();
    let mut merged = Vec::with_capacity(store_hits.len() + snapshot_hits.len());
    for vertex in store_hits.into_iter().chain(snapshot_hits) {
        if seen.insert(vertex.id) {
            merged.push(vertex);
        }
    }
    merged
}
