//! # graphlink - Entity Mention Resolution for Knowledge Graphs
//!
//! graphlink resolves free-text entity mentions extracted from a user request
//! against a knowledge graph, deciding per mention whether to reuse an
//! existing vertex, create a new one, or defer to a human for
//! disambiguation.
//!
//! ## Core Concepts
//!
//! - **Mention**: a raw textual reference to something that may or may not
//!   already exist in the graph
//! - **Confidence**: a four-signal score (name, type, property, context)
//!   with a fixed weighted combination
//! - **Resolution**: the terminal decision for one mention, with a
//!   deterministic rationale
//! - **GraphContext**: an immutable, timeout-bounded view of the graph used
//!   for one resolution pass
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use graphlink::{
//!     ElementKind, MemoryGraphStore, Mention, ResolutionConfig, ResolutionService,
//!     ResolutionStrategy, Vertex,
//! };
//!
//! let store = Arc::new(MemoryGraphStore::new());
//! store.insert_vertex(Vertex::new("Acme Corp", "Organization")).unwrap();
//!
//! let service = ResolutionService::new(store, ResolutionConfig::default()).unwrap();
//! let mentions = vec![Mention::new("Acme Corp", ElementKind::NodeReference)];
//!
//! let resolutions = service.resolve(&mentions, &Default::default());
//! assert!(matches!(
//!     resolutions[0].strategy,
//!     ResolutionStrategy::UseExisting { .. }
//! ));
//! ```
//!
//! A batch never fails: malformed mentions, missing candidates, and even a
//! timed-out graph store all degrade to well-formed `CreateNew` resolutions.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod confidence;
pub mod error;
pub mod graph;
pub mod mention;

// Scoring and decision policy
pub mod resolver;
pub mod similarity;

// Context retrieval, orchestration, and storage
pub mod context;
pub mod service;
pub mod store;

// Re-export primary types at crate root for convenience
pub use confidence::{Confidence, SignalWeights, WEIGHT_SUM_EPSILON};
pub use context::{ContextBuilder, GraphContext};
pub use error::{ConfigError, GraphLinkError, Result, StoreError};
pub use graph::{Edge, GraphSnapshot, SchemaInfo, Vertex, VertexId};
pub use mention::{ElementKind, Mention, MentionId};
pub use resolver::{decide, DecisionThresholds, Resolution, ResolutionStrategy};
pub use service::{ResolutionConfig, ResolutionService};
pub use similarity::{
    name_similarity, ScoredCandidate, SignalKind, SimilarityScorer, SimilaritySignal,
};
pub use store::{GraphStore, MemoryGraphStore};
