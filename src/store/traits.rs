//! The read-only graph store contract.
//!
//! Resolution consumes the graph through this narrow interface and never
//! mutates it. Keeping the trait small decouples the resolution core from
//! any specific storage engine; tests and embedded deployments use the
//! in-memory backend.

use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::graph::{GraphSnapshot, SchemaInfo, Vertex, VertexId};

/// Read-only access to the knowledge graph.
///
/// Implementations must be safe to call from the retrieval worker thread.
/// `find_candidates_by_name` is recall-oriented: it should return every
/// plausible candidate and let the scorer narrow the set.
pub trait GraphStore: Send + Sync {
    /// Materializes an internally consistent snapshot of the neighborhood
    /// around `seeds`, bounded by `depth`. An empty seed set yields a
    /// snapshot of the whole bounded store view.
    fn fetch_neighborhood(
        &self,
        seeds: &BTreeSet<VertexId>,
        depth: u32,
    ) -> Result<GraphSnapshot, StoreError>;

    /// Finds candidate vertices by name, optionally narrowed to a label.
    fn find_candidates_by_name(
        &self,
        name: &str,
        label_hint: Option<&str>,
    ) -> Result<Vec<Vertex>, StoreError>;

    /// Schema metadata: known labels and relationship types.
    fn schema_info(&self) -> Result<SchemaInfo, StoreError>;
}
