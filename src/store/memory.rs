//! In-memory graph store backend.
//!
//! Thread-safe reference implementation of [`GraphStore`], intended for
//! embedded usage and tests. Reads take a consistent view under one lock
//! acquisition, so a snapshot never observes a partial write.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::RwLock;

use crate::error::StoreError;
use crate::graph::{Edge, GraphSnapshot, SchemaInfo, Vertex, VertexId, FUZZY_RECALL_FLOOR};
use crate::mention::normalize_surface;
use crate::store::traits::GraphStore;

fn lock_err(context: &'static str) -> StoreError {
    StoreError::Backend(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct GraphState {
    // Insertion order drives label-lookup and fuzzy-search tie-breaks.
    vertices: Vec<Vertex>,
    by_id: HashMap<VertexId, usize>,
    edges: Vec<Edge>,
    adjacency: HashMap<VertexId, BTreeSet<VertexId>>,
}

/// Thread-safe in-memory [`GraphStore`].
///
/// # Examples
///
/// ```
/// use graphlink::{MemoryGraphStore, Vertex};
///
/// let store = MemoryGraphStore::new();
/// store.insert_vertex(Vertex::new("Acme Corp", "Organization")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    state: RwLock<GraphState>,
}

impl MemoryGraphStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on a duplicate id or poisoned lock.
    pub fn insert_vertex(&self, vertex: Vertex) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| lock_err("insert_vertex"))?;
        if state.by_id.contains_key(&vertex.id) {
            return Err(StoreError::Backend(format!(
                "duplicate vertex id: {}",
                vertex.id
            )));
        }
        let idx = state.vertices.len();
        state.by_id.insert(vertex.id, idx);
        state.vertices.push(vertex);
        Ok(())
    }

    /// Inserts an edge between two existing vertices.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when either endpoint is unknown.
    pub fn insert_edge(&self, edge: Edge) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| lock_err("insert_edge"))?;
        for endpoint in [edge.source, edge.target] {
            if !state.by_id.contains_key(&endpoint) {
                return Err(StoreError::Backend(format!(
                    "edge endpoint not found: {endpoint}"
                )));
            }
        }
        state
            .adjacency
            .entry(edge.source)
            .or_default()
            .insert(edge.target);
        state
            .adjacency
            .entry(edge.target)
            .or_default()
            .insert(edge.source);
        state.edges.push(edge);
        Ok(())
    }

    /// Number of vertices currently stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on a poisoned lock.
    pub fn vertex_count(&self) -> Result<usize, StoreError> {
        let state = self.state.read().map_err(|_| lock_err("vertex_count"))?;
        Ok(state.vertices.len())
    }
}

impl GraphStore for MemoryGraphStore {
    fn fetch_neighborhood(
        &self,
        seeds: &BTreeSet<VertexId>,
        depth: u32,
    ) -> Result<GraphSnapshot, StoreError> {
        let state = self.state.read().map_err(|_| lock_err("fetch_neighborhood"))?;

        let included: BTreeSet<VertexId> = if seeds.is_empty() {
            state.by_id.keys().copied().collect()
        } else {
            // BFS out to `depth` hops from the seed set.
            let mut included: BTreeSet<VertexId> = BTreeSet::new();
            let mut frontier: VecDeque<(VertexId, u32)> = seeds
                .iter()
                .filter(|id| state.by_id.contains_key(id))
                .map(|&id| (id, 0))
                .collect();

            while let Some((id, dist)) = frontier.pop_front() {
                if !included.insert(id) {
                    continue;
                }
                if dist >= depth {
                    continue;
                }
                if let Some(neighbors) = state.adjacency.get(&id) {
                    for &next in neighbors {
                        if !included.contains(&next) {
                            frontier.push_back((next, dist + 1));
                        }
                    }
                }
            }
            included
        };

        let vertices: Vec<Vertex> = state
            .vertices
            .iter()
            .filter(|v| included.contains(&v.id))
            .cloned()
            .collect();
        let edges: Vec<Edge> = state
            .edges
            .iter()
            .filter(|e| included.contains(&e.source) && included.contains(&e.target))
            .cloned()
            .collect();

        Ok(GraphSnapshot::new(vertices, edges, depth))
    }

    fn find_candidates_by_name(
        &self,
        name: &str,
        label_hint: Option<&str>,
    ) -> Result<Vec<Vertex>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("find_candidates_by_name"))?;

        let label_key = label_hint.map(normalize_surface);
        let mut scored: Vec<(f64, usize)> = state
            .vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| {
                label_key
                    .as_ref()
                    .map_or(true, |key| normalize_surface(&v.label) == *key)
            })
            .filter_map(|(idx, v)| {
                let score = v.best_name_similarity(name);
                (score >= FUZZY_RECALL_FLOOR).then_some((score, idx))
            })
            .collect();

        scored.sort_by(|(sa, ia), (sb, ib)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ia.cmp(ib))
        });

        Ok(scored
            .into_iter()
            .map(|(_, idx)| state.vertices[idx].clone())
            .collect())
    }

    fn schema_info(&self) -> Result<SchemaInfo, StoreError> {
        let state = self.state.read().map_err(|_| lock_err("schema_info"))?;
        let labels = state.vertices.iter().map(|v| v.label.clone());
        let relationship_types = state.edges.iter().map(|e| e.label.clone());
        Ok(SchemaInfo::new(labels, relationship_types))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> (MemoryGraphStore, VertexId, VertexId, VertexId, VertexId) {
        let store = MemoryGraphStore::new();
        let acme = Vertex::new("Acme Corp", "Organization").with_alias("ACME");
        let john = Vertex::new("John Doe", "Person");
        let berlin = Vertex::new("Berlin", "Location");
        let remote = Vertex::new("Remote Island", "Location");
        let (a, j, b, r) = (acme.id, john.id, berlin.id, remote.id);

        store.insert_vertex(acme).unwrap();
        store.insert_vertex(john).unwrap();
        store.insert_vertex(berlin).unwrap();
        store.insert_vertex(remote).unwrap();
        store.insert_edge(Edge::new(j, a, "WORKS_AT")).unwrap();
        store.insert_edge(Edge::new(a, b, "LOCATED_IN")).unwrap();
        (store, a, j, b, r)
    }

    #[test]
    fn test_insert_duplicate_vertex_rejected() {
        let store = MemoryGraphStore::new();
        let vertex = Vertex::new("Acme", "Organization");
        store.insert_vertex(vertex.clone()).unwrap();
        assert!(store.insert_vertex(vertex).is_err());
    }

    #[test]
    fn test_insert_edge_requires_endpoints() {
        let store = MemoryGraphStore::new();
        let vertex = Vertex::new("Acme", "Organization");
        let known = vertex.id;
        store.insert_vertex(vertex).unwrap();

        let result = store.insert_edge(Edge::new(known, VertexId::new(), "KNOWS"));
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_neighborhood_bfs_depth() {
        let (store, acme, john, berlin, remote) = seeded_store();

        // Depth 1 from John reaches Acme but not Berlin.
        let snap = store
            .fetch_neighborhood(&BTreeSet::from([john]), 1)
            .unwrap();
        assert!(snap.vertex(john).is_some());
        assert!(snap.vertex(acme).is_some());
        assert!(snap.vertex(berlin).is_none());

        // Depth 2 reaches Berlin; the disconnected island stays out.
        let snap = store
            .fetch_neighborhood(&BTreeSet::from([john]), 2)
            .unwrap();
        assert!(snap.vertex(berlin).is_some());
        assert!(snap.vertex(remote).is_none());
    }

    #[test]
    fn test_fetch_neighborhood_empty_seeds_returns_all() {
        let (store, ..) = seeded_store();
        let snap = store.fetch_neighborhood(&BTreeSet::new(), 2).unwrap();
        assert_eq!(snap.vertex_count(), 4);
    }

    #[test]
    fn test_fetch_neighborhood_unknown_seed() {
        let (store, ..) = seeded_store();
        let snap = store
            .fetch_neighborhood(&BTreeSet::from([VertexId::new()]), 2)
            .unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn test_find_candidates_recall_and_order() {
        let (store, acme, ..) = seeded_store();

        let hits = store.find_candidates_by_name("Acme Corp", None).unwrap();
        assert_eq!(hits[0].id, acme);

        // Alias recall.
        let hits = store.find_candidates_by_name("ACME", None).unwrap();
        assert!(hits.iter().any(|v| v.id == acme));

        // No lexical relation at all.
        let hits = store.find_candidates_by_name("zzzzzz", None).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_find_candidates_label_hint_narrows() {
        let (store, acme, ..) = seeded_store();

        let hits = store
            .find_candidates_by_name("Acme Corp", Some("organization"))
            .unwrap();
        assert!(hits.iter().any(|v| v.id == acme));

        let hits = store
            .find_candidates_by_name("Acme Corp", Some("Person"))
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_schema_info_accumulates() {
        let (store, ..) = seeded_store();
        let schema = store.schema_info().unwrap();
        assert!(schema.labels.contains("Organization"));
        assert!(schema.labels.contains("Person"));
        assert!(schema.relationship_types.contains("WORKS_AT"));
        assert!(schema.relationship_types.contains("LOCATED_IN"));
    }
}
