//! Graph data types and the immutable snapshot.
//!
//! A [`GraphSnapshot`] is a point-in-time view of a bounded neighborhood of
//! the knowledge graph. It is built once per batch, never mutated afterwards,
//! and stays stable even if the underlying store is concurrently written by
//! other requests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mention::normalize_surface;
use crate::similarity::name_similarity;

/// Globally unique, stable vertex identifier.
///
/// Once created, a `VertexId` never changes; resolutions reference target
/// entities by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(Uuid);

impl VertexId {
    /// Creates a new random vertex ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a vertex ID from an existing UUID.
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

impl Default for VertexId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A graph vertex exposed for matching: the raw candidate a mention may
/// resolve to.
///
/// Owned by the graph-store collaborator; read-only during resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    /// Stable identifier.
    pub id: VertexId,

    /// Primary display name.
    pub name: String,

    /// Other names this vertex is known by.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Label/type classification ("Person", "Organization").
    pub label: String,

    /// Property key-values used by the property signal.
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl Vertex {
    /// Creates a new vertex with the given name and label.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: VertexId::new(),
            name: name.into(),
            aliases: Vec::new(),
            label: label.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Creates a new vertex with a specific ID (migration, testing).
    #[must_use]
    pub fn with_id(id: VertexId, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            aliases: Vec::new(),
            label: label.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Adds an alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Best lexical similarity of `query` against the canonical name and all
    /// aliases.
    #[must_use]
    pub fn best_name_similarity(&self, query: &str) -> f64 {
        let mut best = name_similarity(query, &self.name);
        for alias in &self.aliases {
            best = best.max(name_similarity(query, alias));
        }
        best
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vertex {}

/// A directed relationship between two vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Source vertex.
    pub source: VertexId,
    /// Target vertex.
    pub target: VertexId,
    /// Relationship label ("WORKS_AT").
    pub label: String,
}

impl Edge {
    /// Creates a new edge.
    #[must_use]
    pub fn new(source: VertexId, target: VertexId, label: impl Into<String>) -> Self {
        Self {
            source,
            target,
            label: label.into(),
        }
    }
}

/// Schema metadata: the vocabulary the graph is known to use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    /// Known vertex labels.
    pub labels: BTreeSet<String>,
    /// Known relationship types.
    pub relationship_types: BTreeSet<String>,
}

impl SchemaInfo {
    /// Creates schema info from label and relationship-type iterators.
    #[must_use]
    pub fn new<L, R>(labels: L, relationship_types: R) -> Self
    where
        L: IntoIterator,
        L::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            relationship_types: relationship_types.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-insensitive label membership check.
    #[must_use]
    pub fn knows_label(&self, label: &str) -> bool {
        let key = normalize_surface(label);
        self.labels.iter().any(|l| normalize_surface(l) == key)
    }
}

/// Recall floor for fuzzy name search.
///
/// Deliberately below any plausible scorer cutoff: the snapshot is
/// recall-oriented and the scorer only ever narrows the candidate set.
pub(crate) const FUZZY_RECALL_FLOOR: f64 = 0.3;

/// An immutable bag of vertices and edges plus the depth at which it was
/// materialized.
///
/// Supports lookup by id, lookup by label (insertion order), neighbor
/// lookup, and recall-oriented fuzzy name search. Never mutated after
/// creation.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    by_id: HashMap<VertexId, usize>,
    by_label: BTreeMap<String, Vec<VertexId>>,
    neighbors: HashMap<VertexId, BTreeSet<VertexId>>,
    depth: u32,
    materialized_at: DateTime<Utc>,
}

impl GraphSnapshot {
    /// Builds a snapshot from vertices and edges.
    ///
    /// Vertex insertion order is preserved for label lookups and fuzzy
    /// search tie-breaks. Duplicate vertex ids keep the first occurrence.
    #[must_use]
    pub fn new(vertices: Vec<Vertex>, edges: Vec<Edge>, depth: u32) -> Self {
        let mut deduped: Vec<Vertex> = Vec::with_capacity(vertices.len());
        let mut by_id = HashMap::with_capacity(vertices.len());
        let mut by_label: BTreeMap<String, Vec<VertexId>> = BTreeMap::new();

        for vertex in vertices {
            if by_id.contains_key(&vertex.id) {
                continue;
            }
            by_id.insert(vertex.id, deduped.len());
            by_label
                .entry(normalize_surface(&vertex.label))
                .or_default()
                .push(vertex.id);
            deduped.push(vertex);
        }

        let mut neighbors: HashMap<VertexId, BTreeSet<VertexId>> = HashMap::new();
        for edge in &edges {
            // Neighborhood is undirected for the context signal.
            neighbors.entry(edge.source).or_default().insert(edge.target);
            neighbors.entry(edge.target).or_default().insert(edge.source);
        }

        Self {
            vertices: deduped,
            edges,
            by_id,
            by_label,
            neighbors,
            depth,
            materialized_at: Utc::now(),
        }
    }

    /// An empty snapshot, used when context retrieval degrades.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), 0)
    }

    /// Returns true if the snapshot holds no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of vertices in the snapshot.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The depth the neighborhood was materialized at.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// When the snapshot was materialized.
    #[must_use]
    pub const fn materialized_at(&self) -> DateTime<Utc> {
        self.materialized_at
    }

    /// All vertices in insertion order.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All edges.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Looks up a vertex by id.
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.by_id.get(&id).map(|&i| &self.vertices[i])
    }

    /// Vertices carrying the given label, in insertion order.
    #[must_use]
    pub fn vertices_by_label(&self, label: &str) -> Vec<&Vertex> {
        self.by_label
            .get(&normalize_surface(label))
            .map(|ids| ids.iter().filter_map(|&id| self.vertex(id)).collect())
            .unwrap_or_default()
    }

    /// Undirected neighbor set of a vertex. Empty if the vertex has no edges
    /// in the snapshot.
    #[must_use]
    pub fn neighbor_ids(&self, id: VertexId) -> BTreeSet<VertexId> {
        self.neighbors.get(&id).cloned().unwrap_or_default()
    }

    /// Returns true if `a` and `b` are adjacent in the snapshot.
    #[must_use]
    pub fn are_neighbors(&self, a: VertexId, b: VertexId) -> bool {
        self.neighbors.get(&a).is_some_and(|n| n.contains(&b))
    }

    /// Recall-oriented fuzzy name search.
    ///
    /// Returns vertices whose best name/alias similarity to `query` clears
    /// the fixed recall floor, best first; equal scores keep insertion
    /// order. The floor is intentionally lower than any scorer cutoff.
    #[must_use]
    pub fn fuzzy_search(&self, query: &str) -> Vec<&Vertex> {
        let mut scored: Vec<(f64, usize)> = self
            .vertices
            .iter()
            .enumerate()
            .filter_map(|(idx, vertex)| {
                let score = vertex.best_name_similarity(query);
                (score >= FUZZY_RECALL_FLOOR).then_some((score, idx))
            })
            .collect();

        scored.sort_by(|(sa, ia), (sb, ib)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ia.cmp(ib))
        });

        scored.into_iter().map(|(_, idx)| &self.vertices[idx]).collect()
    }
}
