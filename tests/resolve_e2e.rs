use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use graphlink::{
    ConfigError, Edge, ElementKind, GraphContext, GraphSnapshot, GraphStore, MemoryGraphStore,
    Mention, ResolutionConfig, ResolutionService, ResolutionStrategy, SchemaInfo, SignalKind,
    SignalWeights, SimilarityScorer, SimilaritySignal, StoreError, Vertex, VertexId,
};

fn seeded_store() -> (MemoryGraphStore, VertexId, VertexId) {
    let store = MemoryGraphStore::new();
    let acme = Vertex::new("Acme Corp", "Organization").with_alias("ACME");
    let john = Vertex::new("John Doe", "Person");
    let acme_id = acme.id;
    let john_id = john.id;
    store.insert_vertex(acme).unwrap();
    store.insert_vertex(john).unwrap();
    store
        .insert_edge(Edge::new(john_id, acme_id, "WORKS_AT"))
        .unwrap();
    (store, acme_id, john_id)
}

/// A constant-valued signal, used to pin exact scores in scenarios.
struct Fixed(f64);

impl SimilaritySignal for Fixed {
    fn score(&self, _: &Mention, _: &Vertex, _: &GraphContext) -> f64 {
        self.0
    }
}

/// Maps specific vertex names to fixed scores; anything else scores zero.
struct ByName(Vec<(&'static str, f64)>);

impl SimilaritySignal for ByName {
    fn score(&self, _: &Mention, vertex: &Vertex, _: &GraphContext) -> f64 {
        self.0
            .iter()
            .find(|(name, _)| *name == vertex.name)
            .map_or(0.0, |(_, score)| *score)
    }
}

#[test]
fn scenario_a_high_confidence_uses_existing() {
    // name=0.95, type=1.0, property=0.8, context=0.7 under (0.4, 0.3, 0.2, 0.1)
    // combine to overall 0.91, well above high=0.6.
    let (store, _, john_id) = seeded_store();

    let weights = SignalWeights::new(0.4, 0.3, 0.2, 0.1).unwrap();
    let scorer = SimilarityScorer::new(weights, 0.1, 5)
        .unwrap()
        .with_signal(SignalKind::Name, Arc::new(ByName(vec![("John Doe", 0.95)])))
        .with_signal(SignalKind::Type, Arc::new(ByName(vec![("John Doe", 1.0)])))
        .with_signal(SignalKind::Property, Arc::new(ByName(vec![("John Doe", 0.8)])))
        .with_signal(SignalKind::Context, Arc::new(ByName(vec![("John Doe", 0.7)])));

    let service =
        ResolutionService::with_scorer(Arc::new(store), scorer, ResolutionConfig::default())
            .unwrap();

    let mentions = vec![Mention::new("John Doe", ElementKind::NodeReference)];
    let resolutions = service.resolve(&mentions, &BTreeSet::new());

    let ResolutionStrategy::UseExisting { entity } = resolutions[0].strategy else {
        panic!("expected UseExisting, got {}", resolutions[0].strategy);
    };
    assert_eq!(entity, john_id);
    assert!((resolutions[0].confidence.overall - 0.91).abs() < 1e-9);
}

#[test]
fn scenario_b_mid_band_near_tie_asks_user() {
    // Two candidates at overall 0.55 and 0.52, low=0.3, high=0.6: the top
    // score sits in [low, high), so the user is asked with both ranked.
    let store = MemoryGraphStore::new();
    store
        .insert_vertex(Vertex::new("John Smith", "Person"))
        .unwrap();
    store
        .insert_vertex(Vertex::new("John Doe", "Person"))
        .unwrap();

    let weights = SignalWeights::new(1.0, 0.0, 0.0, 0.0).unwrap();
    let scorer = SimilarityScorer::new(weights, 0.1, 5).unwrap().with_signal(
        SignalKind::Name,
        Arc::new(ByName(vec![("John Smith", 0.55), ("John Doe", 0.52)])),
    );

    let service =
        ResolutionService::with_scorer(Arc::new(store), scorer, ResolutionConfig::default())
            .unwrap();

    let mentions = vec![Mention::new("John", ElementKind::NodeReference)];
    let resolutions = service.resolve(&mentions, &BTreeSet::new());

    let ResolutionStrategy::AskUser { candidates } = &resolutions[0].strategy else {
        panic!("expected AskUser, got {}", resolutions[0].strategy);
    };
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].vertex.name, "John Smith");
    assert_eq!(candidates[1].vertex.name, "John Doe");
    assert!(candidates[0].confidence.overall >= candidates[1].confidence.overall);
}

#[test]
fn scenario_c_no_candidates_creates_new() {
    let (store, _, _) = seeded_store();
    let service =
        ResolutionService::new(Arc::new(store), ResolutionConfig::default()).unwrap();

    let mentions = vec![Mention::new("NewWidgetXYZ", ElementKind::NodeReference)];
    let resolutions = service.resolve(&mentions, &BTreeSet::new());

    assert_eq!(resolutions[0].strategy, ResolutionStrategy::CreateNew);
    assert_eq!(resolutions[0].confidence.overall, 0.0);
    assert_eq!(resolutions[0].confidence.name, 0.0);
    assert!(resolutions[0].rationale.contains("No matching candidates"));
}

/// A store whose neighborhood fetch never returns in time.
struct StalledStore;

impl GraphStore for StalledStore {
    fn fetch_neighborhood(
        &self,
        _seeds: &BTreeSet<VertexId>,
        _depth: u32,
    ) -> Result<GraphSnapshot, StoreError> {
        std::thread::sleep(Duration::from_secs(10));
        Ok(GraphSnapshot::empty())
    }

    fn find_candidates_by_name(
        &self,
        _name: &str,
        _label_hint: Option<&str>,
    ) -> Result<Vec<Vertex>, StoreError> {
        Ok(Vec::new())
    }

    fn schema_info(&self) -> Result<SchemaInfo, StoreError> {
        Ok(SchemaInfo::default())
    }
}

#[test]
fn scenario_d_timeout_degrades_but_every_mention_resolves() {
    let config = ResolutionConfig {
        context_timeout: Duration::from_millis(25),
        ..ResolutionConfig::default()
    };
    let service = ResolutionService::new(Arc::new(StalledStore), config).unwrap();

    let mentions = vec![
        Mention::new("Acme Corp", ElementKind::NodeReference),
        Mention::new("John Doe", ElementKind::NodeReference),
        Mention::new("Berlin", ElementKind::NodeReference),
    ];

    let resolutions = service.resolve(&mentions, &BTreeSet::new());
    assert_eq!(resolutions.len(), 3);
    for resolution in &resolutions {
        assert_eq!(resolution.strategy, ResolutionStrategy::CreateNew);
        assert!(resolution.rationale.contains("degraded"));
    }
}

#[test]
fn coreference_consistency_across_casing() {
    let (store, acme_id, _) = seeded_store();
    let service =
        ResolutionService::new(Arc::new(store), ResolutionConfig::default()).unwrap();

    let mentions = vec![
        Mention::new("Acme Corp", ElementKind::NodeReference)
            .with_context("John Doe works at Acme Corp"),
        Mention::new("acme corp", ElementKind::NodeReference),
    ];

    let resolutions = service.resolve(&mentions, &BTreeSet::new());
    assert_eq!(resolutions[0].entity(), Some(acme_id));
    assert_eq!(resolutions[1].entity(), Some(acme_id));
    assert_eq!(
        format!("{}", resolutions[0].strategy),
        format!("{}", resolutions[1].strategy)
    );
}

#[test]
fn idempotent_resolution_is_bit_identical() {
    let (store, _, _) = seeded_store();
    let service =
        ResolutionService::new(Arc::new(store), ResolutionConfig::default()).unwrap();

    let mentions = vec![
        Mention::new("Acme Corp", ElementKind::NodeReference),
        Mention::new("Nobody Knows This", ElementKind::NodeReference),
    ];
    let context = service.build_context(&mentions, &BTreeSet::new());

    let first = service.resolve_batch(&mentions, &context);
    let second = service.resolve_batch(&mentions, &context);
    assert_eq!(first, second);
    assert_eq!(first[0].rationale, second[0].rationale);
}

#[test]
fn invalid_weights_fail_deterministically() {
    // Weights summing to 0.9 are rejected, never renormalized.
    let err = SignalWeights::new(0.4, 0.3, 0.1, 0.1).unwrap_err();
    assert!(matches!(err, ConfigError::WeightSumMismatch { .. }));
    assert!(err.to_string().contains("sum"));
}

#[test]
fn candidate_lists_are_sorted_and_capped() {
    let store = MemoryGraphStore::new();
    for name in [
        "Acme Corp",
        "Acme Corporation",
        "Acme Holdings",
        "Acme Industries",
        "Acme Ltd",
        "Acme GmbH",
        "Acme Partners",
    ] {
        store
            .insert_vertex(Vertex::new(name, "Organization"))
            .unwrap();
    }

    let config = ResolutionConfig {
        max_candidates: 3,
        ..ResolutionConfig::default()
    };
    let service = ResolutionService::new(Arc::new(store), config).unwrap();

    let mentions = vec![Mention::new("Acme", ElementKind::NodeReference)];
    let resolutions = service.resolve(&mentions, &BTreeSet::new());

    let candidates = resolutions[0].candidates();
    assert!(!candidates.is_empty());
    assert!(candidates.len() <= 3);
    for pair in candidates.windows(2) {
        assert!(pair[0].confidence.overall >= pair[1].confidence.overall);
    }
}

#[test]
fn context_signal_rewards_graph_neighbors() {
    // Two vertices share the name "Jordan"; only one works at Acme. A
    // mention whose sentence names Acme Corp should prefer the colleague.
    let store = MemoryGraphStore::new();
    let acme = Vertex::new("Acme Corp", "Organization");
    let colleague = Vertex::new("Jordan", "Person");
    let stranger = Vertex::new("Jordan", "Person");
    let (acme_id, colleague_id) = (acme.id, colleague.id);
    store.insert_vertex(acme).unwrap();
    store.insert_vertex(colleague).unwrap();
    store.insert_vertex(stranger).unwrap();
    store
        .insert_edge(Edge::new(colleague_id, acme_id, "WORKS_AT"))
        .unwrap();

    let config = ResolutionConfig {
        // Name ties; context separates. Keep the margin tight so the
        // separation decides instead of tripping the ambiguity branch.
        weights: SignalWeights::new(0.5, 0.2, 0.0, 0.3).unwrap(),
        ..ResolutionConfig::default()
    };
    let service = ResolutionService::new(Arc::new(store), config).unwrap();

    let mentions = vec![Mention::new("Jordan", ElementKind::NodeReference)
        .with_context("Jordan presented the Acme Corp quarterly report")];
    let resolutions = service.resolve(&mentions, &BTreeSet::new());

    let ResolutionStrategy::UseExisting { entity } = resolutions[0].strategy else {
        panic!(
            "expected UseExisting, got {}: {}",
            resolutions[0].strategy, resolutions[0].rationale
        );
    };
    assert_eq!(entity, colleague_id);
}

#[test]
fn blank_mention_does_not_affect_siblings() {
    let (store, acme_id, _) = seeded_store();
    let service =
        ResolutionService::new(Arc::new(store), ResolutionConfig::default()).unwrap();

    let mentions = vec![
        Mention::new("", ElementKind::NodeReference),
        Mention::new("Acme Corp", ElementKind::NodeReference),
    ];

    let resolutions = service.resolve(&mentions, &BTreeSet::new());
    assert_eq!(resolutions[0].strategy, ResolutionStrategy::CreateNew);
    assert!(resolutions[0].rationale.contains("empty surface form"));
    assert_eq!(resolutions[1].entity(), Some(acme_id));
}

#[test]
fn high_score_without_separation_asks_user() {
    // Both candidates clear `high`, but within the margin: ambiguity
    // overrides the high raw score.
    let store = MemoryGraphStore::new();
    store
        .insert_vertex(Vertex::new("Acme Corp", "Organization"))
        .unwrap();
    store
        .insert_vertex(Vertex::new("Acme Corp.", "Organization"))
        .unwrap();

    let weights = SignalWeights::new(1.0, 0.0, 0.0, 0.0).unwrap();
    let scorer = SimilarityScorer::new(weights, 0.1, 5).unwrap().with_signal(
        SignalKind::Name,
        Arc::new(ByName(vec![("Acme Corp", 0.92), ("Acme Corp.", 0.9)])),
    );
    let service =
        ResolutionService::with_scorer(Arc::new(store), scorer, ResolutionConfig::default())
            .unwrap();

    let mentions = vec![Mention::new("Acme Corp", ElementKind::NodeReference)];
    let resolutions = service.resolve(&mentions, &BTreeSet::new());

    assert!(matches!(
        resolutions[0].strategy,
        ResolutionStrategy::AskUser { .. }
    ));
    assert!(resolutions[0].rationale.contains("ambiguity margin"));
}

#[test]
fn constant_signal_override_applies_everywhere() {
    let (store, _, _) = seeded_store();
    let weights = SignalWeights::new(0.0, 0.0, 0.0, 1.0).unwrap();
    let scorer = SimilarityScorer::new(weights, 0.0, 5)
        .unwrap()
        .with_signal(SignalKind::Context, Arc::new(Fixed(0.65)));
    let service =
        ResolutionService::with_scorer(Arc::new(store), scorer, ResolutionConfig::default())
            .unwrap();

    let mentions = vec![Mention::new("Acme Corp", ElementKind::NodeReference)];
    let resolutions = service.resolve(&mentions, &BTreeSet::new());
    assert!((resolutions[0].confidence.overall - 0.65).abs() < 1e-9);
}
