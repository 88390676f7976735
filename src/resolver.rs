//! Per-mention decision policy.
//!
//! The resolver is a pure function of (mention, sorted scored candidates,
//! thresholds). Its decision table:
//!
//! 1. No surviving candidates: `CreateNew` with zero confidence.
//! 2. Top score `>= high` and separated from the runner-up by at least the
//!    ambiguity margin: `UseExisting`.
//! 3. Top score `>= high` but within the margin of the runner-up: `AskUser`.
//!    Ambiguity overrides a high raw score — auto-resolution requires both
//!    confidence and separation.
//! 4. Top score in `[low, high)`: `AskUser` with the full ranked list.
//! 5. Top score `< low`: `CreateNew`.
//!
//! Rationale strings are generated deterministically from the branch taken
//! and the scores involved: same inputs, identical string.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::error::ConfigError;
use crate::graph::VertexId;
use crate::mention::{Mention, MentionId};
use crate::similarity::ScoredCandidate;

/// The strategy chosen for one mention.
///
/// A closed sum type: the decision table over it is exhaustively checked by
/// the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Reuse an existing vertex.
    UseExisting {
        /// The vertex the mention resolves to.
        entity: VertexId,
    },
    /// Defer to a human, presenting the ranked candidate list.
    AskUser {
        /// Surviving candidates, best first.
        candidates: Vec<ScoredCandidate>,
    },
    /// Create a new vertex for the mention.
    CreateNew,
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UseExisting { .. } => write!(f, "use_existing"),
            Self::AskUser { .. } => write!(f, "ask_user"),
            Self::CreateNew => write!(f, "create_new"),
        }
    }
}

/// The terminal output for one mention. Never mutated after return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// The mention this resolution answers.
    pub mention_id: MentionId,

    /// The chosen strategy, with its payload.
    pub strategy: ResolutionStrategy,

    /// The winning candidate's confidence; all-zero when no candidate won.
    pub confidence: Confidence,

    /// Deterministic, human-readable justification for the decision.
    pub rationale: String,
}

impl Resolution {
    /// The target entity, present only for `UseExisting`.
    #[must_use]
    pub fn entity(&self) -> Option<VertexId> {
        match &self.strategy {
            ResolutionStrategy::UseExisting { entity } => Some(*entity),
            ResolutionStrategy::AskUser { .. } | ResolutionStrategy::CreateNew => None,
        }
    }

    /// The ranked candidate list, nonempty only for `AskUser`.
    #[must_use]
    pub fn candidates(&self) -> &[ScoredCandidate] {
        match &self.strategy {
            ResolutionStrategy::AskUser { candidates } => candidates,
            ResolutionStrategy::UseExisting { .. } | ResolutionStrategy::CreateNew => &[],
        }
    }
}

/// The decision thresholds: `low < high` in [0, 1] plus the ambiguity
/// margin δ.
///
/// δ is a tunable parameter, not a constant: it defines how much separation
/// from the runner-up a high-scoring top candidate needs before the resolver
/// auto-resolves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    low: f64,
    high: f64,
    ambiguity_margin: f64,
}

impl DecisionThresholds {
    /// Creates validated thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when either threshold leaves [0, 1], when
    /// `low >= high`, or when the margin is negative or non-finite.
    pub fn new(low: f64, high: f64, ambiguity_margin: f64) -> Result<Self, ConfigError> {
        for (name, value) in [("low", low), ("high", high)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if low >= high {
            return Err(ConfigError::ThresholdOrder { low, high });
        }
        if !ambiguity_margin.is_finite() || ambiguity_margin < 0.0 {
            return Err(ConfigError::InvalidMargin {
                value: ambiguity_margin,
            });
        }
        Ok(Self {
            low,
            high,
            ambiguity_margin,
        })
    }

    /// The create-new threshold.
    #[must_use]
    pub const fn low(&self) -> f64 {
        self.low
    }

    /// The auto-resolve threshold.
    #[must_use]
    pub const fn high(&self) -> f64 {
        self.high
    }

    /// The ambiguity margin δ.
    #[must_use]
    pub const fn ambiguity_margin(&self) -> f64 {
        self.ambiguity_margin
    }
}

impl Default for DecisionThresholds {
    /// low = 0.3, high = 0.6, δ = 0.05.
    fn default() -> Self {
        Self {
            low: 0.3,
            high: 0.6,
            ambiguity_margin: 0.05,
        }
    }
}

/// Note appended to rationales produced against a degraded context.
const DEGRADED_NOTE: &str = " Context was degraded to an empty snapshot.";

/// Decides the resolution for one mention from its sorted scored candidates.
///
/// `scored` must already be sorted descending by `overall` (the scorer's
/// output contract). `degraded` appends a fixed note to the rationale so a
/// reader can tell the decision ran without graph context.
#[must_use]
pub fn decide(
    mention: &Mention,
    scored: &[ScoredCandidate],
    thresholds: &DecisionThresholds,
    degraded: bool,
) -> Resolution {
    let (strategy, confidence, mut rationale) = decide_inner(mention, scored, thresholds);
    if degraded {
        rationale.push_str(DEGRADED_NOTE);
    }
    Resolution {
        mention_id: mention.id,
        strategy,
        confidence,
        rationale,
    }
}

fn decide_inner(
    mention: &Mention,
    scored: &[ScoredCandidate],
    thresholds: &DecisionThresholds,
) -> (ResolutionStrategy, Confidence, String) {
    if mention.is_blank() {
        return (
            ResolutionStrategy::CreateNew,
            Confidence::zero(),
            "Mention has an empty surface form; creating a new entity.".to_string(),
        );
    }

    let Some(top) = scored.first() else {
        return (
            ResolutionStrategy::CreateNew,
            Confidence::zero(),
            "No matching candidates above threshold; creating a new entity.".to_string(),
        );
    };

    let top_score = top.confidence.overall;
    let runner_up = scored.get(1).map(|sc| sc.confidence.overall);

    if top_score >= thresholds.high {
        if let Some(second) = runner_up {
            if top_score - second < thresholds.ambiguity_margin {
                let rationale = format!(
                    "Top candidates scored {:.3} and {:.3}, within ambiguity margin {:.3}; \
                     asking user to disambiguate among {} candidates.",
                    top_score,
                    second,
                    thresholds.ambiguity_margin,
                    scored.len()
                );
                return (
                    ResolutionStrategy::AskUser {
                        candidates: scored.to_vec(),
                    },
                    top.confidence,
                    rationale,
                );
            }
        }
        let rationale = format!(
            "Top candidate '{}' scored {:.3}, at or above high threshold {:.3} with clear \
             separation; reusing existing entity {}.",
            top.vertex.name, top_score, thresholds.high, top.vertex.id
        );
        return (
            ResolutionStrategy::UseExisting {
                entity: top.vertex.id,
            },
            top.confidence,
            rationale,
        );
    }

    if top_score >= thresholds.low {
        let rationale = format!(
            "Top candidate '{}' scored {:.3}, between low {:.3} and high {:.3}; asking user \
             to disambiguate among {} candidates.",
            top.vertex.name,
            top_score,
            thresholds.low,
            thresholds.high,
            scored.len()
        );
        return (
            ResolutionStrategy::AskUser {
                candidates: scored.to_vec(),
            },
            top.confidence,
            rationale,
        );
    }

    let rationale = format!(
        "Top candidate '{}' scored {:.3}, below low threshold {:.3}; creating a new entity.",
        top.vertex.name, top_score, thresholds.low
    );
    (ResolutionStrategy::CreateNew, Confidence::zero(), rationale)
}
