//! Confidence types for mention/candidate matching.
//!
//! A match confidence is not one number: it carries the four independent
//! signals it was combined from (name, type, property, context) so callers
//! can see *why* a candidate scored the way it did. The derived `overall`
//! is a fixed weighted combination, with the weights validated once at
//! scorer construction — never silently renormalized.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tolerance for the weight-sum check.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// The four signal weights used to combine a [`Confidence`] into `overall`.
///
/// Weights must be finite, non-negative, and sum to 1 within
/// [`WEIGHT_SUM_EPSILON`]. Construction fails otherwise.
///
/// # Examples
///
/// ```
/// use graphlink::SignalWeights;
///
/// let weights = SignalWeights::new(0.4, 0.3, 0.2, 0.1).unwrap();
/// assert!(SignalWeights::new(0.4, 0.3, 0.2, 0.0).is_err()); // sums to 0.9
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    name: f64,
    r#type: f64,
    property: f64,
    context: f64,
}

impl SignalWeights {
    /// Creates validated signal weights.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NegativeWeight`] for a negative or non-finite
    /// weight, and [`ConfigError::WeightSumMismatch`] when the sum is not
    /// 1 within epsilon.
    pub fn new(name: f64, r#type: f64, property: f64, context: f64) -> Result<Self, ConfigError> {
        for (label, value) in [
            ("name", name),
            ("type", r#type),
            ("property", property),
            ("context", context),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeWeight { name: label, value });
            }
        }

        let sum = name + r#type + property + context;
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightSumMismatch {
                sum,
                epsilon: WEIGHT_SUM_EPSILON,
            });
        }

        Ok(Self {
            name,
            r#type,
            property,
            context,
        })
    }

    /// The weight on the name signal.
    #[must_use]
    pub const fn name(&self) -> f64 {
        self.name
    }

    /// The weight on the type signal.
    #[must_use]
    pub const fn type_(&self) -> f64 {
        self.r#type
    }

    /// The weight on the property signal.
    #[must_use]
    pub const fn property(&self) -> f64 {
        self.property
    }

    /// The weight on the context signal.
    #[must_use]
    pub const fn context(&self) -> f64 {
        self.context
    }

    /// Combines four signal scores into a clamped overall confidence.
    #[must_use]
    pub fn combine(&self, name: f64, r#type: f64, property: f64, context: f64) -> f64 {
        let overall = self.name * name
            + self.r#type * r#type
            + self.property * property
            + self.context * context;
        overall.clamp(0.0, 1.0)
    }
}

impl Default for SignalWeights {
    /// Default weighting: name dominates, context refines.
    fn default() -> Self {
        Self {
            name: 0.4,
            r#type: 0.3,
            property: 0.2,
            context: 0.1,
        }
    }
}

/// Multi-signal confidence of one candidate against one mention.
///
/// All four signals and the derived `overall` are bounded in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    /// Lexical similarity between surface form and display name.
    pub name: f64,
    /// Label/type agreement.
    pub r#type: f64,
    /// Fraction of extracted properties matching candidate properties.
    pub property: f64,
    /// Fraction of context entities adjacent to the candidate.
    pub context: f64,
    /// Weighted combination of the four signals, clamped to [0, 1].
    pub overall: f64,
}

impl Confidence {
    /// Builds a confidence from four signal scores and the weights.
    ///
    /// Each signal is clamped to [0, 1] before combining, so a misbehaving
    /// custom signal cannot push `overall` out of range.
    #[must_use]
    pub fn from_signals(
        weights: &SignalWeights,
        name: f64,
        r#type: f64,
        property: f64,
        context: f64,
    ) -> Self {
        let name = clamp_signal(name);
        let r#type = clamp_signal(r#type);
        let property = clamp_signal(property);
        let context = clamp_signal(context);
        Self {
            name,
            r#type,
            property,
            context,
            overall: weights.combine(name, r#type, property, context),
        }
    }

    /// Zero confidence on every signal: the confidence attached to a
    /// `CreateNew` resolution with no surviving candidates.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            name: 0.0,
            r#type: 0.0,
            property: 0.0,
            context: 0.0,
            overall: 0.0,
        }
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "overall={:.3} (name={:.3}, type={:.3}, property={:.3}, context={:.3})",
            self.overall, self.name, self.r#type, self.property, self.context
        )
    }
}

fn clamp_signal(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
