//! Behavioral feature vectors
//!
//! A feature vector is a fixed-schema numeric summary of one analysis window.
//! Every schema feature is always present and finite: missing data is imputed
//! with the feature's default and flagged so confidence can be discounted.

pub mod extractor;
pub mod norms;
pub mod stats;

pub use extractor::FeatureExtractor;

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Version of the feature schema produced by the extractor
pub const FEATURE_SCHEMA_VERSION: &str = "feelsync.features.v1";

pub const REACTION_TIME_MEAN: &str = "reaction_time_mean";
pub const REACTION_TIME_STD: &str = "reaction_time_std";
pub const REACTION_TIME_P90: &str = "reaction_time_p90";
pub const ERROR_RATE: &str = "error_rate";
pub const HESITATION_FREQUENCY: &str = "hesitation_frequency";
pub const HESITATION_MEAN: &str = "hesitation_mean";
pub const EMOTIONAL_CHOICE_BIAS: &str = "emotional_choice_bias";
pub const ATTENTION_LAPSE_RATE: &str = "attention_lapse_rate";
pub const DECISION_CONSISTENCY: &str = "decision_consistency";
pub const STRESS_MEAN: &str = "stress_mean";
pub const ENGAGEMENT_TREND: &str = "engagement_trend";
pub const SESSION_COUNT: &str = "session_count";

/// One schema feature and the value used when it cannot be computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub default: f64,
    pub unit: &'static str,
    pub description: &'static str,
}

/// The `feelsync.features.v1` schema, in canonical order
pub const FEATURE_SCHEMA: [FeatureSpec; 12] = [
    FeatureSpec {
        name: REACTION_TIME_MEAN,
        default: 0.0,
        unit: "ms",
        description: "Mean reaction time over all events",
    },
    FeatureSpec {
        name: REACTION_TIME_STD,
        default: 0.0,
        unit: "ms",
        description: "Population standard deviation of reaction time",
    },
    FeatureSpec {
        name: REACTION_TIME_P90,
        default: 0.0,
        unit: "ms",
        description: "90th percentile reaction time (linear interpolation)",
    },
    FeatureSpec {
        name: ERROR_RATE,
        default: 0.5,
        unit: "ratio",
        description: "Incorrect decisions over accuracy-bearing decisions",
    },
    FeatureSpec {
        name: HESITATION_FREQUENCY,
        default: 0.5,
        unit: "ratio",
        description: "Share of hesitations above the hesitation threshold",
    },
    FeatureSpec {
        name: HESITATION_MEAN,
        default: 0.0,
        unit: "ms",
        description: "Mean recorded hesitation time",
    },
    FeatureSpec {
        name: EMOTIONAL_CHOICE_BIAS,
        default: 0.0,
        unit: "signed ratio",
        description: "(negative - positive) / all valence choices, neutral included",
    },
    FeatureSpec {
        name: ATTENTION_LAPSE_RATE,
        default: 0.0,
        unit: "ratio",
        description: "Share of responses slower than their session mean + z * std",
    },
    FeatureSpec {
        name: DECISION_CONSISTENCY,
        default: 0.5,
        unit: "ratio",
        description: "1 - variance(per-session accuracy) / 0.25",
    },
    FeatureSpec {
        name: STRESS_MEAN,
        default: 5.5,
        unit: "1-10",
        description: "Mean self-reported stress level",
    },
    FeatureSpec {
        name: ENGAGEMENT_TREND,
        default: 0.0,
        unit: "signed ratio",
        description: "Relative change in daily session count across the window",
    },
    FeatureSpec {
        name: SESSION_COUNT,
        default: 0.0,
        unit: "count",
        description: "Number of sessions in the window",
    },
];

/// Look up a schema feature by name
pub fn feature_spec(name: &str) -> Option<&'static FeatureSpec> {
    FEATURE_SCHEMA.iter().find(|f| f.name == name)
}

/// Numeric summary of one analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub schema_version: String,
    values: BTreeMap<String, f64>,
    #[serde(default)]
    imputed: BTreeSet<String>,
}

impl Default for FeatureVector {
    /// Vector holding every schema default, all flagged imputed
    fn default() -> Self {
        let mut vector = Self::empty();
        for spec in FEATURE_SCHEMA.iter() {
            vector.impute(spec.name);
        }
        vector
    }
}

impl FeatureVector {
    /// Vector with no features, tagged with the current schema version
    pub fn empty() -> Self {
        Self {
            schema_version: FEATURE_SCHEMA_VERSION.to_string(),
            values: BTreeMap::new(),
            imputed: BTreeSet::new(),
        }
    }

    /// Build a vector from raw values (e.g. a labelled training sample)
    ///
    /// Non-finite values are rejected so the finiteness invariant holds for
    /// every vector in circulation.
    pub fn from_values(values: BTreeMap<String, f64>) -> Result<Self, AnalysisError> {
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::ParseError(format!(
                "feature {} is not finite: {}",
                name, value
            )));
        }
        Ok(Self {
            schema_version: FEATURE_SCHEMA_VERSION.to_string(),
            values,
            imputed: BTreeSet::new(),
        })
    }

    /// Set a computed value. Non-finite values fall back to the schema default.
    pub fn set(&mut self, name: &str, value: f64) {
        if value.is_finite() {
            self.values.insert(name.to_string(), value);
            self.imputed.remove(name);
        } else {
            self.impute(name);
        }
    }

    /// Fill a feature with its schema default and flag it
    pub fn impute(&mut self, name: &str) {
        let default = feature_spec(name).map(|f| f.default).unwrap_or(0.0);
        self.values.insert(name.to_string(), default);
        self.imputed.insert(name.to_string());
    }

    /// Copy with one feature replaced (used by probes)
    pub fn with_value(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value of a feature that must be present
    pub fn require(&self, model: &str, name: &str) -> Result<f64, AnalysisError> {
        self.get(name).ok_or_else(|| AnalysisError::SchemaMismatch {
            model: model.to_string(),
            missing: vec![name.to_string()],
        })
    }

    pub fn is_imputed(&self, name: &str) -> bool {
        self.imputed.contains(name)
    }

    /// Names of imputed features, sorted
    pub fn imputed_features(&self) -> Vec<String> {
        self.imputed.iter().cloned().collect()
    }

    /// Share of `names` that were imputed
    pub fn imputed_fraction<S: AsRef<str>>(&self, names: &[S]) -> f64 {
        if names.is_empty() {
            return 0.0;
        }
        let imputed = names.iter().filter(|n| self.is_imputed(n.as_ref())).count();
        imputed as f64 / names.len() as f64
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Fail unless every required feature is present and finite
    pub fn ensure_schema<S: AsRef<str>>(
        &self,
        model: &str,
        required: &[S],
    ) -> Result<(), AnalysisError> {
        let missing: Vec<String> = required
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| !self.get(n).is_some_and(f64::is_finite))
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalysisError::SchemaMismatch {
                model: model.to_string(),
                missing,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vector_is_complete() {
        let vector = FeatureVector::default();
        assert_eq!(vector.len(), FEATURE_SCHEMA.len());
        assert_eq!(vector.get(ERROR_RATE), Some(0.5));
        assert_eq!(vector.get(DECISION_CONSISTENCY), Some(0.5));
        assert!(vector.is_imputed(REACTION_TIME_MEAN));
        assert_eq!(vector.imputed_fraction(&[ERROR_RATE, STRESS_MEAN]), 1.0);
    }

    #[test]
    fn test_set_clears_imputed_flag() {
        let vector = FeatureVector::default().with_value(ERROR_RATE, 0.1);
        assert!(!vector.is_imputed(ERROR_RATE));
        assert_eq!(vector.get(ERROR_RATE), Some(0.1));

        let vector = vector.with_value(ERROR_RATE, f64::NAN);
        assert!(vector.is_imputed(ERROR_RATE));
        assert_eq!(vector.get(ERROR_RATE), Some(0.5));
    }

    #[test]
    fn test_ensure_schema_reports_missing() {
        let mut values = BTreeMap::new();
        values.insert(ERROR_RATE.to_string(), 0.2);
        let vector = FeatureVector::from_values(values).unwrap();

        assert!(vector.ensure_schema("attention", &[ERROR_RATE]).is_ok());
        match vector.ensure_schema("attention", &[ERROR_RATE, STRESS_MEAN, SESSION_COUNT]) {
            Err(AnalysisError::SchemaMismatch { model, missing }) => {
                assert_eq!(model, "attention");
                assert_eq!(missing, vec![STRESS_MEAN.to_string(), SESSION_COUNT.to_string()]);
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_from_values_rejects_non_finite() {
        let mut values = BTreeMap::new();
        values.insert(STRESS_MEAN.to_string(), f64::INFINITY);
        assert!(FeatureVector::from_values(values).is_err());
    }
}
