//! Standardized linear indicator model
//!
//! Features are z-scored against the training distribution, combined linearly
//! and passed through a logistic link. The same z-scores drive the
//! out-of-distribution part of the confidence estimate.

use crate::error::AnalysisError;
use crate::features::*;
use crate::models::{IndicatorModel, Prediction};
use crate::types::Indicator;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version string of the built-in models
pub const HEURISTIC_MODEL_VERSION: &str = "heuristic-1";

/// rms z-score at which proximity confidence halves
const PROXIMITY_SCALE: f64 = 3.0;

/// Largest confidence discount applied for fully imputed input
const MAX_IMPUTATION_DISCOUNT: f64 = 0.5;

/// Reference distribution `(feature, mean, std)` of the built-in models
const REFERENCE_DISTRIBUTION: [(&str, f64, f64); 12] = [
    (REACTION_TIME_MEAN, 900.0, 300.0),
    (REACTION_TIME_STD, 300.0, 150.0),
    (REACTION_TIME_P90, 1400.0, 450.0),
    (ERROR_RATE, 0.2, 0.12),
    (HESITATION_FREQUENCY, 0.2, 0.15),
    (HESITATION_MEAN, 800.0, 500.0),
    (EMOTIONAL_CHOICE_BIAS, 0.0, 0.35),
    (ATTENTION_LAPSE_RATE, 0.04, 0.03),
    (DECISION_CONSISTENCY, 0.8, 0.15),
    (STRESS_MEAN, 4.5, 2.0),
    (ENGAGEMENT_TREND, 0.0, 0.4),
    (SESSION_COUNT, 8.0, 5.0),
];

const ANXIETY_WEIGHTS: &[(&str, f64)] = &[
    (REACTION_TIME_STD, 0.5),
    (HESITATION_FREQUENCY, 0.7),
    (HESITATION_MEAN, 0.3),
    (ERROR_RATE, 0.3),
    (EMOTIONAL_CHOICE_BIAS, 0.3),
    (STRESS_MEAN, 0.8),
    (DECISION_CONSISTENCY, -0.2),
];

const DEPRESSION_WEIGHTS: &[(&str, f64)] = &[
    (REACTION_TIME_MEAN, 0.5),
    (ATTENTION_LAPSE_RATE, 0.3),
    (EMOTIONAL_CHOICE_BIAS, 0.8),
    (ENGAGEMENT_TREND, -0.5),
    (DECISION_CONSISTENCY, -0.3),
    (STRESS_MEAN, 0.3),
];

const ATTENTION_WEIGHTS: &[(&str, f64)] = &[
    (REACTION_TIME_MEAN, 0.4),
    (REACTION_TIME_STD, 0.5),
    (ERROR_RATE, 0.6),
    (ATTENTION_LAPSE_RATE, 0.8),
    (DECISION_CONSISTENCY, -0.5),
    (HESITATION_FREQUENCY, 0.2),
];

const HEURISTIC_BIAS: f64 = -1.0;

/// Logistic-linear model over standardized features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearIndicatorModel {
    pub indicator: Indicator,
    pub version: String,
    /// Feature schema the model was trained against
    pub schema_version: String,
    /// Input features, in weight order
    pub features: Vec<String>,
    /// Training mean per feature
    pub means: Vec<f64>,
    /// Training standard deviation per feature (> 0)
    pub stds: Vec<f64>,
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(default)]
    pub training_samples: usize,
}

impl LinearIndicatorModel {
    /// Built-in model for an indicator, used when no trained artifact exists
    pub fn heuristic(indicator: Indicator) -> Self {
        let table = match indicator {
            Indicator::Anxiety => ANXIETY_WEIGHTS,
            Indicator::Depression => DEPRESSION_WEIGHTS,
            Indicator::Attention => ATTENTION_WEIGHTS,
        };

        let mut model = Self {
            indicator,
            version: HEURISTIC_MODEL_VERSION.to_string(),
            schema_version: FEATURE_SCHEMA_VERSION.to_string(),
            features: Vec::with_capacity(table.len()),
            means: Vec::with_capacity(table.len()),
            stds: Vec::with_capacity(table.len()),
            weights: Vec::with_capacity(table.len()),
            bias: HEURISTIC_BIAS,
            training_samples: 0,
        };
        for (name, weight) in table {
            let (mean, std) = reference_stats(name);
            model.features.push(name.to_string());
            model.means.push(mean);
            model.stds.push(std);
            model.weights.push(*weight);
        }
        model
    }

    /// Parse and validate a JSON artifact
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let model: LinearIndicatorModel = serde_json::from_str(json)
            .map_err(|e| AnalysisError::ModelArtifact(format!("invalid model JSON: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::ModelArtifact(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<(), AnalysisError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Check the internal consistency of the artifact
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.schema_version != FEATURE_SCHEMA_VERSION {
            return Err(AnalysisError::SchemaVersion {
                model: self.indicator.to_string(),
                expected: FEATURE_SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        let n = self.features.len();
        if n == 0 {
            return Err(AnalysisError::ModelArtifact(format!(
                "{} model has no features",
                self.indicator
            )));
        }
        if self.means.len() != n || self.stds.len() != n || self.weights.len() != n {
            return Err(AnalysisError::ModelArtifact(format!(
                "{} model has {} features but {} means, {} stds, {} weights",
                self.indicator,
                n,
                self.means.len(),
                self.stds.len(),
                self.weights.len()
            )));
        }
        let finite = self
            .means
            .iter()
            .chain(&self.weights)
            .chain(std::iter::once(&self.bias))
            .all(|v| v.is_finite());
        if !finite || self.stds.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(AnalysisError::ModelArtifact(format!(
                "{} model has non-finite parameters or non-positive stds",
                self.indicator
            )));
        }
        Ok(())
    }

    /// Standardized inputs in feature order
    fn z_scores(&self, features: &FeatureVector) -> Result<Vec<f64>, AnalysisError> {
        self.features
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(name, (mean, std))| {
                features
                    .require(self.indicator.as_str(), name)
                    .map(|x| (x - mean) / std)
            })
            .collect()
    }
}

impl IndicatorModel for LinearIndicatorModel {
    fn indicator(&self) -> Indicator {
        self.indicator
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn required_features(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, features: &FeatureVector) -> Result<Prediction, AnalysisError> {
        if features.schema_version != self.schema_version {
            return Err(AnalysisError::SchemaVersion {
                model: self.indicator.to_string(),
                expected: self.schema_version.clone(),
                actual: features.schema_version.clone(),
            });
        }
        features.ensure_schema(self.indicator.as_str(), &self.features)?;

        let z = self.z_scores(features)?;
        let linear = self.bias + z.iter().zip(&self.weights).map(|(z, w)| z * w).sum::<f64>();
        let score = logistic(linear);
        if !score.is_finite() {
            return Err(AnalysisError::ModelInference {
                indicator: self.indicator.to_string(),
                reason: format!("non-finite output from linear term {}", linear),
            });
        }

        let rms_z = (z.iter().map(|v| v * v).sum::<f64>() / z.len() as f64).sqrt();
        let proximity = 1.0 / (1.0 + (rms_z / PROXIMITY_SCALE).powi(2));
        let imputation = 1.0 - MAX_IMPUTATION_DISCOUNT * features.imputed_fraction(&self.features);

        Ok(Prediction {
            score: score.clamp(0.0, 1.0),
            confidence: (proximity * imputation).clamp(0.0, 1.0),
        })
    }
}

/// Reference `(mean, std)` of a schema feature
pub(crate) fn reference_stats(name: &str) -> (f64, f64) {
    REFERENCE_DISTRIBUTION
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, mean, std)| (*mean, *std))
        .unwrap_or((0.0, 1.0))
}

/// Logistic link `1 / (1 + e^-x)`
pub(crate) fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
