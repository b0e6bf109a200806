//! Indicator models
//!
//! Models are loaded once into a read-only [`ModelContext`] and shared across
//! analysis runs. Inference never mutates a model.

pub mod linear;
pub mod patterns;
pub mod training;

pub use linear::LinearIndicatorModel;
pub use training::{
    probe_monotonicity, train_indicator_model, TrainingOptions, TrainingReport, TrainingSample,
};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::{FeatureVector, SESSION_COUNT};
use crate::types::{Indicator, IndicatorResult};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Raw model output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Concern score (0-1)
    pub score: f64,
    /// Model-internal confidence (0-1)
    pub confidence: f64,
}

/// Inference contract for one indicator
pub trait IndicatorModel: Send + Sync {
    fn indicator(&self) -> Indicator;

    fn version(&self) -> &str;

    /// Features the model reads, by name
    fn required_features(&self) -> &[String];

    /// Score a feature vector. Extra features are ignored; missing ones are
    /// a `SchemaMismatch`.
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, AnalysisError>;
}

/// The three indicator models used by a pipeline
pub struct ModelContext {
    anxiety: Box<dyn IndicatorModel>,
    depression: Box<dyn IndicatorModel>,
    attention: Box<dyn IndicatorModel>,
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.versions()).finish()
    }
}

impl ModelContext {
    /// Build a context, checking each model is filed under its own indicator
    pub fn new(
        anxiety: Box<dyn IndicatorModel>,
        depression: Box<dyn IndicatorModel>,
        attention: Box<dyn IndicatorModel>,
    ) -> Result<Self, AnalysisError> {
        for (expected, model) in [
            (Indicator::Anxiety, &anxiety),
            (Indicator::Depression, &depression),
            (Indicator::Attention, &attention),
        ] {
            if model.indicator() != expected {
                return Err(AnalysisError::ModelArtifact(format!(
                    "{} model supplied for the {} slot",
                    model.indicator(),
                    expected
                )));
            }
        }
        Ok(Self {
            anxiety,
            depression,
            attention,
        })
    }

    /// Context with the built-in models
    pub fn heuristic() -> Self {
        Self {
            anxiety: Box::new(LinearIndicatorModel::heuristic(Indicator::Anxiety)),
            depression: Box::new(LinearIndicatorModel::heuristic(Indicator::Depression)),
            attention: Box::new(LinearIndicatorModel::heuristic(Indicator::Attention)),
        }
    }

    /// Load all three artifacts from a directory
    pub fn load_dir(dir: &Path) -> Result<Self, AnalysisError> {
        Self::new(
            Box::new(load_model(dir, Indicator::Anxiety)?),
            Box::new(load_model(dir, Indicator::Depression)?),
            Box::new(load_model(dir, Indicator::Attention)?),
        )
    }

    /// Load artifacts that exist and fall back to built-in models for the rest
    pub fn load_dir_or_heuristic(dir: &Path) -> Result<Self, AnalysisError> {
        let load = |indicator: Indicator| -> Result<Box<dyn IndicatorModel>, AnalysisError> {
            if model_path(dir, indicator).exists() {
                Ok(Box::new(load_model(dir, indicator)?))
            } else {
                debug!(%indicator, "no artifact, using built-in model");
                Ok(Box::new(LinearIndicatorModel::heuristic(indicator)))
            }
        };
        Self::new(
            load(Indicator::Anxiety)?,
            load(Indicator::Depression)?,
            load(Indicator::Attention)?,
        )
    }

    pub fn get(&self, indicator: Indicator) -> &dyn IndicatorModel {
        match indicator {
            Indicator::Anxiety => self.anxiety.as_ref(),
            Indicator::Depression => self.depression.as_ref(),
            Indicator::Attention => self.attention.as_ref(),
        }
    }

    /// Model version per indicator name
    pub fn versions(&self) -> BTreeMap<String, String> {
        Indicator::ALL
            .into_iter()
            .map(|i| (i.to_string(), self.get(i).version().to_string()))
            .collect()
    }

    /// Fail unless every model can read the vector
    pub fn ensure_schema(&self, features: &FeatureVector) -> Result<(), AnalysisError> {
        for indicator in Indicator::ALL {
            let model = self.get(indicator);
            features.ensure_schema(indicator.as_str(), model.required_features())?;
        }
        Ok(())
    }

    /// Score one indicator into a full result
    pub fn evaluate(
        &self,
        indicator: Indicator,
        features: &FeatureVector,
        config: &AnalysisConfig,
    ) -> Result<IndicatorResult, AnalysisError> {
        let prediction = self.get(indicator).predict(features)?;
        let score = prediction.score.clamp(0.0, 1.0);
        let sessions = features.get(SESSION_COUNT).unwrap_or(0.0).max(0.0) as usize;
        let confidence = sample_adjusted_confidence(prediction.confidence, sessions, config);

        Ok(IndicatorResult {
            score,
            level: config.levels.level_for(score),
            confidence,
            key_patterns: patterns::key_patterns(
                indicator,
                features,
                score,
                config.levels.high,
                config.max_key_patterns,
            ),
            degraded: false,
        })
    }
}

/// Path of an indicator's artifact inside a model directory
pub fn model_path(dir: &Path, indicator: Indicator) -> std::path::PathBuf {
    dir.join(format!("{}.json", indicator.as_str()))
}

/// Load `<dir>/<indicator>.json`
pub fn load_model(dir: &Path, indicator: Indicator) -> Result<LinearIndicatorModel, AnalysisError> {
    let model = LinearIndicatorModel::load(&model_path(dir, indicator))?;
    if model.indicator != indicator {
        return Err(AnalysisError::ModelArtifact(format!(
            "{} contains a {} model",
            model_path(dir, indicator).display(),
            model.indicator
        )));
    }
    debug!(%indicator, version = %model.version, "loaded model artifact");
    Ok(model)
}

/// Apply the sample-size factor to a model confidence
///
/// Confidence scales with `sessions / min_sessions` and, below the minimum
/// session count, is forced under the low-confidence cutoff.
fn sample_adjusted_confidence(confidence: f64, sessions: usize, config: &AnalysisConfig) -> f64 {
    let adequacy = (sessions as f64 / config.min_sessions as f64).min(1.0);
    let mut adjusted = (confidence * adequacy).clamp(0.0, 1.0);
    if sessions < config.min_sessions {
        adjusted = adjusted.min((config.low_confidence_cutoff - 0.01).max(0.0));
    }
    adjusted
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Model that always fails, standing in for a numerical error
    pub struct FailingModel(pub Indicator);

    impl IndicatorModel for FailingModel {
        fn indicator(&self) -> Indicator {
            self.0
        }

        fn version(&self) -> &str {
            "failing"
        }

        fn required_features(&self) -> &[String] {
            &[]
        }

        fn predict(&self, _features: &FeatureVector) -> Result<Prediction, AnalysisError> {
            Err(AnalysisError::ModelInference {
                indicator: self.0.to_string(),
                reason: "NaN in linear term".to_string(),
            })
        }
    }

    /// Model returning a fixed prediction
    pub struct FixedModel(pub Indicator, pub f64, pub f64);

    impl IndicatorModel for FixedModel {
        fn indicator(&self) -> Indicator {
            self.0
        }

        fn version(&self) -> &str {
            "fixed"
        }

        fn required_features(&self) -> &[String] {
            &[]
        }

        fn predict(&self, _features: &FeatureVector) -> Result<Prediction, AnalysisError> {
            Ok(Prediction {
                score: self.1,
                confidence: self.2,
            })
        }
    }
}
