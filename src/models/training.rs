//! Offline training of linear indicator models
//!
//! Fitting is full-batch gradient descent on the logistic loss with an L2
//! penalty, starting from zero weights for a fixed number of epochs, so the
//! same samples always produce the same artifact.

use crate::error::AnalysisError;
use crate::features::stats::{mean, std_dev};
use crate::features::{FeatureVector, FEATURE_SCHEMA_VERSION};
use crate::models::linear::logistic;
use crate::models::{IndicatorModel, LinearIndicatorModel};
use crate::types::Indicator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Fewer labelled samples than this cannot train a model
pub const MIN_TRAINING_SAMPLES: usize = 10;

/// One labelled feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: BTreeMap<String, f64>,
    /// Target concern score (0-1)
    pub label: f64,
}

/// Gradient descent settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingOptions {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
    /// Input features; the built-in model's features when absent
    pub features: Option<Vec<String>>,
    pub version: String,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs: 3000,
            learning_rate: 0.5,
            l2: 1e-4,
            features: None,
            version: "trained-1".to_string(),
        }
    }
}

/// Fit quality on the training set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub indicator: Indicator,
    pub samples: usize,
    pub mse: f64,
    pub r_squared: f64,
}

/// Train one indicator model from labelled samples
pub fn train_indicator_model(
    indicator: Indicator,
    samples: &[TrainingSample],
    options: &TrainingOptions,
) -> Result<(LinearIndicatorModel, TrainingReport), AnalysisError> {
    if samples.len() < MIN_TRAINING_SAMPLES {
        return Err(AnalysisError::InsufficientData(format!(
            "{} training samples, at least {} required",
            samples.len(),
            MIN_TRAINING_SAMPLES
        )));
    }
    if options.epochs == 0 || options.learning_rate.is_nan() || options.learning_rate <= 0.0 || options.l2 < 0.0
    {
        return Err(AnalysisError::Training(
            "epochs and learning rate must be positive, l2 non-negative".to_string(),
        ));
    }

    let labels: Vec<f64> = samples.iter().map(|s| s.label).collect();
    if labels.iter().any(|y| !(0.0..=1.0).contains(y)) {
        return Err(AnalysisError::Training(
            "labels must be finite and within [0, 1]".to_string(),
        ));
    }
    let label_std = std_dev(&labels).unwrap_or(0.0);
    if label_std <= f64::EPSILON {
        return Err(AnalysisError::Training(
            "labels have no variance".to_string(),
        ));
    }

    let names = options
        .features
        .clone()
        .unwrap_or_else(|| LinearIndicatorModel::heuristic(indicator).features);

    // Design matrix in feature order
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(samples.len()); names.len()];
    for (row, sample) in samples.iter().enumerate() {
        let vector = FeatureVector::from_values(sample.features.clone())
            .map_err(|e| AnalysisError::Training(format!("sample {}: {}", row, e)))?;
        vector.ensure_schema(indicator.as_str(), &names)?;
        for (col, name) in names.iter().enumerate() {
            columns[col].push(vector.get(name).unwrap_or(0.0));
        }
    }

    let means: Vec<f64> = columns.iter().map(|c| mean(c).unwrap_or(0.0)).collect();
    let stds: Vec<f64> = columns
        .iter()
        .map(|c| match std_dev(c) {
            Some(s) if s > f64::EPSILON => s,
            _ => 1.0,
        })
        .collect();
    let z: Vec<Vec<f64>> = (0..samples.len())
        .map(|row| {
            (0..names.len())
                .map(|col| (columns[col][row] - means[col]) / stds[col])
                .collect()
        })
        .collect();

    let n = samples.len() as f64;
    let mut weights = vec![0.0; names.len()];
    let mut bias = 0.0;
    for _ in 0..options.epochs {
        let mut grad_w = vec![0.0; names.len()];
        let mut grad_b = 0.0;
        for (row, y) in z.iter().zip(&labels) {
            let p = logistic(bias + dot(&weights, row));
            let err = p - y;
            grad_b += err;
            for (g, x) in grad_w.iter_mut().zip(row) {
                *g += err * x;
            }
        }
        for (w, g) in weights.iter_mut().zip(&grad_w) {
            *w -= options.learning_rate * (g / n + options.l2 * *w);
        }
        bias -= options.learning_rate * grad_b / n;
    }

    if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
        return Err(AnalysisError::Training(
            "gradient descent diverged".to_string(),
        ));
    }

    let predictions: Vec<f64> = z.iter().map(|row| logistic(bias + dot(&weights, row))).collect();
    let ss_res: f64 = predictions
        .iter()
        .zip(&labels)
        .map(|(p, y)| (p - y).powi(2))
        .sum();
    let label_mean = mean(&labels).unwrap_or(0.0);
    let ss_tot: f64 = labels.iter().map(|y| (y - label_mean).powi(2)).sum();

    let report = TrainingReport {
        indicator,
        samples: samples.len(),
        mse: ss_res / n,
        r_squared: 1.0 - ss_res / ss_tot,
    };
    debug!(%indicator, samples = report.samples, mse = report.mse, r_squared = report.r_squared, "trained model");

    let model = LinearIndicatorModel {
        indicator,
        version: options.version.clone(),
        schema_version: FEATURE_SCHEMA_VERSION.to_string(),
        features: names,
        means,
        stds,
        weights,
        bias,
        training_samples: samples.len(),
    };
    model.validate()?;
    Ok((model, report))
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Scores of a model as one feature sweeps a range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonotonicityProbe {
    pub feature: String,
    pub values: Vec<f64>,
    pub scores: Vec<f64>,
    /// No score decreased as the feature increased
    pub non_decreasing: bool,
}

/// Sweep `feature` from `start` to `end` in `steps` points over `base`
pub fn probe_monotonicity(
    model: &dyn IndicatorModel,
    base: &FeatureVector,
    feature: &str,
    start: f64,
    end: f64,
    steps: usize,
) -> Result<MonotonicityProbe, AnalysisError> {
    if steps < 2 || start.is_nan() || end.is_nan() || end <= start {
        return Err(AnalysisError::InvalidConfig(
            "a probe needs at least 2 steps over an increasing range".to_string(),
        ));
    }

    let values: Vec<f64> = (0..steps)
        .map(|i| start + (end - start) * i as f64 / (steps - 1) as f64)
        .collect();
    let scores = values
        .iter()
        .map(|v| {
            let probe = base.clone().with_value(feature, *v);
            model.predict(&probe).map(|p| p.score)
        })
        .collect::<Result<Vec<f64>, AnalysisError>>()?;
    let non_decreasing = scores.windows(2).all(|w| w[1] >= w[0]);

    Ok(MonotonicityProbe {
        feature: feature.to_string(),
        values,
        scores,
        non_decreasing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::*;

    /// Labels follow a known logistic function of error rate and reaction time
    fn synthetic_samples(n: usize) -> Vec<TrainingSample> {
        (0..n)
            .map(|i| {
                let error_rate = (i % 10) as f64 / 20.0;
                let rt_mean = 600.0 + ((i * 37) % 11) as f64 * 50.0;
                let mut features = BTreeMap::new();
                features.insert(REACTION_TIME_MEAN.to_string(), rt_mean);
                features.insert(REACTION_TIME_STD.to_string(), 200.0 + ((i * 13) % 7) as f64 * 30.0);
                features.insert(ERROR_RATE.to_string(), error_rate);
                features.insert(ATTENTION_LAPSE_RATE.to_string(), ((i * 7) % 5) as f64 * 0.02);
                features.insert(DECISION_CONSISTENCY.to_string(), 0.5 + ((i * 3) % 4) as f64 * 0.1);
                features.insert(HESITATION_FREQUENCY.to_string(), ((i * 11) % 6) as f64 * 0.05);
                let label = logistic(6.0 * (error_rate - 0.2) + 0.002 * (rt_mean - 850.0));
                TrainingSample { features, label }
            })
            .collect()
    }

    #[test]
    fn test_training_fits_known_relationship() {
        let samples = synthetic_samples(60);
        let (model, report) =
            train_indicator_model(Indicator::Attention, &samples, &TrainingOptions::default())
                .unwrap();

        assert_eq!(report.samples, 60);
        assert!(report.r_squared > 0.8, "r_squared = {}", report.r_squared);
        assert!(report.mse < 0.01, "mse = {}", report.mse);
        assert_eq!(model.training_samples, 60);

        let error_idx = model.features.iter().position(|f| f == ERROR_RATE).unwrap();
        assert!(model.weights[error_idx] > 0.0);
    }

    #[test]
    fn test_training_is_deterministic() {
        let samples = synthetic_samples(30);
        let options = TrainingOptions {
            epochs: 200,
            ..TrainingOptions::default()
        };
        let first = train_indicator_model(Indicator::Attention, &samples, &options).unwrap();
        let second = train_indicator_model(Indicator::Attention, &samples, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_training_requires_enough_samples() {
        let samples = synthetic_samples(9);
        let err = train_indicator_model(Indicator::Attention, &samples, &TrainingOptions::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_training_requires_label_variance() {
        let mut samples = synthetic_samples(12);
        for s in samples.iter_mut() {
            s.label = 0.4;
        }
        let err = train_indicator_model(Indicator::Attention, &samples, &TrainingOptions::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Training(_)));
    }

    #[test]
    fn test_training_reports_missing_features() {
        let samples = synthetic_samples(12);
        // Anxiety reads stress_mean, which the samples lack
        let err = train_indicator_model(Indicator::Anxiety, &samples, &TrainingOptions::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_probe_detects_monotone_and_decreasing_features() {
        let model = LinearIndicatorModel::heuristic(Indicator::Attention);
        let base = FeatureVector::default();

        let probe = probe_monotonicity(&model, &base, REACTION_TIME_MEAN, 200.0, 3000.0, 15).unwrap();
        assert!(probe.non_decreasing);
        assert_eq!(probe.scores.len(), 15);

        let probe = probe_monotonicity(&model, &base, ATTENTION_LAPSE_RATE, 0.0, 0.5, 10).unwrap();
        assert!(probe.non_decreasing);

        // Consistency lowers attention concern
        let probe = probe_monotonicity(&model, &base, DECISION_CONSISTENCY, 0.0, 1.0, 10).unwrap();
        assert!(!probe.non_decreasing);

        assert!(probe_monotonicity(&model, &base, ERROR_RATE, 1.0, 0.0, 5).is_err());
    }
}
