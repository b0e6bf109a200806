//! Behavioral archetype clustering
//!
//! At analysis time a feature vector is assigned to the nearest archetype
//! centroid in z-normalized space. Centroids are fit offline with a
//! deterministic k-means. The assignment is context for the reader of a
//! report and never feeds into any score.

use crate::error::AnalysisError;
use crate::features::stats::{mean, std_dev};
use crate::features::{
    FeatureVector, ATTENTION_LAPSE_RATE, DECISION_CONSISTENCY, ERROR_RATE, REACTION_TIME_MEAN,
    REACTION_TIME_STD,
};
use crate::models::linear::reference_stats;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Features used for clustering, in centroid order
pub const CLUSTER_FEATURES: [&str; 5] = [
    REACTION_TIME_MEAN,
    REACTION_TIME_STD,
    ERROR_RATE,
    DECISION_CONSISTENCY,
    ATTENTION_LAPSE_RATE,
];

/// Iteration cap for the offline fit
pub const MAX_KMEANS_ITERATIONS: usize = 100;

/// Named behavioral archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    FastAccurate,
    SlowConsistent,
    Erratic,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [
        Archetype::FastAccurate,
        Archetype::SlowConsistent,
        Archetype::Erratic,
    ];

    /// Short framing shown next to the archetype
    pub fn description(&self) -> &'static str {
        match self {
            Archetype::FastAccurate => "Quick decision-making with high accuracy",
            Archetype::SlowConsistent => "Thoughtful, deliberate approach that favors accuracy over speed",
            Archetype::Erratic => "Variable performance from one decision to the next",
        }
    }
}

/// Nearest archetype for one feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub archetype: Archetype,
    pub cluster_index: usize,
    /// Distance to the assigned centroid in normalized units
    pub distance: f64,
    /// Separation margin `(b - a) / max(a, b)` against the runner-up centroid
    pub quality: f64,
}

/// Centroid in raw feature units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub archetype: Archetype,
    pub center: Vec<f64>,
}

/// Outcome of an offline fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub samples: usize,
    pub iterations: usize,
    pub cluster_sizes: Vec<usize>,
    pub mean_silhouette: f64,
}

/// Nearest-centroid archetype lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralClusterer {
    /// Normalization mean per clustering feature
    pub means: Vec<f64>,
    /// Normalization std per clustering feature (> 0)
    pub stds: Vec<f64>,
    pub centroids: Vec<Centroid>,
}

impl Default for BehavioralClusterer {
    /// Hand-placed archetype centroids over the reference distribution
    fn default() -> Self {
        let (means, stds) = CLUSTER_FEATURES.iter().map(|f| reference_stats(f)).unzip();
        Self {
            means,
            stds,
            centroids: vec![
                Centroid {
                    archetype: Archetype::FastAccurate,
                    center: vec![650.0, 180.0, 0.08, 0.9, 0.02],
                },
                Centroid {
                    archetype: Archetype::SlowConsistent,
                    center: vec![1250.0, 250.0, 0.12, 0.85, 0.03],
                },
                Centroid {
                    archetype: Archetype::Erratic,
                    center: vec![900.0, 550.0, 0.35, 0.45, 0.1],
                },
            ],
        }
    }
}

impl BehavioralClusterer {
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let clusterer: BehavioralClusterer = serde_json::from_str(json)
            .map_err(|e| AnalysisError::ModelArtifact(format!("invalid cluster JSON: {}", e)))?;
        clusterer.validate()?;
        Ok(clusterer)
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

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let dims = CLUSTER_FEATURES.len();
        let shapes_ok = self.means.len() == dims
            && self.stds.len() == dims
            && !self.centroids.is_empty()
            && self.centroids.iter().all(|c| c.center.len() == dims);
        if !shapes_ok {
            return Err(AnalysisError::ModelArtifact(format!(
                "clusterer needs {} normalization values and at least one {}-dimensional centroid",
                dims, dims
            )));
        }
        if self.stds.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(AnalysisError::ModelArtifact(
                "clusterer stds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Assign a vector to its nearest archetype
    ///
    /// Returns None when a clustering feature is absent or was imputed, since
    /// the placement would then reflect defaults rather than behavior.
    pub fn assign(&self, features: &FeatureVector) -> Option<ClusterAssignment> {
        let mut point = Vec::with_capacity(CLUSTER_FEATURES.len());
        for name in CLUSTER_FEATURES {
            if features.is_imputed(name) {
                return None;
            }
            point.push(features.get(name)?);
        }
        let point = self.normalize(&point);
        let centers: Vec<Vec<f64>> = self.centroids.iter().map(|c| self.normalize(&c.center)).collect();

        let (index, a, b) = nearest_two(&point, &centers)?;
        let quality = if b.is_finite() && a.max(b) > 0.0 {
            (b - a) / a.max(b)
        } else {
            0.0
        };
        Some(ClusterAssignment {
            archetype: self.centroids[index].archetype,
            cluster_index: index,
            distance: a,
            quality,
        })
    }

    fn normalize(&self, raw: &[f64]) -> Vec<f64> {
        raw.iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    /// Fit archetype centroids over a batch of feature vectors
    ///
    /// Initialisation is farthest-first starting from the first vector, so the
    /// result depends only on the input order.
    pub fn fit(vectors: &[FeatureVector]) -> Result<(Self, FitReport), AnalysisError> {
        let k = Archetype::ALL.len();
        let raw: Vec<Vec<f64>> = vectors
            .iter()
            .filter_map(|v| CLUSTER_FEATURES.iter().map(|f| v.get(f)).collect::<Option<Vec<f64>>>())
            .collect();
        if raw.len() < k {
            return Err(AnalysisError::InsufficientData(format!(
                "{} complete vectors, at least {} required to fit clusters",
                raw.len(),
                k
            )));
        }

        let dims = CLUSTER_FEATURES.len();
        let mut means = Vec::with_capacity(dims);
        let mut stds = Vec::with_capacity(dims);
        for d in 0..dims {
            let column: Vec<f64> = raw.iter().map(|p| p[d]).collect();
            means.push(mean(&column).unwrap_or(0.0));
            stds.push(match std_dev(&column) {
                Some(s) if s > f64::EPSILON => s,
                _ => 1.0,
            });
        }
        let points: Vec<Vec<f64>> = raw
            .iter()
            .map(|p| {
                p.iter()
                    .zip(means.iter().zip(&stds))
                    .map(|(x, (m, s))| (x - m) / s)
                    .collect()
            })
            .collect();

        let mut centers = farthest_first(&points, k);
        let mut labels = vec![usize::MAX; points.len()];
        let mut iterations = 0;
        while iterations < MAX_KMEANS_ITERATIONS {
            iterations += 1;
            let next: Vec<usize> = points
                .iter()
                .map(|p| nearest_two(p, &centers).map(|(i, _, _)| i).unwrap_or(0))
                .collect();
            let changed = next != labels;
            labels = next;
            for (c, center) in centers.iter_mut().enumerate() {
                let members: Vec<&Vec<f64>> = points
                    .iter()
                    .zip(&labels)
                    .filter(|(_, l)| **l == c)
                    .map(|(p, _)| p)
                    .collect();
                if members.is_empty() {
                    continue;
                }
                for (d, value) in center.iter_mut().enumerate() {
                    *value = members.iter().map(|p| p[d]).sum::<f64>() / members.len() as f64;
                }
            }
            if !changed {
                break;
            }
        }

        let archetypes = label_archetypes(&centers);
        let centroids = centers
            .iter()
            .zip(archetypes)
            .map(|(center, archetype)| Centroid {
                archetype,
                center: center
                    .iter()
                    .zip(means.iter().zip(&stds))
                    .map(|(z, (m, s))| z * s + m)
                    .collect(),
            })
            .collect();

        let report = FitReport {
            samples: points.len(),
            iterations,
            cluster_sizes: (0..k).map(|c| labels.iter().filter(|l| **l == c).count()).collect(),
            mean_silhouette: mean_silhouette(&points, &labels, k),
        };
        debug!(samples = report.samples, iterations, silhouette = report.mean_silhouette, "fit clusters");

        Ok((
            Self {
                means,
                stds,
                centroids,
            },
            report,
        ))
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// Index of the nearest center plus the nearest and runner-up distances
///
/// Ties keep the lowest index. The runner-up is infinite with one center.
fn nearest_two(point: &[f64], centers: &[Vec<f64>]) -> Option<(usize, f64, f64)> {
    let mut best: Option<(usize, f64)> = None;
    let mut second = f64::INFINITY;
    for (i, center) in centers.iter().enumerate() {
        let d = distance(point, center);
        match best {
            Some((_, bd)) if d < bd => {
                second = bd;
                best = Some((i, d));
            }
            Some(_) => second = second.min(d),
            None => best = Some((i, d)),
        }
    }
    best.map(|(i, d)| (i, d, second))
}

fn farthest_first(points: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let mut centers = vec![points[0].clone()];
    while centers.len() < k {
        let mut pick = 0;
        let mut pick_dist = -1.0;
        for (i, p) in points.iter().enumerate() {
            let d = centers
                .iter()
                .map(|c| distance(p, c))
                .fold(f64::INFINITY, f64::min);
            if d > pick_dist {
                pick = i;
                pick_dist = d;
            }
        }
        centers.push(points[pick].clone());
    }
    centers
}

/// Name fitted centroids by their normalized profile
///
/// The most irregular centroid (variability, errors and lapses against
/// consistency) is erratic; of the rest, the fastest is fast_accurate.
fn label_archetypes(centers: &[Vec<f64>]) -> Vec<Archetype> {
    let irregularity = |c: &Vec<f64>| c[1] + c[2] + c[4] - c[3];
    let mut order: Vec<usize> = (0..centers.len()).collect();
    order.sort_by(|a, b| irregularity(&centers[*b]).total_cmp(&irregularity(&centers[*a])).then(a.cmp(b)));

    let mut labels = vec![Archetype::SlowConsistent; centers.len()];
    if let Some(erratic) = order.first() {
        labels[*erratic] = Archetype::Erratic;
    }
    let fastest = order
        .iter()
        .skip(1)
        .min_by(|a, b| centers[**a][0].total_cmp(&centers[**b][0]).then(a.cmp(b)));
    if let Some(fast) = fastest {
        labels[*fast] = Archetype::FastAccurate;
    }
    labels
}

fn mean_silhouette(points: &[Vec<f64>], labels: &[usize], k: usize) -> f64 {
    let scores: Vec<f64> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut sums = vec![0.0; k];
            let mut counts = vec![0usize; k];
            for (j, q) in points.iter().enumerate() {
                if i != j {
                    sums[labels[j]] += distance(p, q);
                    counts[labels[j]] += 1;
                }
            }
            let own = labels[i];
            if counts[own] == 0 {
                return 0.0;
            }
            let a = sums[own] / counts[own] as f64;
            let b = (0..k)
                .filter(|c| *c != own && counts[*c] > 0)
                .map(|c| sums[c] / counts[c] as f64)
                .fold(f64::INFINITY, f64::min);
            if !b.is_finite() || a.max(b) <= 0.0 {
                0.0
            } else {
                (b - a) / a.max(b)
            }
        })
        .collect();
    mean(&scores).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(rt: f64, rt_std: f64, err: f64, consistency: f64, lapse: f64) -> FeatureVector {
        FeatureVector::default()
            .with_value(REACTION_TIME_MEAN, rt)
            .with_value(REACTION_TIME_STD, rt_std)
            .with_value(ERROR_RATE, err)
            .with_value(DECISION_CONSISTENCY, consistency)
            .with_value(ATTENTION_LAPSE_RATE, lapse)
    }

    #[test]
    fn test_default_assignment() {
        let clusterer = BehavioralClusterer::default();
        assert!(clusterer.validate().is_ok());

        let fast = clusterer.assign(&vector(620.0, 170.0, 0.05, 0.92, 0.01)).unwrap();
        assert_eq!(fast.archetype, Archetype::FastAccurate);
        assert!(fast.quality > 0.0 && fast.quality <= 1.0);

        let erratic = clusterer.assign(&vector(950.0, 600.0, 0.4, 0.3, 0.15)).unwrap();
        assert_eq!(erratic.archetype, Archetype::Erratic);
    }

    #[test]
    fn test_imputed_features_skip_assignment() {
        let clusterer = BehavioralClusterer::default();
        assert!(clusterer.assign(&FeatureVector::default()).is_none());
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let mut clusterer = BehavioralClusterer::default();
        let twin = clusterer.centroids[2].center.clone();
        clusterer.centroids[0].center = twin.clone();
        clusterer.centroids[1].center = twin.clone();

        let assignment = clusterer
            .assign(&vector(twin[0], twin[1], twin[2], twin[3], twin[4]))
            .unwrap();
        assert_eq!(assignment.cluster_index, 0);
        assert_eq!(assignment.quality, 0.0);
    }

    #[test]
    fn test_fit_separates_archetypes() {
        let mut vectors = Vec::new();
        for i in 0..10 {
            let jitter = i as f64;
            vectors.push(vector(600.0 + jitter * 5.0, 150.0 + jitter, 0.05, 0.95, 0.01));
            vectors.push(vector(1300.0 + jitter * 5.0, 220.0 + jitter, 0.1, 0.9, 0.02));
            vectors.push(vector(900.0 + jitter * 5.0, 650.0 + jitter, 0.45, 0.3, 0.15));
        }

        let (clusterer, report) = BehavioralClusterer::fit(&vectors).unwrap();
        assert_eq!(report.samples, 30);
        assert_eq!(report.cluster_sizes, vec![10, 10, 10]);
        assert!(report.mean_silhouette > 0.7, "silhouette {}", report.mean_silhouette);

        // First vector seeds cluster 0
        assert_eq!(clusterer.centroids[0].archetype, Archetype::FastAccurate);
        let slow = clusterer.assign(&vector(1310.0, 225.0, 0.1, 0.9, 0.02)).unwrap();
        assert_eq!(slow.archetype, Archetype::SlowConsistent);
        let erratic = clusterer.assign(&vector(880.0, 640.0, 0.5, 0.25, 0.2)).unwrap();
        assert_eq!(erratic.archetype, Archetype::Erratic);

        // Deterministic
        let (again, _) = BehavioralClusterer::fit(&vectors).unwrap();
        assert_eq!(again, clusterer);
    }

    #[test]
    fn test_fit_needs_enough_vectors() {
        let vectors = vec![vector(600.0, 150.0, 0.05, 0.95, 0.01)];
        assert!(matches!(
            BehavioralClusterer::fit(&vectors),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_artifact_roundtrip() {
        let clusterer = BehavioralClusterer::default();
        let parsed = BehavioralClusterer::from_json(&clusterer.to_json().unwrap()).unwrap();
        assert_eq!(parsed, clusterer);
        assert!(BehavioralClusterer::from_json(r#"{"means": [], "stds": [], "centroids": []}"#).is_err());
    }
}
