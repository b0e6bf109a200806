//! Analysis configuration
//!
//! Every tunable constant used by the pipeline lives here so that callers can
//! override them explicitly instead of relying on process-wide state. The
//! defaults are heuristic choices, not clinically derived values.

use crate::error::AnalysisError;
use crate::types::{Indicator, IndicatorLevel};
use serde::{Deserialize, Serialize};

/// Default weight of the anxiety indicator in the wellbeing score
pub const DEFAULT_ANXIETY_WEIGHT: f64 = 0.35;

/// Default weight of the depression indicator in the wellbeing score
pub const DEFAULT_DEPRESSION_WEIGHT: f64 = 0.35;

/// Default weight of the attention indicator in the wellbeing score
pub const DEFAULT_ATTENTION_WEIGHT: f64 = 0.30;

/// Scores at or above this are `moderate`
pub const DEFAULT_MODERATE_THRESHOLD: f64 = 0.3;

/// Scores at or above this are `high`
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.6;

/// Minimum usable sessions required to generate a report
pub const MIN_SESSIONS_FOR_REPORT: usize = 3;

/// Session count at which the adequacy factor stops discounting confidence
pub const MIN_SESSIONS_FOR_FULL_CONFIDENCE: usize = 10;

/// Confidence below this is reported as low confidence
pub const LOW_CONFIDENCE_CUTOFF: f64 = 0.3;

/// Wellbeing weights for the three indicators (must sum to 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorWeights {
    pub anxiety: f64,
    pub depression: f64,
    pub attention: f64,
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            anxiety: DEFAULT_ANXIETY_WEIGHT,
            depression: DEFAULT_DEPRESSION_WEIGHT,
            attention: DEFAULT_ATTENTION_WEIGHT,
        }
    }
}

impl IndicatorWeights {
    pub fn weight(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::Anxiety => self.anxiety,
            Indicator::Depression => self.depression,
            Indicator::Attention => self.attention,
        }
    }

    fn sum(&self) -> f64 {
        self.anxiety + self.depression + self.attention
    }
}

/// Level thresholds shared by every indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelThresholds {
    pub moderate: f64,
    pub high: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            moderate: DEFAULT_MODERATE_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

impl LevelThresholds {
    /// Bucket a score into a level
    pub fn level_for(&self, score: f64) -> IndicatorLevel {
        if score >= self.high {
            IndicatorLevel::High
        } else if score >= self.moderate {
            IndicatorLevel::Moderate
        } else {
            IndicatorLevel::Low
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub weights: IndicatorWeights,
    pub levels: LevelThresholds,
    /// Fewer usable sessions than this aborts report generation
    pub min_sessions: usize,
    /// Sessions needed before the adequacy factor reaches 1
    pub full_confidence_sessions: usize,
    pub low_confidence_cutoff: f64,
    /// Lapse threshold in session standard deviations above the session mean
    pub lapse_z_threshold: f64,
    /// Sessions with fewer events are not used for lapse detection
    pub lapse_min_events: usize,
    /// Hesitations longer than this count toward hesitation frequency
    pub hesitation_threshold_ms: f64,
    pub max_recommendations: usize,
    pub max_key_patterns: usize,
    pub max_key_findings: usize,
    /// Wellbeing below this triggers the general support recommendations
    pub low_wellbeing_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            weights: IndicatorWeights::default(),
            levels: LevelThresholds::default(),
            min_sessions: MIN_SESSIONS_FOR_REPORT,
            full_confidence_sessions: MIN_SESSIONS_FOR_FULL_CONFIDENCE,
            low_confidence_cutoff: LOW_CONFIDENCE_CUTOFF,
            lapse_z_threshold: 2.0,
            lapse_min_events: 5,
            hesitation_threshold_ms: 1000.0,
            max_recommendations: 5,
            max_key_patterns: 3,
            max_key_findings: 5,
            low_wellbeing_threshold: 0.4,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let w = &self.weights;
        if [w.anxiety, w.depression, w.attention]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(AnalysisError::InvalidConfig(
                "indicator weights must be finite and non-negative".to_string(),
            ));
        }
        if (w.sum() - 1.0).abs() > 1e-6 {
            return Err(AnalysisError::InvalidConfig(format!(
                "indicator weights must sum to 1, got {:.4}",
                w.sum()
            )));
        }

        let l = &self.levels;
        if !(0.0 < l.moderate && l.moderate < l.high && l.high <= 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "level thresholds must satisfy 0 < moderate < high <= 1, got {} / {}",
                l.moderate, l.high
            )));
        }

        if self.min_sessions == 0 || self.full_confidence_sessions < self.min_sessions {
            return Err(AnalysisError::InvalidConfig(
                "full_confidence_sessions must be >= min_sessions >= 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.low_confidence_cutoff) {
            return Err(AnalysisError::InvalidConfig(
                "low_confidence_cutoff must be within [0, 1]".to_string(),
            ));
        }
        if self.lapse_z_threshold <= 0.0 || self.lapse_min_events < 2 {
            return Err(AnalysisError::InvalidConfig(
                "lapse detection needs a positive z threshold and at least 2 events".to_string(),
            ));
        }
        if self.max_recommendations == 0 || self.max_key_patterns == 0 {
            return Err(AnalysisError::InvalidConfig(
                "recommendation and pattern limits must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Session adequacy factor applied to the overall confidence
    pub fn session_adequacy(&self, sessions: usize) -> f64 {
        (sessions as f64 / self.full_confidence_sessions as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.weights.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_level_boundaries() {
        let levels = LevelThresholds::default();
        assert_eq!(levels.level_for(0.0), IndicatorLevel::Low);
        assert_eq!(levels.level_for(0.2999), IndicatorLevel::Low);
        assert_eq!(levels.level_for(0.3), IndicatorLevel::Moderate);
        assert_eq!(levels.level_for(0.5999), IndicatorLevel::Moderate);
        assert_eq!(levels.level_for(0.6), IndicatorLevel::High);
        assert_eq!(levels.level_for(1.0), IndicatorLevel::High);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AnalysisConfig::from_json(r#"{ "min_sessions": 4 }"#).unwrap();
        assert_eq!(config.min_sessions, 4);
        assert_eq!(config.full_confidence_sessions, MIN_SESSIONS_FOR_FULL_CONFIDENCE);
        assert_eq!(config.weights, IndicatorWeights::default());
    }

    #[test]
    fn test_rejects_bad_weights() {
        let json = r#"{ "weights": { "anxiety": 0.5, "depression": 0.5, "attention": 0.5 } }"#;
        let err = AnalysisConfig::from_json(json).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = AnalysisConfig::default();
        config.levels = LevelThresholds {
            moderate: 0.7,
            high: 0.4,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_adequacy() {
        let config = AnalysisConfig::default();
        assert!((config.session_adequacy(3) - 0.3).abs() < 1e-12);
        assert_eq!(config.session_adequacy(10), 1.0);
        assert_eq!(config.session_adequacy(25), 1.0);
    }
}
