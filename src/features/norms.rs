//! Normative comparison
//!
//! Places selected features relative to a reference range for the player's
//! age group. The ranges are coarse reference bands, not clinical norms.

use crate::features::{
    FeatureVector, EMOTIONAL_CHOICE_BIAS, ERROR_RATE, HESITATION_FREQUENCY, REACTION_TIME_MEAN,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Age group used to pick the reference ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Child,
    #[default]
    Adolescent,
    YoungAdult,
    Adult,
}

/// Position of a value relative to its reference range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormBand {
    BelowAverage,
    Average,
    AboveAverage,
}

/// Inclusive reference range for one feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormRange {
    pub feature: &'static str,
    pub min: f64,
    pub max: f64,
}

impl NormRange {
    const fn new(feature: &'static str, min: f64, max: f64) -> Self {
        Self { feature, min, max }
    }

    pub fn band(&self, value: f64) -> NormBand {
        if value < self.min {
            NormBand::BelowAverage
        } else if value > self.max {
            NormBand::AboveAverage
        } else {
            NormBand::Average
        }
    }
}

const CHILD: [NormRange; 4] = [
    NormRange::new(REACTION_TIME_MEAN, 800.0, 1600.0),
    NormRange::new(ERROR_RATE, 0.15, 0.5),
    NormRange::new(HESITATION_FREQUENCY, 0.15, 0.5),
    NormRange::new(EMOTIONAL_CHOICE_BIAS, -0.3, 0.2),
];

const ADOLESCENT: [NormRange; 4] = [
    NormRange::new(REACTION_TIME_MEAN, 600.0, 1200.0),
    NormRange::new(ERROR_RATE, 0.1, 0.4),
    NormRange::new(HESITATION_FREQUENCY, 0.1, 0.4),
    NormRange::new(EMOTIONAL_CHOICE_BIAS, -0.3, 0.2),
];

const YOUNG_ADULT: [NormRange; 4] = [
    NormRange::new(REACTION_TIME_MEAN, 500.0, 1000.0),
    NormRange::new(ERROR_RATE, 0.08, 0.35),
    NormRange::new(HESITATION_FREQUENCY, 0.08, 0.35),
    NormRange::new(EMOTIONAL_CHOICE_BIAS, -0.3, 0.2),
];

const ADULT: [NormRange; 4] = [
    NormRange::new(REACTION_TIME_MEAN, 550.0, 1100.0),
    NormRange::new(ERROR_RATE, 0.08, 0.35),
    NormRange::new(HESITATION_FREQUENCY, 0.1, 0.35),
    NormRange::new(EMOTIONAL_CHOICE_BIAS, -0.3, 0.2),
];

impl AgeGroup {
    /// Reference ranges for this group
    pub fn ranges(&self) -> &'static [NormRange] {
        match self {
            AgeGroup::Child => &CHILD,
            AgeGroup::Adolescent => &ADOLESCENT,
            AgeGroup::YoungAdult => &YOUNG_ADULT,
            AgeGroup::Adult => &ADULT,
        }
    }
}

/// Band every normed feature that was actually measured
pub fn compare(features: &FeatureVector, group: AgeGroup) -> BTreeMap<String, NormBand> {
    group
        .ranges()
        .iter()
        .filter(|r| !features.is_imputed(r.feature))
        .filter_map(|r| features.get(r.feature).map(|v| (r.feature.to_string(), r.band(v))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges_are_average() {
        let range = NormRange::new(ERROR_RATE, 0.1, 0.4);
        assert_eq!(range.band(0.1), NormBand::Average);
        assert_eq!(range.band(0.4), NormBand::Average);
        assert_eq!(range.band(0.05), NormBand::BelowAverage);
        assert_eq!(range.band(0.41), NormBand::AboveAverage);
    }

    #[test]
    fn test_compare_skips_imputed() {
        let features = FeatureVector::default()
            .with_value(REACTION_TIME_MEAN, 1500.0)
            .with_value(EMOTIONAL_CHOICE_BIAS, 0.0);

        let bands = compare(&features, AgeGroup::Adolescent);
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[REACTION_TIME_MEAN], NormBand::AboveAverage);
        assert_eq!(bands[EMOTIONAL_CHOICE_BIAS], NormBand::Average);
        assert!(!bands.contains_key(ERROR_RATE));

        // The same reaction time is within range for a child
        let bands = compare(&features, AgeGroup::Child);
        assert_eq!(bands[REACTION_TIME_MEAN], NormBand::Average);
    }
}
