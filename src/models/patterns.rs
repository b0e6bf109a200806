//! Key pattern rules
//!
//! Each indicator has a static table of feature thresholds. A rule fires when
//! its feature was measured (not imputed) and crosses the threshold; fired
//! rules are reported in table order.

use crate::features::*;
use crate::types::Indicator;

/// Direction of a threshold comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Above,
    Below,
}

/// One thresholded finding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternRule {
    pub feature: &'static str,
    pub cmp: Cmp,
    pub threshold: f64,
    pub text: &'static str,
}

impl PatternRule {
    const fn above(feature: &'static str, threshold: f64, text: &'static str) -> Self {
        Self {
            feature,
            cmp: Cmp::Above,
            threshold,
            text,
        }
    }

    const fn below(feature: &'static str, threshold: f64, text: &'static str) -> Self {
        Self {
            feature,
            cmp: Cmp::Below,
            threshold,
            text,
        }
    }

    /// Whether the rule fires for the given vector
    pub fn matches(&self, features: &FeatureVector) -> bool {
        if features.is_imputed(self.feature) {
            return false;
        }
        match (features.get(self.feature), self.cmp) {
            (Some(v), Cmp::Above) => v > self.threshold,
            (Some(v), Cmp::Below) => v < self.threshold,
            (None, _) => false,
        }
    }
}

pub const ANXIETY_PATTERNS: &[PatternRule] = &[
    PatternRule::above(
        HESITATION_FREQUENCY,
        0.3,
        "Frequent hesitation before decisions",
    ),
    PatternRule::above(
        REACTION_TIME_STD,
        500.0,
        "Highly variable response times under pressure",
    ),
    PatternRule::above(STRESS_MEAN, 6.0, "Elevated self-reported stress during play"),
    PatternRule::above(
        EMOTIONAL_CHOICE_BIAS,
        0.2,
        "Tendency to pick negatively framed options",
    ),
];

pub const DEPRESSION_PATTERNS: &[PatternRule] = &[
    PatternRule::above(
        REACTION_TIME_MEAN,
        1200.0,
        "Slower reaction times may indicate reduced engagement",
    ),
    PatternRule::above(
        EMOTIONAL_CHOICE_BIAS,
        0.3,
        "Strong bias toward negative emotional choices",
    ),
    PatternRule::below(ENGAGEMENT_TREND, -0.3, "Declining play frequency over the period"),
    PatternRule::above(
        ATTENTION_LAPSE_RATE,
        0.1,
        "Frequent disengaged, unusually slow responses",
    ),
];

pub const ATTENTION_PATTERNS: &[PatternRule] = &[
    PatternRule::above(
        ATTENTION_LAPSE_RATE,
        0.1,
        "Frequent attention lapses detected during gameplay",
    ),
    PatternRule::below(
        DECISION_CONSISTENCY,
        0.5,
        "Inconsistent performance across difficulty levels",
    ),
    PatternRule::above(ERROR_RATE, 0.3, "Low accuracy on focus-dependent tasks"),
    PatternRule::above(
        REACTION_TIME_STD,
        600.0,
        "Highly variable reaction times suggest attention fluctuations",
    ),
];

pub fn rules_for(indicator: Indicator) -> &'static [PatternRule] {
    match indicator {
        Indicator::Anxiety => ANXIETY_PATTERNS,
        Indicator::Depression => DEPRESSION_PATTERNS,
        Indicator::Attention => ATTENTION_PATTERNS,
    }
}

fn generic_pattern(indicator: Indicator) -> &'static str {
    match indicator {
        Indicator::Anxiety => "High anxiety patterns detected in gameplay behavior",
        Indicator::Depression => "Behavioral patterns consistent with low mood",
        Indicator::Attention => "Significant attention difficulties observed",
    }
}

/// Up to `max` findings for an indicator
///
/// When no rule fires but the score reached `high_threshold`, a generic
/// finding is returned so a high result is never unexplained.
pub fn key_patterns(
    indicator: Indicator,
    features: &FeatureVector,
    score: f64,
    high_threshold: f64,
    max: usize,
) -> Vec<String> {
    let mut patterns: Vec<String> = rules_for(indicator)
        .iter()
        .filter(|rule| rule.matches(features))
        .take(max)
        .map(|rule| rule.text.to_string())
        .collect();

    if patterns.is_empty() && score >= high_threshold && max > 0 {
        patterns.push(generic_pattern(indicator).to_string());
    }
    patterns
}
