//! Score aggregation
//!
//! Combines the three indicator results into the wellbeing score, the overall
//! confidence, cross-indicator findings and a rule-based risk summary.

use crate::config::AnalysisConfig;
use crate::features::{FeatureVector, EMOTIONAL_CHOICE_BIAS, STRESS_MEAN};
use crate::types::{Indicator, IndicatorLevel, Insights, RiskAssessment, RiskLevel};

/// Wellbeing reported when no indicator could be evaluated
pub const NEUTRAL_WELLBEING: f64 = 0.5;

/// Risk points at or above which risk is high
const HIGH_RISK_POINTS: u32 = 4;

/// Risk points at or above which risk is medium
const MEDIUM_RISK_POINTS: u32 = 2;

/// Output of the aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateScore {
    pub wellbeing: f64,
    pub confidence: f64,
    pub key_findings: Vec<String>,
    pub risk: RiskAssessment,
}

/// Aggregate indicator results for a window of `sessions` sessions
pub fn aggregate(
    insights: &Insights,
    sessions: usize,
    features: &FeatureVector,
    config: &AnalysisConfig,
) -> AggregateScore {
    AggregateScore {
        wellbeing: wellbeing_score(insights, config),
        confidence: overall_confidence(insights, sessions, config),
        key_findings: key_findings(insights, features, config),
        risk: assess_risk(insights),
    }
}

/// Inverse weighted concern over the non-degraded indicators
///
/// Formula: `1 - sum(w_i * score_i) / sum(w_i)`, so the weights of the
/// indicators that could be evaluated are renormalized to sum to 1.
pub fn wellbeing_score(insights: &Insights, config: &AnalysisConfig) -> f64 {
    let (weighted, total) = insights
        .iter()
        .filter(|(_, r)| !r.degraded)
        .fold((0.0, 0.0), |(acc, total), (indicator, result)| {
            let w = config.weights.weight(indicator);
            (acc + w * result.score, total + w)
        });
    if total <= 0.0 {
        return NEUTRAL_WELLBEING;
    }
    (1.0 - weighted / total).clamp(0.0, 1.0)
}

/// Mean indicator confidence discounted by session adequacy
///
/// Degraded indicators contribute a confidence of 0.
pub fn overall_confidence(insights: &Insights, sessions: usize, config: &AnalysisConfig) -> f64 {
    let sum: f64 = insights
        .iter()
        .map(|(_, r)| if r.degraded { 0.0 } else { r.confidence })
        .sum();
    let mean = sum / Indicator::ALL.len() as f64;
    (mean * config.session_adequacy(sessions)).clamp(0.0, 1.0)
}

/// Risk points: 2 per high indicator, 1 per moderate one
pub fn assess_risk(insights: &Insights) -> RiskAssessment {
    let points: u32 = insights
        .iter()
        .filter(|(_, r)| !r.degraded)
        .map(|(_, r)| match r.level {
            IndicatorLevel::High => 2,
            IndicatorLevel::Moderate => 1,
            IndicatorLevel::Low => 0,
        })
        .sum();

    let level = if points >= HIGH_RISK_POINTS {
        RiskLevel::High
    } else if points >= MEDIUM_RISK_POINTS {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let mut concerns: Vec<(Indicator, f64)> = insights
        .iter()
        .filter(|(_, r)| !r.degraded && r.level == IndicatorLevel::High)
        .map(|(i, r)| (i, r.score))
        .collect();
    // Stable sort keeps weight order among equal scores
    concerns.sort_by(|a, b| b.1.total_cmp(&a.1));

    RiskAssessment {
        level,
        points,
        requires_attention: level != RiskLevel::Low,
        primary_concerns: concerns.into_iter().map(|(i, _)| i).collect(),
    }
}

/// Indicator patterns in weight order followed by cross-indicator findings
pub fn key_findings(
    insights: &Insights,
    features: &FeatureVector,
    config: &AnalysisConfig,
) -> Vec<String> {
    let mut findings: Vec<String> = Vec::new();
    let mut push = |finding: String| {
        if !findings.contains(&finding) {
            findings.push(finding);
        }
    };

    for (_, result) in insights.iter() {
        for pattern in &result.key_patterns {
            push(pattern.clone());
        }
    }

    let elevated = |i: Indicator| {
        let r = insights.get(i);
        !r.degraded && r.level >= IndicatorLevel::Moderate
    };
    let measured = |name: &str| {
        if features.is_imputed(name) {
            None
        } else {
            features.get(name)
        }
    };

    if elevated(Indicator::Anxiety) && measured(STRESS_MEAN).is_some_and(|s| s > 7.0) {
        push("Multiple stress indicators present in behavior".to_string());
    }
    if elevated(Indicator::Anxiety) && elevated(Indicator::Attention) {
        push("Worry and focus difficulties appear together".to_string());
    }
    if elevated(Indicator::Depression) && elevated(Indicator::Anxiety) {
        push("Low mood and anxiety indicators are both elevated".to_string());
    }
    if measured(EMOTIONAL_CHOICE_BIAS).is_some_and(|b| b < -0.3) {
        push("Generally optimistic response patterns".to_string());
    }
    let evaluated = insights.iter().filter(|(_, r)| !r.degraded).count();
    if evaluated > 0
        && insights
            .iter()
            .filter(|(_, r)| !r.degraded)
            .all(|(_, r)| r.level == IndicatorLevel::Low)
    {
        push("Overall positive wellbeing indicators".to_string());
    }

    findings.truncate(config.max_key_findings);
    findings
}
