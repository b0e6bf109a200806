//! Longitudinal trends
//!
//! Compares a user's successive reports to show how each indicator is moving
//! and whether the overall picture is improving.

use crate::error::AnalysisError;
use crate::features::stats::{index_slope, mean};
use crate::types::{AnalysisReport, Indicator, TrendDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-report slope above which a score counts as moving
pub const TREND_SLOPE_THRESHOLD: f64 = 0.02;

/// Early-vs-recent concern difference above which the trajectory changes
pub const TRAJECTORY_THRESHOLD: f64 = 0.1;

/// Points needed before a slope is reported
pub const MIN_TREND_POINTS: usize = 3;

/// Overall direction across indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Improving,
    Declining,
    Stable,
}

/// Movement of one score over the report history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTrend {
    pub direction: TrendDirection,
    /// Change per report (least squares)
    pub slope: Option<f64>,
    pub first: Option<f64>,
    pub latest: Option<f64>,
    /// Number of reports that carried a usable score
    pub points: usize,
}

impl ScoreTrend {
    fn from_scores(scores: &[f64]) -> Self {
        let slope = if scores.len() >= MIN_TREND_POINTS {
            index_slope(scores)
        } else {
            None
        };
        let direction = match slope {
            Some(s) if s > TREND_SLOPE_THRESHOLD => TrendDirection::Increasing,
            Some(s) if s < -TREND_SLOPE_THRESHOLD => TrendDirection::Decreasing,
            Some(_) => TrendDirection::Stable,
            None => TrendDirection::InsufficientData,
        };
        Self {
            direction,
            slope,
            first: scores.first().copied(),
            latest: scores.last().copied(),
            points: scores.len(),
        }
    }
}

/// Trend summary over a report history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongitudinalAnalysis {
    pub reports: usize,
    pub timespan_days: f64,
    pub sessions_per_day: f64,
    /// Concern trend per indicator name
    pub indicators: BTreeMap<String, ScoreTrend>,
    pub wellbeing: ScoreTrend,
    /// Mean drop in concern from the early half to the recent half
    pub improvement_score: f64,
    pub trajectory: Trajectory,
}

/// Analyze a user's reports
///
/// Reports are ordered by generation time before analysis. Degraded
/// indicator results are skipped.
pub fn analyze_trends(reports: &[AnalysisReport]) -> Result<LongitudinalAnalysis, AnalysisError> {
    if reports.len() < 2 {
        return Err(AnalysisError::InsufficientData(
            "at least 2 reports are needed for trend analysis".to_string(),
        ));
    }
    if let Some(other) = reports.iter().find(|r| r.user_id != reports[0].user_id) {
        return Err(AnalysisError::ParseError(format!(
            "reports belong to different users ({} and {})",
            reports[0].user_id, other.user_id
        )));
    }

    let mut ordered: Vec<&AnalysisReport> = reports.iter().collect();
    ordered.sort_by_key(|r| r.generated_at);

    let half = ordered.len() / 2;
    let mut indicators = BTreeMap::new();
    let mut improvements = Vec::new();
    for indicator in Indicator::ALL {
        let scores = usable_scores(&ordered, indicator);
        indicators.insert(indicator.to_string(), ScoreTrend::from_scores(&scores));

        let early = usable_scores(&ordered[..half], indicator);
        let recent = usable_scores(&ordered[ordered.len() - half..], indicator);
        if let (Some(e), Some(r)) = (mean(&early), mean(&recent)) {
            improvements.push(e - r);
        }
    }

    let wellbeing: Vec<f64> = ordered.iter().map(|r| r.overall_wellbeing_score).collect();
    let improvement_score = mean(&improvements).unwrap_or(0.0);
    let trajectory = if improvement_score > TRAJECTORY_THRESHOLD {
        Trajectory::Improving
    } else if improvement_score < -TRAJECTORY_THRESHOLD {
        Trajectory::Declining
    } else {
        Trajectory::Stable
    };

    let (first, last) = (ordered[0], ordered[ordered.len() - 1]);
    let timespan_days = (last.generated_at - first.generated_at).num_seconds() as f64 / 86_400.0;
    let sessions: usize = ordered.iter().map(|r| r.sessions_analyzed).sum();

    Ok(LongitudinalAnalysis {
        reports: ordered.len(),
        timespan_days,
        sessions_per_day: sessions as f64 / timespan_days.max(1.0),
        indicators,
        wellbeing: ScoreTrend::from_scores(&wellbeing),
        improvement_score,
        trajectory,
    })
}

fn usable_scores(reports: &[&AnalysisReport], indicator: Indicator) -> Vec<f64> {
    reports
        .iter()
        .map(|r| r.insights.get(indicator))
        .filter(|result| !result.degraded)
        .map(|result| result.score)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::sample_report;
    use chrono::Duration;

    fn history(anxiety: &[f64], attention: &[f64]) -> Vec<AnalysisReport> {
        anxiety
            .iter()
            .zip(attention)
            .enumerate()
            .map(|(i, (a, t))| {
                let mut report = sample_report("u1");
                report.generated_at += Duration::days(7 * i as i64);
                report.insights.anxiety.score = *a;
                report.insights.attention.score = *t;
                report.insights.depression.score = 0.3;
                report.overall_wellbeing_score = 1.0 - (a + t + 0.3) / 3.0;
                report
            })
            .collect()
    }

    #[test]
    fn test_needs_two_reports() {
        let reports = history(&[0.5], &[0.5]);
        assert!(matches!(
            analyze_trends(&reports),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_two_reports_have_no_slope() {
        let analysis = analyze_trends(&history(&[0.8, 0.2], &[0.5, 0.5])).unwrap();
        assert_eq!(
            analysis.indicators["anxiety"].direction,
            TrendDirection::InsufficientData
        );
        // Early vs recent still yields a trajectory: (0.6 + 0 + 0) / 3
        assert!((analysis.improvement_score - 0.2).abs() < 1e-12);
        assert_eq!(analysis.trajectory, Trajectory::Improving);
    }

    #[test]
    fn test_directions() {
        let analysis =
            analyze_trends(&history(&[0.7, 0.6, 0.5, 0.4], &[0.2, 0.3, 0.4, 0.5])).unwrap();
        assert_eq!(analysis.indicators["anxiety"].direction, TrendDirection::Decreasing);
        assert_eq!(analysis.indicators["attention"].direction, TrendDirection::Increasing);
        assert_eq!(analysis.indicators["depression"].direction, TrendDirection::Stable);
        assert_eq!(analysis.trajectory, Trajectory::Stable);
        assert!((analysis.timespan_days - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_declining_trajectory() {
        let analysis = analyze_trends(&history(&[0.2, 0.2, 0.7, 0.8], &[0.1, 0.2, 0.6, 0.7])).unwrap();
        assert_eq!(analysis.trajectory, Trajectory::Declining);
        assert_eq!(analysis.wellbeing.direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_order_independent_and_skips_degraded() {
        let mut reports = history(&[0.7, 0.6, 0.5, 0.4], &[0.2, 0.3, 0.4, 0.5]);
        reports[1].insights.anxiety.degraded = true;
        reports.reverse();
        let analysis = analyze_trends(&reports).unwrap();
        assert_eq!(analysis.indicators["anxiety"].points, 3);
        assert_eq!(analysis.indicators["anxiety"].first, Some(0.7));
        assert_eq!(analysis.indicators["anxiety"].latest, Some(0.4));
    }

    #[test]
    fn test_rejects_mixed_users() {
        let mut reports = history(&[0.5, 0.5], &[0.5, 0.5]);
        reports[1].user_id = "u2".to_string();
        assert!(analyze_trends(&reports).is_err());
    }
}
