//! Report assembly
//!
//! Packages the pipeline outputs into the versioned `AnalysisReport` record
//! and renders the plain-language summary.

use crate::aggregator::AggregateScore;
use crate::cluster::ClusterAssignment;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::norms::NormBand;
use crate::features::{FeatureVector, ENGAGEMENT_TREND};
use crate::features::stats::mean;
use crate::store::WindowBatch;
use crate::types::{
    AnalysisReport, GamePerformance, GameType, Insights, Recommendation, ReportMetadata,
    ReportType, SessionData, TrendDirection,
};
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Format version of `AnalysisReport`
pub const REPORT_VERSION: &str = "1.0.0";

/// Relative engagement change treated as a real trend
pub const ENGAGEMENT_TREND_THRESHOLD: f64 = 0.1;

/// Attached to every report
pub const DISCLAIMER: &str = "This report describes patterns in gameplay behavior. \
It is not a diagnosis and does not replace assessment by a qualified professional.";

/// Everything the pipeline produced for one report
pub struct ReportParts<'a> {
    pub user_id: &'a str,
    pub report_type: ReportType,
    pub batch: &'a WindowBatch,
    pub features: &'a FeatureVector,
    pub insights: Insights,
    pub aggregate: AggregateScore,
    pub recommendations: Vec<Recommendation>,
    pub cluster: Option<ClusterAssignment>,
    pub normative_comparison: BTreeMap<String, NormBand>,
    pub model_versions: BTreeMap<String, String>,
}

/// Report assembler
pub struct ReportAssembler {
    low_confidence_cutoff: f64,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl ReportAssembler {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            low_confidence_cutoff: config.low_confidence_cutoff,
        }
    }

    /// Build the report record
    pub fn assemble(&self, parts: ReportParts<'_>) -> AnalysisReport {
        let sessions_analyzed = parts.batch.sessions.len();
        let engagement_trend = engagement_direction(parts.features);
        let summary = self.summary(
            sessions_analyzed,
            &parts.insights,
            &parts.aggregate,
            engagement_trend,
        );

        let metadata = ReportMetadata {
            analyzed_session_ids: parts.batch.session_ids(),
            excluded_sessions: parts.batch.excluded.clone(),
            partial_sessions: parts.batch.partial.clone(),
            dropped_events: parts.batch.dropped_events,
            game_performance: game_performance(&parts.batch.sessions),
            imputed_features: parts.features.imputed_features(),
            feature_schema_version: parts.features.schema_version.clone(),
            model_versions: parts.model_versions,
            cluster: parts.cluster,
            key_findings: parts.aggregate.key_findings,
            risk: parts.aggregate.risk,
            engagement_trend,
            normative_comparison: parts.normative_comparison,
            disclaimer: DISCLAIMER.to_string(),
        };

        AnalysisReport {
            id: Uuid::new_v4().to_string(),
            report_version: REPORT_VERSION.to_string(),
            user_id: parts.user_id.to_string(),
            generated_at: Utc::now(),
            report_type: parts.report_type,
            sessions_analyzed,
            analysis_period: parts.batch.period,
            overall_wellbeing_score: parts.aggregate.wellbeing,
            confidence_score: parts.aggregate.confidence,
            insights: parts.insights,
            recommendations: parts.recommendations,
            summary,
            metadata,
        }
    }

    fn summary(
        &self,
        sessions: usize,
        insights: &Insights,
        aggregate: &AggregateScore,
        engagement: TrendDirection,
    ) -> String {
        let mut parts = Vec::new();

        match insights.dominant() {
            Some((indicator, result)) => parts.push(format!(
                "Across {sessions} sessions, {indicator} indicators were the most prominent, at a {} level.",
                result.level.as_str()
            )),
            None => parts.push(format!(
                "Across {sessions} sessions, no indicator could be evaluated."
            )),
        }

        parts.push(format!(
            "The overall wellbeing score is {:.0}%.",
            aggregate.wellbeing * 100.0
        ));

        match engagement {
            TrendDirection::Increasing => {
                parts.push("Engagement with the games increased over the period.".to_string())
            }
            TrendDirection::Decreasing => {
                parts.push("Engagement with the games decreased over the period.".to_string())
            }
            TrendDirection::Stable => {
                parts.push("Engagement with the games stayed steady.".to_string())
            }
            TrendDirection::InsufficientData => {}
        }

        if aggregate.confidence < self.low_confidence_cutoff {
            parts.push(
                "Confidence in these results is low. Playing more sessions will give a clearer picture."
                    .to_string(),
            );
        }

        parts.join(" ")
    }
}

/// Direction of the engagement trend feature
pub fn engagement_direction(features: &FeatureVector) -> TrendDirection {
    if features.is_imputed(ENGAGEMENT_TREND) {
        return TrendDirection::InsufficientData;
    }
    match features.get(ENGAGEMENT_TREND) {
        Some(v) if v > ENGAGEMENT_TREND_THRESHOLD => TrendDirection::Increasing,
        Some(v) if v < -ENGAGEMENT_TREND_THRESHOLD => TrendDirection::Decreasing,
        Some(_) => TrendDirection::Stable,
        None => TrendDirection::InsufficientData,
    }
}

/// Session-summary statistics grouped by game type
pub fn game_performance(sessions: &[SessionData]) -> BTreeMap<GameType, GamePerformance> {
    let mut by_game: BTreeMap<GameType, Vec<&SessionData>> = BTreeMap::new();
    for data in sessions {
        by_game.entry(data.session.game_type).or_default().push(data);
    }

    by_game
        .into_iter()
        .map(|(game, group)| {
            let avg = |f: fn(&SessionData) -> f64| {
                let values: Vec<f64> = group.iter().map(|d| f(d)).collect();
                mean(&values).unwrap_or(0.0)
            };
            let performance = GamePerformance {
                session_count: group.len(),
                avg_score: avg(|d| d.session.final_score as f64),
                avg_duration_sec: avg(|d| d.session.duration_sec()),
                avg_accuracy: avg(|d| d.session.accuracy),
                avg_level_reached: avg(|d| f64::from(d.session.level_reached)),
                avg_consistency: avg(|d| d.session.consistency_score),
                completion_rate: avg(|d| if d.session.completed { 1.0 } else { 0.0 }),
            };
            (game, performance)
        })
        .collect()
}

/// Encode a report as pretty JSON
pub fn report_to_json(report: &AnalysisReport) -> Result<String, AnalysisError> {
    serde_json::to_string_pretty(report).map_err(AnalysisError::JsonError)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::aggregator::aggregate;

    fn assemble(insights: Insights, features: &FeatureVector, sessions: usize) -> AnalysisReport {
        let config = AnalysisConfig::default();
        let batch = batch(sessions);
        let aggregate = aggregate(&insights, sessions, features, &config);
        ReportAssembler::new(&config).assemble(ReportParts {
            user_id: "u1",
            report_type: ReportType::Therapist,
            batch: &batch,
            features,
            insights,
            aggregate,
            recommendations: vec![],
            cluster: None,
            normative_comparison: BTreeMap::new(),
            model_versions: BTreeMap::new(),
        })
    }

    #[test]
    fn test_report_fields() {
        let features = FeatureVector::default().with_value(ENGAGEMENT_TREND, 0.4);
        let insights = Insights {
            anxiety: result(0.2),
            depression: result(0.7),
            attention: result(0.4),
        };
        let report = assemble(insights, &features, 12);

        assert!(Uuid::parse_str(&report.id).is_ok());
        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.report_type, ReportType::Therapist);
        assert_eq!(report.sessions_analyzed, 12);
        assert_eq!(report.metadata.analyzed_session_ids.len(), 12);
        assert_eq!(report.metadata.engagement_trend, TrendDirection::Increasing);
        assert_eq!(report.metadata.disclaimer, DISCLAIMER);
        assert!(!report.metadata.imputed_features.contains(&ENGAGEMENT_TREND.to_string()));
        assert!(report.summary.contains("depression indicators were the most prominent, at a high level"));
        assert!(report.summary.contains("increased"));
        assert!(!report.summary.contains("Confidence in these results is low"));
    }

    #[test]
    fn test_summary_low_confidence_note() {
        let insights = Insights {
            anxiety: result(0.2),
            depression: result(0.2),
            attention: result(0.2),
        };
        let report = assemble(insights, &FeatureVector::default(), 3);
        assert!(report.confidence_score < 0.3);
        assert!(report.summary.contains("Confidence in these results is low"));
        // Imputed engagement trend is not mentioned
        assert_eq!(report.metadata.engagement_trend, TrendDirection::InsufficientData);
        assert!(!report.summary.contains("Engagement"));
    }

    #[test]
    fn test_engagement_direction() {
        let base = FeatureVector::default();
        assert_eq!(engagement_direction(&base), TrendDirection::InsufficientData);
        let steady = base.clone().with_value(ENGAGEMENT_TREND, 0.05);
        assert_eq!(engagement_direction(&steady), TrendDirection::Stable);
        let falling = base.with_value(ENGAGEMENT_TREND, -0.5);
        assert_eq!(engagement_direction(&falling), TrendDirection::Decreasing);
    }

    #[test]
    fn test_game_performance_by_type() {
        let mut batch = batch(3);
        batch.sessions[1].session.game_type = GameType::StatBalance;
        batch.sessions[1].session.final_score = 40;
        batch.sessions[2].session.final_score = 300;
        batch.sessions[2].session.completed = false;
        batch.sessions[2].session.level_reached = 4;

        let stats = game_performance(&batch.sessions);
        assert_eq!(stats.len(), 2);

        let catch = &stats[&GameType::CatchThought];
        assert_eq!(catch.session_count, 2);
        assert_eq!(catch.avg_score, 200.0);
        assert_eq!(catch.avg_duration_sec, 240.0);
        assert_eq!(catch.avg_level_reached, 3.0);
        assert_eq!(catch.completion_rate, 0.5);

        let stat = &stats[&GameType::StatBalance];
        assert_eq!(stat.session_count, 1);
        assert_eq!(stat.avg_score, 40.0);
        assert_eq!(stat.completion_rate, 1.0);
    }

    #[test]
    fn test_report_carries_game_performance() {
        let report = sample_report("u1");
        let stats = &report.metadata.game_performance[&GameType::CatchThought];
        assert_eq!(stats.session_count, 5);
        let json = report_to_json(&report).unwrap();
        assert!(json.contains("\"catch_thought\""));
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = sample_report("u1");
        let json = report_to_json(&report).unwrap();
        assert!(json.contains("\"report_type\": \"personal\""));
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, report.id);
        assert_eq!(back.generated_at, report.generated_at);
        assert_eq!(back.summary, report.summary);
        assert_eq!(back.metadata.analyzed_session_ids, report.metadata.analyzed_session_ids);
    }
}
