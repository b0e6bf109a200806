//! Pipeline orchestration
//!
//! This module provides the public entry point of FeelSync. It runs the full
//! pipeline from the event store to the assembled report:
//! window collection → feature extraction → indicator models and clustering
//! → aggregation → recommendations → report.

use crate::aggregator::aggregate;
use crate::cluster::BehavioralClusterer;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::norms::{compare, AgeGroup};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::models::ModelContext;
use crate::recommend::recommend;
use crate::report::{ReportAssembler, ReportParts};
use crate::store::{collect_window, EventStore};
use crate::types::{AnalysisPeriod, AnalysisReport, Indicator, IndicatorResult, Insights, ReportType};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Report generator
///
/// Holds everything a run reads. The model context is shared through an
/// `Arc`, so several generators (or threads using one generator) score with
/// the same loaded models.
pub struct ReportGenerator {
    config: AnalysisConfig,
    models: Arc<ModelContext>,
    clusterer: BehavioralClusterer,
    age_group: AgeGroup,
    extractor: FeatureExtractor,
    assembler: ReportAssembler,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        let config = AnalysisConfig::default();
        Self {
            extractor: FeatureExtractor::new(&config),
            assembler: ReportAssembler::new(&config),
            config,
            models: Arc::new(ModelContext::heuristic()),
            clusterer: BehavioralClusterer::default(),
            age_group: AgeGroup::default(),
        }
    }
}

impl ReportGenerator {
    /// Create a generator after validating the configuration
    pub fn new(config: AnalysisConfig, models: Arc<ModelContext>) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            extractor: FeatureExtractor::new(&config),
            assembler: ReportAssembler::new(&config),
            config,
            models,
            clusterer: BehavioralClusterer::default(),
            age_group: AgeGroup::default(),
        })
    }

    pub fn with_clusterer(mut self, clusterer: BehavioralClusterer) -> Self {
        self.clusterer = clusterer;
        self
    }

    pub fn with_age_group(mut self, age_group: AgeGroup) -> Self {
        self.age_group = age_group;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn models(&self) -> &Arc<ModelContext> {
        &self.models
    }

    /// Generate a report for one user's window
    ///
    /// # Errors
    /// - `InsufficientData` when the window holds too few usable sessions
    /// - `SchemaMismatch` when a model cannot read the extracted features
    /// - `EventStore` when the store fails
    ///
    /// A failing indicator model does not fail the report; the indicator is
    /// marked degraded and left out of the aggregate.
    pub fn generate_report(
        &self,
        store: &dyn EventStore,
        user_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        report_type: ReportType,
    ) -> Result<AnalysisReport, AnalysisError> {
        let period = AnalysisPeriod {
            start: window_start,
            end: window_end,
        };
        let batch = collect_window(store, user_id, period, &self.config)?;
        debug!(
            user_id,
            sessions = batch.sessions.len(),
            excluded = batch.excluded.len(),
            dropped_events = batch.dropped_events,
            "collected analysis window"
        );

        let features = self.extractor.extract(&batch.sessions, &batch.period)?;
        if let Err(e) = self.models.ensure_schema(&features) {
            error!(user_id, error = %e, "feature schema does not match the loaded models");
            return Err(e);
        }

        let insights = Insights {
            anxiety: self.evaluate(Indicator::Anxiety, &features)?,
            depression: self.evaluate(Indicator::Depression, &features)?,
            attention: self.evaluate(Indicator::Attention, &features)?,
        };

        let cluster = self.clusterer.assign(&features);
        let normative_comparison = compare(&features, self.age_group);
        let aggregate = aggregate(&insights, batch.sessions.len(), &features, &self.config);
        let recommendations = recommend(&insights, aggregate.wellbeing, &self.config);
        debug!(
            user_id,
            wellbeing = aggregate.wellbeing,
            confidence = aggregate.confidence,
            recommendations = recommendations.len(),
            "scored analysis window"
        );

        Ok(self.assembler.assemble(ReportParts {
            user_id,
            report_type,
            batch: &batch,
            features: &features,
            insights,
            aggregate,
            recommendations,
            cluster,
            normative_comparison,
            model_versions: self.models.versions(),
        }))
    }

    /// Evaluate one indicator, degrading it when its model fails
    fn evaluate(
        &self,
        indicator: Indicator,
        features: &FeatureVector,
    ) -> Result<IndicatorResult, AnalysisError> {
        match self.models.evaluate(indicator, features, &self.config) {
            Ok(result) => Ok(result),
            Err(e) if !e.is_fatal() => {
                warn!(%indicator, error = %e, "indicator model failed, marking degraded");
                Ok(IndicatorResult::degraded())
            }
            Err(e) => {
                error!(%indicator, error = %e, "indicator model rejected the feature vector");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::test_support::{FailingModel, FixedModel};
    use crate::models::{IndicatorModel, LinearIndicatorModel, Prediction};
    use crate::store::test_support::{daily_store, day, event, session, window, MisattributingStore};
    use crate::store::InMemoryEventStore;
    use crate::types::{IndicatorLevel, TrendDirection};

    fn run(generator: &ReportGenerator, store: &InMemoryEventStore) -> Result<AnalysisReport, AnalysisError> {
        let period = window(14);
        generator.generate_report(store, "u1", period.start, period.end, ReportType::Personal)
    }

    #[test]
    fn test_five_steady_sessions_have_low_attention_concern() {
        let mut store = InMemoryEventStore::new();
        for d in 0..5 {
            let id = format!("s{}", d);
            store.add_session(session(&id, "u1", day(d), 10));
            for i in 0..10 {
                let mut e = event(&id, day(d) + chrono::Duration::seconds(i * 3), 200.0);
                e.stress_level = 2;
                store.add_event(e);
            }
        }
        let period = window(5);
        let report = ReportGenerator::default()
            .generate_report(&store, "u1", period.start, period.end, ReportType::Personal)
            .unwrap();

        assert_eq!(report.sessions_analyzed, 5);
        assert_eq!(report.insights.attention.level, IndicatorLevel::Low);
        assert!(report.insights.attention.score < 0.3);
        assert!(!report.insights.attention.degraded);
        for (_, result) in report.insights.iter() {
            assert!((0.0..=1.0).contains(&result.score));
            assert!((0.0..=1.0).contains(&result.confidence));
        }
        assert!((0.0..=1.0).contains(&report.overall_wellbeing_score));
        assert!(!report.recommendations.is_empty());
        assert!(report.recommendations.len() <= 5);
        assert_eq!(report.metadata.model_versions.len(), 3);
        assert_eq!(report.metadata.engagement_trend, TrendDirection::Stable);
    }

    #[test]
    fn test_two_sessions_are_insufficient() {
        let store = daily_store("u1", 2, 10, 600.0);
        let err = run(&ReportGenerator::default(), &store).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_three_sessions_cap_confidence() {
        let store = daily_store("u1", 3, 10, 600.0);
        let report = run(&ReportGenerator::default(), &store).unwrap();
        assert!(report.confidence_score <= 0.3);
        assert!(report.summary.contains("Confidence in these results is low"));
    }

    #[test]
    fn test_orphaned_events_are_ignored() {
        let clean = daily_store("u1", 4, 10, 600.0);
        let noisy = MisattributingStore {
            inner: daily_store("u1", 4, 10, 600.0),
            stray: event("ghost", day(1), 3000.0),
        };

        let generator = ReportGenerator::default();
        let period = window(14);
        let a = run(&generator, &clean).unwrap();
        let b = generator
            .generate_report(&noisy, "u1", period.start, period.end, ReportType::Personal)
            .unwrap();

        assert_eq!(b.sessions_analyzed, 4);
        assert_eq!(b.metadata.dropped_events, 4);
        assert_eq!(a.metadata.dropped_events, 0);
        assert!(!b.metadata.analyzed_session_ids.contains(&"ghost".to_string()));
        assert_eq!(a.insights, b.insights);
        assert_eq!(a.overall_wellbeing_score, b.overall_wellbeing_score);
    }

    #[test]
    fn test_failing_model_degrades_indicator() {
        let models = ModelContext::new(
            Box::new(FailingModel(Indicator::Anxiety)),
            Box::new(FixedModel(Indicator::Depression, 0.4, 0.9)),
            Box::new(FixedModel(Indicator::Attention, 0.2, 0.9)),
        )
        .unwrap();
        let generator = ReportGenerator::new(AnalysisConfig::default(), Arc::new(models)).unwrap();
        let store = daily_store("u1", 10, 10, 600.0);
        let report = run(&generator, &store).unwrap();

        assert!(report.insights.anxiety.degraded);
        assert_eq!(report.insights.anxiety.confidence, 0.0);
        let expected = 1.0 - (0.35 * 0.4 + 0.30 * 0.2) / 0.65;
        assert!((report.overall_wellbeing_score - expected).abs() < 1e-9);
        // (0 + 0.9 + 0.9) / 3 at full session adequacy
        assert!((report.confidence_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let store = daily_store("u1", 6, 12, 550.0);
        let generator = ReportGenerator::default();
        let a = run(&generator, &store).unwrap();
        let b = run(&generator, &store).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.insights, b.insights);
        assert_eq!(a.overall_wellbeing_score, b.overall_wellbeing_score);
        assert_eq!(a.confidence_score, b.confidence_score);
        assert_eq!(a.recommendations, b.recommendations);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.metadata.key_findings, b.metadata.key_findings);
    }

    #[test]
    fn test_concurrent_runs_share_models() {
        let models = Arc::new(ModelContext::heuristic());
        let store = daily_store("u1", 6, 12, 550.0);
        let generators: Vec<ReportGenerator> = (0..4)
            .map(|_| ReportGenerator::new(AnalysisConfig::default(), Arc::clone(&models)).unwrap())
            .collect();

        let reports: Vec<AnalysisReport> = std::thread::scope(|scope| {
            let handles: Vec<_> = generators
                .iter()
                .map(|g| scope.spawn(|| run(g, &store).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for report in &reports[1..] {
            assert_eq!(report.insights, reports[0].insights);
            assert_eq!(report.overall_wellbeing_score, reports[0].overall_wellbeing_score);
        }
    }

    /// Model that reads a feature the extractor never produces
    struct HeartRateModel {
        features: Vec<String>,
    }

    impl IndicatorModel for HeartRateModel {
        fn indicator(&self) -> Indicator {
            Indicator::Anxiety
        }

        fn version(&self) -> &str {
            "hr-1"
        }

        fn required_features(&self) -> &[String] {
            &self.features
        }

        fn predict(&self, features: &FeatureVector) -> Result<Prediction, AnalysisError> {
            let hr = features.require("anxiety", "heart_rate_mean")?;
            Ok(Prediction {
                score: hr / 200.0,
                confidence: 1.0,
            })
        }
    }

    #[test]
    fn test_schema_mismatch_fails_report() {
        let models = ModelContext::new(
            Box::new(HeartRateModel {
                features: vec!["heart_rate_mean".to_string()],
            }),
            Box::new(LinearIndicatorModel::heuristic(Indicator::Depression)),
            Box::new(LinearIndicatorModel::heuristic(Indicator::Attention)),
        )
        .unwrap();
        let generator = ReportGenerator::new(AnalysisConfig::default(), Arc::new(models)).unwrap();
        let store = daily_store("u1", 5, 10, 600.0);

        match run(&generator, &store) {
            Err(AnalysisError::SchemaMismatch { model, missing }) => {
                assert_eq!(model, "anxiety");
                assert_eq!(missing, vec!["heart_rate_mean".to_string()]);
            }
            other => panic!("expected schema mismatch, got {:?}", other.map(|r| r.id)),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AnalysisConfig::default();
        config.min_sessions = 0;
        assert!(ReportGenerator::new(config, Arc::new(ModelContext::heuristic())).is_err());
    }
}
