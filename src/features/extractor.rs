//! Feature extraction
//!
//! Turns the events and summaries of one analysis window into a
//! `feelsync.features.v1` vector.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::stats::{index_slope, mean, percentile, std_dev, variance};
use crate::features::*;
use crate::types::{AnalysisPeriod, BehavioralEvent, SessionData, Valence};
use std::collections::BTreeMap;
use tracing::debug;

/// Variance of a Bernoulli variable at p = 0.5, the largest possible
const MAX_ACCURACY_VARIANCE: f64 = 0.25;

/// Feature extractor for one analysis window
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    hesitation_threshold_ms: f64,
    lapse_z_threshold: f64,
    lapse_min_events: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl FeatureExtractor {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            hesitation_threshold_ms: config.hesitation_threshold_ms,
            lapse_z_threshold: config.lapse_z_threshold,
            lapse_min_events: config.lapse_min_events,
        }
    }

    /// Extract the feature vector for a window
    ///
    /// Sessions are expected in chronological order, each with its own events.
    pub fn extract(
        &self,
        sessions: &[SessionData],
        period: &AnalysisPeriod,
    ) -> Result<FeatureVector, AnalysisError> {
        if sessions.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "no sessions in the analysis window".to_string(),
            ));
        }

        let events: Vec<&BehavioralEvent> = sessions.iter().flat_map(|s| s.events.iter()).collect();
        let mut vector = FeatureVector::empty();

        // Reaction time
        let reaction_times: Vec<f64> = events.iter().map(|e| e.reaction_time_ms).collect();
        set_or_impute(&mut vector, REACTION_TIME_MEAN, mean(&reaction_times));
        set_or_impute(&mut vector, REACTION_TIME_STD, std_dev(&reaction_times));
        set_or_impute(&mut vector, REACTION_TIME_P90, percentile(&reaction_times, 90.0));

        set_or_impute(&mut vector, ERROR_RATE, compute_error_rate(&events));

        // Hesitation
        let hesitations: Vec<f64> = events.iter().filter_map(|e| e.hesitation_time_ms).collect();
        set_or_impute(
            &mut vector,
            HESITATION_FREQUENCY,
            compute_hesitation_frequency(&hesitations, self.hesitation_threshold_ms),
        );
        set_or_impute(&mut vector, HESITATION_MEAN, mean(&hesitations));

        set_or_impute(
            &mut vector,
            EMOTIONAL_CHOICE_BIAS,
            compute_emotional_choice_bias(&events),
        );
        set_or_impute(
            &mut vector,
            ATTENTION_LAPSE_RATE,
            compute_attention_lapse_rate(sessions, self.lapse_z_threshold, self.lapse_min_events),
        );
        set_or_impute(
            &mut vector,
            DECISION_CONSISTENCY,
            compute_decision_consistency(sessions),
        );

        let stress: Vec<f64> = events.iter().map(|e| e.stress_level as f64).collect();
        set_or_impute(&mut vector, STRESS_MEAN, mean(&stress));

        set_or_impute(
            &mut vector,
            ENGAGEMENT_TREND,
            compute_engagement_trend(sessions, period),
        );
        vector.set(SESSION_COUNT, sessions.len() as f64);

        debug!(
            sessions = sessions.len(),
            events = events.len(),
            imputed = ?vector.imputed_features(),
            "extracted feature vector"
        );

        Ok(vector)
    }
}

fn set_or_impute(vector: &mut FeatureVector, name: &str, value: Option<f64>) {
    match value {
        Some(v) => vector.set(name, v),
        None => vector.impute(name),
    }
}

/// Per-event accuracy share
///
/// Formula: `count(accuracy == false) / count(accuracy is not null)`
fn compute_error_rate(events: &[&BehavioralEvent]) -> Option<f64> {
    let graded: Vec<bool> = events.iter().filter_map(|e| e.accuracy).collect();
    if graded.is_empty() {
        return None;
    }
    let errors = graded.iter().filter(|correct| !**correct).count();
    Some(errors as f64 / graded.len() as f64)
}

/// Share of recorded hesitations strictly above the threshold
fn compute_hesitation_frequency(hesitations: &[f64], threshold_ms: f64) -> Option<f64> {
    if hesitations.is_empty() {
        return None;
    }
    let long = hesitations.iter().filter(|h| **h > threshold_ms).count();
    Some(long as f64 / hesitations.len() as f64)
}

/// Signed valence bias of choices
///
/// Formula: `(negative - positive) / (negative + positive + neutral)`;
/// positive values mean the player leans toward negative-valence choices.
fn compute_emotional_choice_bias(events: &[&BehavioralEvent]) -> Option<f64> {
    let (mut positive, mut negative, mut neutral) = (0usize, 0usize, 0usize);
    for event in events {
        match event.valence() {
            Some(Valence::Positive) => positive += 1,
            Some(Valence::Negative) => negative += 1,
            Some(Valence::Neutral) => neutral += 1,
            None => {}
        }
    }
    let total = positive + negative + neutral;
    if total == 0 {
        return None;
    }
    Some((negative as f64 - positive as f64) / total as f64)
}

/// Share of responses slower than `mean + z * std` of their own session
///
/// Only sessions with at least `min_events` events are eligible, so a short
/// session cannot produce lapses from a degenerate baseline.
fn compute_attention_lapse_rate(
    sessions: &[SessionData],
    z_threshold: f64,
    min_events: usize,
) -> Option<f64> {
    let mut eligible = 0usize;
    let mut lapses = 0usize;

    for session in sessions.iter().filter(|s| s.events.len() >= min_events) {
        let rts: Vec<f64> = session.events.iter().map(|e| e.reaction_time_ms).collect();
        let (Some(m), Some(sd)) = (mean(&rts), std_dev(&rts)) else {
            continue;
        };
        let cutoff = m + z_threshold * sd;
        eligible += rts.len();
        lapses += rts.iter().filter(|rt| **rt > cutoff).count();
    }

    if eligible == 0 {
        return None;
    }
    Some(lapses as f64 / eligible as f64)
}

/// Stability of accuracy across sessions
///
/// Formula: `1 - variance(per_session_accuracy) / 0.25`, clipped to [0, 1].
/// Per-session accuracy comes from the events when any carry accuracy, else
/// from the session summary. Needs at least two sessions.
fn compute_decision_consistency(sessions: &[SessionData]) -> Option<f64> {
    if sessions.len() < 2 {
        return None;
    }
    let accuracies: Vec<f64> = sessions.iter().map(session_accuracy).collect();
    let var = variance(&accuracies)?;
    Some((1.0 - var / MAX_ACCURACY_VARIANCE).clamp(0.0, 1.0))
}

fn session_accuracy(data: &SessionData) -> f64 {
    let graded: Vec<bool> = data.events.iter().filter_map(|e| e.accuracy).collect();
    if graded.is_empty() {
        return data.session.accuracy.clamp(0.0, 1.0);
    }
    graded.iter().filter(|c| **c).count() as f64 / graded.len() as f64
}

/// Relative change in daily session count across the window
///
/// Formula: `slope * (days - 1) / mean_daily_count`, clipped to [-1, 1], with
/// `slope` the least-squares slope of session count per day bucket.
fn compute_engagement_trend(sessions: &[SessionData], period: &AnalysisPeriod) -> Option<f64> {
    let first_day = period.start.date_naive();
    let days = period.duration_days();
    if days < 2 {
        return None;
    }

    let mut buckets: BTreeMap<i64, f64> = (0..days).map(|d| (d, 0.0)).collect();
    for data in sessions {
        let offset = (data.session.start_time.date_naive() - first_day).num_days();
        if let Some(count) = buckets.get_mut(&offset) {
            *count += 1.0;
        }
    }

    let counts: Vec<f64> = buckets.into_values().collect();
    let mean_count = mean(&counts)?;
    if mean_count <= 0.0 {
        return None;
    }
    let slope = index_slope(&counts)?;
    Some((slope * (days - 1) as f64 / mean_count).clamp(-1.0, 1.0))
}
