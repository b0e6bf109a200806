//! Core data types
//!
//! This module defines the gameplay records consumed by the pipeline and the
//! report records it produces.

use crate::cluster::ClusterAssignment;
use crate::features::norms::NormBand;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Gameplay records
// ============================================================================

/// Kind of decision the player made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    /// Caught a positive thought bubble
    PositiveCatch,
    /// Caught a negative thought bubble
    NegativeCatch,
    /// Let a bubble pass
    NeutralPass,
    /// Allocated points in the stat balance game
    StatAllocation,
    /// Picked an option in a decision scenario
    ScenarioChoice,
    #[serde(other)]
    Other,
}

/// Emotional valence of a choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Valence {
    Positive,
    Negative,
    Neutral,
}

/// Difficulty setting of the game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Adaptive,
}

/// Game the session was played in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    CatchThought,
    StatBalance,
    DecisionMaker,
    #[serde(other)]
    Other,
}

/// Primitive value in the open metadata extension of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null(()),
    Bool(bool),
    Number(f64),
    Text(String),
}

impl MetadataValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Number(n) if n.is_finite() => Some(*n),
            MetadataValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

/// One decision or action during a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralEvent {
    /// Session that produced the event
    pub session_id: String,
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
    /// Time from stimulus to decision in milliseconds
    pub reaction_time_ms: f64,
    /// Decision type
    pub decision_type: DecisionType,
    /// Free-form decision label (e.g. "positive", "help_friend")
    #[serde(default)]
    pub decision_value: String,
    /// Self-reported or inferred confidence (0-1)
    #[serde(default = "default_confidence")]
    pub confidence_level: f64,
    /// Emotional state label at decision time
    #[serde(default)]
    pub emotional_state: Option<String>,
    /// Stress rating (1-10)
    pub stress_level: u8,
    /// Whether the decision was correct, when the game defines correctness
    #[serde(default)]
    pub accuracy: Option<bool>,
    /// Delay before the first interaction in milliseconds
    #[serde(default)]
    pub hesitation_time_ms: Option<f64>,
    /// Game level (>= 1)
    #[serde(default = "default_level")]
    pub game_level: u32,
    /// Game phase label
    #[serde(default)]
    pub game_phase: Option<String>,
    /// Difficulty of the phase
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Open extension fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, MetadataValue>,
}

fn default_confidence() -> f64 {
    0.5
}

fn default_level() -> u32 {
    1
}

impl BehavioralEvent {
    /// Emotional valence of this choice, if the decision carries one.
    ///
    /// Catch decisions carry their valence in the type; scenario and allocation
    /// choices carry it in the decision label.
    pub fn valence(&self) -> Option<Valence> {
        match self.decision_type {
            DecisionType::PositiveCatch => Some(Valence::Positive),
            DecisionType::NegativeCatch => Some(Valence::Negative),
            DecisionType::NeutralPass => Some(Valence::Neutral),
            DecisionType::ScenarioChoice | DecisionType::StatAllocation | DecisionType::Other => {
                let label = self.decision_value.to_ascii_lowercase();
                if label.starts_with("positive") {
                    Some(Valence::Positive)
                } else if label.starts_with("negative") {
                    Some(Valence::Negative)
                } else if label.starts_with("neutral") {
                    Some(Valence::Neutral)
                } else {
                    None
                }
            }
        }
    }
}

/// Reasons an event is rejected before feature extraction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventValidationError {
    #[error("reaction time must be finite and non-negative, got {0}")]
    ReactionTime(f64),

    #[error("confidence must be within [0, 1], got {0}")]
    Confidence(f64),

    #[error("stress level must be within 1..=10, got {0}")]
    StressLevel(u8),

    #[error("game level must be at least 1")]
    GameLevel,

    #[error("hesitation time must be finite and non-negative, got {0}")]
    HesitationTime(f64),
}

impl BehavioralEvent {
    /// Check the field ranges of a recorded event
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if !self.reaction_time_ms.is_finite() || self.reaction_time_ms < 0.0 {
            return Err(EventValidationError::ReactionTime(self.reaction_time_ms));
        }
        if !(0.0..=1.0).contains(&self.confidence_level) {
            return Err(EventValidationError::Confidence(self.confidence_level));
        }
        if !(1..=10).contains(&self.stress_level) {
            return Err(EventValidationError::StressLevel(self.stress_level));
        }
        if self.game_level < 1 {
            return Err(EventValidationError::GameLevel);
        }
        if let Some(h) = self.hesitation_time_ms {
            if !h.is_finite() || h < 0.0 {
                return Err(EventValidationError::HesitationTime(h));
            }
        }
        Ok(())
    }
}

/// One play of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// Session identifier
    pub id: String,
    /// Player identifier
    pub user_id: String,
    /// Game played
    pub game_type: GameType,
    /// Session start
    pub start_time: DateTime<Utc>,
    /// Session end (absent while the game is still running)
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Final score
    #[serde(default)]
    pub final_score: i64,
    /// Highest level reached
    #[serde(default = "default_level")]
    pub level_reached: u32,
    /// Session accuracy (0-1)
    #[serde(default)]
    pub accuracy: f64,
    /// Average reaction time in milliseconds
    #[serde(default)]
    pub avg_reaction_time_ms: f64,
    /// Consistency score reported by the game (0-1)
    #[serde(default)]
    pub consistency_score: f64,
    /// Number of decisions recorded by the game
    #[serde(default)]
    pub decisions_made: u32,
    /// Whether the game reached its end
    #[serde(default)]
    pub completed: bool,
}

impl GameSession {
    /// Session duration in seconds (0 while unsealed)
    pub fn duration_sec(&self) -> f64 {
        match self.end_time {
            Some(end) => ((end - self.start_time).num_milliseconds() as f64 / 1000.0).max(0.0),
            None => 0.0,
        }
    }

    /// Sealed sessions have an end time and are immutable
    pub fn is_sealed(&self) -> bool {
        self.end_time.is_some()
    }
}

/// A session together with its ordered events
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    pub session: GameSession,
    pub events: Vec<BehavioralEvent>,
}

// ============================================================================
// Indicators
// ============================================================================

/// Behavioral indicator. All scores point in the concern direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Anxiety,
    Depression,
    Attention,
}

impl Indicator {
    /// All indicators in weight order (also the recommendation tie-break order)
    pub const ALL: [Indicator; 3] = [Indicator::Anxiety, Indicator::Depression, Indicator::Attention];

    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::Anxiety => "anxiety",
            Indicator::Depression => "depression",
            Indicator::Attention => "attention",
        }
    }

    /// Parse the snake_case name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_str() == name)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucketed indicator level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorLevel {
    Low,
    Moderate,
    High,
}

impl IndicatorLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorLevel::Low => "low",
            IndicatorLevel::Moderate => "moderate",
            IndicatorLevel::High => "high",
        }
    }
}

/// Result for one indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    /// Concern score (0-1)
    pub score: f64,
    /// Level bucketed from the score
    pub level: IndicatorLevel,
    /// Confidence in the score (0-1)
    pub confidence: f64,
    /// Up to three human-readable findings, most relevant first
    pub key_patterns: Vec<String>,
    /// True when the model failed and this result carries no information
    #[serde(default)]
    pub degraded: bool,
}

impl IndicatorResult {
    /// Placeholder for an indicator whose model failed
    pub fn degraded() -> Self {
        Self {
            score: 0.0,
            level: IndicatorLevel::Low,
            confidence: 0.0,
            key_patterns: Vec::new(),
            degraded: true,
        }
    }
}

/// Indicator results keyed by indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub anxiety: IndicatorResult,
    pub depression: IndicatorResult,
    pub attention: IndicatorResult,
}

impl Insights {
    pub fn get(&self, indicator: Indicator) -> &IndicatorResult {
        match indicator {
            Indicator::Anxiety => &self.anxiety,
            Indicator::Depression => &self.depression,
            Indicator::Attention => &self.attention,
        }
    }

    /// Iterate in weight order
    pub fn iter(&self) -> impl Iterator<Item = (Indicator, &IndicatorResult)> {
        Indicator::ALL.into_iter().map(move |i| (i, self.get(i)))
    }

    /// Non-degraded indicator with the highest concern score.
    ///
    /// Ties keep the earlier indicator in weight order.
    pub fn dominant(&self) -> Option<(Indicator, &IndicatorResult)> {
        self.iter()
            .filter(|(_, r)| !r.degraded)
            .fold(None, |best, (i, r)| match best {
                Some((_, b)) if b.score >= r.score => best,
                _ => Some((i, r)),
            })
    }
}

// ============================================================================
// Recommendations
// ============================================================================

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Recommendation category (recommendations are deduplicated by category)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    ProfessionalSupport,
    StressManagement,
    MoodSupport,
    SocialConnection,
    AttentionTraining,
    Lifestyle,
    Monitoring,
    Wellness,
}

/// Actionable recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub action_items: Vec<String>,
}

// ============================================================================
// Reports
// ============================================================================

/// Audience of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    #[default]
    Personal,
    Therapist,
    Research,
}

/// Window covered by a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisPeriod {
    /// Whole days covered (at least 1 for a non-empty window)
    pub fn duration_days(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive()).num_days() + 1
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Direction of a trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

/// Overall risk level derived from the indicator levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Rule-based risk summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// Accumulated risk points
    pub points: u32,
    pub requires_attention: bool,
    /// Indicators at high level, highest score first
    pub primary_concerns: Vec<Indicator>,
}

/// Session left out of the analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedSession {
    pub session_id: String,
    pub reason: String,
}

/// Session kept in the analysis although fewer events arrived than it recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialSession {
    pub session_id: String,
    pub decisions_recorded: u32,
    pub events_received: usize,
}

/// Session-summary statistics for one game type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePerformance {
    pub session_count: usize,
    pub avg_score: f64,
    pub avg_duration_sec: f64,
    /// Mean session accuracy (0-1)
    pub avg_accuracy: f64,
    pub avg_level_reached: f64,
    /// Mean game-reported consistency (0-1)
    pub avg_consistency: f64,
    /// Fraction of sessions played to the end (0-1)
    pub completion_rate: f64,
}

/// Supplementary information about how a report was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Sessions that contributed to the report
    pub analyzed_session_ids: Vec<String>,
    /// Sessions excluded because their data was incomplete
    pub excluded_sessions: Vec<ExcludedSession>,
    /// Sessions analyzed with fewer events than decisions recorded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_sessions: Vec<PartialSession>,
    /// Events dropped because they failed validation or belonged elsewhere
    pub dropped_events: usize,
    /// Per-game summary of the analyzed sessions
    #[serde(default)]
    pub game_performance: BTreeMap<GameType, GamePerformance>,
    /// Features filled with schema defaults
    pub imputed_features: Vec<String>,
    pub feature_schema_version: String,
    /// Model version per indicator
    pub model_versions: BTreeMap<String, String>,
    /// Behavioral archetype, for context only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterAssignment>,
    /// Findings across all indicators
    pub key_findings: Vec<String>,
    pub risk: RiskAssessment,
    /// Direction of play engagement over the window
    pub engagement_trend: TrendDirection,
    /// Feature bands relative to age-group norms
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub normative_comparison: BTreeMap<String, NormBand>,
    pub disclaimer: String,
}

/// Versioned analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Report identifier (UUID)
    pub id: String,
    /// Format version of this record
    pub report_version: String,
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    pub report_type: ReportType,
    /// Number of usable sessions
    pub sessions_analyzed: usize,
    pub analysis_period: AnalysisPeriod,
    /// Inverse-concern aggregate (0-1)
    pub overall_wellbeing_score: f64,
    /// Confidence in the report (0-1)
    pub confidence_score: f64,
    pub insights: Insights,
    pub recommendations: Vec<Recommendation>,
    pub summary: String,
    pub metadata: ReportMetadata,
}
