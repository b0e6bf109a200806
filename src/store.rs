//! Event store access
//!
//! The pipeline reads gameplay data through the [`EventStore`] trait. This
//! module also assembles the fetched records into the batch for one analysis
//! window, dropping invalid or misattributed events and excluding sessions
//! whose data is incomplete.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::types::{
    AnalysisPeriod, BehavioralEvent, ExcludedSession, GameSession, PartialSession, SessionData,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Source of sessions and events for one user
pub trait EventStore: Send + Sync {
    /// Sessions of `user_id` that started within `[start, end]`
    fn fetch_sessions(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<GameSession>, AnalysisError>;

    /// Events recorded for a session, in insertion order
    fn fetch_events(&self, session_id: &str) -> Result<Vec<BehavioralEvent>, AnalysisError>;
}

/// Sessions plus events, as exchanged in JSON files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    #[serde(default)]
    pub sessions: Vec<GameSession>,
    #[serde(default)]
    pub events: Vec<BehavioralEvent>,
}

impl EventBatch {
    /// Parse a JSON object with `sessions` and `events` arrays
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse NDJSON where each line is either a session or an event record
    pub fn from_ndjson(ndjson: &str) -> Result<Self, AnalysisError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Line {
            Event(Box<BehavioralEvent>),
            Session(Box<GameSession>),
        }

        let mut batch = EventBatch::default();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Line>(trimmed) {
                Ok(Line::Event(event)) => batch.events.push(*event),
                Ok(Line::Session(session)) => batch.sessions.push(*session),
                Err(e) => {
                    return Err(AnalysisError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(batch)
    }

    /// Check every record without building a report
    pub fn validate(&self) -> BatchValidation {
        let session_ids: HashSet<&str> = self.sessions.iter().map(|s| s.id.as_str()).collect();

        let invalid_events = self
            .events
            .iter()
            .enumerate()
            .filter_map(|(index, event)| {
                event.validate().err().map(|e| InvalidEvent {
                    index,
                    session_id: event.session_id.clone(),
                    reason: e.to_string(),
                })
            })
            .collect();

        let mut orphaned_events: Vec<usize> = Vec::new();
        let mut per_session: HashMap<&str, usize> = HashMap::new();
        for (index, event) in self.events.iter().enumerate() {
            if session_ids.contains(event.session_id.as_str()) {
                *per_session.entry(event.session_id.as_str()).or_default() += 1;
            } else {
                orphaned_events.push(index);
            }
        }

        let sessions_without_events = self
            .sessions
            .iter()
            .filter(|s| !per_session.contains_key(s.id.as_str()))
            .map(|s| s.id.clone())
            .collect();

        BatchValidation {
            sessions: self.sessions.len(),
            events: self.events.len(),
            invalid_events,
            orphaned_events,
            sessions_without_events,
        }
    }
}

/// Event that failed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidEvent {
    pub index: usize,
    pub session_id: String,
    pub reason: String,
}

/// Result of validating an [`EventBatch`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchValidation {
    pub sessions: usize,
    pub events: usize,
    pub invalid_events: Vec<InvalidEvent>,
    /// Indices of events whose session is not part of the batch
    pub orphaned_events: Vec<usize>,
    pub sessions_without_events: Vec<String>,
}

impl BatchValidation {
    pub fn is_clean(&self) -> bool {
        self.invalid_events.is_empty()
            && self.orphaned_events.is_empty()
            && self.sessions_without_events.is_empty()
    }
}

/// Event store backed by an in-memory batch
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    sessions: Vec<GameSession>,
    events: HashMap<String, Vec<BehavioralEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_batch(batch: EventBatch) -> Self {
        let mut store = Self::new();
        for session in batch.sessions {
            store.add_session(session);
        }
        for event in batch.events {
            store.add_event(event);
        }
        store
    }

    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(Self::from_batch(EventBatch::from_json(json)?))
    }

    pub fn add_session(&mut self, session: GameSession) {
        self.sessions.push(session);
    }

    /// Record an event under its session id, preserving insertion order
    pub fn add_event(&mut self, event: BehavioralEvent) {
        self.events
            .entry(event.session_id.clone())
            .or_default()
            .push(event);
    }

    /// Distinct user ids present in the store, sorted
    pub fn user_ids(&self) -> Vec<String> {
        let mut users: Vec<String> = self.sessions.iter().map(|s| s.user_id.clone()).collect();
        users.sort();
        users.dedup();
        users
    }

    /// Earliest and latest session start times
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.sessions.iter().map(|s| s.start_time).min()?;
        let last = self.sessions.iter().map(|s| s.start_time).max()?;
        Some((first, last))
    }
}

impl EventStore for InMemoryEventStore {
    fn fetch_sessions(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<GameSession>, AnalysisError> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.start_time >= start && s.start_time <= end)
            .cloned()
            .collect())
    }

    fn fetch_events(&self, session_id: &str) -> Result<Vec<BehavioralEvent>, AnalysisError> {
        Ok(self.events.get(session_id).cloned().unwrap_or_default())
    }
}

/// Usable data for one analysis window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowBatch {
    pub period: AnalysisPeriod,
    /// Usable sessions in chronological order
    pub sessions: Vec<SessionData>,
    pub excluded: Vec<ExcludedSession>,
    /// Sessions kept with fewer usable events than recorded decisions
    pub partial: Vec<PartialSession>,
    /// Events dropped for failing validation or naming another session
    pub dropped_events: usize,
}

impl WindowBatch {
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|s| s.session.id.clone()).collect()
    }
}

/// Fetch and clean the data for one user's window
///
/// Unfinished sessions and sessions whose events are missing are excluded and
/// recorded. Sessions with fewer usable events than recorded decisions are
/// kept and listed as partial. A finished session with neither events nor recorded decisions, or
/// fewer usable sessions than `config.min_sessions`, is `InsufficientData`.
pub fn collect_window(
    store: &dyn EventStore,
    user_id: &str,
    period: AnalysisPeriod,
    config: &AnalysisConfig,
) -> Result<WindowBatch, AnalysisError> {
    if period.end < period.start {
        return Err(AnalysisError::InvalidConfig(format!(
            "analysis window ends before it starts ({} < {})",
            period.end, period.start
        )));
    }

    let mut fetched = store.fetch_sessions(user_id, period.start, period.end)?;
    fetched.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
    debug!(user_id, sessions = fetched.len(), "fetched sessions");

    let mut batch = WindowBatch {
        period,
        sessions: Vec::new(),
        excluded: Vec::new(),
        partial: Vec::new(),
        dropped_events: 0,
    };

    for session in fetched {
        if session.user_id != user_id || !period.contains(session.start_time) {
            continue;
        }
        if !session.completed || !session.is_sealed() {
            batch.excluded.push(ExcludedSession {
                session_id: session.id.clone(),
                reason: "session not completed".to_string(),
            });
            continue;
        }

        let raw = store.fetch_events(&session.id)?;
        let raw_count = raw.len();
        let mut events: Vec<BehavioralEvent> = raw
            .into_iter()
            .filter(|e| e.session_id == session.id && e.validate().is_ok())
            .collect();
        let dropped = raw_count - events.len();
        if dropped > 0 {
            debug!(session_id = %session.id, dropped, "dropped events");
        }
        batch.dropped_events += dropped;
        events.sort_by_key(|e| e.timestamp);

        if events.is_empty() {
            if session.decisions_made == 0 {
                return Err(AnalysisError::InsufficientData(format!(
                    "session {} has no recorded events",
                    session.id
                )));
            }
            let err = AnalysisError::IncompleteBatch {
                session_id: session.id.clone(),
                reason: format!(
                    "{} decisions recorded but no usable events returned",
                    session.decisions_made
                ),
            };
            warn!(error = %err, "excluding session");
            batch.excluded.push(ExcludedSession {
                session_id: session.id.clone(),
                reason: err.to_string(),
            });
            continue;
        }

        if (events.len() as u64) < u64::from(session.decisions_made) {
            let err = AnalysisError::IncompleteBatch {
                session_id: session.id.clone(),
                reason: format!(
                    "{} decisions recorded but only {} usable events returned",
                    session.decisions_made,
                    events.len()
                ),
            };
            warn!(error = %err, "analyzing partial session");
            batch.partial.push(PartialSession {
                session_id: session.id.clone(),
                decisions_recorded: session.decisions_made,
                events_received: events.len(),
            });
        }

        batch.sessions.push(SessionData { session, events });
    }

    if batch.sessions.len() < config.min_sessions {
        return Err(AnalysisError::InsufficientData(format!(
            "{} usable sessions in window, at least {} required",
            batch.sessions.len(),
            config.min_sessions
        )));
    }

    Ok(batch)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::types::{DecisionType, GameType};
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;

    pub fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap() + Duration::days(n)
    }

    pub fn window(days: i64) -> AnalysisPeriod {
        AnalysisPeriod {
            start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap() + Duration::days(days - 1),
        }
    }

    pub fn session(id: &str, user: &str, start: DateTime<Utc>, decisions: u32) -> GameSession {
        GameSession {
            id: id.to_string(),
            user_id: user.to_string(),
            game_type: GameType::CatchThought,
            start_time: start,
            end_time: Some(start + Duration::minutes(4)),
            final_score: 100,
            level_reached: 2,
            accuracy: 0.8,
            avg_reaction_time_ms: 600.0,
            consistency_score: 0.7,
            decisions_made: decisions,
            completed: true,
        }
    }

    pub fn event(session_id: &str, at: DateTime<Utc>, rt: f64) -> BehavioralEvent {
        BehavioralEvent {
            session_id: session_id.to_string(),
            timestamp: at,
            reaction_time_ms: rt,
            decision_type: DecisionType::PositiveCatch,
            decision_value: "positive".to_string(),
            confidence_level: 0.6,
            emotional_state: Some("calm".to_string()),
            stress_level: 3,
            accuracy: Some(true),
            hesitation_time_ms: Some(250.0),
            game_level: 1,
            game_phase: None,
            difficulty: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Store that appends a stray event to every event fetch
    pub struct MisattributingStore {
        pub inner: InMemoryEventStore,
        pub stray: BehavioralEvent,
    }

    impl EventStore for MisattributingStore {
        fn fetch_sessions(
            &self,
            user_id: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<GameSession>, AnalysisError> {
            self.inner.fetch_sessions(user_id, start, end)
        }

        fn fetch_events(&self, session_id: &str) -> Result<Vec<BehavioralEvent>, AnalysisError> {
            let mut events = self.inner.fetch_events(session_id)?;
            events.push(self.stray.clone());
            Ok(events)
        }
    }

    /// Store with `n` daily sessions of `per_session` events each
    pub fn daily_store(user: &str, n: i64, per_session: usize, rt: f64) -> InMemoryEventStore {
        let mut store = InMemoryEventStore::new();
        for d in 0..n {
            let id = format!("{}-s{}", user, d);
            store.add_session(session(&id, user, day(d), per_session as u32));
            for i in 0..per_session {
                store.add_event(event(&id, day(d) + Duration::seconds(i as i64 * 3), rt));
            }
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_partial_session_is_kept_and_listed() {
        let mut store = daily_store("u1", 3, 4, 500.0);
        store.add_session(session("short", "u1", day(1) + Duration::hours(2), 9));
        for i in 0..3 {
            store.add_event(event("short", day(1) + Duration::hours(2) + Duration::seconds(i), 450.0));
        }

        let batch = collect_window(&store, "u1", window(3), &AnalysisConfig::default()).unwrap();
        assert_eq!(batch.sessions.len(), 4);
        assert!(batch.excluded.is_empty());
        assert_eq!(
            batch.partial,
            vec![PartialSession {
                session_id: "short".to_string(),
                decisions_recorded: 9,
                events_received: 3,
            }]
        );
    }

    #[test]
    fn test_collect_window_orders_sessions() {
        let mut store = daily_store("u1", 3, 4, 500.0);
        store.add_session(session("late", "u1", day(1) + Duration::hours(3), 1));
        store.add_event(event("late", day(1) + Duration::hours(3), 450.0));
        // Other users and out-of-window sessions are ignored
        store.add_session(session("other", "u2", day(0), 1));
        store.add_session(session("old", "u1", day(-20), 1));

        let batch = collect_window(&store, "u1", window(3), &AnalysisConfig::default()).unwrap();
        assert_eq!(batch.session_ids(), vec!["u1-s0", "u1-s1", "late", "u1-s2"]);
        assert!(batch.excluded.is_empty());
        assert_eq!(batch.dropped_events, 0);
    }

    #[test]
    fn test_two_sessions_is_insufficient() {
        let store = daily_store("u1", 2, 5, 500.0);
        let err = collect_window(&store, "u1", window(7), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_missing_events_excludes_session() {
        let mut store = daily_store("u1", 3, 4, 500.0);
        // Claims 12 decisions but the store has no events for it
        store.add_session(session("ghost", "u1", day(2) + Duration::hours(1), 12));

        let batch = collect_window(&store, "u1", window(3), &AnalysisConfig::default()).unwrap();
        assert_eq!(batch.sessions.len(), 3);
        assert_eq!(batch.excluded.len(), 1);
        assert_eq!(batch.excluded[0].session_id, "ghost");
        assert!(batch.excluded[0].reason.contains("Incomplete event batch"));
    }

    #[test]
    fn test_empty_session_without_decisions_is_insufficient() {
        let mut store = daily_store("u1", 4, 4, 500.0);
        store.add_session(session("empty", "u1", day(1) + Duration::hours(2), 0));

        let err = collect_window(&store, "u1", window(4), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(msg) if msg.contains("empty")));
    }

    #[test]
    fn test_unfinished_session_is_excluded() {
        let mut store = daily_store("u1", 3, 4, 500.0);
        let mut running = session("running", "u1", day(0) + Duration::hours(5), 3);
        running.end_time = None;
        running.completed = false;
        store.add_session(running);

        let batch = collect_window(&store, "u1", window(3), &AnalysisConfig::default()).unwrap();
        assert_eq!(batch.sessions.len(), 3);
        assert_eq!(batch.excluded[0].reason, "session not completed");
    }

    #[test]
    fn test_misattributed_and_invalid_events_are_dropped() {
        let mut inner = daily_store("u1", 3, 4, 500.0);
        let mut bad = event("u1-s0", day(0), 500.0);
        bad.stress_level = 11;
        inner.add_event(bad);

        let store = MisattributingStore {
            inner,
            stray: event("somebody-else", day(0), 9999.0),
        };
        let batch = collect_window(&store, "u1", window(3), &AnalysisConfig::default()).unwrap();
        assert_eq!(batch.sessions.len(), 3);
        // One stray per session plus the invalid event
        assert_eq!(batch.dropped_events, 4);
        assert!(batch
            .sessions
            .iter()
            .all(|s| s.events.iter().all(|e| e.session_id == s.session.id)));
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let store = daily_store("u1", 3, 4, 500.0);
        let period = AnalysisPeriod {
            start: day(5),
            end: day(0),
        };
        let err = collect_window(&store, "u1", period, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_batch_validation() {
        let json = r#"{
            "sessions": [
                {"id": "a", "user_id": "u1", "game_type": "stat_balance",
                 "start_time": "2024-03-01T10:00:00Z", "end_time": "2024-03-01T10:05:00Z",
                 "decisions_made": 1, "completed": true},
                {"id": "b", "user_id": "u1", "game_type": "decision_maker",
                 "start_time": "2024-03-02T10:00:00Z", "end_time": "2024-03-02T10:05:00Z",
                 "decisions_made": 0, "completed": true}
            ],
            "events": [
                {"session_id": "a", "timestamp": "2024-03-01T10:00:05Z", "reaction_time_ms": 640,
                 "decision_type": "stat_allocation", "stress_level": 4},
                {"session_id": "a", "timestamp": "2024-03-01T10:00:09Z", "reaction_time_ms": -3,
                 "decision_type": "stat_allocation", "stress_level": 4},
                {"session_id": "zzz", "timestamp": "2024-03-01T10:00:09Z", "reaction_time_ms": 300,
                 "decision_type": "neutral_pass", "stress_level": 2}
            ]
        }"#;
        let batch = EventBatch::from_json(json).unwrap();
        let report = batch.validate();

        assert_eq!(report.sessions, 2);
        assert_eq!(report.events, 3);
        assert_eq!(report.invalid_events.len(), 1);
        assert_eq!(report.invalid_events[0].index, 1);
        assert_eq!(report.orphaned_events, vec![2]);
        assert_eq!(report.sessions_without_events, vec!["b".to_string()]);
        assert!(!report.is_clean());

        let store = InMemoryEventStore::from_batch(batch);
        assert_eq!(store.user_ids(), vec!["u1".to_string()]);
    }

    #[test]
    fn test_ndjson_batch() {
        let ndjson = concat!(
            r#"{"id": "a", "user_id": "u1", "game_type": "catch_thought", "start_time": "2024-03-01T10:00:00Z"}"#,
            "\n\n",
            r#"{"session_id": "a", "timestamp": "2024-03-01T10:00:05Z", "reaction_time_ms": 640, "decision_type": "negative_catch", "stress_level": 4}"#,
            "\n",
        );
        let batch = EventBatch::from_ndjson(ndjson).unwrap();
        assert_eq!(batch.sessions.len(), 1);
        assert_eq!(batch.events.len(), 1);

        let err = EventBatch::from_ndjson("{\"nope\": 1}").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
