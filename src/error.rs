//! Error types for FeelSync analysis

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while generating an analysis report
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Insufficient data for analysis: {0}")]
    InsufficientData(String),

    #[error("Feature schema mismatch for {model}: missing {missing:?}")]
    SchemaMismatch { model: String, missing: Vec<String> },

    #[error("Feature schema version mismatch for {model}: expected {expected}, got {actual}")]
    SchemaVersion {
        model: String,
        expected: String,
        actual: String,
    },

    #[error("Model inference failed for {indicator}: {reason}")]
    ModelInference { indicator: String, reason: String },

    #[error("Incomplete event batch for session {session_id}: {reason}")]
    IncompleteBatch { session_id: String, reason: String },

    #[error("Event store error: {0}")]
    EventStore(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Model artifact error: {0}")]
    ModelArtifact(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error category so callers can pick an appropriate message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientData,
    SchemaMismatch,
    ModelInference,
    IncompleteBatch,
    EventStore,
    Configuration,
    Training,
    Input,
}

impl AnalysisError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InsufficientData(_) => ErrorKind::InsufficientData,
            AnalysisError::SchemaMismatch { .. } | AnalysisError::SchemaVersion { .. } => {
                ErrorKind::SchemaMismatch
            }
            AnalysisError::ModelInference { .. } => ErrorKind::ModelInference,
            AnalysisError::IncompleteBatch { .. } => ErrorKind::IncompleteBatch,
            AnalysisError::EventStore(_) => ErrorKind::EventStore,
            AnalysisError::InvalidConfig(_) | AnalysisError::ModelArtifact(_) => {
                ErrorKind::Configuration
            }
            AnalysisError::Training(_) => ErrorKind::Training,
            AnalysisError::ParseError(_) | AnalysisError::JsonError(_) | AnalysisError::Io(_) => {
                ErrorKind::Input
            }
        }
    }

    /// Whether the error aborts report generation.
    ///
    /// Inference failures and incomplete batches are contained by the pipeline
    /// and only surface here when a caller invokes a stage directly.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::ModelInference | ErrorKind::IncompleteBatch
        )
    }

    /// Short message suitable for showing to the player
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::InsufficientData => {
                "Play a few more games first so there is enough data for a report."
            }
            ErrorKind::SchemaMismatch | ErrorKind::Configuration => {
                "The analysis service is misconfigured. Please try again later."
            }
            ErrorKind::ModelInference | ErrorKind::IncompleteBatch => {
                "Part of your data could not be analyzed."
            }
            ErrorKind::EventStore => "Your game history could not be loaded right now.",
            ErrorKind::Training => "Model training failed.",
            ErrorKind::Input => "The provided data could not be read.",
        }
    }
}
