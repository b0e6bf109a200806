//! FeelSync Core - behavioral feature extraction and indicator scoring
//!
//! FeelSync turns gameplay telemetry from short psychology games into bounded,
//! explainable indicator scores through a deterministic pipeline:
//! event store → feature extraction → indicator models → aggregation
//! → recommendations → report.
//!
//! Scores are heuristic indicators, not clinical classifications. Every
//! report carries its confidence and a non-diagnostic disclaimer.
//!
//! ## Modules
//!
//! - **Pipeline**: [`ReportGenerator`] produces an [`AnalysisReport`] for one user window
//! - **Models**: indicator models, model artifacts and the training harness
//! - **Trends**: longitudinal comparison of successive reports

pub mod aggregator;
pub mod cluster;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod store;
pub mod trends;
pub mod types;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, ErrorKind};
pub use features::{FeatureExtractor, FeatureVector, FEATURE_SCHEMA_VERSION};
pub use models::{load_model, IndicatorModel, LinearIndicatorModel, ModelContext};
pub use pipeline::ReportGenerator;
pub use store::{EventBatch, EventStore, InMemoryEventStore};
pub use trends::{analyze_trends, LongitudinalAnalysis};
pub use types::{AnalysisReport, BehavioralEvent, GameSession, Indicator, ReportType};

/// FeelSync version embedded in CLI output
pub const FEELSYNC_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for CLI output
pub const PRODUCER_NAME: &str = "feelsync-core";
