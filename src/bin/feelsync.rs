//! FeelSync CLI - Command-line interface for FeelSync Core
//!
//! Commands:
//! - analyze: Generate analysis reports from an event batch
//! - train: Fit indicator models (and optionally the clusterer) from labelled samples
//! - trends: Compare a user's successive reports
//! - validate: Validate an event batch
//! - doctor: Check configuration and model artifacts
//! - schema: Print the feature schema

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use feelsync::cluster::BehavioralClusterer;
use feelsync::features::norms::AgeGroup;
use feelsync::features::{FeatureVector, FEATURE_SCHEMA, FEATURE_SCHEMA_VERSION};
use feelsync::models::{model_path, train_indicator_model, TrainingOptions, TrainingSample};
use feelsync::report::REPORT_VERSION;
use feelsync::{
    analyze_trends, AnalysisConfig, AnalysisError, AnalysisReport, ErrorKind, EventBatch,
    InMemoryEventStore, Indicator, ModelContext, ReportGenerator, ReportType, FEELSYNC_VERSION,
    PRODUCER_NAME,
};

/// FeelSync - behavioral indicator scoring for gameplay telemetry
#[derive(Parser)]
#[command(name = "feelsync")]
#[command(author = "FeelSync Contributors")]
#[command(version = FEELSYNC_VERSION)]
#[command(about = "Turn gameplay telemetry into wellbeing indicator reports", long_about = None)]
struct Cli {
    /// Log pipeline stages to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate analysis reports from an event batch
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format (json-pretty on a terminal, ndjson otherwise)
        #[arg(long)]
        output_format: Option<OutputFormat>,

        /// Only analyze this user (default: every user in the batch)
        #[arg(long)]
        user: Option<String>,

        /// Window start (RFC 3339 or YYYY-MM-DD; default: earliest session)
        #[arg(long, value_parser = parse_window_start)]
        start: Option<DateTime<Utc>>,

        /// Window end (RFC 3339 or YYYY-MM-DD; default: latest session)
        #[arg(long, value_parser = parse_window_end)]
        end: Option<DateTime<Utc>>,

        /// Report audience
        #[arg(long, default_value = "personal")]
        report_type: ReportKind,

        /// Age group for the normative comparison
        #[arg(long, default_value = "adolescent")]
        age_group: AgeGroupArg,

        /// Analysis config JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory with model artifacts (missing ones use built-in models)
        #[arg(long)]
        models: Option<PathBuf>,

        /// Clusterer artifact
        #[arg(long)]
        clusterer: Option<PathBuf>,
    },

    /// Fit indicator models from labelled feature vectors
    Train {
        /// Samples file: {"anxiety": [{"features": {...}, "label": 0.4}, ...], ...}
        #[arg(short, long)]
        samples: PathBuf,

        /// Directory to write model artifacts to
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Training options JSON file
        #[arg(long)]
        options: Option<PathBuf>,

        /// Also fit the behavioral clusterer on every sample's features
        #[arg(long)]
        fit_clusterer: bool,
    },

    /// Compare a user's successive reports
    Trends {
        /// File holding a JSON array of reports (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Validate an event batch
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check configuration and model artifacts
    Doctor {
        /// Analysis config JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory with model artifacts
        #[arg(long)]
        models: Option<PathBuf>,

        /// Clusterer artifact
        #[arg(long)]
        clusterer: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the feature schema
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// {"sessions": [...], "events": [...]}
    Json,
    /// One session or event per line
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// One report per line
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum ReportKind {
    Personal,
    Therapist,
    Research,
}

impl From<ReportKind> for ReportType {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Personal => ReportType::Personal,
            ReportKind::Therapist => ReportType::Therapist,
            ReportKind::Research => ReportType::Research,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum AgeGroupArg {
    Child,
    Adolescent,
    YoungAdult,
    Adult,
}

impl From<AgeGroupArg> for AgeGroup {
    fn from(arg: AgeGroupArg) -> Self {
        match arg {
            AgeGroupArg::Child => AgeGroup::Child,
            AgeGroupArg::Adolescent => AgeGroup::Adolescent,
            AgeGroupArg::YoungAdult => AgeGroup::YoungAdult,
            AgeGroupArg::Adult => AgeGroup::Adult,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "feelsync=debug" } else { "feelsync=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), FeelsyncCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            input_format,
            output_format,
            user,
            start,
            end,
            report_type,
            age_group,
            config,
            models,
            clusterer,
        } => cmd_analyze(AnalyzeArgs {
            input,
            output,
            input_format,
            output_format: output_format.unwrap_or_else(default_output_format),
            user,
            start,
            end,
            report_type: report_type.into(),
            age_group: age_group.into(),
            config,
            models,
            clusterer,
        }),
        Commands::Train {
            samples,
            output_dir,
            options,
            fit_clusterer,
        } => cmd_train(&samples, &output_dir, options.as_deref(), fit_clusterer),
        Commands::Trends { input } => cmd_trends(&input),
        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
        Commands::Doctor {
            config,
            models,
            clusterer,
            json,
        } => cmd_doctor(config.as_deref(), models.as_deref(), clusterer.as_deref(), json),
        Commands::Schema { json } => cmd_schema(json),
    }
}

struct AnalyzeArgs {
    input: PathBuf,
    output: PathBuf,
    input_format: InputFormat,
    output_format: OutputFormat,
    user: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    report_type: ReportType,
    age_group: AgeGroup,
    config: Option<PathBuf>,
    models: Option<PathBuf>,
    clusterer: Option<PathBuf>,
}

fn cmd_analyze(args: AnalyzeArgs) -> Result<(), FeelsyncCliError> {
    let batch = read_batch(&args.input, &args.input_format)?;
    let store = InMemoryEventStore::from_batch(batch);

    let (span_start, span_end) = store.time_span().ok_or(FeelsyncCliError::NoSessions)?;
    let start = args.start.unwrap_or(span_start);
    let end = args.end.unwrap_or(span_end);

    let users = match args.user {
        Some(user) => vec![user],
        None => store.user_ids(),
    };
    if users.is_empty() {
        return Err(FeelsyncCliError::NoSessions);
    }

    let generator = build_generator(args.config.as_deref(), args.models.as_deref(), args.clusterer.as_deref())?
        .with_age_group(args.age_group);

    let mut reports: Vec<AnalysisReport> = Vec::with_capacity(users.len());
    for user in &users {
        let report = generator.generate_report(&store, user, start, end, args.report_type)?;
        info!(user_id = %user, report_id = %report.id, "generated report");
        reports.push(report);
    }

    let output_data = format_output(&reports, &args.output_format)?;
    write_output(&args.output, &output_data)
}

fn build_generator(
    config: Option<&Path>,
    models: Option<&Path>,
    clusterer: Option<&Path>,
) -> Result<ReportGenerator, FeelsyncCliError> {
    let config = match config {
        Some(path) => AnalysisConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };
    let models = match models {
        Some(dir) => ModelContext::load_dir_or_heuristic(dir)?,
        None => ModelContext::heuristic(),
    };
    debug!(models = ?models, "model context ready");

    let mut generator = ReportGenerator::new(config, Arc::new(models))?;
    if let Some(path) = clusterer {
        generator = generator.with_clusterer(BehavioralClusterer::load(path)?);
    }
    Ok(generator)
}

/// Labelled samples keyed by indicator name
type SampleSet = BTreeMap<String, Vec<TrainingSample>>;

#[derive(Serialize)]
struct TrainSummary {
    producer: String,
    version: String,
    models: Vec<feelsync::models::TrainingReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clusterer: Option<feelsync::cluster::FitReport>,
}

fn cmd_train(
    samples: &Path,
    output_dir: &Path,
    options: Option<&Path>,
    fit_clusterer: bool,
) -> Result<(), FeelsyncCliError> {
    let sample_set: SampleSet = serde_json::from_str(&read_input(samples)?)?;
    let options = match options {
        Some(path) => serde_json::from_str::<TrainingOptions>(&fs::read_to_string(path)?)?,
        None => TrainingOptions::default(),
    };
    fs::create_dir_all(output_dir)?;

    let mut reports = Vec::new();
    for (name, samples) in &sample_set {
        let indicator = Indicator::from_name(name)
            .ok_or_else(|| FeelsyncCliError::Usage(format!("unknown indicator '{}'", name)))?;
        let (model, report) = train_indicator_model(indicator, samples, &options)?;
        model.save(&model_path(output_dir, indicator))?;
        info!(%indicator, samples = report.samples, r_squared = report.r_squared, "trained model");
        reports.push(report);
    }
    if reports.is_empty() {
        return Err(FeelsyncCliError::Usage("samples file holds no indicators".to_string()));
    }

    let clusterer = if fit_clusterer {
        let vectors = sample_set
            .values()
            .flatten()
            .map(|s| FeatureVector::from_values(s.features.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let (clusterer, fit) = BehavioralClusterer::fit(&vectors)?;
        clusterer.save(&output_dir.join("clusterer.json"))?;
        Some(fit)
    } else {
        None
    };

    let summary = TrainSummary {
        producer: PRODUCER_NAME.to_string(),
        version: FEELSYNC_VERSION.to_string(),
        models: reports,
        clusterer,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_trends(input: &Path) -> Result<(), FeelsyncCliError> {
    let reports: Vec<AnalysisReport> = serde_json::from_str(&read_input(input)?)?;
    let analysis = analyze_trends(&reports)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), FeelsyncCliError> {
    let batch = read_batch(input, &input_format)?;
    let report = batch.validate();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Sessions:         {}", report.sessions);
        println!("Events:           {}", report.events);
        println!("Invalid events:   {}", report.invalid_events.len());
        println!("Orphaned events:  {}", report.orphaned_events.len());

        if !report.invalid_events.is_empty() {
            println!("\nErrors:");
            for err in &report.invalid_events {
                println!(
                    "  - Event {} (session {}): {}",
                    err.index, err.session_id, err.reason
                );
            }
        }
        if !report.sessions_without_events.is_empty() {
            println!("\nSessions without events:");
            for id in &report.sessions_without_events {
                println!("  - {}", id);
            }
        }
    }

    let failures = report.invalid_events.len() + report.orphaned_events.len();
    if failures > 0 {
        Err(FeelsyncCliError::ValidationFailed(failures))
    } else {
        Ok(())
    }
}

fn cmd_doctor(
    config: Option<&Path>,
    models: Option<&Path>,
    clusterer: Option<&Path>,
    json: bool,
) -> Result<(), FeelsyncCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck::ok("feelsync_version", format!("FeelSync version {}", FEELSYNC_VERSION)),
        DoctorCheck::ok("feature_schema", format!("Feature schema: {}", FEATURE_SCHEMA_VERSION)),
        DoctorCheck::ok("report_version", format!("Report format: {}", REPORT_VERSION)),
    ];

    match config {
        Some(path) => checks.push(match fs::read_to_string(path).map_err(AnalysisError::from) {
            Ok(content) => match AnalysisConfig::from_json(&content) {
                Ok(config) => DoctorCheck::ok(
                    "config",
                    format!(
                        "Config valid (min sessions {}, full confidence at {})",
                        config.min_sessions, config.full_confidence_sessions
                    ),
                ),
                Err(e) => DoctorCheck::error("config", format!("Invalid config: {}", e)),
            },
            Err(e) => DoctorCheck::error("config", format!("Cannot read config file: {}", e)),
        }),
        None => checks.push(DoctorCheck::ok("config", "Using default config".to_string())),
    }

    match models {
        Some(dir) if dir.is_dir() => {
            for indicator in Indicator::ALL {
                let name = format!("model.{}", indicator);
                let path = model_path(dir, indicator);
                let check = if !path.exists() {
                    DoctorCheck::warning(&name, "No artifact, built-in model will be used".to_string())
                } else {
                    match feelsync::load_model(dir, indicator) {
                        Ok(model) => DoctorCheck::ok(
                            &name,
                            format!("{} ({} training samples)", model.version, model.training_samples),
                        ),
                        Err(e) => DoctorCheck::error(&name, e.to_string()),
                    }
                };
                checks.push(check);
            }
        }
        Some(_) => checks.push(DoctorCheck::error(
            "models",
            "Model directory does not exist".to_string(),
        )),
        None => checks.push(DoctorCheck::ok("models", "Using built-in models".to_string())),
    }

    if let Some(path) = clusterer {
        checks.push(match BehavioralClusterer::load(path) {
            Ok(c) => DoctorCheck::ok("clusterer", format!("{} archetype centroids", c.centroids.len())),
            Err(e) => DoctorCheck::error("clusterer", e.to_string()),
        });
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck::ok("stdin", "stdin is a TTY (interactive mode)".to_string())
    } else {
        DoctorCheck::ok("stdin", "stdin is a pipe (batch input ready)".to_string())
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FEELSYNC_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("FeelSync Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    if report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error)) {
        Err(FeelsyncCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(json: bool) -> Result<(), FeelsyncCliError> {
    if json {
        let schema = serde_json::json!({
            "schema_version": FEATURE_SCHEMA_VERSION,
            "features": FEATURE_SCHEMA,
        });
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!("Feature Schema: {}", FEATURE_SCHEMA_VERSION);
    println!();
    for spec in FEATURE_SCHEMA.iter() {
        println!("  {:<24} {:<10} default {:<6} {}", spec.name, spec.unit, spec.default, spec.description);
    }
    println!();
    println!("Imputed features take their default and are listed in report metadata.");
    Ok(())
}

// Helper functions

fn default_output_format() -> OutputFormat {
    if atty::is(atty::Stream::Stdout) {
        OutputFormat::JsonPretty
    } else {
        OutputFormat::Ndjson
    }
}

fn read_input(path: &Path) -> Result<String, FeelsyncCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_batch(path: &Path, format: &InputFormat) -> Result<EventBatch, FeelsyncCliError> {
    let data = read_input(path)?;
    let batch = match format {
        InputFormat::Json => EventBatch::from_json(&data)?,
        InputFormat::Ndjson => EventBatch::from_ndjson(&data)?,
    };
    if batch.sessions.is_empty() {
        warn!("batch contains no sessions");
    }
    Ok(batch)
}

fn write_output(path: &Path, data: &str) -> Result<(), FeelsyncCliError> {
    if path.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(path, data)?;
    }
    Ok(())
}

fn format_output<T: Serialize>(records: &[T], format: &OutputFormat) -> Result<String, FeelsyncCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::with_capacity(records.len());
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)? + "\n"),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_window_start(s: &str) -> Result<DateTime<Utc>, String> {
    if let Some(date) = parse_date(s) {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|t| Utc.from_utc_datetime(&t))
            .ok_or_else(|| format!("invalid date '{}'", s));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", s, e))
}

/// A bare date as window end covers that whole day
fn parse_window_end(s: &str) -> Result<DateTime<Utc>, String> {
    if parse_date(s).is_some() {
        return parse_window_start(s).map(|t| t + Duration::days(1) - Duration::seconds(1));
    }
    parse_window_start(s)
}

// Error types

#[derive(Debug)]
enum FeelsyncCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    NoSessions,
    ValidationFailed(usize),
    DoctorFailed,
    Usage(String),
}

impl From<io::Error> for FeelsyncCliError {
    fn from(e: io::Error) -> Self {
        FeelsyncCliError::Io(e)
    }
}

impl From<AnalysisError> for FeelsyncCliError {
    fn from(e: AnalysisError) -> Self {
        FeelsyncCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for FeelsyncCliError {
    fn from(e: serde_json::Error) -> Self {
        FeelsyncCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: String, hint: &str) -> Self {
        Self {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

impl From<FeelsyncCliError> for CliError {
    fn from(e: FeelsyncCliError) -> Self {
        match e {
            FeelsyncCliError::Io(e) => {
                CliError::new("IO_ERROR", e.to_string(), "Check file paths and permissions")
            }
            FeelsyncCliError::Analysis(e) => analysis_error(e),
            FeelsyncCliError::Json(e) => CliError::new("JSON_ERROR", e.to_string(), "Check JSON syntax"),
            FeelsyncCliError::NoSessions => CliError::new(
                "NO_SESSIONS",
                "No sessions found in input".to_string(),
                "Ensure the batch contains game sessions",
            ),
            FeelsyncCliError::ValidationFailed(count) => CliError::new(
                "VALIDATION_FAILED",
                format!("{} events failed validation", count),
                "Fix validation errors and retry",
            ),
            FeelsyncCliError::DoctorFailed => CliError::new(
                "DOCTOR_FAILED",
                "One or more health checks failed".to_string(),
                "Review the doctor report for details",
            ),
            FeelsyncCliError::Usage(msg) => CliError::new("USAGE_ERROR", msg, "Run with --help for usage"),
        }
    }
}

fn analysis_error(e: AnalysisError) -> CliError {
    let (code, hint) = match e.kind() {
        ErrorKind::InsufficientData => ("INSUFFICIENT_DATA", e.user_message()),
        ErrorKind::SchemaMismatch => ("SCHEMA_MISMATCH", "Run 'feelsync doctor --models <dir>' to check artifacts"),
        ErrorKind::ModelInference => ("MODEL_INFERENCE", "Retrain or remove the failing model artifact"),
        ErrorKind::IncompleteBatch => ("INCOMPLETE_BATCH", "Run 'feelsync validate' for details"),
        ErrorKind::EventStore => ("EVENT_STORE", "Check the event source"),
        ErrorKind::Configuration => ("CONFIG_ERROR", "Run 'feelsync doctor' to check config and artifacts"),
        ErrorKind::Training => ("TRAINING_ERROR", "Check labels and training options"),
        ErrorKind::Input => ("PARSE_ERROR", "Check input format"),
    };
    CliError::new(code, e.to_string(), hint)
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    fn ok(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Ok, message)
    }

    fn warning(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Warning, message)
    }

    fn error(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Error, message)
    }

    fn with_status(name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
        }
    }
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
