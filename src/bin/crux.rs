//! Crux CLI - Command-line interface for the Crux coaching engine
//!
//! Commands:
//! - score: Score a measurement into an assessment envelope
//! - plan: Score a measurement and generate a six-week program
//! - validate: Re-check every scheduling invariant on a program
//! - grades: Print the grade threshold table
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Weekday;
use crux::constraints::{validate_program, ConstraintValidator, Violation};
use crux::encoder::{ProgramEncoder, ProgramEnvelope};
use crux::generation::StaticNarrator;
use crux::history::AssessmentHistory;
use crux::types::{
    DetailedContext, ProgramType, RawMeasurement, RawMeasurementDraft, TrainingProgram,
    UserPreferences,
};
use crux::{
    Clock, CoachConfig, CoachEngine, CoachError, GradeThresholdTable, SystemClock, CRUX_VERSION,
    PRODUCER_NAME,
};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crux - Climbing assessment scoring and periodized training programs
#[derive(Parser)]
#[command(name = "crux")]
#[command(version = CRUX_VERSION)]
#[command(about = "Score climbing assessments and generate training programs", long_about = None)]
struct Cli {
    /// Engine configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a measurement (JSON) into an assessment envelope
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Append the result to this assessment history file and report progress
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Generate a program from a plan request (JSON)
    Plan {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Replay this file as narration provider output
        #[arg(long)]
        narration: Option<PathBuf>,
    },

    /// Validate a program (JSON or envelope) against the scheduling rules
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Days the climber was available (e.g. mon,wed,fri)
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the grade threshold table
    Grades {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Body of a `plan` request
#[derive(Deserialize)]
struct PlanRequest {
    measurement: RawMeasurementDraft,
    preferences: UserPreferences,
    #[serde(default = "default_program_type")]
    program_type: ProgramType,
    #[serde(default)]
    context: DetailedContext,
}

fn default_program_type() -> ProgramType {
    ProgramType::Quick
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

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

fn run(cli: Cli) -> Result<(), CruxCliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Score { input, history } => {
            cmd_score(&input, history.as_deref(), load_config(config_path)?)
        }
        Commands::Plan { input, narration } => {
            cmd_plan(&input, narration.as_deref(), load_config(config_path)?)
        }
        Commands::Validate { input, days, json } => cmd_validate(&input, &days, json),
        Commands::Grades { json } => cmd_grades(json),
        Commands::Doctor { json } => cmd_doctor(config_path, json),
    }
}

fn load_config(path: Option<&Path>) -> Result<CoachConfig, CruxCliError> {
    match path {
        Some(path) => Ok(CoachConfig::from_toml_file(path)?),
        None => Ok(CoachConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, CruxCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn encoder_for(config: &CoachConfig) -> ProgramEncoder {
    match &config.producer_instance_id {
        Some(id) => ProgramEncoder::with_instance_id(id.clone()),
        None => ProgramEncoder::new(),
    }
}

fn cmd_score(input: &Path, history: Option<&Path>, config: CoachConfig) -> Result<(), CruxCliError> {
    let draft: RawMeasurementDraft = serde_json::from_str(&read_input(input)?)?;
    let measurement = RawMeasurement::try_from(draft)?;

    let encoder = encoder_for(&config);
    let past = match history {
        Some(path) if path.exists() => AssessmentHistory::load(path)?,
        _ => AssessmentHistory::new(),
    };
    let mut engine = CoachEngine::new(config)?.with_history(past);
    let assessment = engine.assess(&measurement)?;

    if let Some(path) = history {
        engine.history().save(path)?;
        if let Some(progress) = engine.history().progress() {
            tracing::info!(
                composite_delta = progress.composite_delta,
                grade_delta = progress.grade_delta,
                improved = ?progress.improved(),
                "progress since previous assessment"
            );
        }
    }

    println!(
        "{}",
        encoder.encode_assessment_to_json(&assessment, SystemClock.now())?
    );
    Ok(())
}

fn cmd_plan(input: &Path, narration: Option<&Path>, config: CoachConfig) -> Result<(), CruxCliError> {
    let request: PlanRequest = serde_json::from_str(&read_input(input)?)?;
    let measurement = RawMeasurement::try_from(request.measurement)?;

    let encoder = encoder_for(&config);
    let mut engine = CoachEngine::new(config)?;
    if let Some(path) = narration {
        engine = engine.with_narration_provider(Arc::new(StaticNarrator::new(fs::read_to_string(path)?)));
    }

    let assessment = engine.assess(&measurement)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()?;
    let program = runtime.block_on(engine.generate_program(
        &assessment,
        &request.preferences,
        request.program_type,
        &request.context,
    ))?;

    println!("{}", encoder.encode_to_json(&program, SystemClock.now())?);
    Ok(())
}

fn cmd_validate(input: &Path, days: &[String], json: bool) -> Result<(), CruxCliError> {
    let text = read_input(input)?;
    let program: TrainingProgram = match serde_json::from_str::<ProgramEnvelope>(&text) {
        Ok(envelope) => envelope.program,
        Err(_) => serde_json::from_str(&text)?,
    };

    let available: Vec<Weekday> = days
        .iter()
        .map(|d| {
            d.trim()
                .parse::<Weekday>()
                .map_err(|_| CruxCliError::InvalidArgument(format!("unknown weekday '{d}'")))
        })
        .collect::<Result<_, _>>()?;

    let validator = if available.is_empty() {
        ConstraintValidator::for_available_days(7)
    } else {
        ConstraintValidator::for_available_days(available.len())
    };
    let violations = validate_program(
        &program,
        &validator,
        (!available.is_empty()).then_some(available.as_slice()),
    );

    let report = ValidationReport {
        program_id: program.id.to_string(),
        weeks: program.weeks.len(),
        valid: violations.is_empty(),
        violations: violations.iter().map(ViolationDetail::from).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Program:    {}", report.program_id);
        println!("Weeks:      {}", report.weeks);
        println!("Violations: {}", report.violations.len());

        if !report.violations.is_empty() {
            println!("\nViolations:");
            for v in &report.violations {
                println!("  - {}", v.message);
            }
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(CruxCliError::ValidationFailed(report.violations.len()))
    }
}

fn cmd_grades(json: bool) -> Result<(), CruxCliError> {
    let table = GradeThresholdTable::standard();

    if json {
        println!("{}", serde_json::to_string_pretty(table.rows())?);
    } else {
        println!("Grade  Minimum composite");
        for row in table.rows() {
            println!("{:<6} {:.2}", row.grade.to_string(), row.min_composite);
        }
    }
    Ok(())
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), CruxCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "crux_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Crux version {CRUX_VERSION}"),
    });

    checks.push(match GradeThresholdTable::new(GradeThresholdTable::standard().rows().to_vec()) {
        Ok(table) => DoctorCheck {
            name: "grade_table".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} thresholds, {} to {}", table.rows().len(), table.floor(), table.ceiling()),
        },
        Err(e) => DoctorCheck {
            name: "grade_table".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    match config_path {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist, defaults apply", path.display()),
        }),
        Some(path) => checks.push(match CoachConfig::from_toml_file(path) {
            Ok(config) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid (timeout {}s, {} active days max)",
                    config.generation_timeout_secs, config.max_active_days
                ),
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        }),
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "No config file given, defaults apply".to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input FILE)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for --input -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: CRUX_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Crux Doctor Report");
        println!("==================");
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
        Err(CruxCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum CruxCliError {
    Io(io::Error),
    Coach(CoachError),
    Json(serde_json::Error),
    InvalidArgument(String),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for CruxCliError {
    fn from(e: io::Error) -> Self {
        CruxCliError::Io(e)
    }
}

impl From<CoachError> for CruxCliError {
    fn from(e: CoachError) -> Self {
        CruxCliError::Coach(e)
    }
}

impl From<serde_json::Error> for CruxCliError {
    fn from(e: serde_json::Error) -> Self {
        CruxCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CruxCliError> for CliError {
    fn from(e: CruxCliError) -> Self {
        match e {
            CruxCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CruxCliError::Coach(e) => {
                let (code, hint) = match &e {
                    CoachError::ValidationError { .. } => {
                        ("VALIDATION_ERROR", "Check the measurement fields")
                    }
                    CoachError::ConfigurationError { .. } => {
                        ("CONFIGURATION_ERROR", "Check preferences and configuration values")
                    }
                    CoachError::ConfigFileError(_) => {
                        ("CONFIG_FILE_ERROR", "Run 'crux doctor --config FILE' for details")
                    }
                    CoachError::PersistenceError(_) => {
                        ("PERSISTENCE_ERROR", "Check the history file path")
                    }
                    _ => ("ENGINE_ERROR", "Re-run with RUST_LOG=debug for details"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            CruxCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CruxCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: Some("Use three-letter weekday names, e.g. mon,wed,fri".to_string()),
            },
            CruxCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{count} scheduling rules violated"),
                hint: Some("The program was edited or produced by another tool".to_string()),
            },
            CruxCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    program_id: String,
    weeks: usize,
    valid: bool,
    violations: Vec<ViolationDetail>,
}

#[derive(serde::Serialize)]
struct ViolationDetail {
    message: String,
    detail: Violation,
}

impl From<&Violation> for ViolationDetail {
    fn from(v: &Violation) -> Self {
        Self {
            message: v.to_string(),
            detail: v.clone(),
        }
    }
}

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

#[derive(serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
