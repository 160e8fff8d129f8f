//! Kin CLI - Command-line interface for Kinemetry
//!
//! Commands:
//! - analyze: Replay a recorded frame log through an assessment session
//! - validate: Validate recorded frames against the input schema
//! - doctor: Diagnose environment and baseline files
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Duration;
use kinemetry::balance::{self, BalanceBaseline, BalanceConfig};
use kinemetry::schema::FrameLogAdapter;
use kinemetry::tapping::{self, TapBaseline, TapConfig};
use kinemetry::{
    AnalysisError, ReportEncoder, DEFAULT_AGGREGATION_WINDOW_MS, FRAME_SCHEMA_VERSION,
    KINEMETRY_VERSION, PRODUCER_NAME, REPORT_SCHEMA_VERSION,
};

/// Kinemetry - Motion analysis core for camera-based health assessments
#[derive(Parser)]
#[command(name = "kin")]
#[command(version = KINEMETRY_VERSION)]
#[command(about = "Analyze recorded motion assessment sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded frame log through an assessment session
    Analyze {
        /// Assessment to run
        #[arg(value_enum)]
        assessment: AssessmentKind,

        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// What to emit
        #[arg(long, default_value = "report")]
        emit: EmitMode,

        /// Aggregation window in milliseconds
        #[arg(long, default_value_t = DEFAULT_AGGREGATION_WINDOW_MS)]
        window_ms: i64,

        /// Compare the final aggregate against a baseline file
        #[arg(long)]
        load_baseline: Option<PathBuf>,

        /// Capture the final aggregate as a baseline and save it to file
        #[arg(long)]
        save_baseline: Option<PathBuf>,
    },

    /// Validate recorded frames against the input schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose environment and baseline files
    Doctor {
        /// Check a baseline file
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AssessmentKind {
    /// Standing-balance assessment over pose landmarks
    Balance,
    /// Finger-tapping assessment over hand landmarks
    Tapping,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one frame per line)
    Ndjson,
    /// JSON array of frames
    Json,
}

#[derive(Clone, ValueEnum)]
enum EmitMode {
    /// Final assessment report (pretty JSON)
    Report,
    /// Per-frame metrics records (NDJSON)
    Records,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (motion.frame.v1)
    Input,
    /// Output schema (assessment.report.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), KinCliError> {
    match cli.command {
        Commands::Analyze {
            assessment,
            input,
            output,
            input_format,
            emit,
            window_ms,
            load_baseline,
            save_baseline,
        } => cmd_analyze(
            assessment,
            &input,
            &output,
            input_format,
            emit,
            window_ms,
            load_baseline.as_deref(),
            save_baseline.as_deref(),
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { baseline, json } => cmd_doctor(baseline.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_analyze(
    assessment: AssessmentKind,
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    emit: EmitMode,
    window_ms: i64,
    load_baseline: Option<&Path>,
    save_baseline: Option<&Path>,
) -> Result<(), KinCliError> {
    let input_data = read_input(input)?;

    let frames = match input_format {
        InputFormat::Ndjson => FrameLogAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => FrameLogAdapter::parse_array(&input_data)?,
    };

    if frames.is_empty() {
        return Err(KinCliError::NoFrames);
    }

    let observations = FrameLogAdapter::to_observations(&frames)?;
    let window = Duration::milliseconds(window_ms);
    let window_secs = window_ms as f64 / 1000.0;

    let output_data = match assessment {
        AssessmentKind::Balance => {
            let analysis =
                balance::analyze_recording(observations, BalanceConfig::default(), window)?;

            if let Some(path) = save_baseline {
                let captured = BalanceBaseline::capture(analysis.aggregate.clone(), window_secs);
                fs::write(path, captured.to_json()?)?;
            }

            match emit {
                EmitMode::Records => format_records(&analysis.records)?,
                EmitMode::Report => {
                    let baseline = match load_baseline {
                        Some(path) => Some(BalanceBaseline::from_json(&fs::read_to_string(path)?)?),
                        None => None,
                    };
                    let comparison = balance::compare(&analysis.aggregate, baseline.as_ref());
                    let report = ReportEncoder::new().encode_balance(
                        &analysis.summary,
                        &analysis.aggregate,
                        comparison,
                    );
                    report.to_json()? + "\n"
                }
            }
        }

        AssessmentKind::Tapping => {
            let analysis = tapping::analyze_recording(observations, TapConfig::default(), window)?;

            if let Some(path) = save_baseline {
                let captured = TapBaseline::capture(analysis.aggregate.clone(), window_secs);
                fs::write(path, captured.to_json()?)?;
            }

            match emit {
                EmitMode::Records => format_records(&analysis.records)?,
                EmitMode::Report => {
                    let baseline = match load_baseline {
                        Some(path) => Some(TapBaseline::from_json(&fs::read_to_string(path)?)?),
                        None => None,
                    };
                    let comparison = tapping::compare(&analysis.aggregate, baseline.as_ref());
                    let report = ReportEncoder::new().encode_tapping(
                        &analysis.summary,
                        &analysis.aggregate,
                        comparison,
                    );
                    report.to_json()? + "\n"
                }
            }
        }
    };

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &PathBuf, input_format: InputFormat, json: bool) -> Result<(), KinCliError> {
    let input_data = read_input(input)?;

    let frames = match input_format {
        InputFormat::Ndjson => FrameLogAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => FrameLogAdapter::parse_array(&input_data)?,
    };

    let failures = FrameLogAdapter::validate_frames(&frames);

    let report = ValidationReport {
        total_frames: frames.len(),
        valid_frames: frames.len() - failures.len(),
        invalid_frames: failures.len(),
        errors: failures
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                timestamp_ms: frames[f.index].timestamp.timestamp_millis(),
                error: f.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total frames:   {}", report.total_frames);
        println!("Valid frames:   {}", report.valid_frames);
        println!("Invalid frames: {}", report.invalid_frames);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Frame {} at {}ms: {}",
                    err.index, err.timestamp_ms, err.error
                );
            }
        }
    }

    if report.invalid_frames > 0 {
        Err(KinCliError::ValidationFailed(report.invalid_frames))
    } else {
        Ok(())
    }
}

fn cmd_doctor(baseline: Option<&Path>, json: bool) -> Result<(), KinCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "kinemetry_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Kinemetry version {}", KINEMETRY_VERSION),
    });

    checks.push(DoctorCheck {
        name: "input_schema".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", FRAME_SCHEMA_VERSION),
    });

    checks.push(DoctorCheck {
        name: "report_schema".to_string(),
        status: CheckStatus::Ok,
        message: format!("Report schema: {}", REPORT_SCHEMA_VERSION),
    });

    if let Some(baseline_path) = baseline {
        if baseline_path.exists() {
            match fs::read_to_string(baseline_path) {
                Ok(content) => match serde_json::from_str::<serde_json::Value>(&content) {
                    Ok(value) => {
                        let captured_at = value
                            .get("captured_at")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown")
                            .to_string();
                        checks.push(DoctorCheck {
                            name: "baseline".to_string(),
                            status: CheckStatus::Ok,
                            message: format!("Baseline file valid (captured at {})", captured_at),
                        });
                    }
                    Err(e) => {
                        checks.push(DoctorCheck {
                            name: "baseline".to_string(),
                            status: CheckStatus::Error,
                            message: format!("Invalid baseline JSON: {}", e),
                        });
                    }
                },
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "baseline".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Cannot read baseline file: {}", e),
                    });
                }
            }
        } else {
            checks.push(DoctorCheck {
                name: "baseline".to_string(),
                status: CheckStatus::Warning,
                message: "Baseline file does not exist".to_string(),
            });
        }
    }

    // Replay input arrives on stdin when the shell pipes a frame log in
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (replay mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: KINEMETRY_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Kin Doctor Report");
        println!("=================");
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

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(KinCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), KinCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", FRAME_SCHEMA_VERSION);
                println!();
                println!("One recorded detector frame per record:");
                println!();
                println!("- schema: Optional schema tag ({})", FRAME_SCHEMA_VERSION);
                println!("- timestamp: Frame time as epoch milliseconds");
                println!("- source: Optional {{ detector, model }} provenance");
                println!("- landmarks: Array of {{ name, x, y, z?, confidence }}");
                println!("  - name: snake_case landmark vocabulary");
                println!("    - pose: nose, eyes, ears, shoulders, elbows, wrists,");
                println!("      hips, knees, ankles (17 points)");
                println!("    - hand: wrist plus thumb/index/middle/ring/pinky joints");
                println!("      from cmc/mcp to tip (21 points)");
                println!("  - confidence: Detector confidence in [0, 1] (alias: score)");
                println!();
                println!("Coordinates are in frame-source units; z is optional for 2D");
                println!("detectors. Balance needs nose, shoulders, hips, and ankles;");
                println!("tapping needs thumb_tip and index_finger_tip.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", REPORT_SCHEMA_VERSION);
                println!();
                println!("Assessment reports contain:");
                println!();
                println!("- schema: Schema version ({})", REPORT_SCHEMA_VERSION);
                println!("- producer: {{ name, version, instance_id }}");
                println!("- generated_at: Report encoding time (UTC)");
                println!("- session: {{ frames_processed, records_emitted, source_errors,");
                println!("  out_of_order_dropped, timestamps, stopped_early, issues }}");
                println!("- overall_score: Headline score in [0, 100]");
                println!("- metrics: Tagged by assessment:");
                println!("  - balance: {{ aggregate: {{ sway, stability, weight }},");
                println!("    comparison? }}");
                println!("  - finger_tap: {{ aggregate: {{ frequency, rhythm, fatigue,");
                println!("    quality }}, comparison?, findings }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &PathBuf) -> Result<String, KinCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn format_records<T: serde::Serialize>(records: &[T]) -> Result<String, KinCliError> {
    let mut lines: Vec<String> = Vec::new();
    for record in records {
        lines.push(serde_json::to_string(record)?);
    }
    Ok(lines.join("\n") + "\n")
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://kinemetry.dev/schemas/motion.frame.v1.json",
        "title": "motion.frame.v1",
        "description": "Kinemetry recorded detector frame schema",
        "type": "object",
        "required": ["timestamp", "landmarks"],
        "properties": {
            "schema": {
                "type": "string",
                "const": "motion.frame.v1"
            },
            "timestamp": {
                "type": "integer",
                "description": "Epoch milliseconds"
            },
            "source": {
                "type": "object",
                "properties": {
                    "detector": { "type": "string" },
                    "model": { "type": "string" }
                }
            },
            "landmarks": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["name", "x", "y", "confidence"],
                    "properties": {
                        "name": { "type": "string" },
                        "x": { "type": "number" },
                        "y": { "type": "number" },
                        "z": { "type": "number" },
                        "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
                    }
                }
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://kinemetry.dev/schemas/assessment.report.v1.json",
        "title": "assessment.report.v1",
        "description": "Kinemetry assessment report schema",
        "type": "object",
        "required": ["schema", "producer", "generated_at", "session", "overall_score", "metrics"],
        "properties": {
            "schema": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "generated_at": { "type": "string", "format": "date-time" },
            "session": {
                "type": "object",
                "properties": {
                    "frames_processed": { "type": "integer" },
                    "records_emitted": { "type": "integer" },
                    "source_errors": { "type": "integer" },
                    "out_of_order_dropped": { "type": "integer" },
                    "stopped_early": { "type": "boolean" },
                    "issues": { "type": "array", "items": { "type": "object" } }
                }
            },
            "overall_score": { "type": "number" },
            "metrics": {
                "type": "object",
                "required": ["assessment", "aggregate"],
                "properties": {
                    "assessment": { "type": "string", "enum": ["balance", "finger_tap"] },
                    "aggregate": { "type": "object" },
                    "comparison": { "type": "object" },
                    "findings": { "type": "array", "items": { "type": "object" } }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum KinCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    NoFrames,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for KinCliError {
    fn from(e: io::Error) -> Self {
        KinCliError::Io(e)
    }
}

impl From<AnalysisError> for KinCliError {
    fn from(e: AnalysisError) -> Self {
        KinCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for KinCliError {
    fn from(e: serde_json::Error) -> Self {
        KinCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<KinCliError> for CliError {
    fn from(e: KinCliError) -> Self {
        match e {
            KinCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            KinCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches the motion.frame.v1 schema".to_string()),
            },
            KinCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            KinCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            KinCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} frames failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            KinCliError::DoctorFailed => CliError {
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
    total_frames: usize,
    valid_frames: usize,
    invalid_frames: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    timestamp_ms: i64,
    error: String,
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
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
