//! Probelog CLI - Command-line interface for the session-record store
//!
//! Commands:
//! - append: append a session bundle (JSON) to the store
//! - records: list everything persisted so far
//! - summary: print the text summary of the latest session
//! - report: print a chartable metric series
//! - export: write one session to an Excel workbook
//! - doctor: diagnose the backing file

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use probelog::report::{accuracy_series, duration_series, session_summary, SeriesPoint};
use probelog::{
    export_to_excel, CsvStore, SessionBundle, StoredRecord, DEFAULT_STORE_FILE, PROBELOG_VERSION,
};

/// Probelog - session-record store for ABA data collection
#[derive(Parser)]
#[command(name = "probelog")]
#[command(version = PROBELOG_VERSION)]
#[command(about = "Record and report therapy session data", long_about = None)]
struct Cli {
    /// Backing CSV file to read and write
    #[arg(short, long, default_value = DEFAULT_STORE_FILE, global = true)]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a session bundle to the store
    Append {
        /// Bundle JSON file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List all persisted records in append order
    Records {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the text summary of the latest session
    Summary {
        /// Output the bundle as JSON instead of the text template
        #[arg(long)]
        json: bool,
    },

    /// Print a metric series for charting
    Report {
        /// Metric to chart
        #[arg(long, default_value = "accuracy")]
        metric: Metric,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export one session to an Excel workbook
    Export {
        /// Output .xlsx path
        #[arg(short, long, default_value = "session_data.xlsx")]
        output: PathBuf,

        /// Record index to export (default: latest)
        #[arg(long)]
        record: Option<usize>,
    },

    /// Diagnose the backing file
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum Metric {
    /// Mean trial accuracy per record
    Accuracy,
    /// Cumulative behavior duration
    Duration,
}

fn main() -> ExitCode {
    env_logger::init();
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

fn run(cli: Cli) -> Result<(), ProbelogCliError> {
    let mut store = CsvStore::new(&cli.file);

    match cli.command {
        Commands::Append { input } => cmd_append(&mut store, &input),
        Commands::Records { json } => cmd_records(&store, json),
        Commands::Summary { json } => cmd_summary(&store, json),
        Commands::Report { metric, json } => cmd_report(&store, metric, json),
        Commands::Export { output, record } => cmd_export(&store, &output, record),
        Commands::Doctor { json } => cmd_doctor(&store, json),
    }
}

fn cmd_append(store: &mut CsvStore, input: &PathBuf) -> Result<(), ProbelogCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let bundle: SessionBundle = serde_json::from_str(&input_data)?;
    let id = store.append_record(&bundle)?;
    println!("{id}");
    Ok(())
}

fn cmd_records(store: &CsvStore, json: bool) -> Result<(), ProbelogCliError> {
    let records = store.query_all_records()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records in {}", store.path().display());
        return Ok(());
    }

    for (index, record) in records.iter().enumerate() {
        let bundle = &record.bundle;
        println!(
            "{index:>3}  {}  {}  probes={} trials={} steps={} duration={}",
            bundle.record.date.format("%Y-%m-%d"),
            if bundle.record.therapist_name.is_empty() {
                "-"
            } else {
                bundle.record.therapist_name.as_str()
            },
            bundle.cold_probe.len(),
            bundle.trial_sets.len(),
            bundle.task_steps.len(),
            bundle
                .total_duration_seconds
                .map(|s| format!("{s:.2}s"))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

fn cmd_summary(store: &CsvStore, json: bool) -> Result<(), ProbelogCliError> {
    let records = store.query_all_records()?;
    let latest = records.last().ok_or(ProbelogCliError::NoRecords)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&latest.bundle)?);
    } else {
        println!("{}", session_summary(&latest.bundle));
    }
    Ok(())
}

fn cmd_report(store: &CsvStore, metric: Metric, json: bool) -> Result<(), ProbelogCliError> {
    let records = store.query_all_records()?;

    let (label, series): (&str, Vec<SeriesPoint>) = match metric {
        Metric::Accuracy => ("accuracy %", accuracy_series(&records)),
        Metric::Duration => ("cumulative duration s", duration_series(&records)),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    if series.is_empty() {
        println!("No data points for this metric");
        return Ok(());
    }

    println!("index  date        {label}");
    for point in &series {
        println!(
            "{:>5}  {}  {:.2}",
            point.index,
            point.date.format("%Y-%m-%d"),
            point.value
        );
    }
    Ok(())
}

fn cmd_export(
    store: &CsvStore,
    output: &PathBuf,
    record: Option<usize>,
) -> Result<(), ProbelogCliError> {
    let records = store.query_all_records()?;

    let stored: &StoredRecord = match record {
        Some(index) => records
            .get(index)
            .ok_or(ProbelogCliError::RecordOutOfRange(index, records.len()))?,
        None => records.last().ok_or(ProbelogCliError::NoRecords)?,
    };

    let sheets = export_to_excel(&stored.bundle, output)?;
    println!(
        "Exported {} sheet(s) to {}: {}",
        sheets.len(),
        output.display(),
        sheets.join(", ")
    );
    Ok(())
}

fn cmd_doctor(store: &CsvStore, json: bool) -> Result<(), ProbelogCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("probelog {PROBELOG_VERSION}"),
    });

    if store.path().exists() {
        match store.query_all_records() {
            Ok(records) => checks.push(DoctorCheck {
                name: "store".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "{} readable, {} record(s)",
                    store.path().display(),
                    records.len()
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "store".to_string(),
                status: CheckStatus::Error,
                message: format!("cannot read {}: {e}", store.path().display()),
            }),
        }
    } else {
        checks.push(DoctorCheck {
            name: "store".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "{} does not exist yet; it is created on first save",
                store.path().display()
            ),
        });
    }

    let report = DoctorReport {
        version: PROBELOG_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Probelog Doctor Report");
        println!("======================");
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
        Err(ProbelogCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Doctor report types

#[derive(serde::Serialize)]
struct DoctorReport {
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

// Error types

#[derive(Debug)]
enum ProbelogCliError {
    Io(io::Error),
    Store(probelog::StoreError),
    Json(serde_json::Error),
    NoRecords,
    RecordOutOfRange(usize, usize),
    DoctorFailed,
}

impl From<io::Error> for ProbelogCliError {
    fn from(e: io::Error) -> Self {
        ProbelogCliError::Io(e)
    }
}

impl From<probelog::StoreError> for ProbelogCliError {
    fn from(e: probelog::StoreError) -> Self {
        ProbelogCliError::Store(e)
    }
}

impl From<serde_json::Error> for ProbelogCliError {
    fn from(e: serde_json::Error) -> Self {
        ProbelogCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ProbelogCliError> for CliError {
    fn from(e: ProbelogCliError) -> Self {
        match e {
            ProbelogCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ProbelogCliError::Store(e) => CliError {
                code: "STORE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'probelog doctor' for details".to_string()),
            },
            ProbelogCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check bundle JSON syntax".to_string()),
            },
            ProbelogCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "The store has no records yet".to_string(),
                hint: Some("Append a session first".to_string()),
            },
            ProbelogCliError::RecordOutOfRange(index, len) => CliError {
                code: "RECORD_OUT_OF_RANGE".to_string(),
                message: format!("record index {index} out of range (store has {len})"),
                hint: Some("Run 'probelog records' to list indices".to_string()),
            },
            ProbelogCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}
