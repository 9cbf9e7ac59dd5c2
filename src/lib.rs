//! Probelog - Session-record engine for applied-behavior-analysis data
//!
//! Probelog validates, normalizes, and persists structured therapy-session
//! observations and computes their derived metrics: cold-probe responses,
//! trial-by-trial accuracy, task-analysis prompt levels, and cumulative
//! behavior duration.
//!
//! ## Modules
//!
//! - **types**: the session data model (records, probes, trials, steps)
//! - **metrics**: pure accuracy and duration computation
//! - **timer**: the Idle/Running behavior-duration state machine
//! - **context**: session-scoped state with explicit command handlers
//! - **store**: append-only CSV persistence with a frozen header
//! - **export**: on-demand spreadsheet export, one sheet per section
//! - **report**: chart-ready series and plain-text session summaries

pub mod context;
pub mod error;
pub mod export;
pub mod flatten;
pub mod metrics;
pub mod report;
pub mod store;
pub mod timer;
pub mod types;

pub use context::SessionContext;
pub use error::StoreError;
pub use export::export_to_excel;
pub use metrics::{accumulate_duration, trial_accuracy};
pub use store::CsvStore;
pub use timer::{DurationTimer, TimerStatus};
pub use types::{
    ColdProbeEntry, DurationEpisode, ProbeResponse, PromptLevel, RecordId, SessionBundle,
    SessionRecord, StoredRecord, TaskStep, TrialOutcome, TrialSet,
};

/// Probelog version recorded by the CLI
pub const PROBELOG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default backing file name when none is given
pub const DEFAULT_STORE_FILE: &str = "session_data.csv";
