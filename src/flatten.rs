//! Bundle flattening
//!
//! Maps a [`SessionBundle`] to and from the flat (column, value) rows the
//! CSV store persists. Column names carry the section as a prefix:
//!
//! - `date`, `start_time`, `end_time`, `therapist`
//! - `cold_probe: {domain} - {target}` → `Y` / `N` / `NA`
//! - `trials: {target}` → comma-joined outcome codes, e.g. `+,p,-,I,+`
//! - `accuracy: {target}` → `60.00%` (write-only; recomputed on read)
//! - `task: {step}` → prompt-level code
//! - `behavior_duration` → seconds with 2 decimal places
//!
//! Only sections present in the bundle contribute columns, so the column
//! set legitimately differs bundle to bundle.

use chrono::{NaiveDate, NaiveTime};

use crate::error::StoreError;
use crate::types::{
    ColdProbeEntry, ProbeResponse, PromptLevel, SessionBundle, TaskStep, TrialOutcome, TrialSet,
};

pub const COL_DATE: &str = "date";
pub const COL_START_TIME: &str = "start_time";
pub const COL_END_TIME: &str = "end_time";
pub const COL_THERAPIST: &str = "therapist";
pub const COL_DURATION: &str = "behavior_duration";

pub const PREFIX_COLD_PROBE: &str = "cold_probe: ";
pub const PREFIX_TRIALS: &str = "trials: ";
pub const PREFIX_ACCURACY: &str = "accuracy: ";
pub const PREFIX_TASK: &str = "task: ";

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";

/// Accuracy cell text for a trial set, `N/A` when undefined
pub fn format_accuracy(accuracy: Option<f64>) -> String {
    match accuracy {
        Some(pct) => format!("{pct:.2}%"),
        None => "N/A".to_string(),
    }
}

/// Flatten a bundle into ordered (column, value) pairs
pub fn flatten(bundle: &SessionBundle) -> Vec<(String, String)> {
    let mut columns = Vec::new();

    columns.push((
        COL_DATE.to_string(),
        bundle.record.date.format(DATE_FMT).to_string(),
    ));

    if bundle.record.has_details() {
        columns.push((
            COL_START_TIME.to_string(),
            bundle
                .record
                .start_time
                .map(|t| t.format(TIME_FMT).to_string())
                .unwrap_or_default(),
        ));
        columns.push((
            COL_END_TIME.to_string(),
            bundle
                .record
                .end_time
                .map(|t| t.format(TIME_FMT).to_string())
                .unwrap_or_default(),
        ));
        columns.push((
            COL_THERAPIST.to_string(),
            bundle.record.therapist_name.clone(),
        ));
    }

    for entry in &bundle.cold_probe {
        columns.push((
            format!("{PREFIX_COLD_PROBE}{}", entry.label()),
            entry.response.as_str().to_string(),
        ));
    }

    for set in &bundle.trial_sets {
        let codes: Vec<&str> = set.trials.iter().map(|t| t.as_str()).collect();
        columns.push((format!("{PREFIX_TRIALS}{}", set.target), codes.join(",")));
        columns.push((
            format!("{PREFIX_ACCURACY}{}", set.target),
            format_accuracy(set.accuracy_percent()),
        ));
    }

    for step in &bundle.task_steps {
        columns.push((
            format!("{PREFIX_TASK}{}", step.step),
            step.prompt_level.as_str().to_string(),
        ));
    }

    if let Some(total) = bundle.total_duration_seconds {
        columns.push((COL_DURATION.to_string(), format!("{total:.2}")));
    }

    columns
}

/// Rebuild a bundle from a header and one row of cells.
///
/// Empty cells mean the column did not apply to this row. `accuracy:`
/// columns are skipped; accuracy is derived from `trials:` on demand.
pub fn unflatten(header: &[String], row: &[String]) -> Result<SessionBundle, StoreError> {
    let cell = |name: &str| -> Option<&str> {
        header
            .iter()
            .position(|h| h == name)
            .and_then(|i| row.get(i))
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    };

    let date_text = cell(COL_DATE).ok_or_else(|| StoreError::Parse("row has no date".into()))?;
    let date = NaiveDate::parse_from_str(date_text, DATE_FMT)
        .map_err(|e| StoreError::Parse(format!("bad date '{date_text}': {e}")))?;

    let mut bundle = SessionBundle::new(date);
    bundle.record.start_time = parse_time(cell(COL_START_TIME))?;
    bundle.record.end_time = parse_time(cell(COL_END_TIME))?;
    if let Some(name) = cell(COL_THERAPIST) {
        bundle.record.therapist_name = name.to_string();
    }

    // Header order preserves each section's entry order
    for (i, column) in header.iter().enumerate() {
        let value = match row.get(i).map(|s| s.as_str()).filter(|s| !s.is_empty()) {
            Some(v) => v,
            None => continue,
        };

        if let Some(label) = column.strip_prefix(PREFIX_COLD_PROBE) {
            bundle.cold_probe.push(parse_cold_probe(label, value)?);
        } else if let Some(target) = column.strip_prefix(PREFIX_TRIALS) {
            bundle.trial_sets.push(parse_trial_set(target, value)?);
        } else if let Some(step) = column.strip_prefix(PREFIX_TASK) {
            let prompt_level = PromptLevel::parse(value).ok_or_else(|| {
                StoreError::Parse(format!("unknown prompt level '{value}' for step '{step}'"))
            })?;
            bundle.task_steps.push(TaskStep {
                step: step.to_string(),
                prompt_level,
            });
        } else if column == COL_DURATION {
            let total: f64 = value
                .parse()
                .map_err(|_| StoreError::Parse(format!("bad duration '{value}'")))?;
            bundle.total_duration_seconds = Some(total);
        }
    }

    Ok(bundle)
}

fn parse_time(cell: Option<&str>) -> Result<Option<NaiveTime>, StoreError> {
    match cell {
        Some(text) => NaiveTime::parse_from_str(text, TIME_FMT)
            .map(Some)
            .map_err(|e| StoreError::Parse(format!("bad time '{text}': {e}"))),
        None => Ok(None),
    }
}

fn parse_cold_probe(label: &str, value: &str) -> Result<ColdProbeEntry, StoreError> {
    let (domain, target) = match label.split_once(" - ") {
        Some((domain, target)) => (domain.to_string(), target.to_string()),
        None => (String::new(), label.to_string()),
    };
    let response = ProbeResponse::parse(value)
        .ok_or_else(|| StoreError::Parse(format!("unknown probe response '{value}'")))?;
    Ok(ColdProbeEntry {
        domain,
        target,
        response,
    })
}

fn parse_trial_set(target: &str, value: &str) -> Result<TrialSet, StoreError> {
    let trials: Vec<TrialOutcome> = value
        .split(',')
        .map(|code| {
            TrialOutcome::parse(code.trim())
                .ok_or_else(|| StoreError::Parse(format!("unknown trial outcome '{code}'")))
        })
        .collect::<Result<_, _>>()?;
    Ok(TrialSet {
        target: target.to_string(),
        trials,
    })
}
