//! Core types for the probelog session data model
//!
//! This module defines the entities a therapist records during one session:
//! session metadata, cold-probe responses, trial-by-trial outcomes,
//! task-analysis prompt levels, and behavior-duration totals.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Maximum number of trial targets per session
pub const MAX_TARGETS: usize = 10;

/// Maximum number of trials per target
pub const MAX_TRIALS: usize = 10;

/// Response to a cold probe of a target skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeResponse {
    Yes,
    No,
    NotApplicable,
}

impl ProbeResponse {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeResponse::Yes => "Y",
            ProbeResponse::No => "N",
            ProbeResponse::NotApplicable => "NA",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "Y" => Some(ProbeResponse::Yes),
            "N" => Some(ProbeResponse::No),
            "NA" => Some(ProbeResponse::NotApplicable),
            _ => None,
        }
    }
}

/// Outcome of a single discrete trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOutcome {
    Correct,
    Prompted,
    Incorrect,
    Independent,
}

impl TrialOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialOutcome::Correct => "+",
            TrialOutcome::Prompted => "p",
            TrialOutcome::Incorrect => "-",
            TrialOutcome::Independent => "I",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "+" => Some(TrialOutcome::Correct),
            "p" => Some(TrialOutcome::Prompted),
            "-" => Some(TrialOutcome::Incorrect),
            "I" => Some(TrialOutcome::Independent),
            _ => None,
        }
    }

    /// Whether this outcome counts toward accuracy (unassisted success)
    pub fn is_success(&self) -> bool {
        matches!(self, TrialOutcome::Correct | TrialOutcome::Independent)
    }
}

/// Degree of assistance given during a task-analysis step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptLevel {
    FullPhysical,
    PartialPhysical,
    Model,
    Verbal,
    Visual,
    Gestural,
    TextualOrDemonstration,
    Independent,
}

impl PromptLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptLevel::FullPhysical => "FP",
            PromptLevel::PartialPhysical => "PP",
            PromptLevel::Model => "MP",
            PromptLevel::Verbal => "VP",
            PromptLevel::Visual => "VI",
            PromptLevel::Gestural => "GP",
            PromptLevel::TextualOrDemonstration => "TD",
            PromptLevel::Independent => "I",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "FP" => Some(PromptLevel::FullPhysical),
            "PP" => Some(PromptLevel::PartialPhysical),
            "MP" => Some(PromptLevel::Model),
            "VP" => Some(PromptLevel::Verbal),
            "VI" => Some(PromptLevel::Visual),
            "GP" => Some(PromptLevel::Gestural),
            "TD" => Some(PromptLevel::TextualOrDemonstration),
            "I" => Some(PromptLevel::Independent),
            _ => None,
        }
    }
}

/// Metadata for one completed therapist session.
///
/// Immutable once appended to the store; corrections are new records.
/// `end_time` is intentionally not checked against `start_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Calendar date of the session
    pub date: NaiveDate,
    /// Time the session started
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_time: Option<NaiveTime>,
    /// Time the session ended
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end_time: Option<NaiveTime>,
    /// Therapist name, may be empty
    #[serde(default)]
    pub therapist_name: String,
}

impl SessionRecord {
    /// Create a record with only the date set
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            start_time: None,
            end_time: None,
            therapist_name: String::new(),
        }
    }

    /// Whether any session-details field beyond the date was filled in
    pub fn has_details(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some() || !self.therapist_name.is_empty()
    }
}

/// One (domain, target) → response triple within a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColdProbeEntry {
    /// Optional grouping label, may be empty
    #[serde(default)]
    pub domain: String,
    /// Target skill, non-empty after trimming
    pub target: String,
    pub response: ProbeResponse,
}

impl ColdProbeEntry {
    pub fn new(
        domain: impl Into<String>,
        target: impl Into<String>,
        response: ProbeResponse,
    ) -> Result<Self, StoreError> {
        let target = target.into().trim().to_string();
        if target.is_empty() {
            return Err(StoreError::Validation(
                "cold probe target must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            domain: domain.into().trim().to_string(),
            target,
            response,
        })
    }

    /// Flat column label: "{domain} - {target}", or just the target
    pub fn label(&self) -> String {
        if self.domain.is_empty() {
            self.target.clone()
        } else {
            format!("{} - {}", self.domain, self.target)
        }
    }
}

/// One target's ordered sequence of trial outcomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSet {
    /// Target skill, non-empty
    pub target: String,
    /// Outcome per trial, 1 to [`MAX_TRIALS`] entries
    pub trials: Vec<TrialOutcome>,
}

impl TrialSet {
    pub fn new(target: impl Into<String>, trials: Vec<TrialOutcome>) -> Result<Self, StoreError> {
        let target = target.into().trim().to_string();
        if target.is_empty() {
            return Err(StoreError::Validation(
                "trial target must be non-empty".to_string(),
            ));
        }
        if trials.is_empty() || trials.len() > MAX_TRIALS {
            return Err(StoreError::Validation(format!(
                "trial count must be 1-{}, got {}",
                MAX_TRIALS,
                trials.len()
            )));
        }
        Ok(Self { target, trials })
    }

    /// Accuracy percentage for this set, `None` when no trials are recorded
    pub fn accuracy_percent(&self) -> Option<f64> {
        crate::metrics::trial_accuracy(&self.trials)
    }
}

/// One (step, prompt level) pair from a task analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStep {
    /// Step description, non-empty
    pub step: String,
    pub prompt_level: PromptLevel,
}

impl TaskStep {
    pub fn new(step: impl Into<String>, prompt_level: PromptLevel) -> Result<Self, StoreError> {
        let step = step.into().trim().to_string();
        if step.is_empty() {
            return Err(StoreError::Validation(
                "task step must be non-empty".to_string(),
            ));
        }
        Ok(Self { step, prompt_level })
    }
}

/// One completed start/stop timer cycle for a behavior of concern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationEpisode {
    /// When the timer was started
    pub started_at: DateTime<Utc>,
    /// Wall-clock seconds between start and stop, non-negative
    pub elapsed_seconds: f64,
}

/// Everything recorded for one session, persisted by value on save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBundle {
    pub record: SessionRecord,
    #[serde(default)]
    pub cold_probe: Vec<ColdProbeEntry>,
    #[serde(default)]
    pub trial_sets: Vec<TrialSet>,
    #[serde(default)]
    pub task_steps: Vec<TaskStep>,
    /// Total behavior duration for the session, `None` when never recorded
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_duration_seconds: Option<f64>,
}

impl SessionBundle {
    /// Create an empty bundle for the given session date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            record: SessionRecord::new(date),
            cold_probe: Vec::new(),
            trial_sets: Vec::new(),
            task_steps: Vec::new(),
            total_duration_seconds: None,
        }
    }
}

/// Identifier minted for each appended row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted row read back from the store, in append order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub bundle: SessionBundle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_outcome_codes_round_trip() {
        for outcome in [
            TrialOutcome::Correct,
            TrialOutcome::Prompted,
            TrialOutcome::Incorrect,
            TrialOutcome::Independent,
        ] {
            assert_eq!(TrialOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(TrialOutcome::parse("x"), None);
    }

    #[test]
    fn test_prompt_level_codes() {
        assert_eq!(PromptLevel::FullPhysical.as_str(), "FP");
        assert_eq!(PromptLevel::Verbal.as_str(), "VP");
        assert_eq!(PromptLevel::Visual.as_str(), "VI");
        assert_eq!(
            PromptLevel::parse("TD"),
            Some(PromptLevel::TextualOrDemonstration)
        );
        assert_eq!(PromptLevel::parse("ZZ"), None);
    }

    #[test]
    fn test_trial_set_rejects_empty_target() {
        let result = TrialSet::new("  ", vec![TrialOutcome::Correct]);
        assert!(result.is_err());
    }

    #[test]
    fn test_trial_set_enforces_trial_ceiling() {
        let trials = vec![TrialOutcome::Correct; MAX_TRIALS + 1];
        assert!(TrialSet::new("Target 1", trials).is_err());
        assert!(TrialSet::new("Target 1", vec![]).is_err());

        let at_cap = vec![TrialOutcome::Prompted; MAX_TRIALS];
        assert!(TrialSet::new("Target 1", at_cap).is_ok());
    }

    #[test]
    fn test_cold_probe_label_with_and_without_domain() {
        let with_domain = ColdProbeEntry::new("Manding", "Target 1", ProbeResponse::Yes).unwrap();
        assert_eq!(with_domain.label(), "Manding - Target 1");

        let no_domain = ColdProbeEntry::new("", "Target 2", ProbeResponse::No).unwrap();
        assert_eq!(no_domain.label(), "Target 2");
    }

    #[test]
    fn test_entry_constructors_trim_input() {
        let entry = ColdProbeEntry::new(" Tacting ", " cup ", ProbeResponse::Yes).unwrap();
        assert_eq!(entry.domain, "Tacting");
        assert_eq!(entry.target, "cup");

        let step = TaskStep::new(" wash hands ", PromptLevel::Model).unwrap();
        assert_eq!(step.step, "wash hands");
    }

    #[test]
    fn test_empty_therapist_is_savable() {
        let record = SessionRecord::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(record.therapist_name, "");
        assert!(!record.has_details());
    }
}
