//! Session context
//!
//! `SessionContext` holds everything recorded during one in-progress
//! session and exposes one command handler per user action (save a
//! section, start or stop the timer). There is no ambient page-wide
//! state: all session state lives in this one object and nothing
//! survives it except what was appended to the store.

use chrono::{NaiveDate, NaiveTime};

use crate::error::StoreError;
use crate::store::CsvStore;
use crate::timer::DurationTimer;
use crate::types::{
    ColdProbeEntry, RecordId, SessionBundle, SessionRecord, TaskStep, TrialSet, MAX_TARGETS,
};

/// In-memory state for one therapist session.
///
/// Created at session start with the session date; discarded (never
/// persisted) unless [`SessionContext::save`] is called.
#[derive(Debug, Clone)]
pub struct SessionContext {
    record: SessionRecord,
    cold_probe: Vec<ColdProbeEntry>,
    trial_sets: Vec<TrialSet>,
    task_steps: Vec<TaskStep>,
    timer: DurationTimer,
    duration_recorded: bool,
}

impl SessionContext {
    /// Begin a new session on the given date, timer idle, total zero
    pub fn new(date: NaiveDate) -> Self {
        Self {
            record: SessionRecord::new(date),
            cold_probe: Vec::new(),
            trial_sets: Vec::new(),
            task_steps: Vec::new(),
            timer: DurationTimer::new(),
            duration_recorded: false,
        }
    }

    /// Record the session-details section
    pub fn set_details(
        &mut self,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
        therapist_name: impl Into<String>,
    ) {
        self.record.start_time = start_time;
        self.record.end_time = end_time;
        self.record.therapist_name = therapist_name.into();
    }

    /// Record the cold-probe section, replacing any prior entries
    pub fn set_cold_probe(&mut self, entries: Vec<ColdProbeEntry>) {
        self.cold_probe = entries;
    }

    /// Record the trial-by-trial section, replacing any prior sets.
    ///
    /// At most [`MAX_TARGETS`] sets are kept; extras are dropped, the way
    /// the form truncates its target list.
    pub fn set_trial_sets(&mut self, mut sets: Vec<TrialSet>) {
        if sets.len() > MAX_TARGETS {
            log::warn!(
                "dropping {} trial sets over the {}-target cap",
                sets.len() - MAX_TARGETS,
                MAX_TARGETS
            );
            sets.truncate(MAX_TARGETS);
        }
        self.trial_sets = sets;
    }

    /// Record the task-analysis section, replacing any prior steps
    pub fn set_task_steps(&mut self, steps: Vec<TaskStep>) {
        self.task_steps = steps;
    }

    /// Start the behavior-duration timer; ignored if already running
    pub fn start_timer(&mut self) {
        self.timer.start();
    }

    /// Stop the behavior-duration timer and return the new session total.
    ///
    /// A stop with no prior start leaves the total unchanged. Any stop
    /// marks the duration section as recorded for this session.
    pub fn stop_timer(&mut self) -> f64 {
        self.timer.stop();
        self.duration_recorded = true;
        self.timer.total_seconds()
    }

    pub fn timer(&self) -> &DurationTimer {
        &self.timer
    }

    /// Running duration total so far, in seconds
    pub fn total_duration_seconds(&self) -> f64 {
        self.timer.total_seconds()
    }

    /// Snapshot the session as a bundle, by value.
    ///
    /// The duration field is present only once the timer has been used,
    /// so an untouched timer does not produce a duration section.
    pub fn bundle(&self) -> SessionBundle {
        SessionBundle {
            record: self.record.clone(),
            cold_probe: self.cold_probe.clone(),
            trial_sets: self.trial_sets.clone(),
            task_steps: self.task_steps.clone(),
            total_duration_seconds: if self.duration_recorded {
                Some(self.timer.total_seconds())
            } else {
                None
            },
        }
    }

    /// Append the current snapshot to the store
    pub fn save(&self, store: &mut CsvStore) -> Result<RecordId, StoreError> {
        store.append_record(&self.bundle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProbeResponse, TrialOutcome};
    use pretty_assertions::assert_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_fresh_context_has_no_sections() {
        let ctx = SessionContext::new(date());
        let bundle = ctx.bundle();

        assert_eq!(bundle.record.date, date());
        assert!(bundle.cold_probe.is_empty());
        assert!(bundle.trial_sets.is_empty());
        assert!(bundle.task_steps.is_empty());
        assert_eq!(bundle.total_duration_seconds, None);
    }

    #[test]
    fn test_sections_land_in_bundle() {
        let mut ctx = SessionContext::new(date());
        ctx.set_details(
            NaiveTime::from_hms_opt(9, 0, 0),
            NaiveTime::from_hms_opt(10, 30, 0),
            "A. Lee",
        );
        ctx.set_cold_probe(vec![
            ColdProbeEntry::new("Manding", "Target 1", ProbeResponse::Yes).unwrap()
        ]);
        ctx.set_trial_sets(vec![TrialSet::new(
            "Target 1",
            vec![TrialOutcome::Correct, TrialOutcome::Incorrect],
        )
        .unwrap()]);

        let bundle = ctx.bundle();
        assert_eq!(bundle.record.therapist_name, "A. Lee");
        assert_eq!(bundle.cold_probe.len(), 1);
        assert_eq!(bundle.trial_sets[0].accuracy_percent(), Some(50.0));
    }

    #[test]
    fn test_trial_sets_truncated_at_target_cap() {
        let mut ctx = SessionContext::new(date());
        let sets: Vec<TrialSet> = (0..MAX_TARGETS + 3)
            .map(|i| TrialSet::new(format!("Target {i}"), vec![TrialOutcome::Correct]).unwrap())
            .collect();
        ctx.set_trial_sets(sets);

        assert_eq!(ctx.bundle().trial_sets.len(), MAX_TARGETS);
    }

    #[test]
    fn test_duration_absent_until_timer_used() {
        let mut ctx = SessionContext::new(date());
        assert_eq!(ctx.bundle().total_duration_seconds, None);

        let total = ctx.stop_timer();
        assert_eq!(total, 0.0);
        assert_eq!(ctx.bundle().total_duration_seconds, Some(0.0));
    }
}
