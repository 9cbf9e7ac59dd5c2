//! Progress reporting
//!
//! Builds the numeric series a chart renderer consumes (x = session date
//! or record index, y = accuracy or cumulative duration) and the
//! plain-text summary of a single session. No drawing happens here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::flatten::format_accuracy;
use crate::metrics::round2;
use crate::types::{SessionBundle, StoredRecord};

/// One chartable point: a record's position, its date, and a metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Zero-based append position of the record
    pub index: usize,
    pub date: NaiveDate,
    pub value: f64,
}

/// Mean trial accuracy per record, in append order.
///
/// Records with no trial sets contribute no point; within a record the
/// mean is over each target's accuracy percentage.
pub fn accuracy_series(records: &[StoredRecord]) -> Vec<SeriesPoint> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let accuracies: Vec<f64> = record
                .bundle
                .trial_sets
                .iter()
                .filter_map(|set| set.accuracy_percent())
                .collect();
            if accuracies.is_empty() {
                return None;
            }
            let mean = accuracies.iter().sum::<f64>() / accuracies.len() as f64;
            Some(SeriesPoint {
                index,
                date: record.bundle.record.date,
                value: round2(mean),
            })
        })
        .collect()
}

/// Cumulative behavior duration across records, in append order.
///
/// Each record with a recorded duration adds to the running total; the
/// point carries the total so far.
pub fn duration_series(records: &[StoredRecord]) -> Vec<SeriesPoint> {
    let mut total = 0.0;
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let seconds = record.bundle.total_duration_seconds?;
            total += seconds.max(0.0);
            Some(SeriesPoint {
                index,
                date: record.bundle.record.date,
                value: round2(total),
            })
        })
        .collect()
}

/// Fixed-template plain-text summary of one session bundle
pub fn session_summary(bundle: &SessionBundle) -> String {
    let record = &bundle.record;
    let mut lines = Vec::new();

    let therapist = if record.therapist_name.is_empty() {
        "(not recorded)"
    } else {
        record.therapist_name.as_str()
    };
    lines.push(format!("Session of {}", record.date.format("%Y-%m-%d")));
    lines.push(format!("Therapist: {therapist}"));

    let time = |t: Option<chrono::NaiveTime>| {
        t.map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string())
    };
    lines.push(format!(
        "Time: {} to {}",
        time(record.start_time),
        time(record.end_time)
    ));

    lines.push(format!("Cold probes recorded: {}", bundle.cold_probe.len()));

    if bundle.trial_sets.is_empty() {
        lines.push("Trial data: none".to_string());
    } else {
        lines.push("Trial data:".to_string());
        for set in &bundle.trial_sets {
            lines.push(format!(
                "  {} - {} trials, accuracy {}",
                set.target,
                set.trials.len(),
                format_accuracy(set.accuracy_percent())
            ));
        }
    }

    lines.push(format!("Task steps recorded: {}", bundle.task_steps.len()));
    lines.push(format!(
        "Total behavior duration: {}",
        match bundle.total_duration_seconds {
            Some(seconds) => format!("{seconds:.2} s"),
            None => "not recorded".to_string(),
        }
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordId, TrialOutcome, TrialSet};
    use pretty_assertions::assert_eq;

    fn stored(bundle: SessionBundle) -> StoredRecord {
        StoredRecord {
            id: RecordId::new(),
            bundle,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn with_trials(day: u32, sets: Vec<(&str, Vec<TrialOutcome>)>) -> SessionBundle {
        let mut bundle = SessionBundle::new(date(day));
        bundle.trial_sets = sets
            .into_iter()
            .map(|(target, trials)| TrialSet::new(target, trials).unwrap())
            .collect();
        bundle
    }

    #[test]
    fn test_accuracy_series_skips_trial_less_records() {
        let records = vec![
            stored(with_trials(
                1,
                vec![("Target 1", vec![TrialOutcome::Correct, TrialOutcome::Incorrect])],
            )),
            stored(SessionBundle::new(date(2))),
            stored(with_trials(3, vec![("Target 1", vec![TrialOutcome::Correct])])),
        ];

        let series = accuracy_series(&records);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0], SeriesPoint { index: 0, date: date(1), value: 50.0 });
        assert_eq!(series[1], SeriesPoint { index: 2, date: date(3), value: 100.0 });
    }

    #[test]
    fn test_accuracy_series_averages_targets_within_record() {
        let records = vec![stored(with_trials(
            1,
            vec![
                ("Target 1", vec![TrialOutcome::Correct]),
                ("Target 2", vec![TrialOutcome::Incorrect, TrialOutcome::Incorrect]),
            ],
        ))];

        // (100 + 0) / 2 = 50
        assert_eq!(accuracy_series(&records)[0].value, 50.0);
    }

    #[test]
    fn test_duration_series_is_cumulative() {
        let mut a = SessionBundle::new(date(1));
        a.total_duration_seconds = Some(30.0);
        let mut b = SessionBundle::new(date(2));
        b.total_duration_seconds = Some(12.5);

        let series = duration_series(&[stored(a), stored(b)]);
        assert_eq!(series[0].value, 30.0);
        assert_eq!(series[1].value, 42.5);
    }

    #[test]
    fn test_summary_substitutes_fields() {
        let mut bundle = with_trials(
            1,
            vec![(
                "Target 1",
                vec![
                    TrialOutcome::Correct,
                    TrialOutcome::Prompted,
                    TrialOutcome::Incorrect,
                    TrialOutcome::Independent,
                    TrialOutcome::Correct,
                ],
            )],
        );
        bundle.record.therapist_name = "A. Lee".to_string();
        bundle.total_duration_seconds = Some(42.5);

        let summary = session_summary(&bundle);
        assert!(summary.contains("Session of 2024-06-01"));
        assert!(summary.contains("Therapist: A. Lee"));
        assert!(summary.contains("Target 1 - 5 trials, accuracy 60.00%"));
        assert!(summary.contains("Total behavior duration: 42.50 s"));
    }

    #[test]
    fn test_summary_notes_missing_fields() {
        let bundle = SessionBundle::new(date(1));
        let summary = session_summary(&bundle);
        assert!(summary.contains("Therapist: (not recorded)"));
        assert!(summary.contains("Time: --:-- to --:--"));
        assert!(summary.contains("Total behavior duration: not recorded"));
    }
}
