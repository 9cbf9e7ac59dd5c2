//! Append-only CSV session store
//!
//! One CSV file, one row per save. The header is written once, from the
//! first row's columns, and never changes afterward: later rows are
//! coerced to it, with unknown columns dropped and absent columns written
//! empty. Existing rows are never rewritten or reordered. There is no
//! locking; a second writer on the same file is the caller's problem.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::flatten::{flatten, unflatten};
use crate::types::{RecordId, SessionBundle, StoredRecord};

/// Column holding the id minted for each appended row
pub const COL_RECORD_ID: &str = "record_id";

/// Append-only store backed by a single CSV file.
///
/// The file is created lazily on the first append; querying a store whose
/// file does not exist yet yields no records rather than an error.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one bundle as a new row and return its minted id.
    ///
    /// All-or-nothing from the caller's view: either the row lands and an
    /// id is returned, or an error is returned and the caller decides
    /// whether to retry. Identical bundles append identical rows; there
    /// is deliberately no dedup.
    pub fn append_record(&mut self, bundle: &SessionBundle) -> Result<RecordId, StoreError> {
        let id = RecordId::new();
        let mut columns = vec![(COL_RECORD_ID.to_string(), id.to_string())];
        columns.extend(flatten(bundle));

        if self.path.exists() {
            self.append_row(&columns)?;
        } else {
            self.create_with_first_row(&columns)?;
        }

        log::debug!("appended record {id} to {}", self.path.display());
        Ok(id)
    }

    /// Read back every persisted record, oldest first. Never mutates.
    pub fn query_all_records(&self) -> Result<Vec<StoredRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let cells: Vec<String> = row.iter().map(str::to_string).collect();
            let id = read_record_id(&header, &cells)?;
            let bundle = unflatten(&header, &cells)?;
            records.push(StoredRecord { id, bundle });
        }

        Ok(records)
    }

    fn create_with_first_row(&self, columns: &[(String, String)]) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(columns.iter().map(|(name, _)| name.as_str()))?;
        writer.write_record(columns.iter().map(|(_, value)| value.as_str()))?;
        writer.flush()?;
        log::info!(
            "created session store {} with {} columns",
            self.path.display(),
            columns.len()
        );
        Ok(())
    }

    fn append_row(&self, columns: &[(String, String)]) -> Result<(), StoreError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        drop(reader);

        // Coerce to the frozen header: fields the header never saw are dropped
        let row: Vec<&str> = header
            .iter()
            .map(|name| {
                columns
                    .iter()
                    .find(|(col, _)| col == name)
                    .map(|(_, value)| value.as_str())
                    .unwrap_or("")
            })
            .collect();

        let dropped = columns
            .iter()
            .filter(|(col, _)| !header.iter().any(|h| h == col))
            .count();
        if dropped > 0 {
            log::warn!(
                "{dropped} column(s) not in the store header were dropped from this row"
            );
        }

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(&row)?;
        writer.flush()?;
        Ok(())
    }
}

fn read_record_id(header: &[String], cells: &[String]) -> Result<RecordId, StoreError> {
    let text = header
        .iter()
        .position(|h| h == COL_RECORD_ID)
        .and_then(|i| cells.get(i))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| StoreError::Parse("row has no record_id".into()))?;
    let id = text
        .parse()
        .map_err(|_| StoreError::Parse(format!("bad record_id '{text}'")))?;
    Ok(RecordId(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SessionRecord, TrialOutcome, TrialSet};
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_bundle() -> SessionBundle {
        SessionBundle {
            record: SessionRecord {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                start_time: NaiveTime::from_hms_opt(9, 0, 0),
                end_time: NaiveTime::from_hms_opt(10, 0, 0),
                therapist_name: "A. Lee".to_string(),
            },
            cold_probe: Vec::new(),
            trial_sets: vec![TrialSet::new(
                "Target 1",
                vec![
                    TrialOutcome::Correct,
                    TrialOutcome::Prompted,
                    TrialOutcome::Incorrect,
                    TrialOutcome::Independent,
                    TrialOutcome::Correct,
                ],
            )
            .unwrap()],
            task_steps: Vec::new(),
            total_duration_seconds: None,
        }
    }

    #[test]
    fn test_append_then_query_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = CsvStore::new(dir.path().join("sessions.csv"));

        let bundle = sample_bundle();
        let id = store.append_record(&bundle).unwrap();

        let records = store.query_all_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].bundle.record.date, bundle.record.date);
        assert_eq!(records[0].bundle.record.therapist_name, "A. Lee");
        assert_eq!(records[0].bundle.trial_sets, bundle.trial_sets);
        assert_eq!(
            records[0].bundle.trial_sets[0].accuracy_percent(),
            Some(60.0)
        );
    }

    #[test]
    fn test_double_append_yields_two_distinct_rows() {
        let dir = tempdir().unwrap();
        let mut store = CsvStore::new(dir.path().join("sessions.csv"));

        let bundle = sample_bundle();
        let first = store.append_record(&bundle).unwrap();
        let second = store.append_record(&bundle).unwrap();
        assert_ne!(first, second);

        let records = store.query_all_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, first);
        assert_eq!(records[1].id, second);
        assert_eq!(records[0].bundle, records[1].bundle);
    }

    #[test]
    fn test_query_before_first_append_is_empty() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("sessions.csv"));
        assert!(store.query_all_records().unwrap().is_empty());
    }

    #[test]
    fn test_header_is_frozen_by_first_row() {
        let dir = tempdir().unwrap();
        let mut store = CsvStore::new(dir.path().join("sessions.csv"));

        // First save: details only, so the header has no trial columns
        let mut details_only = sample_bundle();
        details_only.trial_sets.clear();
        store.append_record(&details_only).unwrap();

        // Second save brings trial columns the header never saw
        store.append_record(&sample_bundle()).unwrap();

        let records = store.query_all_records().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].bundle.trial_sets.is_empty());
        assert_eq!(records[1].bundle.record.therapist_name, "A. Lee");
    }

    #[test]
    fn test_append_preserves_existing_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.csv");
        let mut store = CsvStore::new(&path);

        store.append_record(&sample_bundle()).unwrap();
        let after_first = std::fs::read_to_string(&path).unwrap();

        store.append_record(&sample_bundle()).unwrap();
        let after_second = std::fs::read_to_string(&path).unwrap();

        assert!(after_second.starts_with(&after_first));
    }

    #[test]
    fn test_append_to_unwritable_path_is_io_error() {
        let mut store = CsvStore::new("/nonexistent-dir/sessions.csv");
        let err = store.append_record(&sample_bundle()).unwrap_err();
        assert!(matches!(err, StoreError::Io(_) | StoreError::Csv(_)));
    }
}
