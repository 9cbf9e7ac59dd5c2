//! Spreadsheet export
//!
//! On-demand export of one session bundle to an Excel workbook: one sheet
//! per saved section, each holding that section's entries as rows. Sheet
//! names are truncated to Excel's 31-character limit. Export never runs
//! as part of a save.

use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use crate::error::StoreError;
use crate::flatten::format_accuracy;
use crate::types::SessionBundle;

/// Excel's hard limit on worksheet name length
pub const MAX_SHEET_NAME_LEN: usize = 31;

pub const SHEET_SESSION_DETAILS: &str = "session_details";
pub const SHEET_COLD_PROBE: &str = "cold_probe";
pub const SHEET_TRIAL_DATA: &str = "trial_data";
pub const SHEET_TASK_ANALYSIS: &str = "task_analysis";
pub const SHEET_BEHAVIOR_DURATION: &str = "behavior_duration";

/// Truncate a sheet name to the 31 characters Excel allows
pub fn truncate_sheet_name(name: &str) -> &str {
    match name.char_indices().nth(MAX_SHEET_NAME_LEN) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

/// Names of the sheets a bundle would export, in sheet order.
///
/// A section produces a sheet only when it was saved: session details when
/// any detail field is set, behavior duration when a total was recorded
/// (zero included), the list sections when non-empty.
pub fn sheet_names(bundle: &SessionBundle) -> Vec<&'static str> {
    let mut names = Vec::new();
    if bundle.record.has_details() {
        names.push(SHEET_SESSION_DETAILS);
    }
    if !bundle.cold_probe.is_empty() {
        names.push(SHEET_COLD_PROBE);
    }
    if !bundle.trial_sets.is_empty() {
        names.push(SHEET_TRIAL_DATA);
    }
    if !bundle.task_steps.is_empty() {
        names.push(SHEET_TASK_ANALYSIS);
    }
    if bundle.total_duration_seconds.is_some() {
        names.push(SHEET_BEHAVIOR_DURATION);
    }
    names
}

/// Write a bundle to an Excel workbook at `path`.
///
/// Returns the sheet names written, in order.
pub fn export_to_excel(bundle: &SessionBundle, path: &Path) -> Result<Vec<String>, StoreError> {
    let mut workbook = Workbook::new();
    let mut written = Vec::new();

    for name in sheet_names(bundle) {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(truncate_sheet_name(name))
            .map_err(to_export_error)?;
        write_section(sheet, name, bundle).map_err(to_export_error)?;
        written.push(truncate_sheet_name(name).to_string());
    }

    workbook.save(path).map_err(to_export_error)?;
    log::info!(
        "exported {} sheet(s) to {}",
        written.len(),
        path.display()
    );
    Ok(written)
}

fn write_section(
    sheet: &mut Worksheet,
    name: &str,
    bundle: &SessionBundle,
) -> Result<(), XlsxError> {
    match name {
        SHEET_SESSION_DETAILS => {
            let record = &bundle.record;
            sheet.write_string(0, 0, "date")?;
            sheet.write_string(0, 1, record.date.format("%Y-%m-%d").to_string())?;
            sheet.write_string(1, 0, "start_time")?;
            sheet.write_string(
                1,
                1,
                record
                    .start_time
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_default(),
            )?;
            sheet.write_string(2, 0, "end_time")?;
            sheet.write_string(
                2,
                1,
                record
                    .end_time
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_default(),
            )?;
            sheet.write_string(3, 0, "therapist")?;
            sheet.write_string(3, 1, record.therapist_name.as_str())?;
        }
        SHEET_COLD_PROBE => {
            sheet.write_string(0, 0, "domain")?;
            sheet.write_string(0, 1, "target")?;
            sheet.write_string(0, 2, "response")?;
            for (i, entry) in bundle.cold_probe.iter().enumerate() {
                let row = (i + 1) as u32;
                sheet.write_string(row, 0, entry.domain.as_str())?;
                sheet.write_string(row, 1, entry.target.as_str())?;
                sheet.write_string(row, 2, entry.response.as_str())?;
            }
        }
        SHEET_TRIAL_DATA => {
            sheet.write_string(0, 0, "target")?;
            sheet.write_string(0, 1, "trials")?;
            sheet.write_string(0, 2, "accuracy")?;
            for (i, set) in bundle.trial_sets.iter().enumerate() {
                let row = (i + 1) as u32;
                let codes: Vec<&str> = set.trials.iter().map(|t| t.as_str()).collect();
                sheet.write_string(row, 0, set.target.as_str())?;
                sheet.write_string(row, 1, codes.join(","))?;
                sheet.write_string(row, 2, format_accuracy(set.accuracy_percent()))?;
            }
        }
        SHEET_TASK_ANALYSIS => {
            sheet.write_string(0, 0, "step")?;
            sheet.write_string(0, 1, "prompt_level")?;
            for (i, step) in bundle.task_steps.iter().enumerate() {
                let row = (i + 1) as u32;
                sheet.write_string(row, 0, step.step.as_str())?;
                sheet.write_string(row, 1, step.prompt_level.as_str())?;
            }
        }
        SHEET_BEHAVIOR_DURATION => {
            sheet.write_string(0, 0, "total_seconds")?;
            sheet.write_number(0, 1, bundle.total_duration_seconds.unwrap_or(0.0))?;
        }
        _ => {}
    }
    Ok(())
}

fn to_export_error(e: XlsxError) -> StoreError {
    StoreError::Export(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptLevel, TaskStep};
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_two_saved_sections_yield_two_sheets() {
        let mut bundle = SessionBundle::new(date());
        bundle.record.start_time = NaiveTime::from_hms_opt(9, 0, 0);
        bundle.record.therapist_name = "A. Lee".to_string();
        bundle
            .task_steps
            .push(TaskStep::new("wash hands", PromptLevel::FullPhysical).unwrap());

        assert_eq!(
            sheet_names(&bundle),
            vec![SHEET_SESSION_DETAILS, SHEET_TASK_ANALYSIS]
        );

        let dir = tempdir().unwrap();
        let path = dir.path().join("session_data.xlsx");
        let written = export_to_excel(&bundle, &path).unwrap();
        assert_eq!(written, vec!["session_details", "task_analysis"]);
        assert!(path.exists());
    }

    #[test]
    fn test_date_only_bundle_has_no_sheets() {
        let bundle = SessionBundle::new(date());
        assert!(sheet_names(&bundle).is_empty());
    }

    #[test]
    fn test_zero_duration_still_counts_as_saved() {
        let mut bundle = SessionBundle::new(date());
        bundle.total_duration_seconds = Some(0.0);
        assert_eq!(sheet_names(&bundle), vec![SHEET_BEHAVIOR_DURATION]);
    }

    #[test]
    fn test_sheet_name_truncated_to_31_chars() {
        let long = "behavior_duration_tracking_for_long_sessions";
        let truncated = truncate_sheet_name(long);
        assert_eq!(truncated.len(), MAX_SHEET_NAME_LEN);
        assert_eq!(truncated, "behavior_duration_tracking_for_");

        assert_eq!(truncate_sheet_name("cold_probe"), "cold_probe");
    }
}
