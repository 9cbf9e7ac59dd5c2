//! Derived-metric computation
//!
//! Pure functions for the two metrics the session model derives:
//! - Trial accuracy (percentage of unassisted successes)
//! - Cumulative behavior duration across timer episodes

use crate::types::{DurationEpisode, TrialOutcome};

/// Accuracy percentage for a sequence of trial outcomes.
///
/// Counts `Correct` and `Independent` outcomes as successes:
/// `100 * successes / trials`, rounded via [`round2`]. Returns `None` for
/// an empty sequence; accuracy of no trials is undefined, not zero.
pub fn trial_accuracy(trials: &[TrialOutcome]) -> Option<f64> {
    if trials.is_empty() {
        return None;
    }
    let successes = trials.iter().filter(|t| t.is_success()).count();
    Some(round2(100.0 * successes as f64 / trials.len() as f64))
}

/// Fold one completed episode into a running duration total.
///
/// A negative `elapsed_seconds` (a caller's clock moved backward) is
/// clamped to zero; a negative duration is never a meaningful value.
pub fn accumulate_duration(prior_total: f64, episode: &DurationEpisode) -> f64 {
    prior_total + episode.elapsed_seconds.max(0.0)
}

/// Round to 2 decimal places, half away from zero (round-half-up for the
/// non-negative values used here).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
