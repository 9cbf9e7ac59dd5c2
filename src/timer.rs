//! Behavior-duration timer
//!
//! Stopwatch-style state machine for timing behavior episodes within one
//! session. Two states, Idle and Running; each completed start/stop cycle
//! folds its elapsed time into a session-wide total that only resets with
//! a new session context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::accumulate_duration;
use crate::types::DurationEpisode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
}

/// Duration timer for one session's behavior episodes.
///
/// `start` while already Running is ignored and the original `started_at`
/// is preserved; `stop` while Idle is a no-op. Elapsed time is clamped
/// non-negative before it is accumulated, so a wall clock stepping
/// backward can never shrink the total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DurationTimer {
    status: TimerStatus,
    /// Set only while the timer is running
    started_at: Option<DateTime<Utc>>,
    total_seconds: f64,
}

impl DurationTimer {
    /// Create an idle timer with a zero total
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// When the current run began, if Running
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Sum of all completed episodes so far, in seconds
    pub fn total_seconds(&self) -> f64 {
        self.total_seconds
    }

    /// Start timing at the current wall-clock time
    pub fn start(&mut self) {
        self.start_at(Utc::now());
    }

    /// Start timing at an explicit instant
    pub fn start_at(&mut self, now: DateTime<Utc>) {
        if self.status == TimerStatus::Running {
            return;
        }
        self.status = TimerStatus::Running;
        self.started_at = Some(now);
    }

    /// Stop timing at the current wall-clock time.
    ///
    /// Returns the completed episode, or `None` when the timer was idle.
    pub fn stop(&mut self) -> Option<DurationEpisode> {
        self.stop_at(Utc::now())
    }

    /// Stop timing at an explicit instant
    pub fn stop_at(&mut self, now: DateTime<Utc>) -> Option<DurationEpisode> {
        let started_at = match (self.status, self.started_at) {
            (TimerStatus::Running, Some(t)) => t,
            _ => return None,
        };

        let elapsed = (now - started_at).num_milliseconds() as f64 / 1000.0;
        let episode = DurationEpisode {
            started_at,
            elapsed_seconds: elapsed.max(0.0),
        };

        self.total_seconds = accumulate_duration(self.total_seconds, &episode);
        self.status = TimerStatus::Idle;
        self.started_at = None;

        Some(episode)
    }
}
