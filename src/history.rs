//! Billable running time of a job, inferred from its status history.
//!
//! The history is scanned in the order the API reported it. No chronological
//! sorting happens: the last RUNNING entry seen is the start, the last DONE
//! entry seen is the end, and any ERROR entry aborts the scan.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::dataproc::JobStatus;
use crate::error::CostError;

/// Jobs shorter than this are billed as if they ran this long.
pub const MIN_BILLABLE_MINUTES: f64 = 10.0;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Lifecycle state of a job as far as duration inference cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Running,
    Done,
    Error,
    /// Any other state (PENDING, SETUP_DONE, CANCELLED, ...), kept verbatim.
    Other(String),
}

impl From<&str> for JobState {
    fn from(state: &str) -> Self {
        match state {
            "RUNNING" => JobState::Running,
            "DONE" => JobState::Done,
            "ERROR" => JobState::Error,
            other => JobState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "RUNNING"),
            JobState::Done => write!(f, "DONE"),
            JobState::Error => write!(f, "ERROR"),
            JobState::Other(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobDuration {
    pub minutes: f64,
}

/// Parses an API timestamp such as `2023-01-01T00:12:00.000Z` as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CostError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| CostError::MalformedTimestamp(raw.to_string()))
}

/// Infers the billable duration of a job.
///
/// `terminal_state_time` is the time the job's current status entered DONE,
/// when the current status is DONE. A DONE entry in `events` overrides it.
/// Timestamps are parsed only for the RUNNING and DONE entries the scan
/// reaches, so an ERROR entry is reported even if unrelated entries carry
/// malformed times.
/// The difference is taken in whole seconds; anything under
/// [`MIN_BILLABLE_MINUTES`] (negative differences included) is clamped up.
pub fn infer_duration(
    events: &[JobStatus],
    terminal_state_time: Option<DateTime<Utc>>,
) -> Result<JobDuration, CostError> {
    let mut start_time = None;
    let mut end_time = terminal_state_time;

    for event in events {
        match event.job_state() {
            JobState::Running => start_time = Some(event.timestamp()?),
            JobState::Error => {
                return Err(CostError::JobFailed(
                    event.details.clone().unwrap_or_default(),
                ));
            }
            JobState::Done => end_time = Some(event.timestamp()?),
            JobState::Other(_) => {}
        }
    }

    let start_time = start_time.ok_or(CostError::MissingStartTime)?;
    let end_time = end_time.ok_or(CostError::MissingEndTime)?;

    let seconds = (end_time - start_time).num_seconds();
    let mut minutes = seconds as f64 / 60.0;
    if minutes < MIN_BILLABLE_MINUTES {
        debug!(minutes, "clamping to minimum billable duration");
        minutes = MIN_BILLABLE_MINUTES;
    }

    Ok(JobDuration { minutes })
}
