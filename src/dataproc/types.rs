//! Wire types for the subset of the Dataproc v1 REST API this tool reads.
//!
//! Field names follow the API's camelCase JSON. Repeated fields are omitted
//! by the API when empty, so every list defaults to an empty `Vec`. Fields
//! the tool does not use are ignored on deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CostError;
use crate::history::{JobState, parse_timestamp};

/// Response of `GET .../clusters`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClustersResponse {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default)]
    pub cluster_name: String,
    pub config: ClusterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub master_config: InstanceGroupConfig,
    pub worker_config: InstanceGroupConfig,
}

/// Machine configuration of one node group (master or workers).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupConfig {
    /// Full or partial URI, e.g.
    /// `https://www.googleapis.com/compute/v1/projects/p/zones/z/machineTypes/n1-standard-4`.
    pub machine_type_uri: String,
    pub num_instances: u32,
}

/// Response of `GET .../jobs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsResponse {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub reference: JobReference,
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub status_history: Vec<JobStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    #[serde(default)]
    pub project_id: String,
    pub job_id: String,
}

/// A status entry as reported by the API: the current status or one element
/// of the status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub state: String,
    pub state_start_time: String,
    pub details: Option<String>,
}

impl JobStatus {
    pub fn job_state(&self) -> JobState {
        JobState::from(self.state.as_str())
    }

    /// Parses `stateStartTime`. Callers parse only the entries they use.
    pub fn timestamp(&self) -> Result<DateTime<Utc>, CostError> {
        parse_timestamp(&self.state_start_time)
    }
}

impl Job {
    /// The time the current status entered DONE. Any other current state
    /// yields `None` without looking at its timestamp.
    pub fn terminal_time(&self) -> Result<Option<DateTime<Utc>>, CostError> {
        match &self.status {
            Some(status) if status.job_state() == JobState::Done => status.timestamp().map(Some),
            _ => Ok(None),
        }
    }
}
