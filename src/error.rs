use thiserror::Error;

use crate::dataproc::DataprocError;

#[derive(Debug, Error)]
pub enum CostError {
    #[error("Dataproc connection unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Missing start time: no RUNNING entry in the job status history")]
    MissingStartTime,

    #[error("Missing end time: job has no DONE status")]
    MissingEndTime,

    #[error("Unknown machine type: {0}")]
    UnknownMachineType(String),

    #[error("Malformed price row: {0}")]
    MalformedPriceRow(String),

    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("No clusters found in the project region")]
    NoClusters,

    #[error("No jobs found in the project region")]
    NoJobs,

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Dataproc API error: {0}")]
    Dataproc(#[from] DataprocError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
