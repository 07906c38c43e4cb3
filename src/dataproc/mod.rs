pub mod client;
pub mod error;
pub mod types;

pub use client::{DataprocApi, DataprocClient};
pub use error::DataprocError;
pub use types::{Cluster, InstanceGroupConfig, JobStatus};
