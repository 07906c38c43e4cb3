//! Errors raised while talking to the Dataproc REST API.
//!
//! Only transport and HTTP-status failures live here. Interpreting the
//! payload (missing timestamps, failed jobs) is reported through
//! [`CostError`](crate::error::CostError).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataprocError {
    /// The API answered with a non-success status (403 missing permission,
    /// 404 unknown job, 5xx backend trouble). Carries the response body.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// DNS, connection refused, timeout or an undecodable body.
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
