use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::DataprocError;
use super::types::{Cluster, Job, ListClustersResponse, ListJobsResponse};
use crate::error::CostError;

pub const API_URL: &str = "https://dataproc.googleapis.com/v1";

/// Read-only queries the cost estimator needs from the cluster-management
/// service.
#[allow(async_fn_in_trait)]
pub trait DataprocApi {
    async fn list_clusters(&self, project: &str, region: &str)
    -> Result<Vec<Cluster>, DataprocError>;

    async fn list_jobs(&self, project: &str, region: &str) -> Result<Vec<Job>, DataprocError>;

    async fn get_job(&self, project: &str, region: &str, job_id: &str)
    -> Result<Job, DataprocError>;
}

pub struct DataprocClient {
    access_token: String,
    client: Client,
    base_url: String,
}

impl DataprocClient {
    /// Create a client against `base_url`, normally [`API_URL`].
    ///
    /// Fails with [`CostError::ConnectionUnavailable`] when no access token is
    /// available or the HTTP client cannot be constructed.
    pub fn with_base_url(access_token: String, base_url: String) -> Result<Self, CostError> {
        if access_token.trim().is_empty() {
            return Err(CostError::ConnectionUnavailable(
                "no access token configured (set DATAPROC_ACCESS_TOKEN, e.g. from `gcloud auth print-access-token`)".into(),
            ));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CostError::ConnectionUnavailable(e.to_string()))?;
        Ok(Self {
            access_token,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn region_url(&self, project: &str, region: &str) -> String {
        format!("{}/projects/{project}/regions/{region}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DataprocError> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(DataprocError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }
}

impl DataprocApi for DataprocClient {
    async fn list_clusters(
        &self,
        project: &str,
        region: &str,
    ) -> Result<Vec<Cluster>, DataprocError> {
        let url = format!("{}/clusters", self.region_url(project, region));
        let body: ListClustersResponse = self.get_json(&url).await?;
        Ok(body.clusters)
    }

    async fn list_jobs(&self, project: &str, region: &str) -> Result<Vec<Job>, DataprocError> {
        let url = format!("{}/jobs", self.region_url(project, region));
        let body: ListJobsResponse = self.get_json(&url).await?;
        Ok(body.jobs)
    }

    async fn get_job(
        &self,
        project: &str,
        region: &str,
        job_id: &str,
    ) -> Result<Job, DataprocError> {
        let url = format!("{}/jobs/{job_id}", self.region_url(project, region));
        self.get_json(&url).await
    }
}
