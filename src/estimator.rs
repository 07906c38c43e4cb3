use tracing::{error, info};

use crate::config::CostConfig;
use crate::cost::{CostResult, MachineGroup, compute_cluster_cost};
use crate::dataproc::{Cluster, DataprocApi, DataprocClient};
use crate::error::CostError;
use crate::history::{JobDuration, infer_duration};
use crate::pricing::PriceTable;

/// Prices jobs on one project/region using a Dataproc API handle.
pub struct CostEstimator<'a, C> {
    client: &'a C,
    config: &'a CostConfig,
}

impl<'a, C: DataprocApi> CostEstimator<'a, C> {
    pub fn new(client: &'a C, config: &'a CostConfig) -> Self {
        Self { client, config }
    }

    /// Id of the first job the API lists. The API does not promise that this
    /// is the most recent one.
    pub async fn latest_job_id(&self) -> Result<String, CostError> {
        let jobs = self
            .client
            .list_jobs(&self.config.project_id, &self.config.region)
            .await?;
        let job = jobs.into_iter().next().ok_or(CostError::NoJobs)?;
        Ok(job.reference.job_id)
    }

    pub async fn job_duration(&self, job_id: &str) -> Result<JobDuration, CostError> {
        let job = self
            .client
            .get_job(&self.config.project_id, &self.config.region, job_id)
            .await?;

        let terminal_time = job.terminal_time()?;
        let duration = infer_duration(&job.status_history, terminal_time)?;
        info!(job_id, minutes = duration.minutes, "job duration");
        Ok(duration)
    }

    /// The configured cluster by name, or the first one listed.
    pub async fn cluster(&self) -> Result<Cluster, CostError> {
        let clusters = self
            .client
            .list_clusters(&self.config.project_id, &self.config.region)
            .await?;

        match &self.config.cluster_name {
            Some(name) => clusters
                .into_iter()
                .find(|c| &c.cluster_name == name)
                .ok_or_else(|| CostError::ClusterNotFound(name.clone())),
            None => clusters.into_iter().next().ok_or(CostError::NoClusters),
        }
    }

    pub async fn cost_for_job(&self, job_id: &str) -> Result<CostResult, CostError> {
        let duration = self.job_duration(job_id).await?;
        let cluster = self.cluster().await?;
        let prices = PriceTable::load(&self.config.price_list)?;

        let master = MachineGroup::from(&cluster.config.master_config);
        let worker = MachineGroup::from(&cluster.config.worker_config);
        let cost = compute_cluster_cost(&master, &worker, &prices, duration.minutes)?;
        info!(
            cluster = %cluster.cluster_name,
            total_cost = cost.total_cost,
            "computed job cost"
        );

        Ok(CostResult {
            job_id: job_id.to_string(),
            cluster_name: cluster.cluster_name,
            minutes: duration.minutes,
            master_cost: cost.master_cost,
            worker_cost: cost.worker_cost,
            total_cost: cost.total_cost,
        })
    }

    pub async fn cost_for_last_job(&self) -> Result<CostResult, CostError> {
        let job_id = self.latest_job_id().await?;
        info!(%job_id, "pricing last job");
        self.cost_for_job(&job_id).await
    }
}

/// Builds the API handle. A handle that cannot be obtained is reported and
/// yields `None`.
fn connect(config: &CostConfig) -> Result<Option<DataprocClient>, CostError> {
    info!("trying to get a Dataproc client");
    match DataprocClient::with_base_url(config.access_token.clone(), config.api_base_url.clone()) {
        Ok(client) => Ok(Some(client)),
        Err(CostError::ConnectionUnavailable(reason)) => {
            error!("check gcloud config and project access: {reason}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Cost of the last job on the project's cluster.
///
/// `Ok(None)` means no Dataproc handle could be obtained and nothing was
/// computed; every other failure aborts with an error.
pub async fn get_cost_for_last_job(config: &CostConfig) -> Result<Option<CostResult>, CostError> {
    config.validate()?;
    let Some(client) = connect(config)? else {
        return Ok(None);
    };
    let result = CostEstimator::new(&client, config).cost_for_last_job().await?;
    Ok(Some(result))
}

/// Same as [`get_cost_for_last_job`] for an explicit job id.
pub async fn get_cost_for_job(
    config: &CostConfig,
    job_id: &str,
) -> Result<Option<CostResult>, CostError> {
    config.validate()?;
    let Some(client) = connect(config)? else {
        return Ok(None);
    };
    let result = CostEstimator::new(&client, config).cost_for_job(job_id).await?;
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataproc::DataprocError;
    use crate::dataproc::types::{ClusterConfig, InstanceGroupConfig, Job, JobReference, JobStatus};
    use std::cell::Cell;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PRICE_LIST: &str = "type\tcost\nn1-standard-4\t$0.20\nn1-standard-8\t$0.40\n";

    struct MockApi {
        clusters: Vec<Cluster>,
        jobs: Vec<Job>,
        cluster_calls: Cell<u32>,
    }

    impl MockApi {
        fn new(clusters: Vec<Cluster>, jobs: Vec<Job>) -> Self {
            Self {
                clusters,
                jobs,
                cluster_calls: Cell::new(0),
            }
        }
    }

    impl DataprocApi for MockApi {
        async fn list_clusters(
            &self,
            _project: &str,
            _region: &str,
        ) -> Result<Vec<Cluster>, DataprocError> {
            self.cluster_calls.set(self.cluster_calls.get() + 1);
            Ok(self.clusters.clone())
        }

        async fn list_jobs(&self, _project: &str, _region: &str) -> Result<Vec<Job>, DataprocError> {
            Ok(self.jobs.clone())
        }

        async fn get_job(
            &self,
            _project: &str,
            _region: &str,
            job_id: &str,
        ) -> Result<Job, DataprocError> {
            self.jobs
                .iter()
                .find(|j| j.reference.job_id == job_id)
                .cloned()
                .ok_or_else(|| DataprocError::ApiError {
                    status: 404,
                    message: format!("Job {job_id} not found"),
                })
        }
    }

    fn cluster(name: &str, master_type: &str, workers: u32) -> Cluster {
        Cluster {
            cluster_name: name.into(),
            config: ClusterConfig {
                master_config: InstanceGroupConfig {
                    machine_type_uri: format!(
                        "https://www.googleapis.com/compute/v1/projects/acme/zones/us-east1-b/machineTypes/{master_type}"
                    ),
                    num_instances: 1,
                },
                worker_config: InstanceGroupConfig {
                    machine_type_uri: "n1-standard-8".into(),
                    num_instances: workers,
                },
            },
        }
    }

    fn status(state: &str, time: &str) -> JobStatus {
        JobStatus {
            state: state.into(),
            state_start_time: time.into(),
            details: None,
        }
    }

    fn job(id: &str, current: JobStatus, history: Vec<JobStatus>) -> Job {
        Job {
            reference: JobReference {
                project_id: "acme".into(),
                job_id: id.into(),
            },
            status: Some(current),
            status_history: history,
        }
    }

    fn finished_job(id: &str, end: &str) -> Job {
        job(
            id,
            status("DONE", end),
            vec![
                status("PENDING", "2022-12-31T23:59:40.000Z"),
                status("SETUP_DONE", "2022-12-31T23:59:50.000Z"),
                status("RUNNING", "2023-01-01T00:00:00.000Z"),
            ],
        )
    }

    fn price_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PRICE_LIST.as_bytes()).unwrap();
        file
    }

    fn config(price_file: &NamedTempFile) -> CostConfig {
        CostConfig {
            project_id: "acme".into(),
            region: "us-east1".into(),
            price_list: price_file.path().to_path_buf(),
            ..Default::default()
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[tokio::test]
    async fn last_job_twelve_minutes() {
        let prices = price_file();
        let config = config(&prices);
        let api = MockApi::new(
            vec![cluster("etl", "n1-standard-4", 2)],
            vec![finished_job("job-1", "2023-01-01T00:12:00.000Z")],
        );

        let result = CostEstimator::new(&api, &config)
            .cost_for_last_job()
            .await
            .unwrap();
        assert_eq!(result.job_id, "job-1");
        assert_eq!(result.cluster_name, "etl");
        assert_eq!(result.minutes, 12.0);
        assert_close(result.master_cost, 0.04);
        assert_close(result.worker_cost, 0.16);
        assert_close(result.total_cost, 0.20);
    }

    #[tokio::test]
    async fn short_job_is_priced_at_floor() {
        let prices = price_file();
        let config = config(&prices);
        let api = MockApi::new(
            vec![cluster("etl", "n1-standard-4", 2)],
            vec![finished_job("job-1", "2023-01-01T00:03:00.000Z")],
        );

        let result = CostEstimator::new(&api, &config)
            .cost_for_last_job()
            .await
            .unwrap();
        assert_eq!(result.minutes, 10.0);
        // 1 * 0.20/60 * 10 + 2 * 0.40/60 * 10
        assert_close(result.total_cost, 10.0 / 60.0);
    }

    #[tokio::test]
    async fn first_listed_job_is_used() {
        let prices = price_file();
        let config = config(&prices);
        let api = MockApi::new(
            vec![cluster("etl", "n1-standard-4", 2)],
            vec![
                finished_job("job-a", "2023-01-01T00:30:00.000Z"),
                finished_job("job-b", "2023-01-01T00:12:00.000Z"),
            ],
        );

        let estimator = CostEstimator::new(&api, &config);
        assert_eq!(estimator.latest_job_id().await.unwrap(), "job-a");
        assert_eq!(estimator.cost_for_last_job().await.unwrap().minutes, 30.0);
    }

    #[tokio::test]
    async fn failed_job_aborts_before_pricing() {
        let prices = price_file();
        let config = config(&prices);
        let mut failed = status("ERROR", "2023-01-01T00:05:00.000Z");
        failed.details = Some("Job failed with message [OOM]".into());
        let api = MockApi::new(
            vec![cluster("etl", "n1-standard-4", 2)],
            vec![job(
                "job-1",
                status("DONE", "2023-01-01T00:12:00.000Z"),
                vec![status("RUNNING", "2023-01-01T00:00:00.000Z"), failed],
            )],
        );

        let err = CostEstimator::new(&api, &config)
            .cost_for_last_job()
            .await
            .unwrap_err();
        assert!(matches!(err, CostError::JobFailed(ref d) if d == "Job failed with message [OOM]"));
        assert_eq!(api.cluster_calls.get(), 0);
    }

    #[tokio::test]
    async fn malformed_time_on_non_done_current_status_is_ignored() {
        let prices = price_file();
        let config = config(&prices);
        let api = MockApi::new(
            vec![cluster("etl", "n1-standard-4", 2)],
            vec![job(
                "job-1",
                status("RUNNING", "not-a-time"),
                vec![
                    status("RUNNING", "2023-01-01T00:00:00.000Z"),
                    status("DONE", "2023-01-01T00:12:00.000Z"),
                ],
            )],
        );

        let duration = CostEstimator::new(&api, &config)
            .job_duration("job-1")
            .await
            .unwrap();
        assert_eq!(duration.minutes, 12.0);
    }

    #[tokio::test]
    async fn failure_details_win_over_malformed_history_time() {
        let prices = price_file();
        let config = config(&prices);
        let mut failed = status("ERROR", "2023-01-01T00:05:00.000Z");
        failed.details = Some("boom".into());
        let api = MockApi::new(
            vec![cluster("etl", "n1-standard-4", 2)],
            vec![job(
                "job-1",
                status("ERROR", "2023-01-01T00:05:00.000Z"),
                vec![
                    status("RUNNING", "2023-01-01T00:00:00.000Z"),
                    failed,
                    status("CANCELLED", "2023-01-01 00:06"),
                ],
            )],
        );

        let err = CostEstimator::new(&api, &config)
            .cost_for_job("job-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CostError::JobFailed(ref d) if d == "boom"));
    }

    #[tokio::test]
    async fn running_job_has_no_end_time() {
        let prices = price_file();
        let config = config(&prices);
        let api = MockApi::new(
            vec![cluster("etl", "n1-standard-4", 2)],
            vec![job(
                "job-1",
                status("RUNNING", "2023-01-01T00:00:00.000Z"),
                vec![
                    status("PENDING", "2022-12-31T23:59:00.000Z"),
                    status("RUNNING", "2023-01-01T00:00:00.000Z"),
                ],
            )],
        );

        let err = CostEstimator::new(&api, &config)
            .cost_for_job("job-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CostError::MissingEndTime));
    }

    #[tokio::test]
    async fn unknown_machine_type_yields_no_partial_cost() {
        let prices = price_file();
        let config = config(&prices);
        let api = MockApi::new(
            vec![cluster("etl", "e2-highcpu-32", 2)],
            vec![finished_job("job-1", "2023-01-01T00:12:00.000Z")],
        );

        let err = CostEstimator::new(&api, &config)
            .cost_for_last_job()
            .await
            .unwrap_err();
        assert!(matches!(err, CostError::UnknownMachineType(ref t) if t == "e2-highcpu-32"));
    }

    #[tokio::test]
    async fn named_cluster_is_selected() {
        let prices = price_file();
        let mut config = config(&prices);
        config.cluster_name = Some("big".into());
        let api = MockApi::new(
            vec![cluster("small", "n1-standard-4", 2), cluster("big", "n1-standard-8", 10)],
            vec![finished_job("job-1", "2023-01-01T00:12:00.000Z")],
        );

        let result = CostEstimator::new(&api, &config)
            .cost_for_last_job()
            .await
            .unwrap();
        assert_eq!(result.cluster_name, "big");
        // master 1 * 0.40/60 * 12, workers 10 * 0.40/60 * 12
        assert_close(result.master_cost, 0.08);
        assert_close(result.worker_cost, 0.80);
    }

    #[tokio::test]
    async fn missing_named_cluster_is_reported() {
        let prices = price_file();
        let mut config = config(&prices);
        config.cluster_name = Some("gone".into());
        let api = MockApi::new(
            vec![cluster("etl", "n1-standard-4", 2)],
            vec![finished_job("job-1", "2023-01-01T00:12:00.000Z")],
        );

        let err = CostEstimator::new(&api, &config).cluster().await.unwrap_err();
        assert!(matches!(err, CostError::ClusterNotFound(ref n) if n == "gone"));
    }

    #[tokio::test]
    async fn empty_project_reports_no_jobs_or_clusters() {
        let prices = price_file();
        let config = config(&prices);
        let api = MockApi::new(vec![], vec![]);
        let estimator = CostEstimator::new(&api, &config);

        assert!(matches!(
            estimator.cost_for_last_job().await.unwrap_err(),
            CostError::NoJobs
        ));
        assert!(matches!(
            estimator.cluster().await.unwrap_err(),
            CostError::NoClusters
        ));
    }

    #[tokio::test]
    async fn unknown_job_id_propagates_api_error() {
        let prices = price_file();
        let config = config(&prices);
        let api = MockApi::new(vec![cluster("etl", "n1-standard-4", 2)], vec![]);

        let err = CostEstimator::new(&api, &config)
            .cost_for_job("nope")
            .await
            .unwrap_err();
        assert!(matches!(err, CostError::Dataproc(DataprocError::ApiError { status: 404, .. })));
    }

    #[tokio::test]
    async fn no_access_token_yields_no_result() {
        let prices = price_file();
        let config = config(&prices);
        assert!(config.access_token.is_empty());

        let result = get_cost_for_last_job(&config).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn missing_project_is_config_error() {
        let err = get_cost_for_job(&CostConfig::default(), "job-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CostError::Config(_)));
    }

    #[tokio::test]
    async fn end_to_end_against_rest_api() {
        use serde_json::json;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let base = "/projects/acme/regions/us-east1";
        Mock::given(method("GET"))
            .and(path(format!("{base}/jobs")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobs": [{"reference": {"jobId": "spark-7"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{base}/jobs/spark-7")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reference": {"jobId": "spark-7"},
                "status": {"state": "DONE", "stateStartTime": "2023-01-01T00:12:00.000Z"},
                "statusHistory": [
                    {"state": "PENDING", "stateStartTime": "2022-12-31T23:59:58.000Z"},
                    {"state": "RUNNING", "stateStartTime": "2023-01-01T00:00:00.000Z"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{base}/clusters")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "clusters": [{
                    "clusterName": "etl",
                    "config": {
                        "masterConfig": {"numInstances": 1, "machineTypeUri": "zones/us-east1-b/machineTypes/n1-standard-4"},
                        "workerConfig": {"numInstances": 2, "machineTypeUri": "zones/us-east1-b/machineTypes/n1-standard-8"}
                    }
                }]
            })))
            .mount(&server)
            .await;

        let prices = price_file();
        let config = CostConfig {
            api_base_url: server.uri(),
            access_token: "ya29.test".into(),
            ..config(&prices)
        };

        let result = get_cost_for_last_job(&config).await.unwrap().unwrap();
        assert_eq!(result.job_id, "spark-7");
        assert_eq!(result.minutes, 12.0);
        assert_close(result.total_cost, 0.20);
    }
}
