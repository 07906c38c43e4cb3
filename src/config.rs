//! Configuration loaded from `dataproc-cost.toml`.
//!
//! [`CostConfig`] holds the project, region and price-list location that the
//! estimator is called with. Values missing from the file fall back to
//! defaults. Non-empty `DATAPROC_*` environment variables take precedence over
//! the file, and CLI flags take precedence over both (see [`CostConfig::apply_overrides`]).

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::dataproc::client::API_URL;
use crate::error::CostError;

pub const DEFAULT_CONFIG_FILE: &str = "dataproc-cost.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct CostConfig {
    /// GCP project that owns the cluster.
    #[serde(default)]
    pub project_id: String,

    /// Dataproc region, e.g. `us-east1`.
    #[serde(default = "default_region")]
    pub region: String,

    /// Tab-separated price list with `type` and `cost` columns.
    #[serde(default = "default_price_list")]
    pub price_list: PathBuf,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// OAuth2 bearer token for the Dataproc API.
    #[serde(default)]
    pub access_token: String,

    /// Cluster to price. When unset the first cluster listed is used.
    #[serde(default)]
    pub cluster_name: Option<String>,
}

fn default_region() -> String {
    "global".to_string()
}

fn default_price_list() -> PathBuf {
    PathBuf::from("price_list.tsv")
}

fn default_api_base_url() -> String {
    API_URL.to_string()
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            region: default_region(),
            price_list: default_price_list(),
            api_base_url: default_api_base_url(),
            access_token: String::new(),
            cluster_name: None,
        }
    }
}

/// Values supplied on the command line; `None` leaves the loaded value alone.
#[derive(Debug, Default)]
pub struct Overrides {
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub price_list: Option<PathBuf>,
    pub cluster_name: Option<String>,
}

impl CostConfig {
    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] from the working directory when
    /// `path` is `None`, then applies environment overrides.
    /// Uses defaults if the default file does not exist; an explicit path
    /// that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, CostError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, CostError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<CostConfig>(&contents)?)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(project) = var("DATAPROC_PROJECT_ID") {
            self.project_id = project;
        }
        if let Some(region) = var("DATAPROC_REGION") {
            self.region = region;
        }
        if let Some(price_list) = var("DATAPROC_PRICE_LIST") {
            self.price_list = PathBuf::from(price_list);
        }
        if let Some(token) = var("DATAPROC_ACCESS_TOKEN") {
            self.access_token = token;
        }
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(project) = overrides.project_id {
            self.project_id = project;
        }
        if let Some(region) = overrides.region {
            self.region = region;
        }
        if let Some(price_list) = overrides.price_list {
            self.price_list = price_list;
        }
        if overrides.cluster_name.is_some() {
            self.cluster_name = overrides.cluster_name;
        }
    }

    /// Checks the fields every remote query needs.
    pub fn validate(&self) -> Result<(), CostError> {
        if self.project_id.trim().is_empty() {
            return Err(CostError::Config(
                "project_id is not set (config file, DATAPROC_PROJECT_ID or --project)".into(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(CostError::Config("region must not be empty".into()));
        }
        Ok(())
    }
}
