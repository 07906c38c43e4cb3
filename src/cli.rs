//! Command-line interface built on clap.
//!
//! Defines [`Cli`] with the [`Command`] subcommands (last-job, job, prices)
//! and global flags that override values from the config file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;

/// Estimates what a job on a Dataproc cluster cost.
#[derive(Debug, Parser)]
#[command(name = "dataproc-cost", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the TOML config file (default: ./dataproc-cost.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// GCP project id.
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Dataproc region.
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Tab-separated price list with `type` and `cost` columns.
    #[arg(long, global = true)]
    pub price_list: Option<PathBuf>,

    /// Price this cluster instead of the first one listed.
    #[arg(long, global = true)]
    pub cluster: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cost of the last job listed in the project region.
    LastJob,

    /// Cost of a specific job.
    Job {
        /// Dataproc job id.
        job_id: String,
    },

    /// Show the loaded price list.
    Prices,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            project_id: self.project.clone(),
            region: self.region.clone(),
            price_list: self.price_list.clone(),
            cluster_name: self.cluster.clone(),
        }
    }
}
