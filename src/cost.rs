//! Cluster cost for a job: per-minute machine price times instance count
//! times billable minutes, summed over the master and worker groups.

use serde::Serialize;
use tracing::debug;

use crate::dataproc::InstanceGroupConfig;
use crate::error::CostError;
use crate::pricing::PriceTable;

/// Machine configuration of one node group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineGroup {
    pub machine_type: String,
    pub instance_count: u32,
}

impl From<&InstanceGroupConfig> for MachineGroup {
    fn from(config: &InstanceGroupConfig) -> Self {
        Self {
            machine_type: machine_type_from_uri(&config.machine_type_uri).to_string(),
            instance_count: config.num_instances,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterCost {
    pub master_cost: f64,
    pub worker_cost: f64,
    pub total_cost: f64,
}

/// Cost of one run, with the per-group breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostResult {
    pub job_id: String,
    pub cluster_name: String,
    pub minutes: f64,
    pub master_cost: f64,
    pub worker_cost: f64,
    pub total_cost: f64,
}

/// The machine type is the last segment of a slash-delimited URI; a bare
/// name is returned unchanged.
pub fn machine_type_from_uri(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

pub fn compute_group_cost(
    group: &MachineGroup,
    prices: &PriceTable,
    duration_minutes: f64,
) -> Result<f64, CostError> {
    let per_minute = prices.hourly_cost(&group.machine_type)? / 60.0;
    let cost = f64::from(group.instance_count) * per_minute * duration_minutes;
    debug!(
        machine_type = %group.machine_type,
        instances = group.instance_count,
        cost,
        "group cost"
    );
    Ok(cost)
}

/// Total cost of running both groups for `duration_minutes`. A price miss
/// for either group fails the whole computation. No rounding is applied.
pub fn compute_cluster_cost(
    master: &MachineGroup,
    worker: &MachineGroup,
    prices: &PriceTable,
    duration_minutes: f64,
) -> Result<ClusterCost, CostError> {
    let master_cost = compute_group_cost(master, prices, duration_minutes)?;
    let worker_cost = compute_group_cost(worker, prices, duration_minutes)?;
    Ok(ClusterCost {
        master_cost,
        worker_cost,
        total_cost: master_cost + worker_cost,
    })
}
