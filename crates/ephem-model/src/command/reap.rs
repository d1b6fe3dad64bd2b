use serde::{Deserialize, Serialize};

use crate::{ClusterName, HostId, TaskId};

/// Age threshold applied when a trigger does not specify one.
pub const DEFAULT_TIMEOUT_HOURS: u64 = 6;

/// Payload of the periodic reaper trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReapRequest {
    pub cluster_name: ClusterName,
    #[serde(default = "default_timeout_hours")]
    pub timeout_hours: u64,
    /// Autoscaling group to right-size after reaping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asg_name: Option<String>,
    /// Floor the group is never scaled below.
    #[serde(default)]
    pub min_instances: u32,
    /// Terminate the host that carried each reaped task.
    #[serde(default)]
    pub terminate_hosts: bool,
}

impl ReapRequest {
    pub fn new(cluster_name: impl Into<ClusterName>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            timeout_hours: DEFAULT_TIMEOUT_HOURS,
            asg_name: None,
            min_instances: 0,
            terminate_hosts: false,
        }
    }

    pub fn with_timeout_hours(mut self, hours: u64) -> Self {
        self.timeout_hours = hours;
        self
    }

    pub fn with_group(mut self, asg_name: impl Into<String>, min_instances: u32) -> Self {
        self.asg_name = Some(asg_name.into());
        self.min_instances = min_instances;
        self
    }

    pub fn with_host_termination(mut self) -> Self {
        self.terminate_hosts = true;
        self
    }
}

fn default_timeout_hours() -> u64 {
    DEFAULT_TIMEOUT_HOURS
}

/// Outcome of one reaper run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReapSummary {
    /// Tasks whose stop call succeeded. Authoritative result of the run.
    pub stopped: Vec<TaskId>,
    /// Tasks that were eligible but whose stop call failed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<TaskId>,
    /// Capacity units removed from the autoscaling group.
    pub scaled_instances: u32,
    pub terminated_hosts: Vec<HostId>,
    pub timeout_hours: u64,
}

impl ReapSummary {
    pub fn stopped_count(&self) -> usize {
        self.stopped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_defaults() {
        let req: ReapRequest = serde_json::from_str(r#"{"cluster_name":"demo"}"#).unwrap();
        assert_eq!(req, ReapRequest::new("demo"));
        assert_eq!(req.timeout_hours, 6);
        assert!(!req.terminate_hosts);
    }
}
