use std::collections::BTreeSet;

use ephem_model::{HostId, ReapRequest, Task};
use tracing::{debug, info, warn};

use super::TimeoutReaper;
use crate::error::{PlatformError, ReapError};

/// Post-reap capacity reconciliation. At most one is active per trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityStrategy {
    /// Reap only.
    None,
    /// Lower the group's desired capacity toward remaining demand, never
    /// below `min_floor` and never upward.
    RightSizeGroup { group: String, min_floor: u32 },
    /// Terminate the host that carried each stopped task.
    TerminateHosts,
}

impl CapacityStrategy {
    pub fn from_request(request: &ReapRequest) -> Result<Self, ReapError> {
        match (&request.asg_name, request.terminate_hosts) {
            (Some(_), true) => Err(ReapError::InvalidTrigger(
                "asg_name and terminate_hosts are mutually exclusive".into(),
            )),
            (Some(group), false) => Ok(CapacityStrategy::RightSizeGroup {
                group: group.clone(),
                min_floor: request.min_instances,
            }),
            (None, true) => Ok(CapacityStrategy::TerminateHosts),
            (None, false) => Ok(CapacityStrategy::None),
        }
    }
}

/// Capacity needed for `running` tasks at one task per instance.
pub fn optimal_capacity(min_floor: u32, running: usize) -> u32 {
    let running = u32::try_from(running).unwrap_or(u32::MAX);
    min_floor.max(running)
}

impl TimeoutReaper {
    /// Returns the number of capacity units removed. Failures are logged and
    /// count as zero; they never affect the reap result.
    pub(super) async fn right_size(&self, cluster: &str, group: &str, min_floor: u32) -> u32 {
        match self.try_right_size(cluster, group, min_floor).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(group, error = %e, "error during instance scaling");
                0
            }
        }
    }

    async fn try_right_size(&self, cluster: &str, group: &str, min_floor: u32) -> Result<u32, PlatformError> {
        let running = self.orchestrator.list_active_tasks(cluster).await?.len();
        debug!(running, "current running tasks");

        let Some(current) = self.groups.describe_group(group).await? else {
            warn!(group, "autoscaling group not found");
            return Ok(0);
        };

        let optimal = optimal_capacity(min_floor, running);
        debug!(
            desired = current.desired,
            current = current.current,
            min_floor,
            optimal,
            "group status"
        );

        if optimal >= current.desired {
            debug!(desired = current.desired, "no scaling needed");
            return Ok(0);
        }

        self.groups.set_desired_capacity(group, optimal, false).await?;
        let removed = current.desired - optimal;
        info!(group, from = current.desired, to = optimal, removed, "scaled down");
        Ok(removed)
    }

    /// Terminate hosts of stopped tasks, skipping any host that still
    /// carries a task that was not stopped in this run.
    pub(super) async fn terminate_hosts(&self, stopped: &[&Task], described: &[Task]) -> Vec<HostId> {
        let survivors: BTreeSet<&HostId> = described
            .iter()
            .filter(|t| !stopped.iter().any(|s| s.id == t.id))
            .filter_map(|t| t.host.as_ref())
            .collect();

        let candidates: BTreeSet<&HostId> = stopped.iter().filter_map(|t| t.host.as_ref()).collect();

        let mut terminated = Vec::new();
        for host in candidates {
            if survivors.contains(host) {
                info!(host_id = %host, "host still carries active tasks, keeping it");
                continue;
            }
            match self.hosts.terminate_host(host).await {
                Ok(()) => {
                    info!(host_id = %host, "terminated host");
                    terminated.push(host.clone());
                }
                Err(e) => warn!(host_id = %host, error = %e, "failed to terminate host"),
            }
        }
        terminated
    }
}
