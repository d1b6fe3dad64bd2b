//! Timeout reaper.
//!
//! Stops every active task older than the trigger's threshold, then
//! optionally reconciles compute capacity. Runs are independent and hold no
//! state; overlapping runs may race on the group's desired capacity, which
//! only delays convergence.

mod capacity;
pub use capacity::{CapacityStrategy, optimal_capacity};

use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use ephem_model::{ReapRequest, ReapSummary, Task};
use tracing::{info, instrument, warn};

use crate::error::ReapError;
use crate::ports::{CapacityGroups, Hosts, Orchestrator};

const SECS_PER_HOUR: u64 = 3600;

pub struct TimeoutReaper {
    orchestrator: Arc<dyn Orchestrator>,
    hosts: Arc<dyn Hosts>,
    groups: Arc<dyn CapacityGroups>,
}

impl TimeoutReaper {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        hosts: Arc<dyn Hosts>,
        groups: Arc<dyn CapacityGroups>,
    ) -> Self {
        Self {
            orchestrator,
            hosts,
            groups,
        }
    }

    pub async fn reap(&self, request: &ReapRequest) -> Result<ReapSummary, ReapError> {
        self.reap_at(request, SystemTime::now()).await
    }

    /// Reap relative to an explicit `now`.
    #[instrument(level = "info", skip(self, request, now), fields(cluster = %request.cluster_name, timeout_hours = request.timeout_hours))]
    pub async fn reap_at(&self, request: &ReapRequest, now: SystemTime) -> Result<ReapSummary, ReapError> {
        let strategy = CapacityStrategy::from_request(request)?;
        let cluster = request.cluster_name.as_str();
        let cutoff = cutoff(now, request.timeout_hours);
        info!(cutoff = ?cutoff, "reaping tasks older than cutoff");

        let mut summary = ReapSummary {
            timeout_hours: request.timeout_hours,
            ..ReapSummary::default()
        };

        let ids = self
            .orchestrator
            .list_active_tasks(cluster)
            .await
            .map_err(ReapError::ListTasks)?;
        if ids.is_empty() {
            info!("no running tasks found");
            return Ok(summary);
        }

        let tasks = self
            .orchestrator
            .describe_tasks(cluster, &ids)
            .await
            .map_err(ReapError::DescribeTasks)?;

        let reason = format!("Automatic cleanup after {} hours", request.timeout_hours);
        let mut stopped: Vec<&Task> = Vec::new();
        for task in tasks.iter().filter(|t| t.created_before(cutoff)) {
            info!(task_id = %task.id, created_at = ?task.created_at, "stopping expired task");
            match self.orchestrator.stop_task(cluster, &task.id, &reason).await {
                Ok(()) => stopped.push(task),
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "failed to stop task");
                    summary.failed.push(task.id.clone());
                }
            }
        }
        summary.stopped = stopped.iter().map(|t| t.id.clone()).collect();
        info!(stopped = summary.stopped.len(), failed = summary.failed.len(), "task cleanup complete");

        match strategy {
            CapacityStrategy::None => {}
            CapacityStrategy::RightSizeGroup { group, min_floor } => {
                summary.scaled_instances = self.right_size(cluster, &group, min_floor).await;
            }
            CapacityStrategy::TerminateHosts => {
                summary.terminated_hosts = self.terminate_hosts(&stopped, &tasks).await;
            }
        }

        Ok(summary)
    }
}

/// `now - timeout_hours`, clamped at the epoch.
pub fn cutoff(now: SystemTime, timeout_hours: u64) -> SystemTime {
    let threshold = Duration::from_secs(timeout_hours.saturating_mul(SECS_PER_HOUR));
    now.checked_sub(threshold).unwrap_or(UNIX_EPOCH)
}
