//! In-memory platform.
//!
//! [`MemoryCluster`] implements every platform port against a single locked
//! map, with failure injection and call counters for tests. With
//! [`MemoryCluster::with_start_after`] it also simulates provisioning, which
//! is what `ephemd` runs against locally.

mod outputs;
pub use outputs::StaticOutputs;

mod recorder;
pub use recorder::{RecordingNotifier, RecordingSink};

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, RwLock},
    time::SystemTime,
};

use async_trait::async_trait;
use ephem_model::{
    CapacityGroup, HostId, InterfaceId, NetworkAttachment, Placement, RunTaskRequest, Task, TaskId,
    TaskStatus, TaskTags,
};
use tracing::{debug, trace};

use crate::error::PlatformError;
use crate::ports::{CapacityGroups, Hosts, Orchestrator};

/// First host port handed out to host-binding tasks.
const EPHEMERAL_PORT_BASE: u16 = 32768;

/// Number of calls made through each port method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: u32,
    pub describe: u32,
    pub list_tags: u32,
    pub run: u32,
    pub stop: u32,
    pub terminate: u32,
    pub describe_group: u32,
    pub set_capacity: u32,
}

impl CallCounts {
    pub fn total(&self) -> u32 {
        self.list
            + self.describe
            + self.list_tags
            + self.run
            + self.stop
            + self.terminate
            + self.describe_group
            + self.set_capacity
    }
}

#[derive(Debug, Clone)]
struct HostRecord {
    public_ip: Option<String>,
    terminated: bool,
}

#[derive(Default)]
struct Inner {
    tasks: BTreeMap<TaskId, Task>,
    /// Describes seen per pending task, for simulated provisioning.
    describes: HashMap<TaskId, u32>,
    interfaces: HashMap<InterfaceId, Option<String>>,
    hosts: BTreeMap<HostId, HostRecord>,
    groups: HashMap<String, CapacityGroup>,
    stop_reasons: Vec<(TaskId, String)>,
    failing_stops: HashSet<TaskId>,
    fail_run: bool,
    fail_list: bool,
    fail_scaling: bool,
    start_after: Option<u32>,
    seq: u64,
    calls: CallCounts,
}

/// In-memory orchestration platform.
#[derive(Clone, Default)]
pub struct MemoryCluster {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending tasks become `RUNNING` on their `describes`-th describe call
    /// and get a public endpoint provisioned at the same moment.
    pub fn with_start_after(self, describes: u32) -> Self {
        self.write().start_after = Some(describes.max(1));
        self
    }

    pub fn insert_task(&self, task: Task) {
        self.write().tasks.insert(task.id.clone(), task);
    }

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.read().tasks.get(id).cloned()
    }

    pub fn set_interface_ip(&self, interface_id: impl Into<InterfaceId>, ip: Option<&str>) {
        self.write()
            .interfaces
            .insert(interface_id.into(), ip.map(str::to_string));
    }

    pub fn add_host(&self, host_id: impl Into<HostId>, public_ip: Option<&str>) {
        self.write().hosts.insert(
            host_id.into(),
            HostRecord {
                public_ip: public_ip.map(str::to_string),
                terminated: false,
            },
        );
    }

    pub fn is_host_terminated(&self, host_id: &str) -> bool {
        self.read()
            .hosts
            .get(host_id)
            .is_some_and(|h| h.terminated)
    }

    pub fn add_group(&self, group: CapacityGroup) {
        self.write().groups.insert(group.name.clone(), group);
    }

    pub fn group(&self, name: &str) -> Option<CapacityGroup> {
        self.read().groups.get(name).cloned()
    }

    pub fn stop_reasons(&self) -> Vec<(TaskId, String)> {
        self.read().stop_reasons.clone()
    }

    pub fn fail_stop(&self, id: &TaskId) {
        self.write().failing_stops.insert(id.clone());
    }

    pub fn fail_run(&self) {
        self.write().fail_run = true;
    }

    pub fn fail_list(&self) {
        self.write().fail_list = true;
    }

    pub fn fail_scaling(&self) {
        self.write().fail_scaling = true;
    }

    pub fn calls(&self) -> CallCounts {
        self.read().calls
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("memory cluster lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("memory cluster lock poisoned")
    }
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Move a pending task to `RUNNING` once it has been described often enough.
    fn advance(&mut self, id: &TaskId) {
        let Some(threshold) = self.start_after else {
            return;
        };
        if self.tasks.get(id).map(|t| t.status) != Some(TaskStatus::Pending) {
            return;
        }
        let seen = self.describes.entry(id.clone()).or_insert(0);
        *seen += 1;
        if *seen < threshold {
            return;
        }
        self.describes.remove(id);

        let seq = self.next_seq();
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        task.status = TaskStatus::Running;

        let ip = format!("198.51.100.{}", seq % 250 + 1);
        match &task.attachment {
            Some(NetworkAttachment::Interface {
                interface_id: Some(eni),
            }) => {
                self.interfaces.insert(eni.clone(), Some(ip));
            }
            Some(NetworkAttachment::HostBinding { host_id, .. }) => {
                self.hosts.insert(
                    host_id.clone(),
                    HostRecord {
                        public_ip: Some(ip),
                        terminated: false,
                    },
                );
            }
            _ => {}
        }
        debug!(task_id = %id, "simulated task reached RUNNING");
    }
}

#[async_trait]
impl Orchestrator for MemoryCluster {
    async fn list_active_tasks(&self, cluster: &str) -> Result<Vec<TaskId>, PlatformError> {
        let mut inner = self.write();
        inner.calls.list += 1;
        if inner.fail_list {
            return Err(PlatformError::api("ListTasks", "injected failure"));
        }
        Ok(inner
            .tasks
            .values()
            .filter(|t| t.cluster == cluster && t.status.is_active())
            .map(|t| t.id.clone())
            .collect())
    }

    async fn describe_tasks(&self, cluster: &str, ids: &[TaskId]) -> Result<Vec<Task>, PlatformError> {
        let mut inner = self.write();
        inner.calls.describe += 1;
        for id in ids {
            inner.advance(id);
        }
        Ok(ids
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .filter(|t| t.cluster == cluster)
            .cloned()
            .collect())
    }

    async fn list_tags(&self, id: &TaskId) -> Result<TaskTags, PlatformError> {
        let mut inner = self.write();
        inner.calls.list_tags += 1;
        inner
            .tasks
            .get(id)
            .map(|t| t.tags.clone())
            .ok_or_else(|| PlatformError::not_found("task", id.as_str()))
    }

    async fn run_task(&self, request: RunTaskRequest) -> Result<TaskId, PlatformError> {
        let mut inner = self.write();
        inner.calls.run += 1;
        if inner.fail_run {
            return Err(PlatformError::api("RunTask", "injected failure"));
        }

        let seq = inner.next_seq();
        let id = TaskId::new(format!("task/{}/{:016x}", request.cluster, seq));
        let (attachment, host) = match &request.placement {
            Placement::Direct { .. } => {
                let eni = format!("eni-{seq:08x}");
                inner.interfaces.insert(eni.clone(), None);
                (
                    NetworkAttachment::Interface {
                        interface_id: Some(eni),
                    },
                    None,
                )
            }
            Placement::CapacityProvider { .. } => {
                let host_id = format!("i-{seq:08x}");
                let host_port = EPHEMERAL_PORT_BASE.saturating_add((seq % 1000) as u16);
                (
                    NetworkAttachment::HostBinding {
                        host_id: host_id.clone(),
                        host_port,
                    },
                    Some(host_id),
                )
            }
        };

        let task = Task {
            id: id.clone(),
            cluster: request.cluster,
            created_at: SystemTime::now(),
            status: TaskStatus::Pending,
            tags: request.tags,
            attachment: Some(attachment),
            host,
        };
        trace!(task_id = %id, placement = request.placement.kind(), "memory task created");
        inner.tasks.insert(id.clone(), task);
        Ok(id)
    }

    async fn stop_task(&self, cluster: &str, id: &TaskId, reason: &str) -> Result<(), PlatformError> {
        let mut inner = self.write();
        inner.calls.stop += 1;
        if inner.failing_stops.contains(id) {
            return Err(PlatformError::api("StopTask", "injected failure"));
        }
        let task = inner
            .tasks
            .get_mut(id)
            .filter(|t| t.cluster == cluster)
            .ok_or_else(|| PlatformError::not_found("task", id.as_str()))?;
        task.status = TaskStatus::Stopped;
        inner.stop_reasons.push((id.clone(), reason.to_string()));
        Ok(())
    }
}

#[async_trait]
impl Hosts for MemoryCluster {
    async fn interface_public_ip(&self, interface_id: &str) -> Result<Option<String>, PlatformError> {
        self.read()
            .interfaces
            .get(interface_id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("network interface", interface_id))
    }

    async fn host_public_ip(&self, host_id: &str) -> Result<Option<String>, PlatformError> {
        match self.read().hosts.get(host_id) {
            Some(host) if !host.terminated => Ok(host.public_ip.clone()),
            Some(_) => Ok(None),
            None => Err(PlatformError::not_found("host", host_id)),
        }
    }

    async fn terminate_host(&self, host_id: &HostId) -> Result<(), PlatformError> {
        let mut inner = self.write();
        inner.calls.terminate += 1;
        let host = inner
            .hosts
            .get_mut(host_id)
            .ok_or_else(|| PlatformError::not_found("host", host_id.as_str()))?;
        host.terminated = true;
        Ok(())
    }
}

#[async_trait]
impl CapacityGroups for MemoryCluster {
    async fn describe_group(&self, name: &str) -> Result<Option<CapacityGroup>, PlatformError> {
        let mut inner = self.write();
        inner.calls.describe_group += 1;
        Ok(inner.groups.get(name).cloned())
    }

    async fn set_desired_capacity(
        &self,
        name: &str,
        desired: u32,
        _honor_cooldown: bool,
    ) -> Result<(), PlatformError> {
        let mut inner = self.write();
        inner.calls.set_capacity += 1;
        if inner.fail_scaling {
            return Err(PlatformError::api("SetDesiredCapacity", "injected failure"));
        }
        let group = inner
            .groups
            .get_mut(name)
            .ok_or_else(|| PlatformError::not_found("autoscaling group", name))?;
        group.desired = desired;
        Ok(())
    }
}
