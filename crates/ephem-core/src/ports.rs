//! Ports onto the external platform.
//!
//! Components receive these as `Arc<dyn ...>` so a deployment can plug in
//! real API clients while tests use [`crate::memory`].

use async_trait::async_trait;
use ephem_model::{
    CapacityGroup, CommandReply, HostId, RunTaskRequest, Task, TaskId, TaskStartedEvent, TaskTags,
};

use crate::config::StackOutputs;
use crate::error::{ConfigError, EmitError, NotifyError, PlatformError};

/// Task surface of the orchestration API.
#[async_trait]
pub trait Orchestrator: Send + Sync + 'static {
    /// List tasks whose desired status is running (this includes tasks that
    /// are still pending).
    async fn list_active_tasks(&self, cluster: &str) -> Result<Vec<TaskId>, PlatformError>;

    /// Describe tasks. Unknown ids are silently left out of the result.
    async fn describe_tasks(&self, cluster: &str, ids: &[TaskId]) -> Result<Vec<Task>, PlatformError>;

    async fn list_tags(&self, id: &TaskId) -> Result<TaskTags, PlatformError>;

    /// Submit one task. Returns the id the platform assigned.
    async fn run_task(&self, request: RunTaskRequest) -> Result<TaskId, PlatformError>;

    async fn stop_task(&self, cluster: &str, id: &TaskId, reason: &str) -> Result<(), PlatformError>;
}

/// Compute host and network interface surface.
#[async_trait]
pub trait Hosts: Send + Sync + 'static {
    /// Public address associated with a network interface, if any yet.
    async fn interface_public_ip(&self, interface_id: &str) -> Result<Option<String>, PlatformError>;

    /// Public address of a compute host, if it has one.
    async fn host_public_ip(&self, host_id: &str) -> Result<Option<String>, PlatformError>;

    async fn terminate_host(&self, host_id: &HostId) -> Result<(), PlatformError>;
}

/// Autoscaling group surface.
#[async_trait]
pub trait CapacityGroups: Send + Sync + 'static {
    async fn describe_group(&self, name: &str) -> Result<Option<CapacityGroup>, PlatformError>;

    async fn set_desired_capacity(
        &self,
        name: &str,
        desired: u32,
        honor_cooldown: bool,
    ) -> Result<(), PlatformError>;
}

/// Resolves a stack (target) identifier into its named outputs.
#[async_trait]
pub trait OutputSource: Send + Sync + 'static {
    async fn outputs(&self, stack: &str) -> Result<StackOutputs, ConfigError>;
}

/// One-shot hand-off of the task-started event. Never retried.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    async fn emit(&self, event: TaskStartedEvent) -> Result<(), EmitError>;
}

/// Delivers a reply to a requester's delivery address. Never retried.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, response_url: &str, reply: &CommandReply) -> Result<(), NotifyError>;
}
