use async_trait::async_trait;
use ephem_model::{CommandReply, LaunchRequest, ReapRequest, ReapSummary, TaskStartedEvent};

use crate::error::ApiError;

/// Control plane API handler.
///
/// Abstracts the backend so the HTTP surface can be mounted over the
/// provided [`crate::ControlPlaneAdapter`] or a custom implementation that
/// adds its own checks.
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Handle a launch command. Always produces a chat reply.
    async fn launch(&self, request: LaunchRequest) -> CommandReply;

    /// Accept a task-started event. Resolves once the readiness wait has
    /// been scheduled, not when it finishes.
    async fn task_started(&self, event: TaskStartedEvent) -> Result<(), ApiError>;

    /// Run one reaper pass.
    async fn reap(&self, request: ReapRequest) -> Result<ReapSummary, ApiError>;
}
