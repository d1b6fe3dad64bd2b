use std::sync::Arc;

use async_trait::async_trait;
use ephem_core::{EventSink, LaunchCoordinator, TimeoutReaper};
use ephem_model::{CommandReply, LaunchRequest, ReapRequest, ReapSummary, TaskStartedEvent};

use crate::error::ApiError;
use crate::handler::ApiHandler;

/// Adapter that bridges the three control-loop components to `ApiHandler`.
///
/// Task-started events received over HTTP are handed to `dispatcher`, which
/// owns the readiness wait; the request itself never waits on the task.
pub struct ControlPlaneAdapter {
    launcher: Arc<LaunchCoordinator>,
    dispatcher: Arc<dyn EventSink>,
    reaper: Arc<TimeoutReaper>,
}

impl ControlPlaneAdapter {
    pub fn new(
        launcher: Arc<LaunchCoordinator>,
        dispatcher: Arc<dyn EventSink>,
        reaper: Arc<TimeoutReaper>,
    ) -> Self {
        Self {
            launcher,
            dispatcher,
            reaper,
        }
    }
}

#[async_trait]
impl ApiHandler for ControlPlaneAdapter {
    async fn launch(&self, request: LaunchRequest) -> CommandReply {
        self.launcher.handle(&request).await
    }

    async fn task_started(&self, event: TaskStartedEvent) -> Result<(), ApiError> {
        self.dispatcher.emit(event).await.map_err(ApiError::from)
    }

    async fn reap(&self, request: ReapRequest) -> Result<ReapSummary, ApiError> {
        self.reaper.reap(&request).await.map_err(ApiError::from)
    }
}
