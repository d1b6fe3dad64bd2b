//! Launch coordinator.
//!
//! The one-task-per-requester rule is enforced by listing active tasks and
//! reading their tags before submitting a new one. The check and the launch
//! are two separate platform calls, so two concurrent requests from the same
//! requester can both pass the check. The rule is best-effort.

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use ephem_model::{
    CommandReply, LAUNCH_TYPE_VALUE, LaunchRequest, RunTaskRequest, TAG_LAUNCH_ID, TAG_LAUNCH_TYPE,
    TAG_REQUESTER, TaskId, TaskStartedEvent, TaskTags,
};
use tracing::{debug, info, instrument, warn};

use crate::config::resolve_launch_config;
use crate::error::LaunchError;
use crate::ports::{EventSink, Orchestrator, OutputSource};

/// Result of a successful launch: the task is submitted and its follow-up
/// event has been handed off.
#[derive(Debug, Clone)]
pub struct Launched {
    pub task_id: TaskId,
    pub stack: String,
    pub event: TaskStartedEvent,
}

pub struct LaunchCoordinator {
    orchestrator: Arc<dyn Orchestrator>,
    outputs: Arc<dyn OutputSource>,
    events: Arc<dyn EventSink>,
}

impl LaunchCoordinator {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        outputs: Arc<dyn OutputSource>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            orchestrator,
            outputs,
            events,
        }
    }

    /// Handle a launch command end to end and render the immediate reply.
    ///
    /// Never fails: every error becomes an ephemeral reply.
    pub async fn handle(&self, request: &LaunchRequest) -> CommandReply {
        match self.launch(request).await {
            Ok(launched) => launching_reply(&launched.stack),
            Err(err) => {
                warn!(stack = %request.stack, requester = %request.requester, error = %err, "launch rejected");
                err.reply()
            }
        }
    }

    #[instrument(level = "info", skip(self, request), fields(stack = %request.stack, requester = %request.requester))]
    pub async fn launch(&self, request: &LaunchRequest) -> Result<Launched, LaunchError> {
        let stack = request.stack.trim();
        if stack.is_empty() {
            return Err(LaunchError::MissingStack);
        }

        let outputs = self.outputs.outputs(stack).await?;
        let config = resolve_launch_config(&outputs)?;
        debug!(cluster = %config.cluster, placement = config.placement.kind(), "launch config resolved");

        if let Some(task_id) = self.find_owned_task(&config.cluster, &request.requester).await? {
            info!(%task_id, "requester already has a running task");
            return Err(LaunchError::AlreadyRunning {
                stack: stack.to_string(),
                requester: request.requester.clone(),
                task_id,
            });
        }

        let tags = TaskTags::new()
            .with(TAG_LAUNCH_ID, launch_id(SystemTime::now()))
            .with(TAG_REQUESTER, request.requester.clone())
            .with(TAG_LAUNCH_TYPE, LAUNCH_TYPE_VALUE);

        let task_id = self
            .orchestrator
            .run_task(RunTaskRequest {
                cluster: config.cluster.clone(),
                task_definition: config.task_definition.clone(),
                placement: config.placement.clone(),
                tags,
            })
            .await
            .map_err(LaunchError::LaunchFailed)?;
        info!(%task_id, cluster = %config.cluster, "task submitted");

        let event = TaskStartedEvent {
            task_id: task_id.clone(),
            cluster: config.cluster,
            stack: stack.to_string(),
            response_url: request.response_url.clone(),
            user: request.requester.clone(),
            port: config.port,
            query_string: config.path_suffix,
        };

        // The task stays up even if the hand-off fails.
        if let Err(source) = self.events.emit(event.clone()).await {
            return Err(LaunchError::EventEmissionFailed {
                stack: stack.to_string(),
                task_id,
                source,
            });
        }

        Ok(Launched {
            task_id,
            stack: stack.to_string(),
            event,
        })
    }

    /// Scan active tasks in `cluster` for one tagged with `requester`.
    async fn find_owned_task(&self, cluster: &str, requester: &str) -> Result<Option<TaskId>, LaunchError> {
        let active = self
            .orchestrator
            .list_active_tasks(cluster)
            .await
            .map_err(LaunchError::Platform)?;

        for task_id in active {
            let tags = self
                .orchestrator
                .list_tags(&task_id)
                .await
                .map_err(LaunchError::Platform)?;
            if tags.is_owned_by(requester) {
                return Ok(Some(task_id));
            }
        }
        Ok(None)
    }
}

/// Uniqueness tag value derived from the launch time.
pub fn launch_id(now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("task-{secs}")
}

pub fn launching_reply(stack: &str) -> CommandReply {
    CommandReply::ephemeral(format!(
        "Task is launching for `{stack}`.\nYou’ll get a message when it’s ready."
    ))
}

impl LaunchError {
    /// Immediate chat reply for this failure.
    pub fn reply(&self) -> CommandReply {
        match self {
            LaunchError::MissingStack => {
                CommandReply::ephemeral("You must specify a stack name.\nUsage: `/launch <stack-name>`")
            }
            LaunchError::AlreadyRunning { stack, .. } => CommandReply::ephemeral(format!(
                "You already have a running task for `{stack}`. Only one task per user is allowed."
            )),
            LaunchError::EventEmissionFailed { stack, source, .. } => CommandReply::ephemeral(format!(
                "Task is launching for `{stack}`, but no readiness message will follow: {source}"
            )),
            other => CommandReply::ephemeral(format!("Failed to launch task: {other}")),
        }
    }
}
