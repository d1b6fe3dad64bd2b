use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use ephem_model::{CommandReply, HostId, LaunchRequest, ReapRequest, TaskId, TaskStartedEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{error::ApiError, handler::ApiHandler};

/// Requester assumed when the command carries no `user_name`.
const UNKNOWN_REQUESTER: &str = "unknown";

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API with the given handler.
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - POST /slack/launch - Launch command, stack taken from `text`
    /// - POST /slack/launch/{stack} - Launch command, stack taken from the path
    /// - POST /api/v1/events/task-started - Accept a task-started event (202)
    /// - POST /api/v1/reap - Run one reaper pass
    pub fn router(self) -> Router {
        Router::new()
            .route("/slack/launch", post(launch_from_text::<H>))
            .route("/slack/launch/{stack}", post(launch_from_path::<H>))
            .route("/api/v1/events/task-started", post(task_started::<H>))
            .route("/api/v1/reap", post(reap::<H>))
            .with_state(self.handler)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Form fields sent by the chat platform with a slash command.
#[derive(Debug, Default, Deserialize)]
struct CommandForm {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    response_url: Option<String>,
}

impl CommandForm {
    fn into_request(self, stack: String) -> LaunchRequest {
        LaunchRequest {
            stack,
            requester: self
                .user_name
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_REQUESTER.to_string()),
            response_url: self.response_url.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TaskStartedResponse {
    accepted: bool,
    task_id: TaskId,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReapResponse {
    success: bool,
    stopped_tasks: usize,
    scaled_instances: u32,
    terminated_hosts: Vec<HostId>,
    timeout_hours: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /slack/launch
async fn launch_from_text<H>(
    State(handler): State<Arc<H>>,
    form: Result<Form<CommandForm>, FormRejection>,
) -> Json<CommandReply>
where
    H: ApiHandler,
{
    let form = unwrap_form(form);
    let stack = form.text.as_deref().unwrap_or_default().trim().to_string();
    debug!(%stack, "launch command received");

    Json(handler.launch(form.into_request(stack)).await)
}

/// POST /slack/launch/{stack}
async fn launch_from_path<H>(
    State(handler): State<Arc<H>>,
    Path(stack): Path<String>,
    form: Result<Form<CommandForm>, FormRejection>,
) -> Json<CommandReply>
where
    H: ApiHandler,
{
    let form = unwrap_form(form);
    debug!(%stack, "launch command received");

    Json(handler.launch(form.into_request(stack.trim().to_string())).await)
}

/// POST /api/v1/events/task-started
///
/// Acknowledges as soon as the readiness wait is scheduled. The producer's
/// request never spans the wait.
async fn task_started<H>(
    State(handler): State<Arc<H>>,
    Json(event): Json<TaskStartedEvent>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    debug!(task_id = %event.task_id, cluster = %event.cluster, "task-started event received");
    let task_id = event.task_id.clone();
    handler.task_started(event).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(TaskStartedResponse {
            accepted: true,
            task_id,
        }),
    ))
}

/// POST /api/v1/reap
async fn reap<H>(
    State(handler): State<Arc<H>>,
    Json(req): Json<ReapRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    if req.cluster_name.trim().is_empty() {
        return Err(ApiError::InvalidRequest("cluster_name cannot be empty".into()));
    }

    let summary = handler.reap(req).await?;
    debug!(stopped = summary.stopped_count(), "reap finished");

    Ok(Json(ReapResponse {
        success: true,
        stopped_tasks: summary.stopped_count(),
        scaled_instances: summary.scaled_instances,
        terminated_hosts: summary.terminated_hosts,
        timeout_hours: summary.timeout_hours,
    }))
}

/// An unreadable command body is treated as an empty one, so the requester
/// still gets the usage reply instead of a transport error.
fn unwrap_form(form: Result<Form<CommandForm>, FormRejection>) -> CommandForm {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable command body");
            CommandForm::default()
        }
    }
}
