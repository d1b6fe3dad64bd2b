use ephem_model::{TaskId, TaskStatus};
use thiserror::Error;

/// Failure of a single call against the orchestration, host or capacity API.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
}

impl PlatformError {
    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        PlatformError::Api {
            operation,
            message: message.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        PlatformError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Stack outputs could not be resolved into a launch configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("stack {stack} not found")]
    StackNotFound { stack: String },

    #[error("Output key {key} not found")]
    MissingOutput { key: &'static str },

    #[error("output {key} has invalid value {value:?}")]
    InvalidOutput { key: &'static str, value: String },

    #[error("failed to read stack outputs: {0}")]
    Source(String),
}

/// The follow-up event could not be handed off.
#[derive(Debug, Clone, Error)]
pub enum EmitError {
    #[error("event dispatcher is shut down")]
    Closed,

    #[error("event delivery failed: {0}")]
    Delivery(String),
}

/// The delivery address did not accept a notification.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("notification rejected with status {status}")]
    Rejected { status: u16 },
}

/// Launch path taxonomy. Every variant renders to a chat reply.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("stack name is required")]
    MissingStack,

    #[error(transparent)]
    ConfigurationUnresolved(#[from] ConfigError),

    #[error("requester {requester} already owns task {task_id}")]
    AlreadyRunning {
        stack: String,
        requester: String,
        task_id: TaskId,
    },

    #[error("{0}")]
    LaunchFailed(#[source] PlatformError),

    #[error("{0}")]
    Platform(#[source] PlatformError),

    #[error("task {task_id} launched but the readiness follow-up was not scheduled: {source}")]
    EventEmissionFailed {
        stack: String,
        task_id: TaskId,
        #[source]
        source: EmitError,
    },
}

/// Anything that ends a readiness wait in the errored state.
#[derive(Debug, Clone, Error)]
pub enum ReadinessFault {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("task {0} not found")]
    TaskMissing(TaskId),

    #[error("task {task_id} reached {status} before becoming reachable")]
    TaskStopped { task_id: TaskId, status: TaskStatus },

    #[error("task {0} has no network interface details")]
    MissingAttachment(TaskId),
}

/// Fatal reaper failures. Per-task stop failures are not errors; they are
/// reported in the summary.
#[derive(Debug, Clone, Error)]
pub enum ReapError {
    #[error("invalid reap trigger: {0}")]
    InvalidTrigger(String),

    #[error("listing running tasks failed: {0}")]
    ListTasks(#[source] PlatformError),

    #[error("describing tasks failed: {0}")]
    DescribeTasks(#[source] PlatformError),
}
