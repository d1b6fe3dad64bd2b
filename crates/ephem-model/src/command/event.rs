use serde::{Deserialize, Serialize};

use crate::{ClusterName, TaskId};

/// Port assumed when an event carries none.
pub const DEFAULT_PORT: u16 = 80;

/// Snapshot emitted once per successful launch.
///
/// Carries everything the readiness notifier needs so it never has to
/// resolve stack outputs again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStartedEvent {
    #[serde(rename = "task_arn")]
    pub task_id: TaskId,
    pub cluster: ClusterName,
    #[serde(default)]
    pub stack: String,
    pub response_url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub query_string: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_hints_fall_back_to_defaults() {
        let event: TaskStartedEvent = serde_json::from_str(
            r#"{"task_arn":"task/demo/1","cluster":"demo","response_url":"http://hook"}"#,
        )
        .unwrap();

        assert_eq!(event.task_id, TaskId::from("task/demo/1"));
        assert_eq!(event.port, DEFAULT_PORT);
        assert!(event.query_string.is_empty());
        assert!(event.user.is_empty());
    }
}
