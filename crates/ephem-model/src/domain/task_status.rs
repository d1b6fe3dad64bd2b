use std::fmt;

use serde::{Deserialize, Serialize};

/// Last observed lifecycle status of a task.
///
/// Transitions are driven by the orchestration platform:
/// `Pending -> Running -> Stopped`. A task may also go straight from
/// `Pending` to `Stopped` when it fails to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepted by the platform, not yet running (provisioning, pulling, ...).
    Pending,
    /// Containers are up.
    Running,
    /// Terminal: stopped explicitly or failed.
    Stopped,
}

impl TaskStatus {
    /// Returns `true` if the task still occupies its requester's slot.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_states() {
        assert!(TaskStatus::Pending.is_active());
        assert!(TaskStatus::Running.is_active());
        assert!(!TaskStatus::Stopped.is_active());
        assert!(TaskStatus::Stopped.is_terminal());
    }

    #[test]
    fn serializes_as_platform_status() {
        let json = serde_json::to_string(&TaskStatus::Running).unwrap();
        assert_eq!(json, r#""RUNNING""#);

        let back: TaskStatus = serde_json::from_str(r#""PENDING""#).unwrap();
        assert_eq!(back, TaskStatus::Pending);
    }
}
