use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{ClusterName, HostId, NetworkAttachment, TaskId, TaskStatus, TaskTags};

/// A task as described by the orchestration platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Platform identifier.
    pub id: TaskId,
    /// Cluster the task runs within.
    pub cluster: ClusterName,
    /// When the platform accepted the task.
    #[serde(with = "time_serde")]
    pub created_at: SystemTime,
    /// Last observed lifecycle status.
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "TaskTags::is_empty")]
    pub tags: TaskTags,
    /// Network attachment, absent until the platform has provisioned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<NetworkAttachment>,
    /// Host carrying the task (host-backed placement only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<HostId>,
}

impl Task {
    /// Returns `true` if the task was created strictly before `cutoff`.
    pub fn created_before(&self, cutoff: SystemTime) -> bool {
        self.created_at < cutoff
    }
}

mod time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        since_epoch.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}
