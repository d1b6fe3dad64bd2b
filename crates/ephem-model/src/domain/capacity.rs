use serde::{Deserialize, Serialize};

/// Snapshot of an autoscaling group backing host-based placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityGroup {
    pub name: String,
    pub desired: u32,
    /// Number of instances currently in the group.
    pub current: u32,
    pub min_size: u32,
}
