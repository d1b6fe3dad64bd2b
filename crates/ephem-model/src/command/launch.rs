use serde::{Deserialize, Serialize};

use crate::{ClusterName, TaskTags};

/// One incoming launch command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Stack (target) whose outputs describe what to launch. May be empty
    /// when the requester forgot to name one.
    pub stack: String,
    /// Requester identity; becomes the ownership tag.
    pub requester: String,
    /// Opaque delivery address for the asynchronous follow-up.
    pub response_url: String,
}

impl LaunchRequest {
    pub fn new(
        stack: impl Into<String>,
        requester: impl Into<String>,
        response_url: impl Into<String>,
    ) -> Self {
        Self {
            stack: stack.into(),
            requester: requester.into(),
            response_url: response_url.into(),
        }
    }
}

/// Where the platform should put a new task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum Placement {
    /// Caller-specified networking.
    Direct {
        subnets: Vec<String>,
        security_groups: Vec<String>,
        assign_public_ip: bool,
    },
    /// Let the platform place the task through a named capacity provider.
    CapacityProvider { provider: String, weight: u32 },
}

impl Placement {
    pub fn kind(&self) -> &'static str {
        match self {
            Placement::Direct { .. } => "direct",
            Placement::CapacityProvider { .. } => "capacity-provider",
        }
    }
}

/// Everything resolved from a stack's outputs that a launch needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    pub cluster: ClusterName,
    pub task_definition: String,
    pub placement: Placement,
    /// Port the launched service listens on (interface mode).
    pub port: u16,
    /// Suffix appended to the endpoint URL (path and/or query string).
    pub path_suffix: String,
}

/// A single run request submitted to the orchestration platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTaskRequest {
    pub cluster: ClusterName,
    pub task_definition: String,
    pub placement: Placement,
    pub tags: TaskTags,
}
