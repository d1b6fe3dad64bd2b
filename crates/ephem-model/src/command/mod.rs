mod launch;
pub use launch::{LaunchConfig, LaunchRequest, Placement, RunTaskRequest};

mod event;
pub use event::{DEFAULT_PORT, TaskStartedEvent};

mod reply;
pub use reply::{CommandReply, ResponseType};

mod readiness;
pub use readiness::ReadinessState;

mod reap;
pub use reap::{DEFAULT_TIMEOUT_HOURS, ReapRequest, ReapSummary};
