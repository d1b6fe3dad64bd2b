mod kv;
pub use kv::KeyValue;

mod task_id;
pub use task_id::TaskId;

mod task_status;
pub use task_status::TaskStatus;

mod task_tags;
pub use task_tags::TaskTags;

mod attachment;
pub use attachment::{Endpoint, NetworkAttachment};

mod task;
pub use task::Task;

mod capacity;
pub use capacity::CapacityGroup;

mod constants;
pub use constants::{LAUNCH_TYPE_VALUE, TAG_LAUNCH_ID, TAG_LAUNCH_TYPE, TAG_REQUESTER};

/// Logical cluster name the tasks run within.
pub type ClusterName = String;

/// Identifier of a compute host (the instance carrying host-backed tasks).
pub type HostId = String;

/// Identifier of a network interface attached to an awsvpc-style task.
pub type InterfaceId = String;
