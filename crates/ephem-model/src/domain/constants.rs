/// Tag carrying the time-derived launch id (`task-<unix seconds>`).
pub const TAG_LAUNCH_ID: &str = "task-id";

/// Tag carrying the identity of the requester that owns the task.
pub const TAG_REQUESTER: &str = "slack-user";

/// Tag recording which surface launched the task.
pub const TAG_LAUNCH_TYPE: &str = "launch-type";

/// Value of [`TAG_LAUNCH_TYPE`] for chat-command launches.
pub const LAUNCH_TYPE_VALUE: &str = "slack";
