//! Readiness notifier.
//!
//! Polls one task until it is running and reachable, then sends exactly one
//! terminal message to the requester's delivery address. The wait is bounded
//! by [`PollPolicy::max_attempts`] and, optionally, by an overall deadline
//! or an external cancellation token.

use std::{sync::Arc, time::Duration};

use ephem_model::{
    CommandReply, Endpoint, NetworkAttachment, ReadinessState, Task, TaskStartedEvent, TaskStatus,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::ReadinessFault;
use crate::ports::{Hosts, Notifier, Orchestrator};

/// Polling cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between two polls.
    pub interval: Duration,
    /// Maximum number of status polls.
    pub max_attempts: u32,
    /// Hard limit on the whole wait, on top of the attempt budget.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 100,
            deadline: None,
        }
    }
}

/// Terminal outcome of a readiness wait.
#[derive(Debug, Clone)]
pub enum Readiness {
    Ready(Endpoint),
    TimedOut,
    Errored(ReadinessFault),
}

impl Readiness {
    pub fn state(&self) -> ReadinessState {
        match self {
            Readiness::Ready(_) => ReadinessState::Ready,
            Readiness::TimedOut => ReadinessState::TimedOut,
            Readiness::Errored(_) => ReadinessState::Errored,
        }
    }

    /// Message delivered to the requester for this outcome.
    pub fn reply(&self, event: &TaskStartedEvent) -> CommandReply {
        match self {
            Readiness::Ready(endpoint) => CommandReply::in_channel(format!(
                "Your container is ready at `{}`",
                endpoint.url(&event.query_string)
            )),
            Readiness::TimedOut => {
                CommandReply::in_channel("Task is taking too long to start. Try again in a minute.")
            }
            Readiness::Errored(fault) => {
                CommandReply::in_channel(format!("Error retrieving container IP: {fault}"))
            }
        }
    }
}

/// What one poll saw.
enum Observation {
    NotRunning(TaskStatus),
    /// Running, but the public address is not associated yet.
    Unresolved,
    Reachable(Endpoint),
}

pub struct ReadinessNotifier {
    orchestrator: Arc<dyn Orchestrator>,
    hosts: Arc<dyn Hosts>,
    notifier: Arc<dyn Notifier>,
    policy: PollPolicy,
}

impl ReadinessNotifier {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        hosts: Arc<dyn Hosts>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            orchestrator,
            hosts,
            notifier,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Wait for the task and deliver the terminal message.
    ///
    /// Cancelling `cancel` (or hitting the policy deadline) ends the wait as
    /// [`Readiness::TimedOut`]; the message is still sent. Delivery failures
    /// are logged and otherwise ignored.
    #[instrument(level = "info", skip_all, fields(task_id = %event.task_id, cluster = %event.cluster))]
    pub async fn run(&self, event: &TaskStartedEvent, cancel: CancellationToken) -> Readiness {
        let outcome = self.wait_bounded(event, cancel).await;
        info!(state = ?outcome.state(), "readiness wait finished");

        let reply = outcome.reply(event);
        match self.notifier.notify(&event.response_url, &reply).await {
            Ok(()) => debug!("requester notified"),
            Err(e) => warn!(error = %e, "failed to notify requester"),
        }
        outcome
    }

    async fn wait_bounded(&self, event: &TaskStartedEvent, cancel: CancellationToken) -> Readiness {
        let wait = async {
            match self.policy.deadline {
                Some(limit) => tokio::time::timeout(limit, self.wait_ready(event))
                    .await
                    .unwrap_or_else(|_| {
                        warn!(?limit, "readiness deadline reached");
                        Readiness::TimedOut
                    }),
                None => self.wait_ready(event).await,
            }
        };

        tokio::select! {
            outcome = wait => outcome,
            _ = cancel.cancelled() => {
                warn!("readiness wait cancelled");
                Readiness::TimedOut
            }
        }
    }

    /// Bounded poll loop. Returns as soon as a poll is conclusive.
    pub async fn wait_ready(&self, event: &TaskStartedEvent) -> Readiness {
        let mut attempts: u32 = 0;
        loop {
            if attempts >= self.policy.max_attempts {
                info!(attempts, "attempt budget exhausted");
                return Readiness::TimedOut;
            }
            attempts += 1;

            match self.observe(event).await {
                Ok(Observation::Reachable(endpoint)) => {
                    info!(attempt = attempts, %endpoint, "task is reachable");
                    return Readiness::Ready(endpoint);
                }
                Ok(Observation::NotRunning(status)) => {
                    debug!(attempt = attempts, %status, "task not running yet");
                }
                Ok(Observation::Unresolved) => {
                    debug!(attempt = attempts, "task running, public address pending");
                }
                Err(fault) => {
                    warn!(attempt = attempts, error = %fault, "readiness poll failed");
                    return Readiness::Errored(fault);
                }
            }

            if attempts < self.policy.max_attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }
    }

    async fn observe(&self, event: &TaskStartedEvent) -> Result<Observation, ReadinessFault> {
        let task = self
            .orchestrator
            .describe_tasks(&event.cluster, std::slice::from_ref(&event.task_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ReadinessFault::TaskMissing(event.task_id.clone()))?;

        match task.status {
            TaskStatus::Running => self.resolve_endpoint(&task, event).await,
            TaskStatus::Pending => Ok(Observation::NotRunning(task.status)),
            TaskStatus::Stopped => Err(ReadinessFault::TaskStopped {
                task_id: task.id,
                status: task.status,
            }),
        }
    }

    async fn resolve_endpoint(
        &self,
        task: &Task,
        event: &TaskStartedEvent,
    ) -> Result<Observation, ReadinessFault> {
        let (address, port) = match &task.attachment {
            Some(NetworkAttachment::Interface {
                interface_id: Some(eni),
            }) => (self.hosts.interface_public_ip(eni).await?, event.port),
            Some(NetworkAttachment::HostBinding { host_id, host_port }) => {
                (self.hosts.host_public_ip(host_id).await?, *host_port)
            }
            Some(NetworkAttachment::Interface { interface_id: None }) | None => {
                return Err(ReadinessFault::MissingAttachment(task.id.clone()));
            }
        };

        Ok(match address {
            Some(address) => Observation::Reachable(Endpoint::new(address, port)),
            None => Observation::Unresolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::memory::{MemoryCluster, RecordingNotifier};
    use async_trait::async_trait;
    use ephem_model::{HostId, RunTaskRequest, TaskId, TaskTags};
    use std::sync::Mutex;
    use std::time::SystemTime;

    fn event(task_id: &TaskId) -> TaskStartedEvent {
        TaskStartedEvent {
            task_id: task_id.clone(),
            cluster: "demo".into(),
            stack: "jupyter".into(),
            response_url: "https://hooks/1".into(),
            user: "alice".into(),
            port: 8888,
            query_string: "/lab".into(),
        }
    }

    fn fast() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts: 10,
            deadline: None,
        }
    }

    /// Orchestrator and host fake driven by a per-attempt script.
    struct Scripted {
        statuses: Vec<TaskStatus>,
        attachment: Option<NetworkAttachment>,
        describes: Mutex<u32>,
        fail_describe: bool,
        /// Describes after which the interface gets a public address.
        address_after: u32,
    }

    impl Scripted {
        fn new(statuses: Vec<TaskStatus>) -> Self {
            Self {
                statuses,
                attachment: Some(NetworkAttachment::Interface {
                    interface_id: Some("eni-1".into()),
                }),
                describes: Mutex::new(0),
                fail_describe: false,
                address_after: 0,
            }
        }

        fn describes(&self) -> u32 {
            *self.describes.lock().unwrap()
        }
    }

    #[async_trait]
    impl Orchestrator for Scripted {
        async fn list_active_tasks(&self, _: &str) -> Result<Vec<TaskId>, PlatformError> {
            Ok(vec![])
        }

        async fn describe_tasks(&self, cluster: &str, ids: &[TaskId]) -> Result<Vec<Task>, PlatformError> {
            if self.fail_describe {
                return Err(PlatformError::api("DescribeTasks", "throttled"));
            }
            let mut n = self.describes.lock().unwrap();
            let idx = (*n as usize).min(self.statuses.len() - 1);
            *n += 1;
            Ok(vec![Task {
                id: ids[0].clone(),
                cluster: cluster.to_string(),
                created_at: SystemTime::now(),
                status: self.statuses[idx],
                tags: TaskTags::new(),
                attachment: self.attachment.clone(),
                host: None,
            }])
        }

        async fn list_tags(&self, _: &TaskId) -> Result<TaskTags, PlatformError> {
            Ok(TaskTags::new())
        }

        async fn run_task(&self, _: RunTaskRequest) -> Result<TaskId, PlatformError> {
            Err(PlatformError::api("RunTask", "unsupported"))
        }

        async fn stop_task(&self, _: &str, _: &TaskId, _: &str) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    #[async_trait]
    impl Hosts for Scripted {
        /// Address changes with every describe, so the test can tell which
        /// observation the endpoint came from.
        async fn interface_public_ip(&self, _: &str) -> Result<Option<String>, PlatformError> {
            let n = self.describes();
            Ok((n > self.address_after).then(|| format!("203.0.113.{n}")))
        }

        async fn host_public_ip(&self, _: &str) -> Result<Option<String>, PlatformError> {
            Ok(Some("203.0.113.200".into()))
        }

        async fn terminate_host(&self, _: &HostId) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    fn scripted_notifier(script: Arc<Scripted>, sink: Arc<RecordingNotifier>) -> ReadinessNotifier {
        ReadinessNotifier::new(script.clone(), script, sink).with_policy(fast())
    }

    #[tokio::test]
    async fn ready_uses_endpoint_from_the_running_attempt() {
        use TaskStatus::*;
        let script = Arc::new(Scripted::new(vec![Pending, Pending, Running, Running]));
        let sink = Arc::new(RecordingNotifier::new());
        let notifier = scripted_notifier(script.clone(), sink.clone());

        let id = TaskId::from("task/demo/1");
        let outcome = notifier.run(&event(&id), CancellationToken::new()).await;

        let Readiness::Ready(endpoint) = outcome else {
            panic!("expected ready, got {outcome:?}");
        };
        assert_eq!(script.describes(), 3);
        assert_eq!(endpoint, Endpoint::new("203.0.113.3", 8888));

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "https://hooks/1");
        assert_eq!(
            sent[0].1,
            CommandReply::in_channel("Your container is ready at `http://203.0.113.3:8888/lab`")
        );
    }

    #[tokio::test]
    async fn never_running_times_out_within_budget() {
        let script = Arc::new(Scripted::new(vec![TaskStatus::Pending]));
        let sink = Arc::new(RecordingNotifier::new());
        let notifier = scripted_notifier(script.clone(), sink.clone());

        let outcome = notifier
            .run(&event(&TaskId::from("t")), CancellationToken::new())
            .await;

        assert_eq!(outcome.state(), ReadinessState::TimedOut);
        assert_eq!(script.describes(), fast().max_attempts);
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].1.text,
            "Task is taking too long to start. Try again in a minute."
        );
    }

    #[tokio::test]
    async fn running_without_address_keeps_polling_until_resolved() {
        let mut script = Scripted::new(vec![TaskStatus::Running]);
        script.address_after = 2;
        let script = Arc::new(script);
        let sink = Arc::new(RecordingNotifier::new());
        let notifier = scripted_notifier(script.clone(), sink.clone());

        let outcome = notifier
            .run(&event(&TaskId::from("t")), CancellationToken::new())
            .await;

        let Readiness::Ready(endpoint) = outcome else {
            panic!("expected ready, got {outcome:?}");
        };
        assert_eq!(script.describes(), 3);
        assert_eq!(endpoint, Endpoint::new("203.0.113.3", 8888));
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn running_without_address_times_out_within_budget() {
        let mut script = Scripted::new(vec![TaskStatus::Running]);
        script.address_after = u32::MAX;
        let script = Arc::new(script);
        let sink = Arc::new(RecordingNotifier::new());
        let notifier = scripted_notifier(script.clone(), sink.clone());

        let outcome = notifier
            .run(&event(&TaskId::from("t")), CancellationToken::new())
            .await;

        assert_eq!(outcome.state(), ReadinessState::TimedOut);
        assert_eq!(script.describes(), fast().max_attempts);
        assert_eq!(
            sink.sent()[0].1.text,
            "Task is taking too long to start. Try again in a minute."
        );
    }

    #[tokio::test]
    async fn missing_attachment_is_an_error() {
        let mut script = Scripted::new(vec![TaskStatus::Running]);
        script.attachment = None;
        let script = Arc::new(script);
        let sink = Arc::new(RecordingNotifier::new());
        let notifier = scripted_notifier(script.clone(), sink.clone());

        let outcome = notifier
            .run(&event(&TaskId::from("t")), CancellationToken::new())
            .await;

        assert!(matches!(
            outcome,
            Readiness::Errored(ReadinessFault::MissingAttachment(_))
        ));
        assert_eq!(script.describes(), 1);
        assert_eq!(sink.sent().len(), 1);
        assert!(sink.sent()[0].1.text.starts_with("Error retrieving container IP: "));
    }

    #[tokio::test]
    async fn api_error_is_an_error() {
        let mut script = Scripted::new(vec![TaskStatus::Running]);
        script.fail_describe = true;
        let sink = Arc::new(RecordingNotifier::new());
        let notifier = scripted_notifier(Arc::new(script), sink.clone());

        let outcome = notifier
            .run(&event(&TaskId::from("t")), CancellationToken::new())
            .await;

        assert_eq!(outcome.state(), ReadinessState::Errored);
        assert_eq!(
            sink.sent()[0].1.text,
            "Error retrieving container IP: DescribeTasks failed: throttled"
        );
    }

    #[tokio::test]
    async fn stopped_task_is_an_error() {
        let script = Arc::new(Scripted::new(vec![TaskStatus::Pending, TaskStatus::Stopped]));
        let sink = Arc::new(RecordingNotifier::new());
        let notifier = scripted_notifier(script, sink.clone());

        let outcome = notifier
            .run(&event(&TaskId::from("t")), CancellationToken::new())
            .await;
        assert!(matches!(
            outcome,
            Readiness::Errored(ReadinessFault::TaskStopped { .. })
        ));
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn host_binding_uses_host_address_and_bound_port() {
        let mut script = Scripted::new(vec![TaskStatus::Running]);
        script.attachment = Some(NetworkAttachment::HostBinding {
            host_id: "i-1".into(),
            host_port: 32770,
        });
        let sink = Arc::new(RecordingNotifier::new());
        let notifier = scripted_notifier(Arc::new(script), sink.clone());

        let outcome = notifier
            .run(&event(&TaskId::from("t")), CancellationToken::new())
            .await;
        let Readiness::Ready(endpoint) = outcome else {
            panic!("expected ready");
        };
        assert_eq!(endpoint, Endpoint::new("203.0.113.200", 32770));
    }

    #[tokio::test]
    async fn delivery_failure_does_not_change_the_outcome() {
        let script = Arc::new(Scripted::new(vec![TaskStatus::Running]));
        let sink = Arc::new(RecordingNotifier::new());
        sink.fail();
        let notifier = scripted_notifier(script, sink.clone());

        let outcome = notifier
            .run(&event(&TaskId::from("t")), CancellationToken::new())
            .await;
        assert_eq!(outcome.state(), ReadinessState::Ready);
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn cancellation_still_sends_one_timeout_message() {
        let script = Arc::new(Scripted::new(vec![TaskStatus::Pending]));
        let sink = Arc::new(RecordingNotifier::new());
        let notifier = ReadinessNotifier::new(script.clone(), script, sink.clone()).with_policy(
            PollPolicy {
                interval: Duration::from_secs(3600),
                max_attempts: 100,
                deadline: None,
            },
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = notifier.run(&event(&TaskId::from("t")), cancel).await;

        assert_eq!(outcome.state(), ReadinessState::TimedOut);
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_ends_the_wait() {
        let script = Arc::new(Scripted::new(vec![TaskStatus::Pending]));
        let sink = Arc::new(RecordingNotifier::new());
        let notifier = ReadinessNotifier::new(script.clone(), script.clone(), sink.clone())
            .with_policy(PollPolicy {
                interval: Duration::from_secs(5),
                max_attempts: 100,
                deadline: Some(Duration::from_secs(12)),
            });

        let outcome = notifier
            .run(&event(&TaskId::from("t")), CancellationToken::new())
            .await;

        assert_eq!(outcome.state(), ReadinessState::TimedOut);
        assert!(script.describes() < 100);
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn memory_cluster_reaches_ready_after_provisioning() {
        let cluster = MemoryCluster::new().with_start_after(3);
        let id = cluster
            .run_task(RunTaskRequest {
                cluster: "demo".into(),
                task_definition: "td".into(),
                placement: ephem_model::Placement::CapacityProvider {
                    provider: "cp".into(),
                    weight: 1,
                },
                tags: TaskTags::new(),
            })
            .await
            .unwrap();

        let sink = Arc::new(RecordingNotifier::new());
        let cluster = Arc::new(cluster);
        let notifier =
            ReadinessNotifier::new(cluster.clone(), cluster.clone(), sink.clone()).with_policy(fast());

        let outcome = notifier.run(&event(&id), CancellationToken::new()).await;
        assert_eq!(outcome.state(), ReadinessState::Ready);
        assert_eq!(cluster.calls().describe, 3);
    }

    #[tokio::test]
    async fn memory_interface_without_address_times_out() {
        let cluster = MemoryCluster::new();
        let id = TaskId::from("task/demo/eni");
        cluster.insert_task(Task {
            id: id.clone(),
            cluster: "demo".into(),
            created_at: SystemTime::now(),
            status: TaskStatus::Running,
            tags: TaskTags::new(),
            attachment: Some(NetworkAttachment::Interface {
                interface_id: Some("eni-9".into()),
            }),
            host: None,
        });
        cluster.set_interface_ip("eni-9", None);

        let sink = Arc::new(RecordingNotifier::new());
        let cluster = Arc::new(cluster);
        let notifier =
            ReadinessNotifier::new(cluster.clone(), cluster.clone(), sink.clone()).with_policy(fast());

        let outcome = notifier.run(&event(&id), CancellationToken::new()).await;
        assert!(outcome.state().is_terminal());
        assert_eq!(outcome.state(), ReadinessState::TimedOut);
        assert_eq!(cluster.calls().describe, fast().max_attempts);
        assert_eq!(sink.sent().len(), 1);
    }
}
