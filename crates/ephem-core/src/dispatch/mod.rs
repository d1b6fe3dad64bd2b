//! In-process event hand-off.
//!
//! [`SpawnDispatcher`] is the [`EventSink`] used when the readiness notifier
//! runs in the same process as the launch coordinator: every event gets its
//! own runtime task, so the launch request returns immediately.

use std::sync::Arc;

use async_trait::async_trait;
use ephem_model::TaskStartedEvent;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info};

use crate::error::EmitError;
use crate::ports::EventSink;
use crate::readiness::ReadinessNotifier;

pub struct SpawnDispatcher {
    notifier: Arc<ReadinessNotifier>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl SpawnDispatcher {
    pub fn new(notifier: Arc<ReadinessNotifier>) -> Self {
        Self {
            notifier,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Number of readiness waits still in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting events and wait for in-flight waits to finish on
    /// their own.
    pub async fn drain(&self) {
        self.tracker.close();
        info!(in_flight = self.tracker.len(), "waiting for readiness waits to finish");
        self.tracker.wait().await;
    }

    /// Like [`SpawnDispatcher::drain`], but cancels in-flight waits first.
    /// Each of them still sends its terminal message.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.drain().await;
    }
}

#[async_trait]
impl EventSink for SpawnDispatcher {
    async fn emit(&self, event: TaskStartedEvent) -> Result<(), EmitError> {
        if self.tracker.is_closed() {
            return Err(EmitError::Closed);
        }

        let notifier = Arc::clone(&self.notifier);
        let cancel = self.shutdown.child_token();
        debug!(task_id = %event.task_id, "dispatching readiness wait");
        self.tracker.spawn(async move {
            notifier.run(&event, cancel).await;
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::memory::{MemoryCluster, RecordingNotifier};
    use crate::ports::Orchestrator;
    use crate::readiness::PollPolicy;
    use ephem_model::{Placement, RunTaskRequest, TaskTags};

    fn setup(start_after: u32, interval: Duration) -> (MemoryCluster, Arc<RecordingNotifier>, SpawnDispatcher) {
        let cluster = MemoryCluster::new().with_start_after(start_after);
        let sink = Arc::new(RecordingNotifier::new());
        let shared = Arc::new(cluster.clone());
        let notifier = ReadinessNotifier::new(shared.clone(), shared, sink.clone()).with_policy(PollPolicy {
            interval,
            max_attempts: 100,
            deadline: None,
        });
        (cluster, sink, SpawnDispatcher::new(Arc::new(notifier)))
    }

    async fn launch(cluster: &MemoryCluster) -> TaskStartedEvent {
        let task_id = cluster
            .run_task(RunTaskRequest {
                cluster: "demo".into(),
                task_definition: "td".into(),
                placement: Placement::Direct {
                    subnets: vec!["s".into()],
                    security_groups: vec!["g".into()],
                    assign_public_ip: true,
                },
                tags: TaskTags::new(),
            })
            .await
            .unwrap();
        TaskStartedEvent {
            task_id,
            cluster: "demo".into(),
            stack: "jupyter".into(),
            response_url: "https://hooks/1".into(),
            user: "alice".into(),
            port: 8888,
            query_string: String::new(),
        }
    }

    #[tokio::test]
    async fn emitted_event_is_followed_by_one_notification() {
        let (cluster, sink, dispatcher) = setup(2, Duration::from_millis(1));
        dispatcher.emit(launch(&cluster).await).await.unwrap();

        dispatcher.drain().await;
        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.text.starts_with("Your container is ready at `http://198.51.100."));
    }

    #[tokio::test]
    async fn shutdown_cancels_waits_and_rejects_new_events() {
        let (cluster, sink, dispatcher) = setup(1_000, Duration::from_secs(3600));
        dispatcher.emit(launch(&cluster).await).await.unwrap();
        assert_eq!(dispatcher.in_flight(), 1);

        dispatcher.shutdown().await;
        assert_eq!(sink.sent().len(), 1);
        assert_eq!(
            sink.sent()[0].1.text,
            "Task is taking too long to start. Try again in a minute."
        );

        let err = dispatcher.emit(launch(&cluster).await).await.unwrap_err();
        assert!(matches!(err, EmitError::Closed));
    }
}
