use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use ephem_model::{CommandReply, TaskStartedEvent};

use crate::error::{EmitError, NotifyError};
use crate::ports::{EventSink, Notifier};

/// [`EventSink`] that keeps every event it is handed.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TaskStartedEvent>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent emit.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<TaskStartedEvent> {
        self.events.lock().expect("recording sink lock poisoned").clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: TaskStartedEvent) -> Result<(), EmitError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmitError::Delivery("injected failure".into()));
        }
        self.events
            .lock()
            .expect("recording sink lock poisoned")
            .push(event);
        Ok(())
    }
}

/// [`Notifier`] that keeps every delivered reply with its address.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, CommandReply)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record, then fail, every subsequent delivery.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, CommandReply)> {
        self.sent.lock().expect("recording notifier lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, response_url: &str, reply: &CommandReply) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("recording notifier lock poisoned")
            .push((response_url.to_string(), reply.clone()));
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected { status: 500 });
        }
        Ok(())
    }
}
