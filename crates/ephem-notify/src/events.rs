use async_trait::async_trait;
use ephem_core::{EmitError, EventSink};
use ephem_model::TaskStartedEvent;
use tracing::debug;

use crate::config::HttpConfig;

/// Forwards task-started events to an HTTP consumer, e.g. another `ephemd`
/// instance's `/api/v1/events/task-started` route. The consumer only
/// acknowledges the event; the readiness wait runs on its side.
#[derive(Clone)]
pub struct HttpEventSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEventSink {
    pub fn new(endpoint: impl Into<String>, config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: config.client()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn emit(&self, event: TaskStartedEvent) -> Result<(), EmitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&event)
            .send()
            .await
            .map_err(|e| EmitError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmitError::Delivery(format!(
                "event consumer answered {status}: {body}"
            )));
        }
        debug!(task_id = %event.task_id, endpoint = %self.endpoint, "event forwarded");
        Ok(())
    }
}
