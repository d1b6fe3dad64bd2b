use async_trait::async_trait;
use ephem_core::{NotifyError, Notifier};
use ephem_model::{CommandReply, ResponseType};
use serde::Serialize;
use tracing::debug;

use crate::config::HttpConfig;

/// Body posted to a delivery address. Follow-ups are always broadcast.
#[derive(Debug, Serialize)]
struct WebhookBody<'a> {
    response_type: ResponseType,
    text: &'a str,
}

/// Posts replies to chat delivery addresses.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: config.client()?,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, response_url: &str, reply: &CommandReply) -> Result<(), NotifyError> {
        let body = WebhookBody {
            response_type: ResponseType::InChannel,
            text: &reply.text,
        };

        let response = self
            .client
            .post(response_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), "webhook response status");
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
    use serde_json::Value;

    use super::*;

    type Seen = Arc<Mutex<Vec<Value>>>;

    fn notifier() -> WebhookNotifier {
        WebhookNotifier::new(&HttpConfig::default()).unwrap()
    }

    async fn serve(status: StatusCode) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route(
                "/hook",
                post(move |State(seen): State<Seen>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body);
                    status
                }),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/hook"), seen)
    }

    #[tokio::test]
    async fn posts_in_channel_envelope() {
        let (url, seen) = serve(StatusCode::OK).await;

        notifier()
            .notify(&url, &CommandReply::ephemeral("Your container is ready"))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            serde_json::json!({"response_type": "in_channel", "text": "Your container is ready"})
        );
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (url, _) = serve(StatusCode::GONE).await;

        let err = notifier()
            .notify(&url, &CommandReply::in_channel("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { status: 410 }));
    }

    #[tokio::test]
    async fn invalid_address_is_a_delivery_error() {
        let err = notifier()
            .notify("", &CommandReply::in_channel("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Delivery(_)));
    }
}
