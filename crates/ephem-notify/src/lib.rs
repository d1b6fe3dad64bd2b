//! HTTP adapters for the outbound side of the control loop.
//!
//! - [`WebhookNotifier`] posts the `{response_type, text}` envelope to a
//!   requester's delivery address.
//! - [`HttpEventSink`] forwards `TaskStartedEvent`s to an external consumer,
//!   for deployments where the readiness notifier runs elsewhere.
//!
//! Neither retries: a failed call is reported once and dropped.

mod config;
pub use config::HttpConfig;

mod webhook;
pub use webhook::WebhookNotifier;

mod events;
pub use events::HttpEventSink;
