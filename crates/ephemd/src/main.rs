use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use ephem_api::{ControlPlaneAdapter, HttpApi};
use ephem_core::{
    EventSink, LaunchCoordinator, ReadinessNotifier, SpawnDispatcher, TimeoutReaper,
    memory::{MemoryCluster, StaticOutputs},
};
use ephem_notify::{HttpConfig, HttpEventSink, WebhookNotifier};
use ephem_observe::logger_init;

mod config;
use config::DaemonConfig;

/// Describe calls after which a simulated task reports `RUNNING`.
const SIMULATED_START_AFTER: u32 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Config + logger
    let cfg = DaemonConfig::from_env()?;
    let log = logger_init(cfg.log_level.as_deref(), cfg.log_format.as_deref())?;
    info!(format = %log.format, filter = %log.directive, "logger initialized");

    // 2) Platform
    let cluster = MemoryCluster::new().with_start_after(SIMULATED_START_AFTER);
    let outputs = match &cfg.stacks {
        Some(path) => StaticOutputs::from_path(path)
            .with_context(|| format!("loading stack outputs from {}", path.display()))?,
        None => {
            warn!("EPHEMD_STACKS is not set, every launch will fail to resolve its stack");
            StaticOutputs::new()
        }
    };
    info!(stacks = outputs.len(), "stack outputs loaded");

    // 3) Components
    let http = HttpConfig::default();

    let readiness = ReadinessNotifier::new(
        Arc::new(cluster.clone()),
        Arc::new(cluster.clone()),
        Arc::new(WebhookNotifier::new(&http)?),
    )
    .with_policy(cfg.poll);

    // Readiness waits for events received here, whether emitted in-process
    // or posted to the task-started route by another instance.
    let dispatcher = Arc::new(SpawnDispatcher::new(Arc::new(readiness)));
    let events: Arc<dyn EventSink> = match &cfg.event_url {
        Some(url) => {
            info!(endpoint = %url, "forwarding task-started events");
            Arc::new(HttpEventSink::new(url.as_str(), &http)?)
        }
        None => dispatcher.clone(),
    };

    let launcher = LaunchCoordinator::new(Arc::new(cluster.clone()), Arc::new(outputs), events);
    let reaper = TimeoutReaper::new(
        Arc::new(cluster.clone()),
        Arc::new(cluster.clone()),
        Arc::new(cluster),
    );
    let adapter = ControlPlaneAdapter::new(Arc::new(launcher), dispatcher.clone(), Arc::new(reaper));

    // 4) HTTP
    let router = HttpApi::new(Arc::new(adapter)).router();
    let listener = TcpListener::bind(cfg.addr)
        .await
        .with_context(|| format!("binding {}", cfg.addr))?;
    info!(addr = %cfg.addr, "ephemd listening, press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_shutdown(tokio::signal::ctrl_c()))
        .await?;

    // 5) Pending readiness waits still owe their requester a message.
    dispatcher.shutdown().await;
    info!("stopped");

    Ok(())
}

/// Resolves once `signal` fires. If the signal handler could not be
/// installed the daemon keeps serving until it is killed.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutting down..."),
        Err(e) => {
            warn!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
