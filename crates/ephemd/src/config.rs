use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use ephem_core::PollPolicy;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Daemon settings, read from `EPHEMD_*` environment variables.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub addr: SocketAddr,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    /// JSON document with the outputs of every launchable stack.
    pub stacks: Option<PathBuf>,
    /// External consumer for task-started events. In-process dispatch when unset.
    pub event_url: Option<String>,
    pub poll: PollPolicy,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let addr = get("EPHEMD_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse()
            .context("EPHEMD_ADDR is not a socket address")?;

        let mut poll = PollPolicy::default();
        if let Some(ms) = get("EPHEMD_POLL_INTERVAL_MS") {
            poll.interval = Duration::from_millis(parse_number(&ms, "EPHEMD_POLL_INTERVAL_MS")?);
        }
        if let Some(n) = get("EPHEMD_POLL_ATTEMPTS") {
            let attempts = parse_number(&n, "EPHEMD_POLL_ATTEMPTS")?;
            if attempts == 0 {
                bail!("EPHEMD_POLL_ATTEMPTS must be at least 1");
            }
            poll.max_attempts = u32::try_from(attempts).context("EPHEMD_POLL_ATTEMPTS is too large")?;
        }
        if let Some(ms) = get("EPHEMD_NOTIFY_DEADLINE_MS") {
            poll.deadline = Some(Duration::from_millis(parse_number(&ms, "EPHEMD_NOTIFY_DEADLINE_MS")?));
        }

        Ok(Self {
            addr,
            log_level: get("EPHEMD_LOG_LEVEL"),
            log_format: get("EPHEMD_LOG_FORMAT"),
            stacks: get("EPHEMD_STACKS").map(PathBuf::from),
            event_url: get("EPHEMD_EVENT_URL"),
            poll,
        })
    }
}

fn parse_number(raw: &str, key: &str) -> Result<u64> {
    raw.parse()
        .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}"))
}
