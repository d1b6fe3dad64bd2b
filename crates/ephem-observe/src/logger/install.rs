use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LogFormat};

pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let registry = tracing_subscriber::registry().with(cfg.env_filter()?);

    match cfg.format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_ansi(cfg.ansi)
                    .with_timer(local_rfc3339()),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_timer(local_rfc3339()),
            )
            .try_init()?,
        #[cfg(all(target_os = "linux", feature = "journald"))]
        LogFormat::Journald => registry
            .with(
                tracing_journald::layer()
                    .map_err(LoggerError::Journald)?
                    .with_syslog_identifier("ephemd".to_string()),
            )
            .try_init()?,
    }
    Ok(())
}

/// RFC3339 timestamps at the local offset, UTC when it cannot be read.
fn local_rfc3339() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}
