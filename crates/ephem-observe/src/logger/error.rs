use thiserror::Error;
use tracing_subscriber::{filter::ParseError, util::TryInitError};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?}, expected text or json")]
    InvalidFormat(String),

    #[error("journald output is not available in this build")]
    JournaldUnavailable,

    #[error("invalid log level {directive:?}")]
    InvalidLogLevel {
        directive: String,
        #[source]
        source: ParseError,
    },

    #[error("a global logger is already installed")]
    AlreadyInitialized(#[from] TryInitError),

    #[error("journald socket unavailable")]
    Journald(#[source] std::io::Error),
}
