mod config;
mod error;
mod format;
mod install;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LogFormat;

/// Build the logger settings from the raw `level` and `format` strings and
/// install the global subscriber. Returns the settings in effect.
///
/// A bare level such as `debug` applies to the `ephem` crates only, with
/// dependencies held at `warn`. Anything else is used as a full
/// `EnvFilter` directive.
pub fn logger_init(level: Option<&str>, format: Option<&str>) -> Result<LoggerConfig, LoggerError> {
    let cfg = LoggerConfig::new(level, format)?;
    install::install(&cfg)?;
    Ok(cfg)
}
