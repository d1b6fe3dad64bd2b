use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::logger::{error::LoggerError, format::LogFormat};

/// Targets a bare level applies to.
const EPHEM_TARGETS: &[&str] = &[
    "ephem_model",
    "ephem_core",
    "ephem_notify",
    "ephem_api",
    "ephem_observe",
    "ephemd",
];

/// Level kept for every other target when a bare level is given.
const DEPENDENCY_LEVEL: &str = "warn";

const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LogFormat,
    /// Validated `EnvFilter` directive.
    pub directive: String,
    pub ansi: bool,
}

impl LoggerConfig {
    pub fn new(level: Option<&str>, format: Option<&str>) -> Result<Self, LoggerError> {
        let level = level.map(str::trim).filter(|l| !l.is_empty()).unwrap_or(DEFAULT_LEVEL);
        let format = match format.map(str::trim).filter(|f| !f.is_empty()) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        let directive = scoped_directive(level);
        parse_filter(&directive)?;

        Ok(Self {
            format,
            directive,
            ansi: format == LogFormat::Text && std::io::stdout().is_terminal(),
        })
    }

    pub(crate) fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        parse_filter(&self.directive)
    }
}

fn scoped_directive(level: &str) -> String {
    if level.parse::<LevelFilter>().is_err() {
        return level.to_string();
    }
    std::iter::once(DEPENDENCY_LEVEL.to_string())
        .chain(EPHEM_TARGETS.iter().map(|target| format!("{target}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directive).map_err(|source| LoggerError::InvalidLogLevel {
        directive: directive.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_info_for_ephem_crates_only() {
        let cfg = LoggerConfig::new(None, None).unwrap();
        assert_eq!(cfg.format, LogFormat::Text);
        assert!(cfg.directive.starts_with("warn,"));
        assert!(cfg.directive.contains("ephem_core=info"));
        assert!(cfg.directive.contains("ephemd=info"));
    }

    #[test]
    fn bare_level_is_scoped() {
        let cfg = LoggerConfig::new(Some(" DEBUG "), Some("json")).unwrap();
        assert_eq!(cfg.format, LogFormat::Json);
        assert!(cfg.directive.contains("ephem_api=DEBUG"));
        assert!(!cfg.ansi);
    }

    #[test]
    fn full_directive_is_kept_verbatim() {
        let cfg = LoggerConfig::new(Some("ephem_core=trace,axum=debug"), None).unwrap();
        assert_eq!(cfg.directive, "ephem_core=trace,axum=debug");
    }

    #[test]
    fn bad_directive_is_rejected() {
        let err = LoggerConfig::new(Some("ephem_core=loud"), None).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLogLevel { .. }));
    }

    #[test]
    fn bad_format_is_rejected() {
        let err = LoggerConfig::new(None, Some("xml")).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFormat(_)));
    }
}
