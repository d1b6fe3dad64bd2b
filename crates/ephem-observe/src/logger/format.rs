use std::{fmt, str::FromStr};

use crate::logger::error::LoggerError;

/// Output of the `ephemd` log stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines, colored on a terminal.
    #[default]
    Text,
    /// One JSON object per event with the enclosing span's fields.
    Json,
    #[cfg(all(target_os = "linux", feature = "journald"))]
    Journald,
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            #[cfg(all(target_os = "linux", feature = "journald"))]
            "journald" => Ok(LogFormat::Journald),
            #[cfg(not(all(target_os = "linux", feature = "journald")))]
            "journald" => Err(LoggerError::JournaldUnavailable),
            _ => Err(LoggerError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            #[cfg(all(target_os = "linux", feature = "journald"))]
            LogFormat::Journald => "journald",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(" JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(matches!("xml".parse::<LogFormat>(), Err(LoggerError::InvalidFormat(_))));
    }

    #[cfg(not(all(target_os = "linux", feature = "journald")))]
    #[test]
    fn journald_needs_the_feature() {
        assert!(matches!(
            "journald".parse::<LogFormat>(),
            Err(LoggerError::JournaldUnavailable)
        ));
    }
}
