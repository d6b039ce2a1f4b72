//! Server configuration read from the environment.
//!
//! # Environment Variables
//!
//! - `HOST`: bind address (default: `0.0.0.0`)
//! - `PORT`: bind port (default: `5000`)
//! - `CORS_ALLOWED_ORIGINS`: comma-separated origins
//!   (default: `http://localhost:5173,http://localhost:3000`)
//! - `SEED_SAMPLE_DATA`: `true` | `1` | `yes` to seed an empty store (default: off)
//! - `LOG_FORMAT`: `text` (default) | `json`
//! - `WORKER_THREADS`: tokio worker threads (default: logical CPU count)

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 5000;

/// Origins admitted by CORS when none are configured.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

/// Errors in server configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServerConfigError {
    #[error("Invalid PORT: '{0}'. Expected an integer between 0 and 65535")]
    InvalidPort(String),

    #[error("Invalid LOG_FORMAT: '{0}'. Expected 'text' or 'json'")]
    InvalidLogFormat(String),
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ServerConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "text" | "pretty" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ServerConfigError::InvalidLogFormat(value.to_string())),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub seed_sample_data: bool,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_allowed_origins: DEFAULT_CORS_ORIGINS.map(str::to_string).to_vec(),
            seed_sample_data: false,
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ServerConfigError` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ServerConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration from an arbitrary variable source.
    ///
    /// Empty and whitespace-only values count as unset.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let port = match read("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ServerConfigError::InvalidPort(value))?,
            None => defaults.port,
        };

        let cors_allowed_origins = read("CORS_ALLOWED_ORIGINS")
            .map(|value| parse_origins(&value))
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.cors_allowed_origins);

        let log_format = match read("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => defaults.log_format,
        };

        Ok(Self {
            host: read("HOST").unwrap_or(defaults.host),
            port,
            cors_allowed_origins,
            seed_sample_data: read("SEED_SAMPLE_DATA").is_some_and(|value| is_enabled(&value)),
            log_format,
        })
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns true for the flag spellings `true`, `1` and `yes`.
#[must_use]
pub fn is_enabled(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

// =============================================================================
// Worker Threads
// =============================================================================

/// Outcome of reading `WORKER_THREADS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerThreads {
    /// Thread count to configure, or `None` for the runtime default.
    pub threads: Option<usize>,
    /// Message to print when the value was unusable or capped.
    pub warning: Option<String>,
}

/// Parses a `WORKER_THREADS` value, capping it at `max_threads`.
///
/// This runs before the log subscriber exists, so problems come back as a
/// warning for the caller to print.
#[must_use]
pub fn parse_worker_threads(value: Option<&str>, max_threads: usize) -> WorkerThreads {
    let Some(trimmed) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return WorkerThreads {
            threads: None,
            warning: None,
        };
    };

    match trimmed.parse::<usize>() {
        Ok(0) => WorkerThreads {
            threads: None,
            warning: Some("WORKER_THREADS=0 is invalid (must be > 0), using default".to_string()),
        },
        Ok(count) if count > max_threads => WorkerThreads {
            threads: Some(max_threads),
            warning: Some(format!(
                "WORKER_THREADS={count} exceeds recommended limit ({max_threads}), capping to {max_threads}"
            )),
        },
        Ok(count) => WorkerThreads {
            threads: Some(count),
            warning: None,
        },
        Err(error) => WorkerThreads {
            threads: None,
            warning: Some(format!(
                "WORKER_THREADS='{trimmed}' is not a valid number ({error}), using default"
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ServerConfigError> {
        let variables: HashMap<&str, &str> = pairs.iter().copied().collect();
        ServerConfig::from_lookup(|key| variables.get(key).map(|value| (*value).to_string()))
    }

    #[rstest]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:5173", "http://localhost:3000"]
        );
        assert!(!config.seed_sample_data);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[rstest]
    fn test_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("CORS_ALLOWED_ORIGINS", " https://a.example , ,https://b.example"),
            ("SEED_SAMPLE_DATA", "Yes"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.seed_sample_data);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[rstest]
    #[case("70000")]
    #[case("http")]
    fn test_invalid_port(#[case] port: &str) {
        assert_eq!(
            config_from(&[("PORT", port)]),
            Err(ServerConfigError::InvalidPort(port.to_string()))
        );
    }

    #[rstest]
    fn test_invalid_log_format() {
        assert!(matches!(
            config_from(&[("LOG_FORMAT", "xml")]),
            Err(ServerConfigError::InvalidLogFormat(_))
        ));
    }

    #[rstest]
    #[case("true", true)]
    #[case("1", true)]
    #[case("YES", true)]
    #[case("false", false)]
    #[case("on", false)]
    fn test_is_enabled(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_enabled(value), expected);
    }

    #[rstest]
    #[case(None, None, false)]
    #[case(Some(" "), None, false)]
    #[case(Some("4"), Some(4), false)]
    #[case(Some("0"), None, true)]
    #[case(Some("many"), None, true)]
    #[case(Some("100"), Some(16), true)]
    fn test_parse_worker_threads(
        #[case] value: Option<&str>,
        #[case] threads: Option<usize>,
        #[case] warns: bool,
    ) {
        let result = parse_worker_threads(value, 16);
        assert_eq!(result.threads, threads);
        assert_eq!(result.warning.is_some(), warns);
    }
}
