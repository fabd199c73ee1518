//! Service configuration.
//!
//! Loaded from environment variables with defaults; an optional `.env` file
//! in the working directory is applied first by [`load_dotenv`].

use std::str::FromStr;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Application configuration shared by the services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name used in logs and responses.
    pub service_name: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Backend connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Default operation deadline in seconds, applied when a request carries none.
    pub query_timeout_secs: u64,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "adapter-service".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            connect_timeout_secs: 10,
            query_timeout_secs: 30,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load_with_service(service_name: &str) -> Self {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            service_name: service_name.to_string(),
            host: lookup("SERVER_HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "SERVER_PORT").unwrap_or(defaults.port),
            connect_timeout_secs: parsed(&lookup, "CONNECT_TIMEOUT_SECS")
                .unwrap_or(defaults.connect_timeout_secs),
            query_timeout_secs: parsed(&lookup, "QUERY_TIMEOUT_SECS")
                .unwrap_or(defaults.query_timeout_secs),
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
        }
    }

    /// Default operation deadline.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Bind address in `host:port` form.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses the value under `key`; missing or malformed values read as `None`.
fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

/// Load .env file from the working directory (best-effort, no error if missing).
pub fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    let Ok(content) = std::fs::read_to_string(env_path) else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set by the environment
        if std::env::var(key).is_err() {
            std::env::set_var(key, value);
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = AppConfig::from_lookup("adapter-service", |_| None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.query_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let env: HashMap<&str, &str> = [
            ("SERVER_PORT", "9000"),
            ("QUERY_TIMEOUT_SECS", "not-a-number"),
            ("LOG_FORMAT", "JSON"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::from_lookup("svc", |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.port, 9000);
        assert_eq!(config.query_timeout_secs, 30);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_timeouts_parse_independently_of_port() {
        let env: HashMap<&str, &str> = [
            ("SERVER_PORT", "9100"),
            ("CONNECT_TIMEOUT_SECS", "3"),
            ("QUERY_TIMEOUT_SECS", "120000"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::from_lookup("svc", |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.port, 9100);
        assert_eq!(config.connect_timeout_secs, 3);
        // Wider than u16.
        assert_eq!(config.query_timeout_secs, 120_000);
    }

    #[test]
    fn test_parse_dotenv_skips_comments() {
        let parsed = parse_dotenv("# comment\nSERVER_PORT = 8085\n\nbroken line\n");
        assert_eq!(parsed, vec![("SERVER_PORT", "8085")]);
    }
}
