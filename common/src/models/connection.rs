//! Connection configuration models.
//!
//! A [`PluginConfig`] is everything an adapter needs to reach one backend for
//! the duration of a single operation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Backend type enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Cloud Spanner through its PostgreSQL interface.
    Spanner,
    /// PostgreSQL database.
    Postgres,
    /// Redis key-value store.
    Redis,
}

impl DatabaseType {
    /// Returns the default port for this backend.
    pub fn default_port(&self) -> u16 {
        match self {
            DatabaseType::Spanner => 5432,
            DatabaseType::Postgres => 5432,
            DatabaseType::Redis => 6379,
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::Spanner => write!(f, "spanner"),
            DatabaseType::Postgres => write!(f, "postgres"),
            DatabaseType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spanner" => Ok(DatabaseType::Spanner),
            "postgres" | "postgresql" => Ok(DatabaseType::Postgres),
            "redis" => Ok(DatabaseType::Redis),
            other => Err(format!("unknown database type: {}", other)),
        }
    }
}

/// A key/value string pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Record {
    pub key: String,
    pub value: String,
}

impl Record {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Backend credentials.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    /// Backend type, selects the adapter.
    #[serde(rename = "type")]
    pub db_type: DatabaseType,
    /// Backend host.
    #[serde(default)]
    pub hostname: String,
    /// Backend username.
    #[serde(default)]
    pub username: String,
    /// Backend password (not serialized in responses).
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Database name.
    #[serde(default)]
    pub database: String,
    /// Backend-specific options, read with per-key defaults.
    #[serde(default)]
    pub advanced: Vec<Record>,
}

/// Configuration for one adapter operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PluginConfig {
    pub credentials: Credentials,
    /// Operation deadline in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl PluginConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            timeout_ms: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn db_type(&self) -> DatabaseType {
        self.credentials.db_type
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Returns the advanced option `key`, or `default` when it is missing or blank.
    pub fn advanced_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.credentials
            .advanced
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.value.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }
}

impl Credentials {
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            hostname: String::new(),
            username: String::new(),
            password: String::new(),
            database: String::new(),
            advanced: Vec::new(),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_advanced(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.advanced.push(Record::new(key, value));
        self
    }
}
