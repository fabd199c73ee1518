//! Shipped backend adapters.

pub mod postgres;
pub mod redis;
pub mod spanner;
pub mod sql;

pub use postgres::PostgresPlugin;
pub use redis::RedisPlugin;
pub use spanner::SpannerPlugin;

use common::errors::{AppError, AppResult};
use common::models::PluginConfig;

/// Advanced option naming the backend port.
pub const PORT_OPTION: &str = "Port";

/// Reads the advanced `Port` option, falling back to the backend's default.
pub(crate) fn port(config: &PluginConfig) -> AppResult<u16> {
    let default = config.db_type().default_port().to_string();
    let raw = config.advanced_or(PORT_OPTION, &default);
    raw.parse()
        .map_err(|_| AppError::InvalidArgument(format!("invalid port: {}", raw)))
}

/// Returns `value` trimmed, or `InvalidArgument` naming `field` when blank.
pub(crate) fn required<'a>(value: &'a str, field: &str) -> AppResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidArgument(format!("{} is required", field)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::errors::ErrorKind;
    use common::models::{Credentials, DatabaseType};

    #[test]
    fn test_port_defaults_per_backend() {
        let redis = PluginConfig::new(Credentials::new(DatabaseType::Redis));
        assert_eq!(port(&redis).unwrap(), 6379);

        let pg = PluginConfig::new(Credentials::new(DatabaseType::Postgres).with_advanced("Port", "6543"));
        assert_eq!(port(&pg).unwrap(), 6543);
    }

    #[test]
    fn test_port_must_be_numeric() {
        let config =
            PluginConfig::new(Credentials::new(DatabaseType::Spanner).with_advanced("Port", "http"));
        assert_eq!(port(&config).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_required_rejects_blank() {
        assert_eq!(required(" db ", "database").unwrap(), "db");
        assert!(required("  ", "database").is_err());
    }
}
