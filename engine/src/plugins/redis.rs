//! Redis adapter.
//!
//! Keys are the storage units of the logical database named in the
//! credentials; the schema argument is ignored. Rows are shaped by key type.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

use common::errors::{AppError, AppResult, ErrorKind};
use common::models::{DatabaseType, Operation, PluginConfig, Record, RowSet, StorageUnit};

use super::{port, required};
use crate::plugin::PluginFunctions;
use crate::session::bounded;

/// Attribute key carrying a key's Redis type.
pub const TYPE_ATTRIBUTE: &str = "Type";

const SCAN_BATCH: usize = 500;

const CAPABILITIES: &[Operation] = &[
    Operation::IsAvailable,
    Operation::GetStorageUnits,
    Operation::GetRows,
];

/// Connection parameters for the configured host and logical database.
///
/// Credentials are passed as fields, not embedded in a URL.
pub fn connection_info(config: &PluginConfig) -> AppResult<ConnectionInfo> {
    let creds = &config.credentials;
    let host = required(&creds.hostname, "hostname")?;
    let port = port(config)?;
    let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_string());

    Ok(ConnectionInfo {
        addr: ConnectionAddr::Tcp(host.to_string(), port),
        redis: RedisConnectionInfo {
            db: database_index(config)?,
            username: non_empty(creds.username.as_str()),
            password: non_empty(creds.password.as_str()),
            ..Default::default()
        },
    })
}

fn database_index(config: &PluginConfig) -> AppResult<i64> {
    let raw = config.credentials.database.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse()
        .map_err(|_| AppError::InvalidArgument(format!("invalid database index: {}", raw)))
}

/// Value of one key, or of one page of it for server-paged types.
#[derive(Debug, Clone, PartialEq)]
enum KeyContents {
    Text(String),
    Hash(Vec<(String, String)>),
    /// List items starting at index `first`.
    List { first: u64, items: Vec<String> },
    Set(Vec<String>),
    SortedSet(Vec<(String, String)>),
}

impl KeyContents {
    fn into_rows(self) -> Vec<Vec<String>> {
        match self {
            KeyContents::Text(value) => vec![vec![value]],
            KeyContents::Hash(pairs) | KeyContents::SortedSet(pairs) => {
                pairs.into_iter().map(|(a, b)| vec![a, b]).collect()
            }
            KeyContents::List { first, items } => items
                .into_iter()
                .zip(first..)
                .map(|(item, idx)| vec![idx.to_string(), item])
                .collect(),
            KeyContents::Set(members) => members.into_iter().map(|m| vec![m]).collect(),
        }
    }
}

/// Slices one page out of `rows`.
fn paginate(rows: Vec<Vec<String>>, page_size: u32, page_offset: u64) -> RowSet {
    let skip = usize::try_from(page_offset).unwrap_or(usize::MAX);
    RowSet {
        rows: rows.into_iter().skip(skip).take(page_size as usize).collect(),
    }
}

/// Inclusive `LRANGE`/`ZRANGE` index window of a page; `None` when the page
/// is empty by construction.
fn page_range(page_size: u32, page_offset: u64) -> Option<(i64, i64)> {
    if page_size == 0 {
        return None;
    }
    let start = i64::try_from(page_offset).ok()?;
    Some((start, start.saturating_add(i64::from(page_size) - 1)))
}

pub struct RedisPlugin {
    connect_timeout: Duration,
}

impl RedisPlugin {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    async fn connect(&self, config: &PluginConfig) -> AppResult<MultiplexedConnection> {
        let client = redis::Client::open(connection_info(config)?)
            .map_err(|e| AppError::InvalidArgument(e.to_string()))?;

        let conn = tokio::time::timeout(self.connect_timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| {
                AppError::ConnectionFailure(format!(
                    "connect to redis timed out after {}s",
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::ConnectionFailure(e.to_string()))?;

        tracing::debug!(backend = "redis", "session acquired");
        Ok(conn)
    }
}

async fn scan_keys(conn: &mut MultiplexedConnection) -> AppResult<Vec<String>> {
    let mut keys = Vec::new();
    let mut cursor: u64 = 0;
    loop {
        let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("COUNT")
            .arg(SCAN_BATCH)
            .query_async(conn)
            .await?;
        keys.extend(batch);
        if next == 0 {
            break;
        }
        cursor = next;
    }
    // SCAN may return a key more than once.
    keys.sort();
    keys.dedup();
    Ok(keys)
}

async fn key_type(conn: &mut MultiplexedConnection, key: &str) -> AppResult<String> {
    Ok(redis::cmd("TYPE").arg(key).query_async(conn).await?)
}

/// Reads one page of `key`. Lists and sorted sets are paged by the server;
/// other types are read whole and sliced.
async fn read_page(
    conn: &mut MultiplexedConnection,
    key: &str,
    page_size: u32,
    page_offset: u64,
) -> AppResult<RowSet> {
    let kind = key_type(conn, key).await?;
    let window = page_range(page_size, page_offset);

    let contents = match (kind.as_str(), window) {
        ("list" | "zset", None) => return Ok(RowSet::default()),
        ("list", Some((start, stop))) => {
            let items = redis::cmd("LRANGE")
                .arg(key)
                .arg(start)
                .arg(stop)
                .query_async(conn)
                .await?;
            let page = KeyContents::List {
                first: page_offset,
                items,
            };
            return Ok(RowSet {
                rows: page.into_rows(),
            });
        }
        ("zset", Some((start, stop))) => {
            let page = KeyContents::SortedSet(
                redis::cmd("ZRANGE")
                    .arg(key)
                    .arg(start)
                    .arg(stop)
                    .arg("WITHSCORES")
                    .query_async(conn)
                    .await?,
            );
            return Ok(RowSet {
                rows: page.into_rows(),
            });
        }
        ("string", _) => KeyContents::Text(redis::cmd("GET").arg(key).query_async(conn).await?),
        ("hash", _) => KeyContents::Hash(redis::cmd("HGETALL").arg(key).query_async(conn).await?),
        ("set", _) => {
            let mut members: Vec<String> = redis::cmd("SMEMBERS").arg(key).query_async(conn).await?;
            members.sort();
            KeyContents::Set(members)
        }
        ("none", _) => return Err(AppError::QueryFailure(format!("key does not exist: {}", key))),
        (other, _) => {
            return Err(AppError::QueryFailure(format!(
                "cannot read key {} of type {}",
                key, other
            )))
        }
    };
    Ok(paginate(contents.into_rows(), page_size, page_offset))
}

#[async_trait]
impl PluginFunctions for RedisPlugin {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Redis
    }

    fn capabilities(&self) -> &'static [Operation] {
        CAPABILITIES
    }

    async fn is_available(&self, config: &PluginConfig) -> AppResult<bool> {
        let probe = bounded(config, async {
            let mut conn = self.connect(config).await?;
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, AppError>(pong)
        })
        .await;

        match probe {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::ConnectionFailure => {
                tracing::debug!(backend = "redis", error = %e, "backend unavailable");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_storage_units(
        &self,
        config: &PluginConfig,
        _schema: &str,
    ) -> AppResult<Vec<StorageUnit>> {
        bounded(config, async {
            let mut conn = self.connect(config).await?;
            let keys = scan_keys(&mut conn).await?;

            let mut units = Vec::with_capacity(keys.len());
            for key in keys {
                let kind = key_type(&mut conn, &key).await?;
                units.push(StorageUnit::new(key, vec![Record::new(TYPE_ATTRIBUTE, kind)]));
            }

            tracing::debug!(backend = "redis", count = units.len(), "storage units listed");
            Ok::<_, AppError>(units)
        })
        .await
    }

    async fn get_rows(
        &self,
        config: &PluginConfig,
        _schema: &str,
        storage_unit: &str,
        filter: &str,
        page_size: u32,
        page_offset: u64,
    ) -> AppResult<RowSet> {
        if !filter.trim().is_empty() {
            return Err(AppError::InvalidArgument("redis keys cannot be filtered".into()));
        }
        let key = required(storage_unit, "storage unit")?;

        bounded(config, async {
            let mut conn = self.connect(config).await?;
            let page = read_page(&mut conn, key, page_size, page_offset).await?;
            Ok::<_, AppError>(page)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::Credentials;

    fn config() -> PluginConfig {
        PluginConfig::new(Credentials::new(DatabaseType::Redis).with_hostname("cache.internal"))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_connection_defaults() {
        let info = connection_info(&config()).unwrap();
        assert!(matches!(&info.addr, ConnectionAddr::Tcp(host, 6379) if host == "cache.internal"));
        assert_eq!(info.redis.db, 0);
        assert_eq!(info.redis.username, None);
        assert_eq!(info.redis.password, None);
    }

    #[test]
    fn test_connection_with_auth_and_database() {
        let mut creds = Credentials::new(DatabaseType::Redis)
            .with_hostname("cache.internal")
            .with_database("3")
            .with_advanced("Port", "6380");
        creds.password = "hunter2".into();
        let info = connection_info(&PluginConfig::new(creds.clone())).unwrap();
        assert!(matches!(&info.addr, ConnectionAddr::Tcp(host, 6380) if host == "cache.internal"));
        assert_eq!(info.redis.db, 3);
        assert_eq!(info.redis.username, None);
        assert_eq!(info.redis.password.as_deref(), Some("hunter2"));

        creds.username = "app".into();
        let info = connection_info(&PluginConfig::new(creds)).unwrap();
        assert_eq!(info.redis.username.as_deref(), Some("app"));
    }

    #[test]
    fn test_credentials_with_reserved_characters() {
        let mut creds = Credentials::new(DatabaseType::Redis).with_hostname("cache.internal");
        creds.username = "ops:team".into();
        creds.password = "p@ss/w#rd%3A".into();
        let info = connection_info(&PluginConfig::new(creds)).unwrap();
        assert_eq!(info.redis.username.as_deref(), Some("ops:team"));
        assert_eq!(info.redis.password.as_deref(), Some("p@ss/w#rd%3A"));
        assert_eq!(info.redis.db, 0);
        assert!(matches!(&info.addr, ConnectionAddr::Tcp(host, 6379) if host == "cache.internal"));
        assert!(redis::Client::open(info).is_ok());
    }

    #[test]
    fn test_connection_rejects_bad_input() {
        let creds = Credentials::new(DatabaseType::Redis).with_database("0");
        assert_eq!(
            connection_info(&PluginConfig::new(creds)).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );

        let creds = Credentials::new(DatabaseType::Redis)
            .with_hostname("cache.internal")
            .with_database("sessions");
        assert_eq!(
            connection_info(&PluginConfig::new(creds)).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_rows_are_shaped_by_key_type() {
        assert_eq!(KeyContents::Text("v".into()).into_rows(), vec![strings(&["v"])]);
        assert_eq!(
            KeyContents::Hash(vec![("name".into(), "ada".into())]).into_rows(),
            vec![strings(&["name", "ada"])]
        );
        assert_eq!(
            KeyContents::List {
                first: 0,
                items: strings(&["a", "b"])
            }
            .into_rows(),
            vec![strings(&["0", "a"]), strings(&["1", "b"])]
        );
        // A server-side page keeps absolute indexes.
        assert_eq!(
            KeyContents::List {
                first: 20,
                items: strings(&["u", "v"])
            }
            .into_rows(),
            vec![strings(&["20", "u"]), strings(&["21", "v"])]
        );
        assert_eq!(
            KeyContents::Set(strings(&["x"])).into_rows(),
            vec![strings(&["x"])]
        );
        assert_eq!(
            KeyContents::SortedSet(vec![("m".into(), "1.5".into())]).into_rows(),
            vec![strings(&["m", "1.5"])]
        );
    }

    #[test]
    fn test_paginate_slices_pages() {
        let rows: Vec<Vec<String>> = (0..7).map(|i| vec![i.to_string()]).collect();
        let page = paginate(rows.clone(), 3, 3);
        assert_eq!(page.rows, vec![strings(&["3"]), strings(&["4"]), strings(&["5"])]);
        assert_eq!(paginate(rows.clone(), 3, 6).len(), 1);
        assert!(paginate(rows, 3, u64::MAX).is_empty());
    }

    #[test]
    fn test_page_range_for_server_paging() {
        assert_eq!(page_range(10, 0), Some((0, 9)));
        assert_eq!(page_range(1, 5), Some((5, 5)));
        assert_eq!(page_range(25, 50), Some((50, 74)));
        // A zero-sized page must not become LRANGE 0 -1.
        assert_eq!(page_range(0, 0), None);
        assert_eq!(page_range(10, u64::MAX), None);
        assert_eq!(page_range(u32::MAX, i64::MAX as u64), Some((i64::MAX, i64::MAX)));
    }

    #[tokio::test]
    async fn test_filter_is_rejected_without_connecting() {
        let plugin = RedisPlugin::new(Duration::from_millis(50));
        let mut config = config();
        config.credentials.hostname = "unreachable.invalid".into();
        let err = plugin
            .get_rows(&config, "0", "session:1", "ttl > 0", 10, 0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_unsupported_operations() {
        let plugin = RedisPlugin::new(Duration::from_millis(50));
        let err = plugin.get_graph(&config(), "0").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(!plugin.supports(Operation::GetSchema));
        assert!(plugin.supports(Operation::GetRows));
    }
}
