//! Backend session seam.
//!
//! A [`SessionProvider`] turns a [`PluginConfig`] into one live
//! [`CatalogSession`]; the session executes [`Statement`]s and yields rows
//! lazily as a stream of [`CellValue`] vectors.

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::stream::BoxStream;
use futures::TryStreamExt;

use common::errors::{AppError, AppResult};
use common::models::PluginConfig;

/// Bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
}

#[cfg(test)]
impl ParamValue {
    pub(crate) fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Text(_) => None,
        }
    }

    pub(crate) fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            ParamValue::Int(_) => None,
        }
    }
}

/// Query text with ordered named parameters.
///
/// The n-th parameter binds placeholder `$n`; names are for logs and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<(String, ParamValue)>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, name: &str, value: ParamValue) -> Self {
        self.params.push((name.to_string(), value));
        self
    }

    #[cfg(test)]
    pub(crate) fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Native cell value as decoded from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    LocalTimestamp(NaiveDateTime),
    Date(NaiveDate),
    Json(serde_json::Value),
    /// A value whose native type has no string form here.
    Unknown(String),
}

impl CellValue {
    /// Renders the cell as a string.
    ///
    /// # Errors
    /// `QueryFailure` for unknown native types and non-UTF-8 byte strings.
    pub fn to_cell_string(&self) -> AppResult<String> {
        match self {
            CellValue::Null => Ok(String::new()),
            CellValue::Bool(v) => Ok(v.to_string()),
            CellValue::Int(v) => Ok(v.to_string()),
            CellValue::Float(v) => Ok(v.to_string()),
            CellValue::Text(v) => Ok(v.clone()),
            CellValue::Bytes(v) => String::from_utf8(v.clone()).map_err(|_| {
                AppError::QueryFailure("binary value is not valid UTF-8".into())
            }),
            CellValue::Timestamp(v) => Ok(v.to_rfc3339()),
            CellValue::LocalTimestamp(v) => Ok(v.to_string()),
            CellValue::Date(v) => Ok(v.to_string()),
            CellValue::Json(v) => Ok(v.to_string()),
            CellValue::Unknown(type_name) => Err(AppError::QueryFailure(format!(
                "cannot render value of type {} as text",
                type_name
            ))),
        }
    }
}

/// One result row, cells in projection order.
pub type Row = Vec<CellValue>;

/// Returns cell `idx` of `row` rendered as text.
pub fn text_at(row: &Row, idx: usize) -> AppResult<String> {
    row.get(idx)
        .ok_or_else(|| AppError::QueryFailure(format!("result row has no column {}", idx)))?
        .to_cell_string()
}

/// A live session to one backend/database pair.
#[async_trait]
pub trait CatalogSession: Send {
    /// Executes `statement` and returns a lazy row cursor.
    fn query<'a>(&'a mut self, statement: &'a Statement) -> BoxStream<'a, AppResult<Row>>;

    /// Closes the session.
    async fn close(self: Box<Self>) -> AppResult<()>;
}

/// Produces sessions from configuration.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn acquire(&self, config: &PluginConfig) -> AppResult<Box<dyn CatalogSession>>;
}

/// Drains a statement's cursor.
pub async fn collect_rows(
    session: &mut dyn CatalogSession,
    statement: &Statement,
) -> AppResult<Vec<Row>> {
    session.query(statement).try_collect().await
}

/// Closes `session`; a failing close is logged and otherwise ignored.
pub async fn release(session: Box<dyn CatalogSession>) {
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close backend session");
    }
}

/// Runs `fut` under the configuration's deadline, if any.
///
/// On expiry the future is dropped, which drops any cursor or session it
/// holds, and `Cancelled` is returned.
pub async fn bounded<T, F>(config: &PluginConfig, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match config.timeout() {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            AppError::Cancelled(format!("deadline of {}ms exceeded", limit.as_millis()))
        })?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::errors::ErrorKind;
    use common::models::{Credentials, DatabaseType};
    use std::time::Duration;

    #[test]
    fn test_cell_rendering() {
        assert_eq!(CellValue::Null.to_cell_string().unwrap(), "");
        assert_eq!(CellValue::Int(42).to_cell_string().unwrap(), "42");
        assert_eq!(CellValue::Bool(true).to_cell_string().unwrap(), "true");
        assert_eq!(
            CellValue::Json(serde_json::json!({"a": 1})).to_cell_string().unwrap(),
            "{\"a\":1}"
        );
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(CellValue::Date(date).to_cell_string().unwrap(), "2024-02-29");
    }

    #[test]
    fn test_uncoercible_cells_fail_as_query_failure() {
        let err = CellValue::Unknown("INTERVAL".into()).to_cell_string().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailure);
        let err = CellValue::Bytes(vec![0xff, 0xfe]).to_cell_string().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryFailure);
        assert_eq!(CellValue::Bytes(b"abc".to_vec()).to_cell_string().unwrap(), "abc");
    }

    #[test]
    fn test_statement_params_by_name() {
        let stmt = Statement::new("SELECT $1")
            .bind("schema", ParamValue::Text("public".into()))
            .bind("pageSize", ParamValue::Int(10));
        assert_eq!(stmt.param("schema").and_then(ParamValue::as_text), Some("public"));
        assert_eq!(stmt.param("pageSize").and_then(ParamValue::as_int), Some(10));
        assert!(stmt.param("where").is_none());
    }

    #[tokio::test]
    async fn test_bounded_cancels_on_deadline() {
        let config = PluginConfig::new(Credentials::new(DatabaseType::Spanner))
            .with_timeout(Duration::from_millis(10));
        let result: AppResult<()> = bounded(&config, futures::future::pending()).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_bounded_without_deadline_passes_through() {
        let config = PluginConfig::new(Credentials::new(DatabaseType::Spanner));
        let result = bounded(&config, async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
