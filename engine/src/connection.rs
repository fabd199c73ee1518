//! PostgreSQL-wire sessions over sqlx.
//!
//! Used by every adapter that speaks the Postgres protocol: Postgres itself
//! and Spanner through PGAdapter. Each [`PgSession`] owns one unpooled
//! connection for the duration of one operation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveTime;
use futures::stream::BoxStream;
use futures::StreamExt;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{Column, Connection, PgConnection, Postgres, Row as _, TypeInfo, ValueRef};

use common::errors::{AppError, AppResult};
use common::models::{DatabaseType, PluginConfig};

use crate::session::{CatalogSession, CellValue, ParamValue, Row, SessionProvider, Statement};

/// Builds connect options from configuration.
pub type ConnectOptionsBuilder = fn(&PluginConfig) -> AppResult<PgConnectOptions>;

/// Opens one [`PgSession`] per acquire.
pub struct PgSessionProvider {
    backend: DatabaseType,
    options: ConnectOptionsBuilder,
    connect_timeout: Duration,
}

impl PgSessionProvider {
    pub fn new(
        backend: DatabaseType,
        options: ConnectOptionsBuilder,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            options,
            connect_timeout,
        }
    }
}

#[async_trait]
impl SessionProvider for PgSessionProvider {
    async fn acquire(&self, config: &PluginConfig) -> AppResult<Box<dyn CatalogSession>> {
        let options = (self.options)(config)?;

        let conn = tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| {
                AppError::ConnectionFailure(format!(
                    "connect to {} timed out after {}s",
                    self.backend,
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::ConnectionFailure(e.to_string()))?;

        tracing::debug!(backend = %self.backend, "session acquired");
        Ok(Box::new(PgSession { conn }))
    }
}

/// A single sqlx Postgres connection.
pub struct PgSession {
    conn: PgConnection,
}

#[async_trait]
impl CatalogSession for PgSession {
    fn query<'a>(&'a mut self, statement: &'a Statement) -> BoxStream<'a, AppResult<Row>> {
        let mut query = sqlx::query::<Postgres>(&statement.sql);
        for (_, value) in &statement.params {
            query = match value {
                ParamValue::Text(v) => query.bind(v.as_str()),
                ParamValue::Int(v) => query.bind(*v),
            };
        }

        query
            .fetch(&mut self.conn)
            .map(|row| decode_row(&row?))
            .boxed()
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        self.conn.close().await.map_err(AppError::from)
    }
}

fn decode_row(row: &PgRow) -> AppResult<Row> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &PgRow, idx: usize) -> AppResult<CellValue> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(CellValue::Null);
    }

    let cell = match row.column(idx).type_info().name() {
        "BOOL" => CellValue::Bool(row.try_get(idx)?),
        "INT2" => CellValue::Int(row.try_get::<i16, _>(idx)?.into()),
        "INT4" => CellValue::Int(row.try_get::<i32, _>(idx)?.into()),
        "INT8" => CellValue::Int(row.try_get(idx)?),
        "FLOAT4" => CellValue::Float(row.try_get::<f32, _>(idx)?.into()),
        "FLOAT8" => CellValue::Float(row.try_get(idx)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN" => {
            CellValue::Text(row.try_get(idx)?)
        }
        "BYTEA" => CellValue::Bytes(row.try_get(idx)?),
        "UUID" => CellValue::Text(row.try_get::<uuid::Uuid, _>(idx)?.to_string()),
        "TIMESTAMPTZ" => CellValue::Timestamp(row.try_get(idx)?),
        "TIMESTAMP" => CellValue::LocalTimestamp(row.try_get(idx)?),
        "DATE" => CellValue::Date(row.try_get(idx)?),
        "TIME" => CellValue::Text(row.try_get::<NaiveTime, _>(idx)?.to_string()),
        "NUMERIC" => CellValue::Text(row.try_get::<Decimal, _>(idx)?.to_string()),
        "JSON" | "JSONB" => CellValue::Json(row.try_get(idx)?),
        "TEXT[]" | "VARCHAR[]" | "NAME[]" => array(row.try_get::<Vec<Option<String>>, _>(idx)?),
        "INT2[]" => array(row.try_get::<Vec<Option<i16>>, _>(idx)?),
        "INT4[]" => array(row.try_get::<Vec<Option<i32>>, _>(idx)?),
        "INT8[]" => array(row.try_get::<Vec<Option<i64>>, _>(idx)?),
        "FLOAT8[]" => array(row.try_get::<Vec<Option<f64>>, _>(idx)?),
        "BOOL[]" => array(row.try_get::<Vec<Option<bool>>, _>(idx)?),
        other => CellValue::Unknown(other.to_string()),
    };
    Ok(cell)
}

/// One-dimensional arrays render as JSON arrays, NULL elements as `null`.
fn array<T: Serialize>(items: Vec<Option<T>>) -> CellValue {
    CellValue::Json(serde_json::json!(items))
}
