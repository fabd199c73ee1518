//! Metadata enumeration over `information_schema`.

use common::errors::AppResult;
use common::models::{Record, StorageUnit, TABLE_TYPE_ATTRIBUTE};

use crate::session::{collect_rows, text_at, CatalogSession, ParamValue, Statement};

const SCHEMAS_QUERY: &str = "SELECT schema_name::text AS schema_name FROM information_schema.schemata";

const STORAGE_UNITS_QUERY: &str = "
SELECT
    t.table_name::text AS table_name,
    t.table_type::text AS table_type
FROM
    information_schema.tables AS t
WHERE
    t.table_schema = $1";

const DATABASES_QUERY: &str = "
SELECT d.datname::text AS name
FROM pg_database AS d
WHERE d.datistemplate = false
ORDER BY d.datname";

/// Lists every schema in catalog order.
pub async fn list_schemas(session: &mut dyn CatalogSession) -> AppResult<Vec<String>> {
    let rows = collect_rows(session, &Statement::new(SCHEMAS_QUERY)).await?;
    rows.iter().map(|row| text_at(row, 0)).collect()
}

/// Lists the tables of `schema` in catalog order, each with its declared kind.
pub async fn list_storage_units(
    session: &mut dyn CatalogSession,
    schema: &str,
) -> AppResult<Vec<StorageUnit>> {
    let statement =
        Statement::new(STORAGE_UNITS_QUERY).bind("schema", ParamValue::Text(schema.to_string()));
    let rows = collect_rows(session, &statement).await?;

    let units = rows
        .iter()
        .map(|row| {
            let name = text_at(row, 0)?;
            let table_type = text_at(row, 1)?;
            Ok(StorageUnit::new(
                name,
                vec![Record::new(TABLE_TYPE_ATTRIBUTE, table_type)],
            ))
        })
        .collect::<AppResult<Vec<_>>>()?;

    tracing::debug!(schema, count = units.len(), "storage units listed");
    Ok(units)
}

/// Lists non-template databases of a Postgres server.
pub async fn list_databases(session: &mut dyn CatalogSession) -> AppResult<Vec<String>> {
    let rows = collect_rows(session, &Statement::new(DATABASES_QUERY)).await?;
    rows.iter().map(|row| text_at(row, 0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{text_row, FakeCatalog, FakeProvider, FakeResponse};
    use crate::session::SessionProvider;
    use common::errors::{AppError, ErrorKind};
    use common::models::{Credentials, DatabaseType, PluginConfig};

    fn config() -> PluginConfig {
        PluginConfig::new(Credentials::new(DatabaseType::Spanner).with_database("db"))
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog::new("public")
            .schemas(&["public", "information_schema", "audit"])
            .table("orders", "BASE TABLE")
            .table("customers", "BASE TABLE")
            .table("order_totals", "VIEW")
    }

    #[tokio::test]
    async fn test_list_schemas_in_catalog_order() {
        let provider = FakeProvider::for_catalog(catalog());
        let mut session = provider.acquire(&config()).await.unwrap();
        let schemas = list_schemas(session.as_mut()).await.unwrap();
        assert_eq!(schemas, vec!["public", "information_schema", "audit"]);
    }

    #[tokio::test]
    async fn test_storage_units_carry_table_type() {
        let provider = FakeProvider::for_catalog(catalog());
        let mut session = provider.acquire(&config()).await.unwrap();
        let units = list_storage_units(session.as_mut(), "public").await.unwrap();

        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["orders", "customers", "order_totals"]);
        assert_eq!(units[2].attribute(TABLE_TYPE_ATTRIBUTE), Some("VIEW"));
        assert_eq!(units[0].attributes.len(), 1);
    }

    #[tokio::test]
    async fn test_schema_is_a_bound_parameter() {
        let provider = FakeProvider::for_catalog(catalog());
        let mut session = provider.acquire(&config()).await.unwrap();
        let units = list_storage_units(session.as_mut(), "x' OR '1'='1")
            .await
            .unwrap();
        assert!(units.is_empty());

        let log = provider.statements();
        assert!(!log[0].sql.contains("x' OR"));
        assert_eq!(
            log[0].param("schema").and_then(ParamValue::as_text),
            Some("x' OR '1'='1")
        );
    }

    #[tokio::test]
    async fn test_listing_is_idempotent() {
        let provider = FakeProvider::for_catalog(catalog());
        let mut session = provider.acquire(&config()).await.unwrap();
        let first = list_storage_units(session.as_mut(), "public").await.unwrap();
        let second = list_storage_units(session.as_mut(), "public").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cursor_error_keeps_its_kind() {
        let provider = FakeProvider::new(|_| {
            FakeResponse::RowsThenFail(
                vec![text_row(&["public"])],
                AppError::ConnectionFailure("connection reset".into()),
            )
        });
        let mut session = provider.acquire(&config()).await.unwrap();
        let err = list_schemas(session.as_mut()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionFailure);
    }
}
