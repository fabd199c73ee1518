//! Paginated row reads.

use futures::TryStreamExt;

use common::errors::{AppError, AppResult};
use common::models::RowSet;
use common::utils::SqlValidator;

use crate::session::{CatalogSession, CellValue, ParamValue, Statement};

/// Builds the projection query for one page of `schema.unit`.
///
/// The unit is quoted as an identifier and a non-blank filter must pass
/// [`SqlValidator::validate_predicate`]; only the page bounds are bound
/// parameters.
pub fn rows_statement(
    schema: &str,
    unit: &str,
    filter: &str,
    page_size: u32,
    page_offset: u64,
) -> AppResult<Statement> {
    let target = SqlValidator::qualified_name(schema, unit)?;
    let filter = filter.trim();

    let sql = if filter.is_empty() {
        format!("SELECT * FROM {} LIMIT $1 OFFSET $2", target)
    } else {
        SqlValidator::validate_predicate(filter)?;
        format!("SELECT * FROM {} WHERE ({}) LIMIT $1 OFFSET $2", target, filter)
    };

    let offset = i64::try_from(page_offset)
        .map_err(|_| AppError::InvalidArgument(format!("page offset out of range: {}", page_offset)))?;

    Ok(Statement::new(sql)
        .bind("pageSize", ParamValue::Int(page_size.into()))
        .bind("pageOffset", ParamValue::Int(offset)))
}

/// Reads one page of rows, rendering every cell as a string.
///
/// Rows are pulled from the cursor one at a time; the first cell that cannot
/// be rendered or the first cursor error aborts the read.
pub async fn get_rows(
    session: &mut dyn CatalogSession,
    schema: &str,
    unit: &str,
    filter: &str,
    page_size: u32,
    page_offset: u64,
) -> AppResult<RowSet> {
    let statement = rows_statement(schema, unit, filter, page_size, page_offset)?;

    let mut result = RowSet::default();
    let mut cursor = session.query(&statement);
    while let Some(row) = cursor.try_next().await? {
        let values = row
            .iter()
            .map(CellValue::to_cell_string)
            .collect::<AppResult<Vec<_>>>()?;
        result.rows.push(values);
    }

    tracing::debug!(schema, unit, rows = result.len(), "rows read");
    Ok(result)
}
