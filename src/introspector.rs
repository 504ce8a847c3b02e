// ============================================================================
// L2.6: SCHEMA INTROSPECTION SUBSYSTEM
// ============================================================================
use log::debug;
use tiberius::Row;

use crate::connection_manager::SqlServerClient;
use crate::errors::AppError;
use crate::model::ColumnDescriptor;
use crate::sql_types::SqlType;
use crate::statement_builder::split_name_parts;

const LIST_TABLES_SQL: &str = r#"
    SELECT CASE WHEN TABLE_SCHEMA = SCHEMA_NAME() THEN TABLE_NAME
                ELSE TABLE_SCHEMA + '.' + TABLE_NAME END AS name
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_TYPE = 'BASE TABLE'
    ORDER BY name
"#;

const LIST_COLUMNS_SQL: &str = r#"
    SELECT COLUMN_NAME,
           DATA_TYPE,
           CAST(COALESCE(CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION, 0) AS INT) AS COLUMN_SIZE
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = COALESCE(NULLIF(@P1, ''), SCHEMA_NAME())
      AND TABLE_NAME = @P2
    ORDER BY ORDINAL_POSITION
"#;

/// Base tables of the connected database, ordered by name. Tables outside
/// the login's default schema come back as `schema.table`.
pub async fn list_tables(client: &mut SqlServerClient) -> Result<Vec<String>, AppError> {
    let rows = client
        .query(LIST_TABLES_SQL, &[])
        .await
        .map_err(|e| AppError::from_mssql(e, None))?
        .into_first_result()
        .await
        .map_err(|e| AppError::from_mssql(e, None))?;

    let tables = rows
        .iter()
        .filter_map(|row| row.try_get::<&str, _>(0).ok().flatten())
        .map(str::to_string)
        .collect::<Vec<_>>();
    debug!("Found {} tables in source catalog", tables.len());
    Ok(tables)
}

/// Ordered column descriptors of `table`. An unknown table yields an empty list.
pub async fn list_columns(
    client: &mut SqlServerClient,
    table: &str,
) -> Result<Vec<ColumnDescriptor>, AppError> {
    let (schema, name) = split_table_name(table);
    let schema = schema.unwrap_or("");

    let rows = client
        .query(LIST_COLUMNS_SQL, &[&schema, &name])
        .await
        .map_err(|e| AppError::from_mssql(e, None))?
        .into_first_result()
        .await
        .map_err(|e| AppError::from_mssql(e, None))?;

    let columns = rows.iter().filter_map(descriptor_from_row).collect::<Vec<_>>();
    debug!("Table {} has {} columns", table, columns.len());
    Ok(columns)
}

fn descriptor_from_row(row: &Row) -> Option<ColumnDescriptor> {
    let name = row.try_get::<&str, _>(0).ok().flatten()?;
    let data_type = row.try_get::<&str, _>(1).ok().flatten().unwrap_or("");
    let size = row.try_get::<i32, _>(2).ok().flatten().unwrap_or(0);
    Some(descriptor_from_catalog(name, data_type, size))
}

/// `(max)` columns report -1; they are unbounded.
pub fn descriptor_from_catalog(name: &str, data_type: &str, column_size: i32) -> ColumnDescriptor {
    ColumnDescriptor::new(
        name,
        SqlType::from_mssql_type_name(data_type),
        u32::try_from(column_size).unwrap_or(0),
    )
}

/// Splits `schema.table`, stripping bracket quotes from each part.
pub fn split_table_name(table: &str) -> (Option<&str>, &str) {
    match split_name_parts(table).as_slice() {
        [.., schema, name] => (Some(unquote(*schema)), unquote(*name)),
        _ => (None, unquote(table)),
    }
}

fn unquote(part: &str) -> &str {
    let part = part.trim();
    part.strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
        .unwrap_or(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_qualified_names() {
        assert_eq!(split_table_name("Orders"), (None, "Orders"));
        assert_eq!(split_table_name("sales.Orders"), (Some("sales"), "Orders"));
        assert_eq!(split_table_name("[sales].[Order Lines]"), (Some("sales"), "Order Lines"));
        assert_eq!(split_table_name("[Order.Details]"), (None, "Order.Details"));
        assert_eq!(
            split_table_name("sales.[Order.Details]"),
            (Some("sales"), "Order.Details")
        );
        assert_eq!(split_table_name("shop.sales.Orders"), (Some("sales"), "Orders"));
    }

    #[test]
    fn catalog_rows_become_descriptors() {
        assert_eq!(
            descriptor_from_catalog("name", "nvarchar", 40),
            ColumnDescriptor::new("name", SqlType::NVarChar, 40)
        );
        assert_eq!(
            descriptor_from_catalog("notes", "varchar", -1),
            ColumnDescriptor::new("notes", SqlType::VarChar, 0)
        );
        assert_eq!(
            descriptor_from_catalog("qty", "int", 10),
            ColumnDescriptor::new("qty", SqlType::Integer, 10)
        );
    }
}
