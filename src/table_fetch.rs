// ============================================================================
// L2.7: TABLE FETCH SUBSYSTEM
// One connection per call: open, run one query, close.
// ============================================================================
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Executor, Row, Statement, ValueRef};
use tiberius::{ColumnData, FromSql};

use crate::connection_manager::{
    DestinationEndpoint, SourceEndpoint, SqlServerClient, close_destination, close_source,
};
use crate::errors::AppError;
use crate::model::TableSnapshot;
use crate::statement_builder::{Dialect, count_rows, select_all};

pub const NULL_TEXT: &str = "NULL";

pub async fn fetch_source_table(
    endpoint: &SourceEndpoint,
    table: &str,
) -> Result<TableSnapshot, AppError> {
    let mut client = endpoint.connect().await?;
    let result = query_source_snapshot(&mut client, table).await;
    close_source(client).await;
    let snapshot = result.map_err(|e| AppError::from_mssql(e, Some(table)))?;
    debug!("Fetched {} rows from source table {}", snapshot.rows.len(), table);
    Ok(snapshot)
}

async fn query_source_snapshot(
    client: &mut SqlServerClient,
    table: &str,
) -> Result<TableSnapshot, tiberius::error::Error> {
    let sql = select_all(Dialect::SqlServer, table);
    let mut stream = client.query(sql, &[]).await?;
    let columns: Vec<String> = stream
        .columns()
        .await?
        .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<String>> = stream
        .into_first_result()
        .await?
        .into_iter()
        .map(|row| row.cells().map(|(_, data)| render_mssql_cell(data)).collect())
        .collect();
    Ok(TableSnapshot { columns, rows })
}

pub async fn fetch_destination_table(
    endpoint: &DestinationEndpoint,
    table: &str,
) -> Result<TableSnapshot, AppError> {
    let mut conn = endpoint.connect().await?;
    let result = query_destination_snapshot(&mut conn, table).await;
    close_destination(conn).await;
    let snapshot = result.map_err(|e| AppError::from_mysql(e, Some(table)))?;
    debug!(
        "Fetched {} rows from destination table {}",
        snapshot.rows.len(),
        table
    );
    Ok(snapshot)
}

async fn query_destination_snapshot(
    conn: &mut MySqlConnection,
    table: &str,
) -> Result<TableSnapshot, sqlx::Error> {
    let sql = select_all(Dialect::MySql, table);
    let statement = (&mut *conn).prepare(&sql).await?;
    let columns: Vec<String> = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let rows: Vec<Vec<String>> = statement
        .query()
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(|row| (0..row.len()).map(|i| render_mysql_cell(row, i)).collect())
        .collect();
    Ok(TableSnapshot { columns, rows })
}

pub async fn count_source_rows(endpoint: &SourceEndpoint, table: &str) -> Result<i64, AppError> {
    let mut client = endpoint.connect().await?;
    let result = async {
        let row = client
            .query(count_rows(Dialect::SqlServer, table), &[])
            .await?
            .into_row()
            .await?;
        Ok::<_, tiberius::error::Error>(
            row.and_then(|r| r.try_get::<i32, _>(0).ok().flatten())
                .unwrap_or(0),
        )
    }
    .await;
    close_source(client).await;
    result
        .map(i64::from)
        .map_err(|e| AppError::from_mssql(e, Some(table)))
}

pub async fn count_destination_rows(
    endpoint: &DestinationEndpoint,
    table: &str,
) -> Result<i64, AppError> {
    let mut conn = endpoint.connect().await?;
    let result = sqlx::query_as::<_, (i64,)>(&count_rows(Dialect::MySql, table))
        .fetch_one(&mut conn)
        .await;
    close_destination(conn).await;
    result
        .map(|(count,)| count)
        .map_err(|e| AppError::from_mysql(e, Some(table)))
}

pub fn render_mssql_cell(data: &ColumnData<'static>) -> String {
    match data {
        ColumnData::U8(v) => opt_text(v.as_ref()),
        ColumnData::I16(v) => opt_text(v.as_ref()),
        ColumnData::I32(v) => opt_text(v.as_ref()),
        ColumnData::I64(v) => opt_text(v.as_ref()),
        ColumnData::F32(v) => opt_text(v.as_ref()),
        ColumnData::F64(v) => opt_text(v.as_ref()),
        ColumnData::Bit(v) => v
            .map(|b| (if b { "1" } else { "0" }).to_string())
            .unwrap_or_else(|| NULL_TEXT.to_string()),
        ColumnData::String(v) => opt_text(v.as_deref()),
        ColumnData::Guid(v) => opt_text(v.as_ref()),
        ColumnData::Numeric(v) => opt_text(v.as_ref()),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|bytes| format!("<{} bytes>", bytes.len()))
            .unwrap_or_else(|| NULL_TEXT.to_string()),
        ColumnData::Date(_) => temporal_text::<NaiveDate>(data),
        ColumnData::Time(_) => temporal_text::<NaiveTime>(data),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal_text::<NaiveDateTime>(data)
        }
        ColumnData::DateTimeOffset(_) => temporal_text::<DateTime<FixedOffset>>(data),
        other => format!("{:?}", other),
    }
}

fn temporal_text<T>(data: &ColumnData<'static>) -> String
where
    T: for<'a> FromSql<'a> + ToString,
{
    match T::from_sql(data) {
        Ok(Some(value)) => value.to_string(),
        Ok(None) => NULL_TEXT.to_string(),
        Err(_) => format!("{:?}", data),
    }
}

fn opt_text<T: ToString + ?Sized>(value: Option<&T>) -> String {
    value
        .map(ToString::to_string)
        .unwrap_or_else(|| NULL_TEXT.to_string())
}

pub fn render_mysql_cell(row: &MySqlRow, index: usize) -> String {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return NULL_TEXT.to_string(),
        Ok(_) => {}
        Err(e) => return format!("<{}>", e),
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return v.to_string();
    }
    if let Ok(v) = row.try_get::<u64, _>(index) {
        return v.to_string();
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return v.to_string();
    }
    if let Ok(v) = row.try_get::<NaiveDateTime, _>(index) {
        return v.to_string();
    }
    if let Ok(v) = row.try_get::<NaiveDate, _>(index) {
        return v.to_string();
    }
    if let Ok(v) = row.try_get::<NaiveTime, _>(index) {
        return v.to_string();
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return v;
    }
    if let Ok(v) = row.try_get_unchecked::<String, _>(index) {
        return v;
    }
    match row.try_get_unchecked::<Vec<u8>, _>(index) {
        Ok(bytes) => format!("<{} bytes>", bytes.len()),
        Err(_) => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn renders_sql_server_cells() {
        assert_eq!(render_mssql_cell(&ColumnData::I32(Some(42))), "42");
        assert_eq!(render_mssql_cell(&ColumnData::I32(None)), NULL_TEXT);
        assert_eq!(render_mssql_cell(&ColumnData::Bit(Some(true))), "1");
        assert_eq!(
            render_mssql_cell(&ColumnData::String(Some(Cow::Borrowed("abc")))),
            "abc"
        );
        assert_eq!(
            render_mssql_cell(&ColumnData::Binary(Some(Cow::Owned(vec![1, 2, 3])))),
            "<3 bytes>"
        );
        assert_eq!(render_mssql_cell(&ColumnData::String(None)), NULL_TEXT);
        assert_eq!(render_mssql_cell(&ColumnData::DateTimeOffset(None)), NULL_TEXT);
    }
}
