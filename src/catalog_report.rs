// ============================================================================
// L2.13: CATALOG REPORT SUBSYSTEM
// ============================================================================
use crate::connection_manager::{SourceEndpoint, close_source};
use crate::errors::AppError;
use crate::introspector;
use crate::model::ColumnDescriptor;

pub async fn print_tables(source: &SourceEndpoint) -> Result<(), AppError> {
    let mut client = source.connect().await?;
    let tables = introspector::list_tables(&mut client).await;
    close_source(client).await;

    let tables = tables?;
    if tables.is_empty() {
        println!("No tables found in the database.");
    }
    for table in tables {
        println!("{}", table);
    }
    Ok(())
}

pub async fn print_columns(source: &SourceEndpoint, table: &str) -> Result<(), AppError> {
    let mut client = source.connect().await?;
    let columns = introspector::list_columns(&mut client, table).await;
    close_source(client).await;

    let columns = columns?;
    if columns.is_empty() {
        println!("No columns found in the table.");
        return Ok(());
    }
    print!("{}", format_columns(&columns));
    Ok(())
}

pub fn format_columns(columns: &[ColumnDescriptor]) -> String {
    let width = columns
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);
    columns
        .iter()
        .map(|c| {
            format!(
                "{:<width$}  {:<5}  {:<32}  {}\n",
                c.name,
                c.sql_type.code(),
                c.sql_type.display_name(),
                c.max_length,
                width = width
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_types::SqlType;

    #[test]
    fn column_listing_shows_code_name_and_length() {
        let text = format_columns(&[
            ColumnDescriptor::new("id", SqlType::Integer, 10),
            ColumnDescriptor::new("customer", SqlType::NVarChar, 40),
        ]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id        4 "));
        assert!(lines[1].contains("UNICODE TEXT"));
        assert!(lines[1].trim_end().ends_with("40"));
    }
}
