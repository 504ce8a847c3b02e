// ============================================================================
// L2.9: MANUAL INSERT SUBSYSTEM
// ============================================================================
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tiberius::Query;
use tokio::io::AsyncBufRead;

use crate::coercion::{BoundValue, TruncationWarning, coerce_form};
use crate::connection_manager::{SourceEndpoint, SqlServerClient, close_source};
use crate::console::Console;
use crate::errors::{AppError, Engine, ValueFormatError};
use crate::introspector;
use crate::model::{ColumnDescriptor, PendingInsertForm};
use crate::random_values::generate_value;
use crate::sql_types::{SqlType, TypeClass};
use crate::statement_builder::{Dialect, build_insert};

const RANDOM_TRIGGER: &str = "?";

/// A statement whose values all passed coercion.
#[derive(Debug)]
pub struct PreparedInsert {
    pub table: String,
    pub sql: String,
    pub values: Vec<BoundValue>,
    pub warnings: Vec<TruncationWarning>,
}

/// Builds the statement and coerces the form. Nothing is sent to the
/// database unless every field is valid.
pub fn prepare_insert(
    table: &str,
    columns: &[ColumnDescriptor],
    form: &PendingInsertForm,
) -> Result<PreparedInsert, Vec<ValueFormatError>> {
    let row = coerce_form(columns, form)?;
    Ok(PreparedInsert {
        table: table.to_string(),
        sql: build_insert(Dialect::SqlServer, table, columns),
        values: row.values,
        warnings: row.warnings,
    })
}

pub async fn execute_insert(
    client: &mut SqlServerClient,
    prepared: &PreparedInsert,
) -> Result<u64, AppError> {
    let mut query = Query::new(prepared.sql.as_str());
    for value in &prepared.values {
        bind_value(&mut query, value);
    }
    let result = query
        .execute(client)
        .await
        .map_err(|e| AppError::from_mssql(e, Some(&prepared.table)))?;
    Ok(result.total())
}

fn bind_value<'a>(query: &mut Query<'a>, value: &BoundValue) {
    match value {
        BoundValue::Null(sql_type) => bind_null(query, *sql_type),
        BoundValue::Int(v) => query.bind(*v),
        BoundValue::BigInt(v) => query.bind(*v),
        BoundValue::Double(v) => query.bind(*v),
        BoundValue::Bool(v) => query.bind(*v),
        BoundValue::Date(v) => query.bind(*v),
        BoundValue::Time(v) => query.bind(*v),
        BoundValue::Timestamp(v) => query.bind(*v),
        BoundValue::Text(v) => query.bind(v.clone()),
    }
}

/// NULL carrying the column's declared type, so the server does not have
/// to convert from NVARCHAR.
fn bind_null(query: &mut Query<'_>, sql_type: SqlType) {
    match (sql_type.class(), sql_type) {
        (TypeClass::Integer, _) => query.bind(Option::<i32>::None),
        (TypeClass::BigInteger, _) => query.bind(Option::<i64>::None),
        (TypeClass::Decimal, _) => query.bind(Option::<f64>::None),
        (TypeClass::Boolean, _) => query.bind(Option::<bool>::None),
        (TypeClass::Date, _) => query.bind(Option::<NaiveDate>::None),
        (TypeClass::Time, _) => query.bind(Option::<NaiveTime>::None),
        (TypeClass::Timestamp, _) => query.bind(Option::<NaiveDateTime>::None),
        (TypeClass::Unrecognized, SqlType::Other(-2 | -3 | -4)) => {
            query.bind(Option::<Vec<u8>>::None)
        }
        (TypeClass::Text | TypeClass::Unrecognized, _) => query.bind(Option::<String>::None),
    }
}

/// Opens the source, walks the user through one insert and closes the
/// connection again, whatever the outcome.
pub async fn run<R: AsyncBufRead + Unpin>(
    console: &mut Console<R>,
    source: &SourceEndpoint,
) -> Result<(), AppError> {
    let mut client = source.connect().await?;
    let result = run_dialog(console, &mut client).await;
    close_source(client).await;
    result
}

async fn run_dialog<R: AsyncBufRead + Unpin>(
    console: &mut Console<R>,
    client: &mut SqlServerClient,
) -> Result<(), AppError> {
    let tables = introspector::list_tables(client).await?;
    if tables.is_empty() {
        console
            .notify("Error", "No tables found in the database.")
            .await?;
        return Ok(());
    }

    println!();
    println!("Tables in {}:", Engine::SqlServer);
    for (i, table) in tables.iter().enumerate() {
        println!("  [{}] {}", i + 1, table);
    }
    let choice = console
        .ask("Select the table for insertion (number or name, empty to cancel): ")
        .await?
        .unwrap_or_default();
    if choice.trim().is_empty() {
        println!("Insert cancelled.");
        return Ok(());
    }
    let Some(table) = resolve_table_choice(&tables, &choice) else {
        console
            .notify("Error", &format!("Unknown table: {}", choice.trim()))
            .await?;
        return Ok(());
    };

    let columns = introspector::list_columns(client, table).await?;
    if columns.is_empty() {
        console
            .notify("Error", "No columns found in the table.")
            .await?;
        return Ok(());
    }

    let mut rng = StdRng::from_entropy();
    let mut form = PendingInsertForm::new();
    let all: Vec<usize> = (0..columns.len()).collect();
    println!();
    println!("Insert data into table {}", table);
    if !fill_form(console, &columns, &mut form, &all, &mut rng).await? {
        println!("Insert cancelled.");
        return Ok(());
    }

    let prepared = loop {
        print_summary(table, &columns, &form);
        if !console.confirm(&format!("Insert into {}?", table)).await? {
            println!("Insert cancelled.");
            return Ok(());
        }
        match prepare_insert(table, &columns, &form) {
            Ok(prepared) => break prepared,
            Err(errors) => {
                for e in &errors {
                    warn!("⚠️ {}", e);
                }
                let message = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n");
                console.notify("Format Error", &message).await?;
                if !console.confirm("Correct the values and resubmit?").await? {
                    println!("Insert abandoned.");
                    return Ok(());
                }
                let offending = offending_indices(&columns, &errors);
                if !fill_form(console, &columns, &mut form, &offending, &mut rng).await? {
                    println!("Insert cancelled.");
                    return Ok(());
                }
            }
        }
    };

    for warning in &prepared.warnings {
        console.notify("Warning", &warning.to_string()).await?;
    }

    let affected = execute_insert(client, &prepared).await?;
    info!("✅ Inserted {} row(s) into {}", affected, table);
    console
        .notify(
            "Success",
            &format!("Data inserted successfully! Rows affected: {}", affected),
        )
        .await?;
    Ok(())
}

/// Accepts a 1-based list number or an exact (case-insensitive) table name.
pub fn resolve_table_choice<'a>(tables: &'a [String], choice: &str) -> Option<&'a str> {
    let choice = choice.trim();
    if let Ok(number) = choice.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|i| tables.get(i))
            .map(String::as_str);
    }
    tables
        .iter()
        .find(|t| t.eq_ignore_ascii_case(choice))
        .map(String::as_str)
}

/// Prompts for the given column indices. Returns false if input ran out.
pub async fn fill_form<R, G>(
    console: &mut Console<R>,
    columns: &[ColumnDescriptor],
    form: &mut PendingInsertForm,
    indices: &[usize],
    rng: &mut G,
) -> std::io::Result<bool>
where
    R: AsyncBufRead + Unpin,
    G: Rng,
{
    for &index in indices {
        let Some(column) = columns.get(index) else {
            continue;
        };
        let Some(input) = console.ask(&field_prompt(column)).await? else {
            return Ok(false);
        };
        if input == RANDOM_TRIGGER {
            let value = generate_value(column, rng);
            println!("    -> {}", value);
            form.set(index, value);
        } else {
            form.set(index, input);
        }
    }
    Ok(true)
}

fn field_prompt(column: &ColumnDescriptor) -> String {
    let length = if column.max_length > 0 && column.sql_type.class() == TypeClass::Text {
        format!(", max {}", column.max_length)
    } else {
        String::new()
    };
    format!(
        "  {} ({}{}) [Enter=NULL, {}=random]: ",
        column.name, column.sql_type, length, RANDOM_TRIGGER
    )
}

fn print_summary(table: &str, columns: &[ColumnDescriptor], form: &PendingInsertForm) {
    println!();
    println!("Values for {}:", table);
    for (index, column) in columns.iter().enumerate() {
        let value = form.value(index);
        println!(
            "  {:<24} {}",
            format!("{}:", column.name),
            if value.is_empty() { "NULL" } else { value }
        );
    }
}

fn offending_indices(columns: &[ColumnDescriptor], errors: &[ValueFormatError]) -> Vec<usize> {
    errors
        .iter()
        .filter_map(|e| columns.iter().position(|c| c.name == e.column))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("id", SqlType::Integer, 10),
            ColumnDescriptor::new("code", SqlType::VarChar, 5),
            ColumnDescriptor::new("price", SqlType::Decimal, 10),
            ColumnDescriptor::new("active", SqlType::Bit, 1),
        ]
    }

    #[test]
    fn malformed_number_aborts_before_statement() {
        let mut form = PendingInsertForm::new();
        form.set(0, "abc");
        form.set(2, "1,5");
        let errors = prepare_insert("Orders", &columns(), &form).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].column, "id");
        assert_eq!(errors[0].expected, "INTEGER");
        assert_eq!(offending_indices(&columns(), &errors), vec![0]);
    }

    #[test]
    fn prepared_insert_carries_values_and_warnings() {
        let mut form = PendingInsertForm::new();
        form.set(0, "7");
        form.set(1, "ABCDEFGH");
        form.set(2, "12,5");
        form.set(3, "true");
        let prepared = prepare_insert("Orders", &columns(), &form).unwrap();
        assert_eq!(
            prepared.sql,
            "INSERT INTO [Orders] ([id], [code], [price], [active]) VALUES (@P1, @P2, @P3, @P4)"
        );
        assert_eq!(
            prepared.values,
            vec![
                BoundValue::Int(7),
                BoundValue::Text("ABCDE".into()),
                BoundValue::Double(12.5),
                BoundValue::Bool(true),
            ]
        );
        assert_eq!(prepared.warnings.len(), 1);
    }

    #[test]
    fn unset_fields_bind_null() {
        let prepared = prepare_insert("Orders", &columns(), &PendingInsertForm::new()).unwrap();
        assert_eq!(prepared.values[0], BoundValue::Null(SqlType::Integer));
        assert_eq!(prepared.values[3], BoundValue::Null(SqlType::Bit));
    }

    #[test]
    fn table_choice_by_number_or_name() {
        let tables = vec!["Customers".to_string(), "Orders".to_string()];
        assert_eq!(resolve_table_choice(&tables, "2"), Some("Orders"));
        assert_eq!(resolve_table_choice(&tables, " customers "), Some("Customers"));
        assert_eq!(resolve_table_choice(&tables, "0"), None);
        assert_eq!(resolve_table_choice(&tables, "3"), None);
        assert_eq!(resolve_table_choice(&tables, "Invoices"), None);
    }

    #[tokio::test]
    async fn form_prompts_accept_values_random_and_null() {
        let input: &[u8] = b"42\n?\n\n";
        let mut console = Console::new(input);
        let mut rng = StdRng::seed_from_u64(5);
        let mut form = PendingInsertForm::new();
        let cols = columns();

        let complete = fill_form(&mut console, &cols, &mut form, &[0, 1, 2], &mut rng)
            .await
            .unwrap();
        assert!(complete);
        assert_eq!(form.value(0), "42");
        assert!(form.value(1).starts_with("Text_"));
        assert!(form.value(1).chars().count() <= 5);
        assert_eq!(form.value(2), "");
    }

    #[tokio::test]
    async fn form_reports_exhausted_input() {
        let input: &[u8] = b"1\n";
        let mut console = Console::new(input);
        let mut rng = StdRng::seed_from_u64(5);
        let mut form = PendingInsertForm::new();

        let complete = fill_form(&mut console, &columns(), &mut form, &[0, 1], &mut rng)
            .await
            .unwrap();
        assert!(!complete);
    }
}
