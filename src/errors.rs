// ============================================================================
// L1: ERROR TAXONOMY
// ============================================================================
use std::fmt;

use thiserror::Error;

/// SQL Server: "Invalid object name".
const MSSQL_INVALID_OBJECT_NAME: u32 = 208;
/// MySQL: ER_NO_SUCH_TABLE.
const MYSQL_NO_SUCH_TABLE: u16 = 1146;
const SQLSTATE_BASE_TABLE_NOT_FOUND: &str = "42S02";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    SqlServer,
    MySql,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::SqlServer => f.write_str("SQL Server"),
            Engine::MySql => f.write_str("MySQL"),
        }
    }
}

/// One rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFormatError {
    pub column: String,
    pub expected: &'static str,
    pub input: String,
}

impl fmt::Display for ValueFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid value for column {}. Expected: {}. Provided value: {}",
            self.column, self.expected, self.input
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{engine} table '{table}' does not exist")]
    TableNotFound { engine: Engine, table: String },

    #[error("{engine} database error: {message}")]
    Database { engine: Engine, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn is_table_not_found(&self) -> bool {
        matches!(self, AppError::TableNotFound { .. })
    }

    /// Classifies a tiberius error; `table` is the object the statement targeted.
    pub fn from_mssql(err: tiberius::error::Error, table: Option<&str>) -> Self {
        if let tiberius::error::Error::Server(token) = &err {
            if let Some(table) = table {
                if is_mssql_missing_table(token.code()) {
                    return AppError::TableNotFound {
                        engine: Engine::SqlServer,
                        table: table.to_string(),
                    };
                }
            }
        }
        AppError::Database {
            engine: Engine::SqlServer,
            message: err.to_string(),
        }
    }

    /// Classifies an sqlx MySQL error; `table` is the object the statement targeted.
    pub fn from_mysql(err: sqlx::Error, table: Option<&str>) -> Self {
        if let (sqlx::Error::Database(db_err), Some(table)) = (&err, table) {
            let number = db_err
                .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                .map(|e| e.number());
            let sqlstate = db_err.code();
            if is_mysql_missing_table(number, sqlstate.as_deref()) {
                return AppError::TableNotFound {
                    engine: Engine::MySql,
                    table: table.to_string(),
                };
            }
        }
        AppError::Database {
            engine: Engine::MySql,
            message: err.to_string(),
        }
    }

    pub fn connect(engine: Engine, err: impl fmt::Display) -> Self {
        AppError::Database {
            engine,
            message: format!("connection failed: {}", err),
        }
    }
}

pub fn is_mssql_missing_table(code: u32) -> bool {
    code == MSSQL_INVALID_OBJECT_NAME
}

pub fn is_mysql_missing_table(number: Option<u16>, sqlstate: Option<&str>) -> bool {
    number == Some(MYSQL_NO_SUCH_TABLE) || sqlstate == Some(SQLSTATE_BASE_TABLE_NOT_FOUND)
}
