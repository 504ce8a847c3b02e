// ============================================================================
// L1: SQL TYPE CODES & TYPE CLASSES
// ============================================================================
use std::fmt;

/// A column's SQL type, identified by its JDBC type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    NChar,
    NVarChar,
    LongNVarChar,
    Date,
    Time,
    Timestamp,
    Boolean,
    TimestampWithTimezone,
    Other(i32),
}

/// How a value of a given type is coerced and generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Integer,
    BigInteger,
    Decimal,
    Boolean,
    Date,
    Time,
    Timestamp,
    Text,
    Unrecognized,
}

impl SqlType {
    pub fn code(self) -> i32 {
        match self {
            SqlType::Bit => -7,
            SqlType::TinyInt => -6,
            SqlType::SmallInt => 5,
            SqlType::Integer => 4,
            SqlType::BigInt => -5,
            SqlType::Float => 6,
            SqlType::Real => 7,
            SqlType::Double => 8,
            SqlType::Numeric => 2,
            SqlType::Decimal => 3,
            SqlType::Char => 1,
            SqlType::VarChar => 12,
            SqlType::LongVarChar => -1,
            SqlType::NChar => -15,
            SqlType::NVarChar => -9,
            SqlType::LongNVarChar => -16,
            SqlType::Date => 91,
            SqlType::Time => 92,
            SqlType::Timestamp => 93,
            SqlType::Boolean => 16,
            SqlType::TimestampWithTimezone => 2014,
            SqlType::Other(code) => code,
        }
    }

    /// The single place that decides coercion and generation strategy.
    /// New type codes only need an arm here.
    pub fn class(self) -> TypeClass {
        match self {
            SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer => TypeClass::Integer,
            SqlType::BigInt => TypeClass::BigInteger,
            SqlType::Decimal
            | SqlType::Numeric
            | SqlType::Float
            | SqlType::Real
            | SqlType::Double => TypeClass::Decimal,
            SqlType::Bit | SqlType::Boolean => TypeClass::Boolean,
            SqlType::Date => TypeClass::Date,
            SqlType::Time => TypeClass::Time,
            SqlType::Timestamp | SqlType::TimestampWithTimezone => TypeClass::Timestamp,
            SqlType::Char
            | SqlType::VarChar
            | SqlType::LongVarChar
            | SqlType::NChar
            | SqlType::NVarChar
            | SqlType::LongNVarChar => TypeClass::Text,
            SqlType::Other(_) => TypeClass::Unrecognized,
        }
    }

    /// Human readable name used in prompts and validation messages.
    pub fn display_name(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::SmallInt => "SMALL INTEGER",
            SqlType::TinyInt => "TINY INTEGER",
            SqlType::BigInt => "LONG INTEGER",
            SqlType::Decimal => "DECIMAL",
            SqlType::Numeric => "NUMERIC",
            SqlType::Float => "FLOAT",
            SqlType::Real => "REAL",
            SqlType::Double => "DOUBLE",
            SqlType::Bit => "BIT/BOOLEAN",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Char => "CHARACTER",
            SqlType::VarChar => "TEXT",
            SqlType::LongVarChar => "LONG TEXT",
            SqlType::NChar => "UNICODE CHARACTER",
            SqlType::NVarChar => "UNICODE TEXT",
            SqlType::LongNVarChar => "LONG UNICODE TEXT",
            SqlType::Date => "DATE (YYYY-MM-DD)",
            SqlType::Time => "TIME (HH:MM:SS)",
            SqlType::Timestamp | SqlType::TimestampWithTimezone => {
                "DATE/TIME (YYYY-MM-DD HH:MM:SS)"
            }
            SqlType::Other(_) => "UNKNOWN",
        }
    }

    /// Maps a SQL Server `INFORMATION_SCHEMA.COLUMNS.DATA_TYPE` name onto the
    /// JDBC code the Microsoft driver reports for it.
    pub fn from_mssql_type_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "bit" => SqlType::Bit,
            "tinyint" => SqlType::TinyInt,
            "smallint" => SqlType::SmallInt,
            "int" => SqlType::Integer,
            "bigint" => SqlType::BigInt,
            "float" => SqlType::Double,
            "real" => SqlType::Real,
            "decimal" | "money" | "smallmoney" => SqlType::Decimal,
            "numeric" => SqlType::Numeric,
            "char" | "uniqueidentifier" => SqlType::Char,
            "varchar" => SqlType::VarChar,
            "text" => SqlType::LongVarChar,
            "nchar" => SqlType::NChar,
            "nvarchar" => SqlType::NVarChar,
            "ntext" | "xml" => SqlType::LongNVarChar,
            "date" => SqlType::Date,
            "time" => SqlType::Time,
            "datetime" | "datetime2" | "smalldatetime" => SqlType::Timestamp,
            "datetimeoffset" => SqlType::TimestampWithTimezone,
            "binary" | "timestamp" | "rowversion" => SqlType::Other(-2),
            "varbinary" => SqlType::Other(-3),
            "image" => SqlType::Other(-4),
            _ => SqlType::Other(1111),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
