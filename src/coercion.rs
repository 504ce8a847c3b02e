// ============================================================================
// L2.4: VALUE COERCION SUBSYSTEM
// ============================================================================
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::ValueFormatError;
use crate::model::{ColumnDescriptor, PendingInsertForm};
use crate::sql_types::{SqlType, TypeClass};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A form value converted to the column's native type, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Null(SqlType),
    Int(i32),
    BigInt(i64),
    Double(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncationWarning {
    pub column: String,
    pub max_length: u32,
}

impl std::fmt::Display for TruncationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Value truncated for column {} to {} characters",
            self.column, self.max_length
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: BoundValue,
    pub warning: Option<TruncationWarning>,
}

impl From<BoundValue> for Coerced {
    fn from(value: BoundValue) -> Self {
        Coerced {
            value,
            warning: None,
        }
    }
}

/// Every value of a form, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedRow {
    pub values: Vec<BoundValue>,
    pub warnings: Vec<TruncationWarning>,
}

pub fn coerce_value(column: &ColumnDescriptor, raw: &str) -> Result<Coerced, ValueFormatError> {
    if raw.is_empty() {
        return Ok(BoundValue::Null(column.sql_type).into());
    }

    let invalid = || ValueFormatError {
        column: column.name.clone(),
        expected: column.sql_type.display_name(),
        input: raw.to_string(),
    };

    let value = match column.sql_type.class() {
        TypeClass::Integer => BoundValue::Int(raw.parse::<i32>().map_err(|_| invalid())?),
        TypeClass::BigInteger => BoundValue::BigInt(raw.parse::<i64>().map_err(|_| invalid())?),
        TypeClass::Decimal => {
            let normalized = raw.replace(',', ".");
            BoundValue::Double(normalized.parse::<f64>().map_err(|_| invalid())?)
        }
        TypeClass::Boolean => BoundValue::Bool(raw.eq_ignore_ascii_case("true") || raw == "1"),
        TypeClass::Date => BoundValue::Date(
            NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| invalid())?,
        ),
        TypeClass::Time => BoundValue::Time(
            NaiveTime::parse_from_str(raw, TIME_FORMAT).map_err(|_| invalid())?,
        ),
        TypeClass::Timestamp => BoundValue::Timestamp(
            NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|_| invalid())?,
        ),
        TypeClass::Text => return Ok(coerce_text(column, raw)),
        TypeClass::Unrecognized => BoundValue::Text(raw.to_string()),
    };

    Ok(value.into())
}

fn coerce_text(column: &ColumnDescriptor, raw: &str) -> Coerced {
    let limit = column.max_length as usize;
    if limit > 0 && raw.encode_utf16().count() > limit {
        let truncated = truncate_utf16(raw, limit);
        log::warn!(
            "⚠️ Value for column {} truncated to {} characters",
            column.name,
            column.max_length
        );
        return Coerced {
            value: BoundValue::Text(truncated),
            warning: Some(TruncationWarning {
                column: column.name.clone(),
                max_length: column.max_length,
            }),
        };
    }
    BoundValue::Text(raw.to_string()).into()
}

/// Longest prefix of `raw` that fits in `limit` UTF-16 code units, the unit
/// SQL Server counts `nvarchar(n)` lengths in. Surrogate pairs stay whole.
fn truncate_utf16(raw: &str, limit: usize) -> String {
    let mut used = 0;
    raw.chars()
        .take_while(|c| {
            used += c.len_utf16();
            used <= limit
        })
        .collect()
}

/// Coerces every field. Any rejected field fails the whole row, and all
/// rejected fields are reported together.
pub fn coerce_form(
    columns: &[ColumnDescriptor],
    form: &PendingInsertForm,
) -> Result<CoercedRow, Vec<ValueFormatError>> {
    let mut values = Vec::with_capacity(columns.len());
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    for (index, column) in columns.iter().enumerate() {
        match coerce_value(column, form.value(index)) {
            Ok(coerced) => {
                values.push(coerced.value);
                warnings.extend(coerced.warning);
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(CoercedRow { values, warnings })
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(sql_type: SqlType, max_length: u32) -> ColumnDescriptor {
        ColumnDescriptor::new("c", sql_type, max_length)
    }

    #[test]
    fn integer_family_rejects_non_numeric_input() {
        for t in [SqlType::TinyInt, SqlType::SmallInt, SqlType::Integer, SqlType::BigInt] {
            let err = coerce_value(&col(t, 0), "12a").unwrap_err();
            assert_eq!(err.input, "12a");
            assert_eq!(err.expected, t.display_name());
        }
        assert_eq!(
            coerce_value(&col(SqlType::Integer, 0), "-42").unwrap().value,
            BoundValue::Int(-42)
        );
        assert_eq!(
            coerce_value(&col(SqlType::BigInt, 0), "9000000000").unwrap().value,
            BoundValue::BigInt(9_000_000_000)
        );
    }

    #[test]
    fn decimal_comma_matches_period() {
        for t in [SqlType::Decimal, SqlType::Numeric, SqlType::Float, SqlType::Double] {
            let comma = coerce_value(&col(t, 0), "12,5").unwrap().value;
            let period = coerce_value(&col(t, 0), "12.5").unwrap().value;
            assert_eq!(comma, BoundValue::Double(12.5));
            assert_eq!(comma, period);
        }
        assert!(coerce_value(&col(SqlType::Decimal, 0), "1,234.5").is_err());
    }

    #[test]
    fn booleans_never_fail() {
        let c = col(SqlType::Bit, 1);
        assert_eq!(coerce_value(&c, "TRUE").unwrap().value, BoundValue::Bool(true));
        assert_eq!(coerce_value(&c, "1").unwrap().value, BoundValue::Bool(true));
        assert_eq!(coerce_value(&c, "yes").unwrap().value, BoundValue::Bool(false));
        assert_eq!(coerce_value(&c, "0").unwrap().value, BoundValue::Bool(false));
    }

    #[test]
    fn temporal_formats() {
        assert_eq!(
            coerce_value(&col(SqlType::Date, 10), "2021-03-04").unwrap().value,
            BoundValue::Date(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap())
        );
        assert_eq!(
            coerce_value(&col(SqlType::Time, 8), "23:05:09").unwrap().value,
            BoundValue::Time(NaiveTime::from_hms_opt(23, 5, 9).unwrap())
        );
        assert_eq!(
            coerce_value(&col(SqlType::Timestamp, 23), "2021-03-04 01:02:03").unwrap().value,
            BoundValue::Timestamp(
                NaiveDate::from_ymd_opt(2021, 3, 4)
                    .unwrap()
                    .and_hms_opt(1, 2, 3)
                    .unwrap()
            )
        );
        assert!(coerce_value(&col(SqlType::Date, 10), "04/03/2021").is_err());
        assert!(coerce_value(&col(SqlType::Time, 8), "25:00:00").is_err());
    }

    #[test]
    fn long_text_is_truncated_with_warning() {
        let c = ColumnDescriptor::new("code", SqlType::VarChar, 4);
        let coerced = coerce_value(&c, "ABCDEFG").unwrap();
        assert_eq!(coerced.value, BoundValue::Text("ABCD".into()));
        assert_eq!(
            coerced.warning,
            Some(TruncationWarning {
                column: "code".into(),
                max_length: 4
            })
        );

        let exact = coerce_value(&c, "ABCD").unwrap();
        assert!(exact.warning.is_none());
    }

    #[test]
    fn truncation_counts_characters() {
        let c = col(SqlType::NVarChar, 3);
        let coerced = coerce_value(&c, "ãéîõü").unwrap();
        assert_eq!(coerced.value, BoundValue::Text("ãéî".into()));
    }

    #[test]
    fn truncation_counts_utf16_code_units() {
        let c = col(SqlType::NVarChar, 3);

        let fits = coerce_value(&c, "a😀").unwrap();
        assert_eq!(fits.value, BoundValue::Text("a😀".into()));
        assert!(fits.warning.is_none());

        let coerced = coerce_value(&c, "ab😀c").unwrap();
        assert_eq!(coerced.value, BoundValue::Text("ab".into()));
        assert!(coerced.warning.is_some());
    }

    #[test]
    fn unbounded_text_is_never_truncated() {
        let long = "x".repeat(10_000);
        let coerced = coerce_value(&col(SqlType::LongVarChar, 0), &long).unwrap();
        assert_eq!(coerced.value, BoundValue::Text(long));
        assert!(coerced.warning.is_none());
    }

    #[test]
    fn empty_input_binds_typed_null() {
        for t in [SqlType::Integer, SqlType::Date, SqlType::VarChar, SqlType::Other(-3)] {
            assert_eq!(coerce_value(&col(t, 1), "").unwrap().value, BoundValue::Null(t));
        }
    }

    #[test]
    fn unrecognized_types_bind_raw_text() {
        let coerced = coerce_value(&col(SqlType::Other(-3), 2), "0xDEADBEEF").unwrap();
        assert_eq!(coerced.value, BoundValue::Text("0xDEADBEEF".into()));
        assert!(coerced.warning.is_none());
    }

    #[test]
    fn form_reports_every_bad_column() {
        let columns = vec![
            ColumnDescriptor::new("id", SqlType::Integer, 10),
            ColumnDescriptor::new("name", SqlType::VarChar, 3),
            ColumnDescriptor::new("price", SqlType::Decimal, 10),
        ];
        let mut form = PendingInsertForm::new();
        form.set(0, "one");
        form.set(1, "abcdef");
        form.set(2, "x");

        let errors = coerce_form(&columns, &form).unwrap_err();
        let names: Vec<_> = errors.iter().map(|e| e.column.as_str()).collect();
        assert_eq!(names, ["id", "price"]);

        form.set(0, "1");
        form.set(2, "9,99");
        let row = coerce_form(&columns, &form).unwrap();
        assert_eq!(
            row.values,
            vec![
                BoundValue::Int(1),
                BoundValue::Text("abc".into()),
                BoundValue::Double(9.99)
            ]
        );
        assert_eq!(row.warnings.len(), 1);
    }
}
