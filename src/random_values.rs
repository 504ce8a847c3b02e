// ============================================================================
// L2.5: RANDOM VALUE SUBSYSTEM
// ============================================================================
use rand::Rng;
use uuid::Uuid;

use crate::model::ColumnDescriptor;
use crate::sql_types::TypeClass;

const FIRST_YEAR: i32 = 2000;
const YEAR_SPAN: i32 = 24;

/// Produces a plausible literal for `column`, in the same text form the
/// coercion engine accepts.
pub fn generate_value<R: Rng + ?Sized>(column: &ColumnDescriptor, rng: &mut R) -> String {
    match column.sql_type.class() {
        TypeClass::Integer => rng.gen_range(0..100).to_string(),
        TypeClass::BigInteger => rng.gen_range(-9_999i64..=9_999).to_string(),
        TypeClass::Decimal => format!("{:.2}", rng.gen_range(0.0..100.0f64)),
        TypeClass::Boolean => (if rng.gen_bool(0.5) { "1" } else { "0" }).to_string(),
        TypeClass::Text => {
            let text = format!("Text_{}", short_hex(6));
            truncate_chars(text, column.max_length)
        }
        TypeClass::Date => {
            let (year, month, day) = random_date(rng);
            format!("{:04}-{:02}-{:02}", year, month, day)
        }
        TypeClass::Time => {
            let (hour, minute, second) = random_time(rng);
            format!("{:02}:{:02}:{:02}", hour, minute, second)
        }
        TypeClass::Timestamp => {
            let (year, month, day) = random_date(rng);
            let (hour, minute, second) = random_time(rng);
            format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            )
        }
        TypeClass::Unrecognized => format!("Value_{}", &Uuid::new_v4().to_string()[..4]),
    }
}

fn random_date<R: Rng + ?Sized>(rng: &mut R) -> (i32, u32, u32) {
    (
        FIRST_YEAR + rng.gen_range(0..YEAR_SPAN),
        rng.gen_range(1..=12),
        rng.gen_range(1..=28),
    )
}

fn random_time<R: Rng + ?Sized>(rng: &mut R) -> (u32, u32, u32) {
    (rng.gen_range(0..24), rng.gen_range(0..60), rng.gen_range(0..60))
}

fn short_hex(len: usize) -> String {
    Uuid::new_v4().simple().to_string()[..len].to_string()
}

fn truncate_chars(text: String, max_length: u32) -> String {
    if max_length == 0 {
        return text;
    }
    text.chars().take(max_length as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion::coerce_value;
    use crate::sql_types::SqlType;
    use rand::{SeedableRng, rngs::StdRng};

    const ALL_TYPES: [SqlType; 21] = [
        SqlType::Bit,
        SqlType::TinyInt,
        SqlType::SmallInt,
        SqlType::Integer,
        SqlType::BigInt,
        SqlType::Float,
        SqlType::Real,
        SqlType::Double,
        SqlType::Numeric,
        SqlType::Decimal,
        SqlType::Char,
        SqlType::VarChar,
        SqlType::LongVarChar,
        SqlType::NChar,
        SqlType::NVarChar,
        SqlType::LongNVarChar,
        SqlType::Date,
        SqlType::Time,
        SqlType::Timestamp,
        SqlType::Boolean,
        SqlType::Other(1111),
    ];

    #[test]
    fn bounded_text_never_exceeds_declared_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for max_length in 1..=15 {
            let column = ColumnDescriptor::new("name", SqlType::NVarChar, max_length);
            for _ in 0..20 {
                let value = generate_value(&column, &mut rng);
                assert!(value.chars().count() <= max_length as usize, "{value}");
            }
        }
    }

    #[test]
    fn unbounded_text_keeps_full_prefix() {
        let mut rng = StdRng::seed_from_u64(1);
        let column = ColumnDescriptor::new("note", SqlType::LongVarChar, 0);
        let value = generate_value(&column, &mut rng);
        assert!(value.starts_with("Text_"));
        assert_eq!(value.len(), 11);
    }

    #[test]
    fn generated_values_pass_coercion() {
        let mut rng = StdRng::seed_from_u64(42);
        for sql_type in ALL_TYPES {
            let column = ColumnDescriptor::new("c", sql_type, 30);
            for _ in 0..50 {
                let value = generate_value(&column, &mut rng);
                assert!(
                    coerce_value(&column, &value).is_ok(),
                    "{sql_type:?} produced {value}"
                );
            }
        }
    }

    #[test]
    fn numeric_ranges_are_small() {
        let mut rng = StdRng::seed_from_u64(3);
        let narrow = ColumnDescriptor::new("n", SqlType::TinyInt, 3);
        let wide = ColumnDescriptor::new("w", SqlType::BigInt, 19);
        for _ in 0..200 {
            let n: i32 = generate_value(&narrow, &mut rng).parse().unwrap();
            assert!((0..100).contains(&n));
            let w: i64 = generate_value(&wide, &mut rng).parse().unwrap();
            assert!((-9_999..=9_999).contains(&w));
        }
    }

    #[test]
    fn dates_stay_in_window() {
        let mut rng = StdRng::seed_from_u64(9);
        let column = ColumnDescriptor::new("d", SqlType::Date, 10);
        for _ in 0..200 {
            let value = generate_value(&column, &mut rng);
            let year: i32 = value[..4].parse().unwrap();
            assert!((2000..2024).contains(&year));
        }
    }
}
