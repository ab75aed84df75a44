//! Row decoding into column-name keyed values.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Backend-specific decoders handle the actual value extraction
//!
//! MySQL is classified by the declared column type. SQLite is classified by
//! the storage class of each value, since its declared types are only
//! affinities.

use crate::config::Backend;
use crate::models::{Row, Value};
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row as SqlxRow, Type, TypeInfo, ValueRef};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Temporal,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, backend: Backend) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower == "null" {
        return TypeCategory::Unknown;
    }

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC is actually a float
        if backend == Backend::SQLite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    if matches!(lower.as_str(), "datetime" | "timestamp" | "date" | "time") {
        return TypeCategory::Temporal;
    }

    if lower.contains("int") || lower.contains("tiny") || lower == "year" {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    if lower.contains("blob") || lower.contains("binary") {
        return TypeCategory::Binary;
    }

    if lower.contains("char") || lower.contains("text") || lower == "enum" || lower == "set" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL/NUMERIC values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Row to Values Trait
// =============================================================================

/// Trait for converting database rows to column-name keyed maps.
pub trait RowToValues {
    fn to_values(&self) -> Row;
}

impl RowToValues for MySqlRow {
    fn to_values(&self) -> Row {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name(), Backend::MySql);
                (col.name().to_string(), mysql::decode_column(self, idx, category))
            })
            .collect()
    }
}

impl RowToValues for SqliteRow {
    fn to_values(&self) -> Row {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| (col.name().to_string(), sqlite::decode_column(self, idx)))
            .collect()
    }
}

// =============================================================================
// Backend-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> Value {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => decode_binary(row, idx),
            TypeCategory::Temporal => decode_temporal(row, idx),
            _ => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &MySqlRow, idx: usize) -> Value {
        match row.try_get::<Option<RawDecimal>, _>(idx) {
            Ok(Some(v)) => Value::String(v.0),
            Ok(None) => Value::Null,
            Err(e) => {
                tracing::error!("Failed to decode DECIMAL: {:?}", e);
                Value::Null
            }
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> Value {
        // Try signed types
        if let Ok(v) = row.try_get::<Option<i8>, _>(idx) {
            return v.into();
        }
        if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
            return v.into();
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return v.into();
        }
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.into();
        }
        // Try unsigned types
        if let Ok(v) = row.try_get::<Option<u8>, _>(idx) {
            return v.into();
        }
        if let Ok(v) = row.try_get::<Option<u16>, _>(idx) {
            return v.into();
        }
        if let Ok(v) = row.try_get::<Option<u32>, _>(idx) {
            return v.into();
        }
        match row.try_get::<Option<u64>, _>(idx) {
            Ok(Some(v)) => i64::try_from(v)
                .map(Value::Int)
                .unwrap_or_else(|_| Value::String(v.to_string())),
            _ => Value::Null,
        }
    }

    fn decode_boolean(row: &MySqlRow, idx: usize) -> Value {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null)
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return v.into();
        }
        if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
            return v.into();
        }
        Value::Null
    }

    fn decode_binary(row: &MySqlRow, idx: usize) -> Value {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null)
    }

    fn decode_temporal(row: &MySqlRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
            return v.map(|t| t.to_string()).into();
        }
        if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
            return v.map(|t| t.to_rfc3339()).into();
        }
        if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
            return v.map(|t| t.to_string()).into();
        }
        if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(idx) {
            return v.map(|t| t.to_string()).into();
        }
        decode_text(row, idx)
    }

    fn decode_text(row: &MySqlRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return v.into();
        }
        // JSON and some collations come back as raw bytes
        match row.try_get::<Option<Vec<u8>>, _>(idx) {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(s) => Value::String(s),
                Err(e) => Value::Bytes(e.into_bytes()),
            },
            _ => Value::Null,
        }
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(row: &SqliteRow, idx: usize) -> Value {
        let category = match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Ok(raw) => categorize_type(raw.type_info().name(), Backend::SQLite),
            Err(e) => {
                tracing::error!("Failed to read SQLite column {}: {:?}", idx, e);
                return Value::Null;
            }
        };

        match category {
            TypeCategory::Integer | TypeCategory::Boolean => row
                .try_get::<Option<i64>, _>(idx)
                .map(Value::from)
                .unwrap_or(Value::Null),
            TypeCategory::Float | TypeCategory::Decimal => row
                .try_get::<Option<f64>, _>(idx)
                .map(Value::from)
                .unwrap_or(Value::Null),
            TypeCategory::Binary => row
                .try_get::<Option<Vec<u8>>, _>(idx)
                .map(Value::from)
                .unwrap_or(Value::Null),
            _ => row
                .try_get::<Option<String>, _>(idx)
                .map(Value::from)
                .unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(
            categorize_type("INT", Backend::MySql),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("BIGINT UNSIGNED", Backend::MySql),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("TINYINT", Backend::MySql),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("INTEGER", Backend::SQLite),
            TypeCategory::Integer
        );
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(
            categorize_type("DECIMAL", Backend::MySql),
            TypeCategory::Decimal
        );
        // SQLite NUMERIC is a float
        assert_eq!(
            categorize_type("numeric", Backend::SQLite),
            TypeCategory::Float
        );
    }

    #[test]
    fn test_categorize_type_temporal() {
        assert_eq!(
            categorize_type("DATETIME", Backend::MySql),
            TypeCategory::Temporal
        );
        assert_eq!(
            categorize_type("TIMESTAMP", Backend::MySql),
            TypeCategory::Temporal
        );
        assert_eq!(categorize_type("DATE", Backend::MySql), TypeCategory::Temporal);
    }

    #[test]
    fn test_categorize_type_text_and_binary() {
        assert_eq!(categorize_type("VARCHAR", Backend::MySql), TypeCategory::Text);
        assert_eq!(categorize_type("TEXT", Backend::SQLite), TypeCategory::Text);
        assert_eq!(categorize_type("BLOB", Backend::SQLite), TypeCategory::Binary);
        assert_eq!(
            categorize_type("VARBINARY", Backend::MySql),
            TypeCategory::Binary
        );
        assert_eq!(categorize_type("REAL", Backend::SQLite), TypeCategory::Float);
        assert_eq!(categorize_type("BOOLEAN", Backend::MySql), TypeCategory::Boolean);
        assert_eq!(categorize_type("JSON", Backend::MySql), TypeCategory::Json);
        assert_eq!(categorize_type("NULL", Backend::SQLite), TypeCategory::Unknown);
    }

    #[tokio::test]
    async fn test_sqlite_row_decoding_uses_storage_class() {
        use sqlx::Connection;
        let mut conn = sqlx::SqliteConnection::connect("sqlite::memory:")
            .await
            .unwrap();
        let row = sqlx::query(
            "select 42 as i, 1.5 as f, 'hi' as s, x'00ff' as b, null as n",
        )
        .fetch_one(&mut conn)
        .await
        .unwrap();

        let values = row.to_values();
        assert_eq!(values["i"], Value::Int(42));
        assert_eq!(values["f"], Value::Float(1.5));
        assert_eq!(values["s"], Value::String("hi".to_string()));
        assert_eq!(values["b"], Value::Bytes(vec![0x00, 0xff]));
        assert_eq!(values["n"], Value::Null);
    }
}
