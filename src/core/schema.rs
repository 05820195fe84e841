//! Table-schema adapter: the only place that looks at column metadata.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{
    ColumnTrait, ColumnType, EntityTrait, IdenStatic, Iterable, JsonValue, Value,
    sea_query::{PostgresQueryBuilder, QueryBuilder},
};
use uuid::Uuid;

use crate::config::Dialect;

/// How values for a column are coerced and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueKind {
    Text,
    /// Database enums: text-like but need a cast before string functions
    Enum,
    Integer,
    Float,
    Boolean,
    Uuid,
    TimestampTz,
    Timestamp,
    Date,
    Json,
    Other,
}

impl ValueKind {
    pub(crate) fn of<C: ColumnTrait>(column: C) -> Self {
        match column.def().get_column_type() {
            ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => Self::Text,
            ColumnType::Enum { .. } => Self::Enum,
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => Self::Integer,
            ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) => Self::Float,
            ColumnType::Boolean => Self::Boolean,
            ColumnType::Uuid => Self::Uuid,
            ColumnType::TimestampWithTimeZone => Self::TimestampTz,
            ColumnType::DateTime | ColumnType::Timestamp => Self::Timestamp,
            ColumnType::Date => Self::Date,
            ColumnType::Json | ColumnType::JsonBinary => Self::Json,
            _ => Self::Other,
        }
    }

    pub(crate) const fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::Enum)
    }
}

/// Looks a column of `E` up by its database name.
#[must_use]
pub fn find_column<E: EntityTrait>(name: &str) -> Option<E::Column> {
    E::Column::iter().find(|column| column.as_str() == name)
}

/// Converts an untyped JSON value into a bind value suited to `kind`.
///
/// Returns `None` for JSON `null` and for arrays/objects aimed at non-JSON
/// columns.
pub(crate) fn json_to_value(kind: ValueKind, json: &JsonValue) -> Option<Value> {
    match json {
        JsonValue::Null => None,
        _ if kind == ValueKind::Json => Some(Value::from(json.clone())),
        JsonValue::Bool(flag) => Some(Value::from(*flag)),
        JsonValue::Number(number) => number
            .as_i64()
            .map(Value::from)
            .or_else(|| number.as_f64().map(Value::from)),
        JsonValue::String(text) => Some(string_to_value(kind, text)),
        JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

/// Strings that do not parse as the column's type are bound as text.
fn string_to_value(kind: ValueKind, text: &str) -> Value {
    let parsed = match kind {
        ValueKind::Integer => text.trim().parse::<i64>().ok().map(Value::from),
        ValueKind::Float => text.trim().parse::<f64>().ok().map(Value::from),
        ValueKind::Boolean => text.trim().to_ascii_lowercase().parse::<bool>().ok().map(Value::from),
        ValueKind::Uuid => Uuid::parse_str(text.trim()).ok().map(Value::from),
        ValueKind::TimestampTz => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|at| Value::from(at.with_timezone(&Utc))),
        ValueKind::Timestamp => parse_naive_datetime(text.trim()).map(Value::from),
        ValueKind::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .ok()
            .map(Value::from),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::from(text.to_string()))
}

fn parse_naive_datetime(text: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok())
}

/// Current time in the representation the column stores.
pub(crate) fn now_value(kind: ValueKind) -> Value {
    let now = Utc::now();
    match kind {
        ValueKind::Timestamp => Value::from(now.naive_utc()),
        ValueKind::Date => Value::from(now.date_naive()),
        ValueKind::Integer => Value::from(now.timestamp()),
        ValueKind::Text => Value::from(now.to_rfc3339()),
        _ => Value::from(now),
    }
}

/// Renders an id for messages: strings and uuids verbatim, everything else
/// as its SQL literal.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(Some(text)) => text.to_string(),
        Value::Uuid(Some(id)) => id.to_string(),
        other => PostgresQueryBuilder.value_to_string(other),
    }
}

/// Quotes an identifier for hand-written SQL fragments.
pub(crate) fn quote_ident(dialect: Dialect, name: &str) -> String {
    match dialect {
        Dialect::Postgresql => format!("\"{}\"", name.replace('"', "\"\"")),
        Dialect::Mysql => format!("`{}`", name.replace('`', "``")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_numbers_and_bools() {
        assert_eq!(
            json_to_value(ValueKind::Integer, &serde_json::json!(18)),
            Some(Value::from(18_i64))
        );
        assert_eq!(
            json_to_value(ValueKind::Float, &serde_json::json!(1.5)),
            Some(Value::from(1.5_f64))
        );
        assert_eq!(
            json_to_value(ValueKind::Boolean, &serde_json::json!(true)),
            Some(Value::from(true))
        );
        assert_eq!(json_to_value(ValueKind::Integer, &JsonValue::Null), None);
    }

    #[test]
    fn test_json_strings_follow_column_kind() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(
            json_to_value(ValueKind::Uuid, &serde_json::json!(id)),
            Some(Value::from(Uuid::parse_str(id).unwrap()))
        );
        assert_eq!(
            json_to_value(ValueKind::Text, &serde_json::json!(id)),
            Some(Value::from(id.to_string()))
        );
        assert_eq!(
            json_to_value(ValueKind::Uuid, &serde_json::json!("not-a-uuid")),
            Some(Value::from("not-a-uuid".to_string()))
        );

        let at = json_to_value(ValueKind::TimestampTz, &serde_json::json!("2024-01-01T00:00:00Z"));
        assert!(matches!(at, Some(Value::ChronoDateTimeUtc(Some(_)))));

        let day = json_to_value(ValueKind::Date, &serde_json::json!("2024-02-29"));
        assert!(matches!(day, Some(Value::ChronoDate(Some(_)))));
    }

    #[test]
    fn test_numeric_and_boolean_strings_are_parsed() {
        assert_eq!(
            json_to_value(ValueKind::Integer, &serde_json::json!(" 10 ")),
            Some(Value::from(10_i64))
        );
        assert_eq!(
            json_to_value(ValueKind::Float, &serde_json::json!("2.5")),
            Some(Value::from(2.5_f64))
        );
        assert_eq!(
            json_to_value(ValueKind::Boolean, &serde_json::json!("TRUE")),
            Some(Value::from(true))
        );
        assert_eq!(
            json_to_value(ValueKind::Integer, &serde_json::json!("ten")),
            Some(Value::from("ten".to_string()))
        );
        assert_eq!(
            json_to_value(ValueKind::Text, &serde_json::json!("10")),
            Some(Value::from("10".to_string()))
        );
    }

    #[test]
    fn test_json_structures_only_bind_to_json_columns() {
        let doc = serde_json::json!({"a": 1});
        assert!(json_to_value(ValueKind::Text, &doc).is_none());
        assert_eq!(
            json_to_value(ValueKind::Json, &doc),
            Some(Value::from(doc.clone()))
        );
    }

    #[test]
    fn test_now_value_kinds() {
        assert!(matches!(now_value(ValueKind::TimestampTz), Value::ChronoDateTimeUtc(Some(_))));
        assert!(matches!(now_value(ValueKind::Timestamp), Value::ChronoDateTime(Some(_))));
        assert!(matches!(now_value(ValueKind::Integer), Value::BigInt(Some(_))));
        assert!(matches!(now_value(ValueKind::Text), Value::String(Some(_))));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::from(42_i32)), "42");
        assert_eq!(display_value(&Value::from("abc".to_string())), "abc");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident(Dialect::Postgresql, "title"), "\"title\"");
        assert_eq!(quote_ident(Dialect::Mysql, "title"), "`title`");
        assert_eq!(quote_ident(Dialect::Postgresql, "we\"ird"), "\"we\"\"ird\"");
    }
}
