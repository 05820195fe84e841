use sea_orm::{
    ColumnTrait, Condition, DatabaseBackend, EntityTrait, JsonValue,
    sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr},
};
use serde_json::Map;

use super::expression::{CompareOp, FilterExpression, FilterPredicate};
use crate::core::schema::{ValueKind, find_column, json_to_value};

/// Escape LIKE wildcards so user input is matched literally
/// Escapes: \ first, then % (match any) and _ (match single char)
pub(crate) fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Builds the AND of all predicates of `filter` that target columns of `E`.
///
/// Fields that are not columns are skipped, as are `null` operands. Values are
/// coerced to the column's declared type; an operand that cannot be coerced
/// (an array aimed at a comparison, say) matches no row. With `case_sensitive == false`, plain strings on
/// textual columns match case-insensitively anywhere in the value.
#[must_use]
pub fn build_filter_condition<E: EntityTrait>(
    filter: &FilterExpression,
    case_sensitive: bool,
    backend: DatabaseBackend,
) -> Condition {
    let mut condition = Condition::all();
    for field_filter in filter {
        let Some(column) = find_column::<E>(&field_filter.field) else {
            tracing::debug!(field = %field_filter.field, "Skipping filter on unknown column");
            continue;
        };
        match predicate_expr(column, &field_filter.predicate, case_sensitive, backend) {
            Some(expr) => condition = condition.add(expr),
            None => tracing::debug!(field = %field_filter.field, "Skipping filter with a null operand"),
        }
    }
    condition
}

/// Builds the equality match used by `find_one`: every field that names a
/// column must equal its value, and `null` matches `IS NULL`. A value that
/// cannot be bound to its column matches no row.
#[must_use]
pub fn build_match_condition<E: EntityTrait>(fields: &Map<String, JsonValue>) -> Condition {
    let mut condition = Condition::all();
    for (field, value) in fields {
        let Some(column) = find_column::<E>(field) else {
            tracing::debug!(field = %field, "Skipping match on unknown column");
            continue;
        };
        condition = condition.add(if value.is_null() {
            column.is_null()
        } else {
            json_to_value(ValueKind::of(column), value)
                .map_or_else(never, |value| column.eq(value))
        });
    }
    condition
}

fn predicate_expr<C: ColumnTrait>(
    column: C,
    predicate: &FilterPredicate,
    case_sensitive: bool,
    backend: DatabaseBackend,
) -> Option<SimpleExpr> {
    let kind = ValueKind::of(column);
    let coerce = |json: &JsonValue| json_to_value(kind, json);

    let expr = match predicate {
        FilterPredicate::Equals(JsonValue::Null)
        | FilterPredicate::Compare {
            value: JsonValue::Null,
            ..
        } => return None,
        FilterPredicate::Equals(value) => coerce(value).map_or_else(never, |value| column.eq(value)),
        FilterPredicate::Text(text) if !case_sensitive && kind.is_textual() => {
            substring_expr(column, kind, text, true, backend)
        }
        FilterPredicate::Text(text) => coerce(&JsonValue::from(text.as_str()))
            .map_or_else(never, |value| column.eq(value)),
        FilterPredicate::Compare { op, value } => match coerce(value) {
            None => never(),
            Some(value) => match op {
                CompareOp::Gt => column.gt(value),
                CompareOp::Gte => column.gte(value),
                CompareOp::Lt => column.lt(value),
                CompareOp::Lte => column.lte(value),
                CompareOp::Ne => column.ne(value),
            },
        },
        FilterPredicate::Membership(values) => {
            column.is_in(values.iter().filter_map(coerce).collect::<Vec<_>>())
        }
        FilterPredicate::NullCheck { is_null: true } => column.is_null(),
        FilterPredicate::NullCheck { is_null: false } => column.is_not_null(),
        FilterPredicate::Substring {
            pattern,
            case_insensitive,
        } => substring_expr(column, kind, pattern, *case_insensitive, backend),
    };
    Some(expr)
}

/// `1 = 2`, the same predicate sea-query emits for an empty `IN` list.
fn never() -> SimpleExpr {
    Expr::val(1).eq(2)
}

/// `col LIKE '%pattern%'`, or `UPPER(col) LIKE UPPER('%pattern%')`.
///
/// PostgreSQL has no implicit text conversion, so non-text columns are cast.
fn substring_expr<C: ColumnTrait>(
    column: C,
    kind: ValueKind,
    pattern: &str,
    case_insensitive: bool,
    backend: DatabaseBackend,
) -> SimpleExpr {
    let target: SimpleExpr = if backend == DatabaseBackend::Postgres && kind != ValueKind::Text {
        Expr::col(column.as_column_ref()).cast_as(Alias::new("TEXT"))
    } else {
        Expr::col(column.as_column_ref()).into()
    };

    let escaped = escape_like_wildcards(pattern);
    if case_insensitive {
        let like = LikeExpr::new(format!("%{}%", escaped.to_uppercase())).escape('\\');
        Expr::expr(Func::upper(target)).like(like)
    } else {
        Expr::expr(target).like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
    }
}
