//! Typed filter expressions.
//!
//! A [`FilterExpression`] is an ordered list of per-field predicates that are
//! combined with AND. It is either parsed from a loosely-typed JSON object
//! (the shape HTTP layers receive) or built in code:
//!
//! ```rust
//! use serde_json::json;
//! use tablecrud::filtering::{CompareOp, FilterExpression};
//!
//! let parsed = FilterExpression::from_json(&json!({
//!     "views": { "gte": 18, "lt": 65 },
//!     "author": ["ada", "grace"],
//!     "deleted_at": null
//! })).unwrap();
//!
//! let built = FilterExpression::new()
//!     .compare("views", CompareOp::Gte, 18)
//!     .compare("views", CompareOp::Lt, 65)
//!     .is_in("author", ["ada", "grace"]);
//!
//! assert_eq!(parsed, built);
//! ```
//!
//! JSON parsing rules, per field value:
//!
//! | value | predicate |
//! |---|---|
//! | `null` | none, the field is skipped |
//! | array | [`FilterPredicate::Membership`] |
//! | string | [`FilterPredicate::Text`] |
//! | number / bool | [`FilterPredicate::Equals`] |
//! | object | one predicate per recognized operator key |
//!
//! Operator keys are `gt`, `gte`, `lt`, `lte`, `neq`, `like`, `ilike`, `in`,
//! `isNull` and `isNotNull`. Unknown keys and operators with a `null` operand
//! are ignored.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

use crate::errors::CrudError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    /// Exact match on a non-string value
    Equals(JsonValue),
    /// Plain string value. Exact match when string matching is case
    /// sensitive, otherwise a case-insensitive substring match.
    Text(String),
    Compare { op: CompareOp, value: JsonValue },
    Membership(Vec<JsonValue>),
    NullCheck { is_null: bool },
    /// `pattern` is matched anywhere in the column; wildcards in it are literal.
    Substring {
        pattern: String,
        case_insensitive: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub predicate: FilterPredicate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression(Vec<FieldFilter>);

impl FilterExpression {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON filter object. `null` is the empty filter.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::ValidationFailed`] when `json` is neither an
    /// object nor `null`.
    pub fn from_json(json: &JsonValue) -> Result<Self, CrudError> {
        match json {
            JsonValue::Null => Ok(Self::new()),
            JsonValue::Object(map) => Ok(Self::from_map(map)),
            _ => Err(CrudError::validation("filter", "Filter must be a JSON object")),
        }
    }

    /// Parses the fields of a JSON filter object in document order.
    #[must_use]
    pub fn from_map(map: &Map<String, JsonValue>) -> Self {
        let mut expression = Self::new();
        for (field, value) in map {
            match value {
                JsonValue::Null => {}
                JsonValue::Array(items) => {
                    expression.push(field, FilterPredicate::Membership(items.clone()));
                }
                JsonValue::String(text) => {
                    expression.push(field, FilterPredicate::Text(text.clone()));
                }
                JsonValue::Object(operators) => expression.push_operators(field, operators),
                JsonValue::Bool(_) | JsonValue::Number(_) => {
                    expression.push(field, FilterPredicate::Equals(value.clone()));
                }
            }
        }
        expression
    }

    fn push_operators(&mut self, field: &str, operators: &Map<String, JsonValue>) {
        for (op, operand) in operators {
            if operand.is_null() {
                continue;
            }
            let predicate = match op.as_str() {
                "gt" => compare(CompareOp::Gt, operand),
                "gte" => compare(CompareOp::Gte, operand),
                "lt" => compare(CompareOp::Lt, operand),
                "lte" => compare(CompareOp::Lte, operand),
                "neq" => compare(CompareOp::Ne, operand),
                "like" => substring(operand, false),
                "ilike" => substring(operand, true),
                "in" => FilterPredicate::Membership(match operand {
                    JsonValue::Array(items) => items.clone(),
                    scalar => vec![scalar.clone()],
                }),
                "isNull" => FilterPredicate::NullCheck {
                    is_null: is_truthy(operand),
                },
                "isNotNull" => FilterPredicate::NullCheck {
                    is_null: !is_truthy(operand),
                },
                unknown => {
                    tracing::debug!(field, operator = unknown, "Ignoring unknown filter operator");
                    continue;
                }
            };
            self.push(field, predicate);
        }
    }

    pub fn push(&mut self, field: impl Into<String>, predicate: FilterPredicate) {
        self.0.push(FieldFilter {
            field: field.into(),
            predicate,
        });
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, predicate: FilterPredicate) -> Self {
        self.push(field, predicate);
        self
    }

    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        match value.into() {
            JsonValue::String(text) => self.with(field, FilterPredicate::Text(text)),
            value => self.with(field, FilterPredicate::Equals(value)),
        }
    }

    #[must_use]
    pub fn compare(self, field: impl Into<String>, op: CompareOp, value: impl Into<JsonValue>) -> Self {
        self.with(
            field,
            FilterPredicate::Compare {
                op,
                value: value.into(),
            },
        )
    }

    #[must_use]
    pub fn gt(self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.compare(field, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.compare(field, CompareOp::Gte, value)
    }

    #[must_use]
    pub fn lt(self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.compare(field, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.compare(field, CompareOp::Lte, value)
    }

    #[must_use]
    pub fn is_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.with(field, FilterPredicate::Membership(values))
    }

    #[must_use]
    pub fn is_null(self, field: impl Into<String>) -> Self {
        self.with(field, FilterPredicate::NullCheck { is_null: true })
    }

    #[must_use]
    pub fn is_not_null(self, field: impl Into<String>) -> Self {
        self.with(field, FilterPredicate::NullCheck { is_null: false })
    }

    #[must_use]
    pub fn like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.with(
            field,
            FilterPredicate::Substring {
                pattern: pattern.into(),
                case_insensitive: false,
            },
        )
    }

    #[must_use]
    pub fn ilike(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.with(
            field,
            FilterPredicate::Substring {
                pattern: pattern.into(),
                case_insensitive: true,
            },
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldFilter> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a FilterExpression {
    type Item = &'a FieldFilter;
    type IntoIter = std::slice::Iter<'a, FieldFilter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for FilterExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Option::<Map<String, JsonValue>>::deserialize(deserializer)?;
        Ok(map.as_ref().map(Self::from_map).unwrap_or_default())
    }
}

fn compare(op: CompareOp, operand: &JsonValue) -> FilterPredicate {
    FilterPredicate::Compare {
        op,
        value: operand.clone(),
    }
}

fn substring(operand: &JsonValue, case_insensitive: bool) -> FilterPredicate {
    let pattern = match operand {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    };
    FilterPredicate::Substring {
        pattern,
        case_insensitive,
    }
}

fn is_truthy(operand: &JsonValue) -> bool {
    !matches!(operand, JsonValue::Bool(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(json: JsonValue) -> Vec<FieldFilter> {
        FilterExpression::from_json(&json).unwrap().0
    }

    #[test]
    fn test_value_shapes() {
        let filters = parse(json!({
            "title": "rust",
            "views": 10,
            "published": true,
            "author": ["ada", "grace"],
            "deleted_at": null
        }));

        let predicates: Vec<_> = filters.iter().map(|f| (f.field.as_str(), &f.predicate)).collect();
        assert_eq!(
            predicates,
            vec![
                ("title", &FilterPredicate::Text("rust".into())),
                ("views", &FilterPredicate::Equals(json!(10))),
                ("published", &FilterPredicate::Equals(json!(true))),
                (
                    "author",
                    &FilterPredicate::Membership(vec![json!("ada"), json!("grace")])
                ),
            ]
        );
    }

    #[test]
    fn test_range_operators_keep_document_order() {
        let filters = parse(json!({"age": {"gte": 18, "lt": 65}}));
        assert_eq!(
            filters,
            vec![
                FieldFilter {
                    field: "age".into(),
                    predicate: FilterPredicate::Compare {
                        op: CompareOp::Gte,
                        value: json!(18)
                    }
                },
                FieldFilter {
                    field: "age".into(),
                    predicate: FilterPredicate::Compare {
                        op: CompareOp::Lt,
                        value: json!(65)
                    }
                },
            ]
        );
    }

    #[test]
    fn test_unknown_operators_and_null_operands_are_ignored() {
        let filters = parse(json!({"age": {"between": [1, 2], "gt": null, "neq": 3}}));
        assert_eq!(filters.len(), 1);
        assert_eq!(
            filters[0].predicate,
            FilterPredicate::Compare {
                op: CompareOp::Ne,
                value: json!(3)
            }
        );
    }

    #[test]
    fn test_null_checks() {
        let filters = parse(json!({
            "a": {"isNull": true},
            "b": {"isNotNull": true},
            "c": {"isNull": false},
            "d": {"isNotNull": false}
        }));
        let flags: Vec<bool> = filters
            .iter()
            .map(|f| match f.predicate {
                FilterPredicate::NullCheck { is_null } => is_null,
                _ => panic!("expected null check"),
            })
            .collect();
        assert_eq!(flags, vec![true, false, false, true]);
    }

    #[test]
    fn test_like_and_in_operands() {
        let filters = parse(json!({"title": {"like": "Ru", "ilike": 42, "in": "solo"}}));
        assert_eq!(
            filters[0].predicate,
            FilterPredicate::Substring {
                pattern: "Ru".into(),
                case_insensitive: false
            }
        );
        assert_eq!(
            filters[1].predicate,
            FilterPredicate::Substring {
                pattern: "42".into(),
                case_insensitive: true
            }
        );
        assert_eq!(filters[2].predicate, FilterPredicate::Membership(vec![json!("solo")]));
    }

    #[test]
    fn test_non_object_filter_is_rejected() {
        assert!(FilterExpression::from_json(&JsonValue::Null).unwrap().is_empty());
        assert!(matches!(
            FilterExpression::from_json(&json!([1, 2])),
            Err(CrudError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_deserialize() {
        let expression: FilterExpression =
            serde_json::from_value(json!({"views": {"gt": 5}})).unwrap();
        assert_eq!(expression, FilterExpression::new().compare("views", CompareOp::Gt, 5));

        let empty: FilterExpression = serde_json::from_value(JsonValue::Null).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_builder_eq_routes_strings_to_text() {
        let expression = FilterExpression::new().eq("title", "rust").eq("views", 3);
        let predicates: Vec<_> = expression.iter().map(|f| f.predicate.clone()).collect();
        assert_eq!(
            predicates,
            vec![
                FilterPredicate::Text("rust".into()),
                FilterPredicate::Equals(json!(3))
            ]
        );
    }
}
