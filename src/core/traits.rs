use async_trait::async_trait;
use sea_orm::{EntityTrait, Value};

use crate::errors::CrudError;

/// Raw column values produced by the DTO mappers, keyed by column name.
///
/// Setting a column twice keeps the last value. Names that are not columns of
/// the entity are dropped when the statement is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    fields: Vec<(String, Value)>,
}

impl FieldValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`FieldValues::insert`].
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Like [`FieldValues::set`], skipping `None`. Handy for partial updates.
    #[must_use]
    pub fn set_some<V: Into<Value>>(mut self, column: impl Into<String>, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.insert(column, value);
        }
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl IntoIterator for FieldValues {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (column, value) in iter {
            fields.insert(column, value);
        }
        fields
    }
}

/// Per-entity capability set a [`CrudService`](crate::CrudService) is built from.
///
/// Implementors supply validation and the mapping from their create/update
/// models to raw column values; the service does everything else.
///
/// ```rust,ignore
/// pub struct ArticleOperations;
///
/// #[async_trait]
/// impl CrudOperations for ArticleOperations {
///     type Entity = article::Entity;
///     type CreateModel = ArticleCreate;
///     type UpdateModel = ArticleUpdate;
///
///     async fn validate_create(&self, data: &ArticleCreate) -> Result<(), CrudError> {
///         if data.title.trim().is_empty() {
///             return Err(CrudError::validation("title", "Title is required"));
///         }
///         Ok(())
///     }
///
///     async fn validate_update(&self, _id: &Value, _data: &ArticleUpdate) -> Result<(), CrudError> {
///         Ok(())
///     }
///
///     fn map_create(&self, data: ArticleCreate) -> FieldValues {
///         FieldValues::new().set("title", data.title).set("author", data.author)
///     }
///
///     fn map_update(&self, data: ArticleUpdate) -> FieldValues {
///         FieldValues::new().set_some("title", data.title)
///     }
/// }
/// ```
#[async_trait]
pub trait CrudOperations: Send + Sync + 'static {
    type Entity: EntityTrait<Model: Sync>;
    type CreateModel: Send + Sync + 'static;
    /// Cloned once per id by `mass_update`.
    type UpdateModel: Clone + Send + Sync + 'static;

    /// # Errors
    ///
    /// Any error aborts the create before hooks run or anything is written.
    async fn validate_create(&self, data: &Self::CreateModel) -> Result<(), CrudError>;

    /// # Errors
    ///
    /// Any error aborts the update before hooks run or anything is written.
    async fn validate_update(&self, id: &Value, data: &Self::UpdateModel) -> Result<(), CrudError>;

    fn map_create(&self, data: Self::CreateModel) -> FieldValues;

    fn map_update(&self, data: Self::UpdateModel) -> FieldValues;
}

/// Row type of the entity behind `O`.
pub type ModelOf<O> = <<O as CrudOperations>::Entity as EntityTrait>::Model;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_values_last_write_wins() {
        let mut fields = FieldValues::new().set("title", "first").set("views", 1);
        fields.insert("title", "second");

        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("title"), Some(&Value::from("second")));
        assert!(fields.contains("views"));
        assert!(!fields.contains("author"));
    }

    #[test]
    fn test_field_values_set_some_skips_none() {
        let fields = FieldValues::new()
            .set_some("title", Some("kept"))
            .set_some::<i32>("views", None);

        assert_eq!(fields.len(), 1);
        assert!(fields.get("views").is_none());
    }

    #[test]
    fn test_field_values_from_iterator_preserves_order() {
        let fields: FieldValues = vec![("b", 2), ("a", 1)].into_iter().collect();
        let names: Vec<&str> = fields.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
