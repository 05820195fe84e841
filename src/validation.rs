//! Field errors reported through [`CrudError::ValidationFailed`].
//!
//! Entity validators usually collect every problem of a payload before
//! failing, so the caller can fix them in one go:
//!
//! ```rust
//! use tablecrud::{CrudError, ValidationErrors};
//!
//! fn check_article(title: &str, views: i64) -> Result<(), CrudError> {
//!     ValidationErrors::new()
//!         .required("title", title)
//!         .length("title", title, 3..=120)
//!         .range("views", views, 0..=i64::MAX)
//!         .finish()
//! }
//!
//! assert!(check_article("Rust tips", 3).is_ok());
//! let err = check_article("", -1).unwrap_err();
//! assert!(matches!(err, CrudError::ValidationFailed { ref errors } if errors.len() == 2));
//! ```

use serde::Serialize;
use std::{fmt, ops::RangeInclusive};

use crate::errors::CrudError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Accumulates field errors; see the module docs.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError::new(field, message));
    }

    /// Fails blank (empty or whitespace-only) values.
    #[must_use]
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.add(field, "is required");
        }
        self
    }

    /// Checks the length in characters, not bytes. Blank values are left to
    /// [`ValidationErrors::required`].
    #[must_use]
    pub fn length(mut self, field: &str, value: &str, bounds: RangeInclusive<usize>) -> Self {
        if value.trim().is_empty() {
            return self;
        }
        let len = value.chars().count();
        if !bounds.contains(&len) {
            self.add(
                field,
                format!(
                    "must be between {} and {} characters long",
                    bounds.start(),
                    bounds.end()
                ),
            );
        }
        self
    }

    #[must_use]
    pub fn range<T: PartialOrd + fmt::Display>(
        mut self,
        field: &str,
        value: T,
        bounds: RangeInclusive<T>,
    ) -> Self {
        if !bounds.contains(&value) {
            self.add(
                field,
                format!("must be between {} and {}", bounds.start(), bounds.end()),
            );
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.0
    }

    /// # Errors
    ///
    /// [`CrudError::ValidationFailed`] with every recorded error, if any.
    pub fn finish(self) -> Result<(), CrudError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

impl Extend<ValidationError> for ValidationErrors {
    fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checks_accumulate_in_order() {
        let errors = ValidationErrors::new()
            .required("title", " ")
            .range("views", -5, 0..=100)
            .required("slug", "ok");

        let fields: Vec<&str> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["title", "views"]);
        assert!(errors.finish().is_err());
    }

    #[test]
    fn test_length_counts_characters_and_skips_blank() {
        assert_eq!(ValidationErrors::new().length("name", "äöü", 3..=3).len(), 0);
        assert_eq!(ValidationErrors::new().length("name", "ab", 3..=10).len(), 1);
        assert_eq!(ValidationErrors::new().length("name", "", 3..=10).len(), 0);
    }

    #[test]
    fn test_finish_without_errors_is_ok() {
        assert!(ValidationErrors::new().range("views", 5, 0..=10).finish().is_ok());
    }

    #[test]
    fn test_serializes_as_list() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "is required");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!([{"field": "title", "message": "is required"}])
        );
    }
}
