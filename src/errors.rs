//! # Error Handling
//!
//! Every failure a [`CrudService`](crate::CrudService) reports is a [`CrudError`].
//! Callers branch on the variant, never on the message:
//!
//! - [`CrudError::EntityNotFound`] → 404
//! - [`CrudError::ValidationFailed`] / [`CrudError::OperationNotSupported`] → 400
//! - [`CrudError::Duplicate`] → 409
//! - [`CrudError::BulkOperation`] → 422, with one entry per failed item
//! - everything else → 500
//!
//! The error implements axum's `IntoResponse`, so handlers can return it
//! directly. Internal details (database errors, broken post-conditions) are
//! logged with `tracing` and never sent to the client.
//!
//! ```rust,ignore
//! async fn get_article(
//!     State(service): State<Arc<CrudService<ArticleOperations>>>,
//!     Path(id): Path<i32>,
//! ) -> Result<Json<article::Model>, CrudError> {
//!     let found = service.find(id, &OperationOptions::default()).await?;
//!     found
//!         .map(Json)
//!         .ok_or_else(|| CrudError::not_found("Article", id.to_string()))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr, Value};
use serde::Serialize;
use std::fmt;

use crate::core::schema::display_value;
use crate::validation::{ValidationError, ValidationErrors};

/// Identifies the item of a batch that failed.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkItemKey {
    /// Position of the item in the input (used by `mass_create`)
    Index(usize),
    /// Primary key of the item (used by the id-based batch operations)
    Id(Value),
}

impl fmt::Display for BulkItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "index {index}"),
            Self::Id(id) => write!(f, "id {}", display_value(id)),
        }
    }
}

/// One failed item of a batch.
#[derive(Debug)]
pub struct BulkItemError {
    pub key: BulkItemKey,
    pub error: CrudError,
}

/// Error type for every CRUD operation.
#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    /// The service could not be constructed from its configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// No (non-deleted) row has the requested primary key.
    #[error("{entity} with id {id} not found")]
    EntityNotFound { entity: String, id: String },

    /// The entity's configuration disables this operation.
    #[error("{0}")]
    OperationNotSupported(String),

    /// Raised by entity validators.
    #[error("{}", validation_summary(.errors))]
    ValidationFailed { errors: Vec<ValidationError> },

    /// A unique constraint rejected the write.
    #[error("{entity} already exists")]
    Duplicate { entity: String, detail: String },

    /// At least one item of a batch failed; the batch was rolled back.
    #[error("{message}. {} error(s) occurred", .errors.len())]
    BulkOperation {
        message: String,
        errors: Vec<BulkItemError>,
    },

    /// The database reported success but the written row cannot be observed.
    #[error("{0}")]
    OperationFailed(String),

    /// Beginning or committing a transaction failed.
    #[error("transaction failed")]
    Transaction(#[source] DbErr),

    #[error("a database error occurred")]
    Database(#[from] DbErr),
}

fn validation_summary(errors: &[ValidationError]) -> String {
    match errors {
        [single] => single.to_string(),
        _ => format!(
            "Validation failed: {}",
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

impl CrudError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub(crate) fn not_found_value(entity: &str, id: &Value) -> Self {
        Self::not_found(entity, display_value(id))
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::OperationNotSupported(message.into())
    }

    /// Single-field validation failure
    ///
    /// # Example
    /// ```rust,ignore
    /// return Err(CrudError::validation("title", "Title is required"));
    /// ```
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            errors: vec![ValidationError::new(field, message)],
        }
    }

    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed(message.into())
    }

    /// Translates a write error, turning unique-constraint violations into
    /// [`CrudError::Duplicate`].
    pub(crate) fn from_write(entity: &str, err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Duplicate {
                entity: entity.to_string(),
                detail,
            },
            _ => Self::Database(err),
        }
    }

    /// HTTP status a boundary layer should answer with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EntityNotFound { .. } => StatusCode::NOT_FOUND,
            Self::OperationNotSupported(_) | Self::ValidationFailed { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Duplicate { .. } => StatusCode::CONFLICT,
            Self::BulkOperation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Configuration(_)
            | Self::OperationFailed(_)
            | Self::Transaction(_)
            | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Sanitized message that is safe to send to clients.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) | Self::OperationFailed(_) => {
                "Internal server error".to_string()
            }
            Self::Transaction(_) | Self::Database(_) => "A database error occurred".to_string(),
            _ => self.to_string(),
        }
    }

    fn details(&self) -> Option<Vec<String>> {
        match self {
            Self::ValidationFailed { errors } => {
                Some(errors.iter().map(ToString::to_string).collect())
            }
            Self::BulkOperation { errors, .. } => Some(
                errors
                    .iter()
                    .map(|item| format!("{}: {}", item.key, item.error.user_message()))
                    .collect(),
            ),
            _ => None,
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database(internal) | Self::Transaction(internal) => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Configuration(details) | Self::OperationFailed(details) => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            Self::Duplicate { detail, .. } => {
                tracing::debug!(detail = %detail, "Unique constraint violated");
            }
            Self::BulkOperation { errors, .. } => {
                for item in errors {
                    item.error.log_internal();
                }
            }
            _ => {
                tracing::debug!(
                    error = %self,
                    status = %self.status_code(),
                    "CRUD error"
                );
            }
        }
    }
}

impl From<ValidationError> for CrudError {
    fn from(error: ValidationError) -> Self {
        Self::ValidationFailed {
            errors: vec![error],
        }
    }
}

impl From<ValidationErrors> for CrudError {
    fn from(errors: ValidationErrors) -> Self {
        Self::ValidationFailed {
            errors: errors.into_errors(),
        }
    }
}

/// Error body sent to clients
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for CrudError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}
