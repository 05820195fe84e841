//! # Service Configuration
//!
//! [`CrudConfig`] is the caller-facing, fully defaulted configuration of one
//! entity service. It can be built in code or deserialized; every nested
//! policy is `#[serde(default)]`, so overriding one field of a policy keeps
//! the defaults of its siblings:
//!
//! ```rust
//! use tablecrud::config::CrudConfig;
//!
//! let config: CrudConfig = serde_json::from_str(r#"{
//!     "dialect": "mysql",
//!     "pagination": { "max_limit": 50 }
//! }"#).unwrap();
//! assert_eq!(config.pagination.default_limit, 20);
//! assert_eq!(config.pagination.max_limit, 50);
//! ```
//!
//! [`ResolvedConfig`] is the validated, immutable form a service runs with:
//! column names are resolved against the entity and dialect quirks applied.

use sea_orm::{EntityTrait, Iterable};
use serde::{Deserialize, Serialize};

use crate::core::schema::find_column;
use crate::errors::CrudError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgresql,
    Mysql,
}

impl Dialect {
    /// Whether the engine can return written rows from the same statement.
    #[must_use]
    pub const fn supports_returning(self) -> bool {
        matches!(self, Self::Postgresql)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryKeyKind {
    #[default]
    Serial,
    Bigserial,
    Int,
    Bigint,
    Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftDeletePolicy {
    pub enabled: bool,
    pub column: String,
}

impl Default for SoftDeletePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            column: "deleted_at".to_string(),
        }
    }
}

/// Columns stamped with the current time on writes. `None` disables a stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampPolicy {
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Default for TimestampPolicy {
    fn default() -> Self {
        Self {
            created_at: Some("created_at".to_string()),
            updated_at: Some("updated_at".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationPolicy {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectCapabilities {
    /// When false, plain string filters become case-insensitive substring matches.
    pub case_sensitive: bool,
    pub use_returning: bool,
    pub json_support: bool,
    pub full_text_search: bool,
}

impl Default for DialectCapabilities {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            use_returning: true,
            json_support: true,
            full_text_search: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrudConfig {
    pub dialect: Dialect,
    /// Name used in error messages. Defaults to the table name.
    pub entity_name: Option<String>,
    pub primary_key: String,
    pub primary_key_kind: PrimaryKeyKind,
    pub soft_delete: SoftDeletePolicy,
    pub timestamps: TimestampPolicy,
    pub pagination: PaginationPolicy,
    pub capabilities: DialectCapabilities,
    /// Text-search configuration (PostgreSQL `regconfig`) used by full-text search.
    pub full_text_language: String,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            entity_name: None,
            primary_key: "id".to_string(),
            primary_key_kind: PrimaryKeyKind::default(),
            soft_delete: SoftDeletePolicy::default(),
            timestamps: TimestampPolicy::default(),
            pagination: PaginationPolicy::default(),
            capabilities: DialectCapabilities::default(),
            full_text_language: "english".to_string(),
        }
    }
}

impl CrudConfig {
    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn primary_key(mut self, column: impl Into<String>, kind: PrimaryKeyKind) -> Self {
        self.primary_key = column.into();
        self.primary_key_kind = kind;
        self
    }

    #[must_use]
    pub fn soft_delete_column(mut self, column: impl Into<String>) -> Self {
        self.soft_delete = SoftDeletePolicy {
            enabled: true,
            column: column.into(),
        };
        self
    }

    #[must_use]
    pub fn without_soft_delete(mut self) -> Self {
        self.soft_delete.enabled = false;
        self
    }

    #[must_use]
    pub fn timestamps(mut self, created_at: Option<&str>, updated_at: Option<&str>) -> Self {
        self.timestamps = TimestampPolicy {
            created_at: created_at.map(str::to_string),
            updated_at: updated_at.map(str::to_string),
        };
        self
    }

    #[must_use]
    pub fn pagination(mut self, default_limit: u64, max_limit: u64) -> Self {
        self.pagination = PaginationPolicy {
            default_limit,
            max_limit,
        };
        self
    }

    #[must_use]
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.capabilities.case_sensitive = case_sensitive;
        self
    }

    #[must_use]
    pub fn use_returning(mut self, use_returning: bool) -> Self {
        self.capabilities.use_returning = use_returning;
        self
    }

    #[must_use]
    pub fn full_text_search(mut self, enabled: bool) -> Self {
        self.capabilities.full_text_search = enabled;
        self
    }
}

/// Validated configuration with columns resolved against entity `E`.
#[derive(Debug, Clone)]
pub struct ResolvedConfig<E: EntityTrait> {
    pub dialect: Dialect,
    pub entity_name: String,
    pub primary_key: E::Column,
    pub primary_key_kind: PrimaryKeyKind,
    /// Set when soft delete is enabled
    pub soft_delete: Option<E::Column>,
    pub created_at: Option<E::Column>,
    pub updated_at: Option<E::Column>,
    pub pagination: PaginationPolicy,
    pub capabilities: DialectCapabilities,
    pub full_text_language: String,
}

impl<E: EntityTrait> ResolvedConfig<E> {
    /// Validates `config` against the table schema of `E`.
    ///
    /// A MySQL dialect with `use_returning` enabled is corrected rather than
    /// rejected: MySQL has no RETURNING clause, so the flag is switched off and
    /// a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::Configuration`] when a configured column does not
    /// exist in the table, the table has no columns, a pagination limit is
    /// zero, or the full-text language is not a plain identifier.
    pub fn resolve(config: CrudConfig) -> Result<Self, CrudError> {
        let table = E::default();
        let table_name = table.table_name().to_string();

        if E::Column::iter().next().is_none() {
            return Err(CrudError::configuration(format!(
                "table schema for '{table_name}' has no columns"
            )));
        }

        let column = |purpose: &str, name: &str| {
            find_column::<E>(name).ok_or_else(|| {
                CrudError::configuration(format!(
                    "{purpose} column '{name}' does not exist in table '{table_name}'"
                ))
            })
        };

        let primary_key = column("primary key", &config.primary_key)?;
        let soft_delete = if config.soft_delete.enabled {
            Some(column("soft delete", &config.soft_delete.column)?)
        } else {
            None
        };
        let created_at = config
            .timestamps
            .created_at
            .as_deref()
            .map(|name| column("created-at timestamp", name))
            .transpose()?;
        let updated_at = config
            .timestamps
            .updated_at
            .as_deref()
            .map(|name| column("updated-at timestamp", name))
            .transpose()?;

        if config.pagination.default_limit == 0 || config.pagination.max_limit == 0 {
            return Err(CrudError::configuration(
                "pagination limits must be at least 1",
            ));
        }

        let language = &config.full_text_language;
        if language.is_empty()
            || !language
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(CrudError::configuration(format!(
                "full-text language '{language}' is not a valid identifier"
            )));
        }

        let mut capabilities = config.capabilities;
        if capabilities.use_returning && !config.dialect.supports_returning() {
            tracing::warn!(
                table = %table_name,
                "MySQL does not support RETURNING clause, disabling use_returning"
            );
            capabilities.use_returning = false;
        }

        Ok(Self {
            dialect: config.dialect,
            entity_name: config.entity_name.unwrap_or(table_name),
            primary_key,
            primary_key_kind: config.primary_key_kind,
            soft_delete,
            created_at,
            updated_at,
            pagination: config.pagination,
            capabilities,
            full_text_language: config.full_text_language,
        })
    }
}
