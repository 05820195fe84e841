//! # Entity Services
//!
//! A [`CrudService`] runs every CRUD operation for one entity. It is built
//! from a [`CrudOperations`] implementation, a database connection and a
//! [`CrudConfig`]:
//!
//! ```rust,ignore
//! let articles = CrudService::builder(ArticleOperations)
//!     .connection(db.clone())
//!     .config(CrudConfig::default().entity_name("Article"))
//!     .hooks(LifecycleHooks::new().after_create(|article| async move {
//!         tracing::info!(id = article.id, "article created");
//!         Ok(())
//!     }))
//!     .build()?;
//!
//! let created = articles.create(new_article, &OperationOptions::default()).await?;
//! let page = articles
//!     .find_all(&filter, &PaginationRequest::new().page(2), &OperationOptions::default())
//!     .await?;
//! ```
//!
//! Every operation takes [`OperationOptions`]; passing a transaction there
//! makes the operation join it instead of using the service's connection.

mod bulk;
mod listing;
mod single;

pub use bulk::BulkOperationOutcome;

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait,
    IdenStatic, QueryFilter, QuerySelect, Select, Value,
};

use crate::config::{CrudConfig, Dialect, ResolvedConfig};
use crate::core::hooks::LifecycleHooks;
use crate::core::options::{LockMode, OperationOptions};
use crate::core::query::Executor;
use crate::core::schema::{ValueKind, find_column, now_value};
use crate::core::traits::{CrudOperations, FieldValues};
use crate::errors::CrudError;

type EntityOf<O> = <O as CrudOperations>::Entity;
type ColumnOf<O> = <EntityOf<O> as EntityTrait>::Column;

pub struct CrudService<O: CrudOperations> {
    db: DatabaseConnection,
    operations: O,
    config: ResolvedConfig<O::Entity>,
    hooks: LifecycleHooks<O>,
}

impl<O: CrudOperations> std::fmt::Debug for CrudService<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudService")
            .field("entity", &self.config.entity_name)
            .field("dialect", &self.config.dialect)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`CrudService`]; see [`CrudService::builder`].
pub struct CrudServiceBuilder<O: CrudOperations> {
    operations: O,
    db: Option<DatabaseConnection>,
    config: CrudConfig,
    hooks: LifecycleHooks<O>,
}

impl<O: CrudOperations> CrudServiceBuilder<O> {
    #[must_use]
    pub fn connection(mut self, db: DatabaseConnection) -> Self {
        self.db = Some(db);
        self
    }

    #[must_use]
    pub fn config(mut self, config: CrudConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: LifecycleHooks<O>) -> Self {
        self.hooks = hooks;
        self
    }

    /// # Errors
    ///
    /// Returns [`CrudError::Configuration`] when no connection was supplied,
    /// the configured dialect does not match the connection's backend, or the
    /// configuration does not fit the entity's table.
    pub fn build(self) -> Result<CrudService<O>, CrudError> {
        let db = self
            .db
            .ok_or_else(|| CrudError::configuration("data source is required"))?;
        let config = ResolvedConfig::resolve(self.config)?;
        check_dialect(config.dialect, db.get_database_backend())?;

        tracing::debug!(
            entity = %config.entity_name,
            dialect = ?config.dialect,
            soft_delete = config.soft_delete.is_some(),
            use_returning = config.capabilities.use_returning,
            "CRUD service configured"
        );

        Ok(CrudService {
            db,
            operations: self.operations,
            config,
            hooks: self.hooks,
        })
    }
}

/// SQLite accepts the PostgreSQL statement shapes, so it runs under either dialect.
fn check_dialect(dialect: Dialect, backend: DatabaseBackend) -> Result<(), CrudError> {
    let matches = match backend {
        DatabaseBackend::MySql => dialect == Dialect::Mysql,
        DatabaseBackend::Postgres => dialect == Dialect::Postgresql,
        DatabaseBackend::Sqlite => true,
    };
    if matches {
        Ok(())
    } else {
        Err(CrudError::configuration(format!(
            "dialect {dialect:?} does not match the {backend:?} connection"
        )))
    }
}

impl<O: CrudOperations> CrudService<O> {
    #[must_use]
    pub fn builder(operations: O) -> CrudServiceBuilder<O> {
        CrudServiceBuilder {
            operations,
            db: None,
            config: CrudConfig::default(),
            hooks: LifecycleHooks::default(),
        }
    }

    /// Builds a service without hooks.
    ///
    /// # Errors
    ///
    /// See [`CrudServiceBuilder::build`].
    pub fn new(db: DatabaseConnection, operations: O, config: CrudConfig) -> Result<Self, CrudError> {
        Self::builder(operations).connection(db).config(config).build()
    }

    #[must_use]
    pub fn config(&self) -> &ResolvedConfig<O::Entity> {
        &self.config
    }

    #[must_use]
    pub fn operations(&self) -> &O {
        &self.operations
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.config.entity_name
    }

    /// The caller's transaction if there is one, else the service's connection.
    fn executor<'a>(&'a self, options: &OperationOptions<'a>) -> Executor<'a> {
        options
            .transaction
            .map_or(Executor::Connection(&self.db), Executor::Transaction)
    }

    fn by_id(&self, id: &Value) -> Condition {
        Condition::all().add(self.config.primary_key.eq(id.clone()))
    }

    /// Adds the "not soft-deleted" predicate when soft delete is enabled.
    fn live(&self, condition: Condition) -> Condition {
        match self.config.soft_delete {
            Some(column) => condition.add(column.is_null()),
            None => condition,
        }
    }

    fn select(&self, condition: Condition, options: &OperationOptions<'_>) -> Select<EntityOf<O>> {
        let select = <O::Entity as EntityTrait>::find().filter(condition);
        match options.lock_mode {
            Some(LockMode::Update) => select.lock_exclusive(),
            Some(LockMode::Share) => select.lock_shared(),
            None => select,
        }
    }

    fn now(column: ColumnOf<O>) -> Value {
        now_value(ValueKind::of(column))
    }

    /// Pairs mapped values with their columns, dropping names the table lacks.
    fn resolve_fields(&self, fields: FieldValues) -> Vec<(ColumnOf<O>, Value)> {
        fields
            .into_iter()
            .filter_map(|(name, value)| match find_column::<O::Entity>(&name) {
                Some(column) => Some((column, value)),
                None => {
                    tracing::debug!(
                        entity = %self.config.entity_name,
                        field = %name,
                        "Dropping value for unknown column"
                    );
                    None
                }
            })
            .collect()
    }

    fn stamp_updated_at(&self, fields: &mut FieldValues) {
        if let Some(column) = self.config.updated_at {
            fields.insert(column.as_str(), Self::now(column));
        }
    }

    fn log_relations(&self, options: &OperationOptions<'_>) {
        if !options.relations_to_load.is_empty() {
            tracing::debug!(
                entity = %self.config.entity_name,
                relations = ?options.relations_to_load,
                "Relation loading is left to after-hooks"
            );
        }
    }
}
