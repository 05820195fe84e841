use sea_orm::{
    Condition, IdenStatic, JsonValue, QuerySelect, Value,
    sea_query::{Keyword, SimpleExpr},
};
use uuid::Uuid;

use super::{ColumnOf, CrudService};
use crate::config::PrimaryKeyKind;
use crate::core::options::OperationOptions;
use crate::core::query::{self, WriteOutcome, generated_key};
use crate::core::schema::{ValueKind, display_value, find_column};
use crate::core::traits::{CrudOperations, ModelOf};
use crate::errors::CrudError;
use crate::filtering::build_match_condition;

impl<O: CrudOperations> CrudService<O> {
    /// Loads the non-deleted row with primary key `id`.
    ///
    /// # Errors
    ///
    /// Only database errors; a missing row is `Ok(None)`.
    pub async fn find(
        &self,
        id: impl Into<Value>,
        options: &OperationOptions<'_>,
    ) -> Result<Option<ModelOf<O>>, CrudError> {
        let id = id.into();
        tracing::debug!(entity = %self.config.entity_name, id = %display_value(&id), "find");
        self.log_relations(options);

        let select = self.select(self.live(self.by_id(&id)), options);
        Ok(query::select_first(&self.executor(options), select).await?)
    }

    /// Like [`CrudService::find`], loading only `options.fields_to_select`.
    ///
    /// Unknown field names are skipped; when none is left the whole row is
    /// loaded. The row comes back as a JSON object keyed by column name.
    ///
    /// # Errors
    ///
    /// Only database errors; a missing row is `Ok(None)`.
    pub async fn find_projected(
        &self,
        id: impl Into<Value>,
        options: &OperationOptions<'_>,
    ) -> Result<Option<JsonValue>, CrudError> {
        let id = id.into();
        tracing::debug!(
            entity = %self.config.entity_name,
            id = %display_value(&id),
            fields = ?options.fields_to_select,
            "find projected"
        );
        self.log_relations(options);

        let columns: Vec<_> = options
            .fields_to_select
            .iter()
            .filter_map(|name| find_column::<O::Entity>(name))
            .collect();
        let mut select = self.select(self.live(self.by_id(&id)), options);
        if !columns.is_empty() {
            select = select.select_only().columns(columns);
        }
        Ok(query::select_json(&self.executor(options), select).await?)
    }

    /// Loads the first non-deleted row whose columns equal the given fields.
    ///
    /// `null` fields match `IS NULL`; names that are not columns are ignored.
    ///
    /// # Errors
    ///
    /// [`CrudError::ValidationFailed`] when `fields` is not a JSON object,
    /// otherwise only database errors.
    pub async fn find_one(
        &self,
        fields: &JsonValue,
        options: &OperationOptions<'_>,
    ) -> Result<Option<ModelOf<O>>, CrudError> {
        let condition = match fields {
            JsonValue::Object(map) => build_match_condition::<O::Entity>(map),
            JsonValue::Null => Condition::all(),
            _ => return Err(CrudError::validation("where", "Match fields must be a JSON object")),
        };
        tracing::debug!(entity = %self.config.entity_name, "find one");
        self.log_relations(options);

        let select = self.select(self.live(condition), options);
        Ok(query::select_first(&self.executor(options), select).await?)
    }

    /// Validates, maps and inserts a new row.
    ///
    /// Configured timestamp columns are set to the current time. Without
    /// RETURNING support the row is read back by its primary key.
    ///
    /// # Errors
    ///
    /// - whatever `validate_create` or a hook returns
    /// - [`CrudError::Duplicate`] on a unique-constraint violation
    /// - [`CrudError::OperationFailed`] when the inserted row cannot be read back
    pub async fn create(
        &self,
        data: O::CreateModel,
        options: &OperationOptions<'_>,
    ) -> Result<ModelOf<O>, CrudError> {
        let entity = &self.config.entity_name;
        tracing::debug!(entity = %entity, "create");

        self.operations.validate_create(&data).await?;
        let data = if options.hook_skip.skip_before {
            data
        } else {
            (self.hooks.before_create)(data).await?
        };

        let mut fields = self.operations.map_create(data);
        for column in [self.config.created_at, self.config.updated_at]
            .into_iter()
            .flatten()
        {
            fields.insert(column.as_str(), Self::now(column));
        }

        let primary_key = self.config.primary_key;
        if self.config.primary_key_kind == PrimaryKeyKind::Uuid && !fields.contains(primary_key.as_str())
        {
            fields.insert(primary_key.as_str(), Uuid::new_v4());
        }
        let supplied_key = fields.get(primary_key.as_str()).cloned();

        let exec = self.executor(options);
        let outcome = query::insert::<O::Entity>(
            &exec,
            self.resolve_fields(fields),
            primary_key,
            self.config.capabilities.use_returning,
        )
        .await
        .map_err(|err| CrudError::from_write(entity, err))?;

        let created = match outcome {
            WriteOutcome::Rows(rows) => rows.into_iter().next(),
            WriteOutcome::Executed { last_insert_id, .. } => {
                let key = supplied_key.or_else(|| {
                    last_insert_id.and_then(|id| generated_key(ValueKind::of(primary_key), id))
                });
                match key {
                    Some(key) => self.find(key, options).await?,
                    None => None,
                }
            }
        }
        .ok_or_else(|| CrudError::operation_failed(format!("Failed to create {entity}")))?;

        if !options.hook_skip.skip_after {
            (self.hooks.after_create)(created.clone()).await?;
        }
        Ok(created)
    }

    /// Updates the non-deleted row `id` with the mapped fields of `data`.
    ///
    /// # Errors
    ///
    /// - [`CrudError::EntityNotFound`] before anything is written when the row
    ///   does not exist or is soft-deleted
    /// - whatever `validate_update` or a hook returns
    /// - [`CrudError::Duplicate`] on a unique-constraint violation
    /// - [`CrudError::OperationFailed`] when the updated row cannot be read back
    pub async fn update(
        &self,
        id: impl Into<Value>,
        data: O::UpdateModel,
        options: &OperationOptions<'_>,
    ) -> Result<ModelOf<O>, CrudError> {
        let id = id.into();
        let entity = &self.config.entity_name;
        tracing::debug!(entity = %entity, id = %display_value(&id), "update");

        if self.find(id.clone(), options).await?.is_none() {
            return Err(CrudError::not_found_value(entity, &id));
        }

        self.operations.validate_update(&id, &data).await?;
        let data = if options.hook_skip.skip_before {
            data
        } else {
            (self.hooks.before_update)((id.clone(), data)).await?
        };

        let mut fields = self.operations.map_update(data);
        self.stamp_updated_at(&mut fields);
        let assignments: Vec<_> = self
            .resolve_fields(fields)
            .into_iter()
            .map(|(column, value)| (column, SimpleExpr::from(value)))
            .collect();

        let returning = self.config.capabilities.use_returning;
        let updated = if assignments.is_empty() {
            // Nothing to set: the row is unchanged.
            self.find(id.clone(), options).await?
        } else {
            let outcome = query::update::<O::Entity>(
                &self.executor(options),
                assignments,
                self.by_id(&id),
                returning,
            )
            .await
            .map_err(|err| CrudError::from_write(entity, err))?;
            match outcome {
                WriteOutcome::Rows(rows) => rows.into_iter().next(),
                WriteOutcome::Executed { .. } => self.find(id.clone(), options).await?,
            }
        }
        .ok_or_else(|| CrudError::operation_failed(format!("Failed to update {entity}")))?;

        if !options.hook_skip.skip_after {
            (self.hooks.after_update)(updated.clone()).await?;
        }
        Ok(updated)
    }

    /// Marks the row `id` deleted by setting the soft-delete column to now.
    ///
    /// Returns whether a row was changed; `after_soft_delete` only runs then.
    ///
    /// # Errors
    ///
    /// - [`CrudError::OperationNotSupported`] when soft delete is disabled
    /// - [`CrudError::EntityNotFound`] when the row does not exist or is
    ///   already deleted
    pub async fn soft_delete(
        &self,
        id: impl Into<Value>,
        options: &OperationOptions<'_>,
    ) -> Result<bool, CrudError> {
        let column = self.require_soft_delete()?;
        let id = id.into();
        let entity = &self.config.entity_name;
        tracing::debug!(entity = %entity, id = %display_value(&id), "soft delete");

        if self.find(id.clone(), options).await?.is_none() {
            return Err(CrudError::not_found_value(entity, &id));
        }
        if !options.hook_skip.skip_before {
            (self.hooks.before_soft_delete)(id.clone()).await?;
        }

        let mut assignments = vec![(column, SimpleExpr::from(Self::now(column)))];
        if let Some(updated_at) = self.config.updated_at {
            assignments.push((updated_at, SimpleExpr::from(Self::now(updated_at))));
        }
        let outcome = query::update::<O::Entity>(
            &self.executor(options),
            assignments,
            self.by_id(&id),
            self.config.capabilities.use_returning,
        )
        .await?;

        let success = outcome.rows_affected() > 0;
        if success && !options.hook_skip.skip_after {
            (self.hooks.after_soft_delete)(id).await?;
        }
        Ok(success)
    }

    /// Clears the soft-delete column of row `id` and returns the row.
    ///
    /// There is no existence check up front: the target is normally a
    /// soft-deleted row, which [`CrudService::find`] would not see.
    ///
    /// # Errors
    ///
    /// - [`CrudError::OperationNotSupported`] when soft delete is disabled
    /// - [`CrudError::EntityNotFound`] when no row has that id
    pub async fn restore(
        &self,
        id: impl Into<Value>,
        options: &OperationOptions<'_>,
    ) -> Result<ModelOf<O>, CrudError> {
        let column = self.require_soft_delete()?;
        let id = id.into();
        let entity = &self.config.entity_name;
        tracing::debug!(entity = %entity, id = %display_value(&id), "restore");

        if !options.hook_skip.skip_before {
            (self.hooks.before_restore)(id.clone()).await?;
        }

        let mut assignments = vec![(column, SimpleExpr::Keyword(Keyword::Null))];
        if let Some(updated_at) = self.config.updated_at {
            assignments.push((updated_at, SimpleExpr::from(Self::now(updated_at))));
        }
        let outcome = query::update::<O::Entity>(
            &self.executor(options),
            assignments,
            self.by_id(&id),
            self.config.capabilities.use_returning,
        )
        .await?;

        let restored = match outcome {
            WriteOutcome::Rows(rows) => rows.into_iter().next(),
            WriteOutcome::Executed { .. } => self.find(id.clone(), options).await?,
        }
        .ok_or_else(|| CrudError::not_found_value(entity, &id))?;

        if !options.hook_skip.skip_after {
            (self.hooks.after_restore)(restored.clone()).await?;
        }
        Ok(restored)
    }

    /// Permanently deletes row `id`.
    ///
    /// The row must currently be visible (not soft-deleted). Returns whether
    /// a row was removed; `after_delete` only runs then.
    ///
    /// # Errors
    ///
    /// [`CrudError::EntityNotFound`] when the row does not exist.
    pub async fn delete(
        &self,
        id: impl Into<Value>,
        options: &OperationOptions<'_>,
    ) -> Result<bool, CrudError> {
        let id = id.into();
        let entity = &self.config.entity_name;
        tracing::debug!(entity = %entity, id = %display_value(&id), "delete");

        if self.find(id.clone(), options).await?.is_none() {
            return Err(CrudError::not_found_value(entity, &id));
        }
        if !options.hook_skip.skip_before {
            (self.hooks.before_delete)(id.clone()).await?;
        }

        let outcome = query::delete::<O::Entity>(&self.executor(options), self.by_id(&id)).await?;

        let success = outcome.rows_affected() > 0;
        if success && !options.hook_skip.skip_after {
            (self.hooks.after_delete)(id).await?;
        }
        Ok(success)
    }

    /// Whether a non-deleted row with primary key `id` exists.
    ///
    /// # Errors
    ///
    /// Only database errors.
    pub async fn exists(
        &self,
        id: impl Into<Value>,
        options: &OperationOptions<'_>,
    ) -> Result<bool, CrudError> {
        let fields = [self.config.primary_key.as_str()];
        let options = OperationOptions {
            fields_to_select: &fields,
            ..*options
        };
        Ok(self.find_projected(id, &options).await?.is_some())
    }

    pub(super) fn require_soft_delete(&self) -> Result<ColumnOf<O>, CrudError> {
        self.config.soft_delete.ok_or_else(|| {
            CrudError::not_supported(format!(
                "Soft delete is not enabled for {}",
                self.config.entity_name
            ))
        })
    }
}
