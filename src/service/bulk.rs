//! Batch variants of the single-row operations.
//!
//! A batch runs its items one after another inside a single transaction:
//! the caller's when `options.transaction` is set, otherwise one opened for
//! the batch. Failures are collected per item instead of stopping at the
//! first one. If any item failed, a transaction opened here is rolled back
//! and [`CrudError::BulkOperation`] lists every failure; a caller's
//! transaction is left for the caller to roll back.

use sea_orm::{DatabaseTransaction, TransactionTrait, Value};

use super::CrudService;
use crate::core::options::OperationOptions;
use crate::core::traits::{CrudOperations, ModelOf};
use crate::errors::{BulkItemError, BulkItemKey, CrudError};

/// Per-item results and failures of a batch.
#[derive(Debug)]
pub struct BulkOperationOutcome<T> {
    pub results: Vec<T>,
    pub errors: Vec<BulkItemError>,
}

impl<T> Default for BulkOperationOutcome<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> BulkOperationOutcome<T> {
    fn record(&mut self, key: impl FnOnce() -> BulkItemKey, result: Result<T, CrudError>) {
        match result {
            Ok(value) => self.results.push(value),
            Err(error) => self.errors.push(BulkItemError { key: key(), error }),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The results, or [`CrudError::BulkOperation`] carrying every failure.
    ///
    /// # Errors
    ///
    /// When at least one item failed.
    pub fn into_result(self, message: impl Into<String>) -> Result<Vec<T>, CrudError> {
        if self.errors.is_empty() {
            Ok(self.results)
        } else {
            Err(CrudError::BulkOperation {
                message: message.into(),
                errors: self.errors,
            })
        }
    }
}

/// The transaction a batch runs in.
enum BatchScope<'a> {
    Joined(&'a DatabaseTransaction),
    Owned(DatabaseTransaction),
}

impl BatchScope<'_> {
    fn transaction(&self) -> &DatabaseTransaction {
        match self {
            Self::Joined(txn) => txn,
            Self::Owned(txn) => txn,
        }
    }

    /// Commits or rolls back an owned transaction depending on `outcome`.
    async fn finish<T>(
        self,
        message: &str,
        outcome: BulkOperationOutcome<T>,
    ) -> Result<Vec<T>, CrudError> {
        let Self::Owned(txn) = self else {
            return outcome.into_result(message);
        };

        if outcome.is_success() {
            txn.commit().await.map_err(CrudError::Transaction)?;
        } else {
            tracing::debug!(failed = outcome.errors.len(), "{message}, rolling back");
            if let Err(err) = txn.rollback().await {
                tracing::warn!(error = %err, "Rollback of failed batch failed");
            }
        }
        outcome.into_result(message)
    }
}

impl<O: CrudOperations> CrudService<O> {
    async fn begin_batch<'a>(
        &self,
        options: &OperationOptions<'a>,
    ) -> Result<BatchScope<'a>, CrudError> {
        match options.transaction {
            Some(txn) => Ok(BatchScope::Joined(txn)),
            None => {
                let txn = self.db.begin().await.map_err(CrudError::Transaction)?;
                Ok(BatchScope::Owned(txn))
            }
        }
    }

    /// Creates every item atomically. Failures are keyed by input position.
    ///
    /// # Errors
    ///
    /// - [`CrudError::BulkOperation`] when any item failed; nothing is persisted
    /// - [`CrudError::Transaction`] when the transaction cannot be opened or committed
    pub async fn mass_create(
        &self,
        items: Vec<O::CreateModel>,
        options: &OperationOptions<'_>,
    ) -> Result<Vec<ModelOf<O>>, CrudError> {
        tracing::debug!(entity = %self.config.entity_name, count = items.len(), "mass create");

        let scope = self.begin_batch(options).await?;
        let mut outcome = BulkOperationOutcome::default();
        {
            let item_options = OperationOptions {
                transaction: Some(scope.transaction()),
                ..*options
            };
            for (index, item) in items.into_iter().enumerate() {
                let result = self.create(item, &item_options).await;
                outcome.record(|| BulkItemKey::Index(index), result);
            }
        }
        scope.finish("Mass create errors", outcome).await
    }

    /// Applies the same update to every id atomically.
    ///
    /// # Errors
    ///
    /// As [`CrudService::mass_create`], with failures keyed by id.
    pub async fn mass_update<I>(
        &self,
        ids: I,
        data: O::UpdateModel,
        options: &OperationOptions<'_>,
    ) -> Result<Vec<ModelOf<O>>, CrudError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        tracing::debug!(entity = %self.config.entity_name, count = ids.len(), "mass update");

        let scope = self.begin_batch(options).await?;
        let mut outcome = BulkOperationOutcome::default();
        {
            let item_options = OperationOptions {
                transaction: Some(scope.transaction()),
                ..*options
            };
            for id in ids {
                let result = self.update(id.clone(), data.clone(), &item_options).await;
                outcome.record(|| BulkItemKey::Id(id), result);
            }
        }
        scope.finish("Mass update errors", outcome).await
    }

    /// Soft-deletes every id atomically.
    ///
    /// Returns whether every item changed a row.
    ///
    /// # Errors
    ///
    /// [`CrudError::OperationNotSupported`] without soft delete, checked before
    /// anything runs; otherwise as [`CrudService::mass_update`].
    pub async fn mass_soft_delete<I>(
        &self,
        ids: I,
        options: &OperationOptions<'_>,
    ) -> Result<bool, CrudError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.require_soft_delete()?;
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        tracing::debug!(entity = %self.config.entity_name, count = ids.len(), "mass soft delete");

        let scope = self.begin_batch(options).await?;
        let mut outcome = BulkOperationOutcome::default();
        {
            let item_options = OperationOptions {
                transaction: Some(scope.transaction()),
                ..*options
            };
            for id in ids {
                let result = self.soft_delete(id.clone(), &item_options).await;
                outcome.record(|| BulkItemKey::Id(id), result);
            }
        }
        let results = scope.finish("Mass soft delete errors", outcome).await?;
        Ok(results.into_iter().all(|changed| changed))
    }

    /// Restores every id atomically.
    ///
    /// # Errors
    ///
    /// As [`CrudService::mass_soft_delete`].
    pub async fn mass_restore<I>(
        &self,
        ids: I,
        options: &OperationOptions<'_>,
    ) -> Result<Vec<ModelOf<O>>, CrudError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.require_soft_delete()?;
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        tracing::debug!(entity = %self.config.entity_name, count = ids.len(), "mass restore");

        let scope = self.begin_batch(options).await?;
        let mut outcome = BulkOperationOutcome::default();
        {
            let item_options = OperationOptions {
                transaction: Some(scope.transaction()),
                ..*options
            };
            for id in ids {
                let result = self.restore(id.clone(), &item_options).await;
                outcome.record(|| BulkItemKey::Id(id), result);
            }
        }
        scope.finish("Mass restore errors", outcome).await
    }

    /// Permanently deletes every id atomically.
    ///
    /// Returns whether every item removed a row.
    ///
    /// # Errors
    ///
    /// As [`CrudService::mass_update`].
    pub async fn mass_delete<I>(
        &self,
        ids: I,
        options: &OperationOptions<'_>,
    ) -> Result<bool, CrudError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        tracing::debug!(entity = %self.config.entity_name, count = ids.len(), "mass delete");

        let scope = self.begin_batch(options).await?;
        let mut outcome = BulkOperationOutcome::default();
        {
            let item_options = OperationOptions {
                transaction: Some(scope.transaction()),
                ..*options
            };
            for id in ids {
                let result = self.delete(id.clone(), &item_options).await;
                outcome.record(|| BulkItemKey::Id(id), result);
            }
        }
        let results = scope.finish("Mass delete errors", outcome).await?;
        Ok(results.into_iter().all(|removed| removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_without_errors_yields_results() {
        let mut outcome = BulkOperationOutcome::default();
        outcome.record(|| BulkItemKey::Index(0), Ok(1));
        outcome.record(|| BulkItemKey::Index(1), Ok(2));
        assert!(outcome.is_success());
        assert_eq!(outcome.into_result("unused").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_outcome_with_errors_lists_every_failure() {
        let mut outcome: BulkOperationOutcome<u8> = BulkOperationOutcome::default();
        outcome.record(|| BulkItemKey::Index(0), Ok(1));
        outcome.record(
            || BulkItemKey::Index(1),
            Err(CrudError::validation("title", "Title is required")),
        );
        outcome.record(|| BulkItemKey::Id(Value::from(7)), Err(CrudError::not_found("Article", "7")));

        let err = outcome.into_result("Mass create errors").unwrap_err();
        match err {
            CrudError::BulkOperation { message, errors } => {
                assert_eq!(message, "Mass create errors");
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].key, BulkItemKey::Index(1));
                assert_eq!(errors[1].key, BulkItemKey::Id(Value::from(7)));
            }
            other => panic!("expected BulkOperation, got {other:?}"),
        }
    }
}
