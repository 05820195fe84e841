//! The query primitives every service operation is composed of.
//!
//! All statements go through an [`Executor`], which is either the service's
//! connection or a caller-supplied transaction. Writes are built with
//! sea-query from raw column values so they can carry a `RETURNING` clause
//! regardless of how the entity's active model is shaped.

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    ExecResult, FromQueryResult, JsonValue, QueryResult, Select, Statement, Value,
    sea_query::{Condition, Query, SimpleExpr},
};

use super::schema::{ValueKind, json_to_value};

/// Where a statement runs: the service's own connection or a transaction.
#[derive(Clone, Copy)]
pub enum Executor<'a> {
    Connection(&'a DatabaseConnection),
    Transaction(&'a DatabaseTransaction),
}

#[async_trait]
impl<'a> ConnectionTrait for Executor<'a> {
    fn get_database_backend(&self) -> DatabaseBackend {
        match self {
            Self::Connection(conn) => conn.get_database_backend(),
            Self::Transaction(txn) => txn.get_database_backend(),
        }
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        match self {
            Self::Connection(conn) => conn.execute(stmt).await,
            Self::Transaction(txn) => txn.execute(stmt).await,
        }
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        match self {
            Self::Connection(conn) => conn.execute_unprepared(sql).await,
            Self::Transaction(txn) => txn.execute_unprepared(sql).await,
        }
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        match self {
            Self::Connection(conn) => conn.query_one(stmt).await,
            Self::Transaction(txn) => txn.query_one(stmt).await,
        }
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        match self {
            Self::Connection(conn) => conn.query_all(stmt).await,
            Self::Transaction(txn) => txn.query_all(stmt).await,
        }
    }
}

/// Result of a write: either the rows the statement returned, or what the
/// driver reports about it.
#[derive(Debug)]
pub(crate) enum WriteOutcome<M> {
    Rows(Vec<M>),
    Executed {
        rows_affected: u64,
        /// Unavailable when nothing was generated or the backend cannot report it.
        last_insert_id: Option<u64>,
    },
}

impl<M> WriteOutcome<M> {
    pub(crate) fn rows_affected(&self) -> u64 {
        match self {
            Self::Rows(rows) => rows.len() as u64,
            Self::Executed { rows_affected, .. } => *rows_affected,
        }
    }
}

fn sea_query_error(err: &sea_orm::sea_query::error::Error) -> DbErr {
    DbErr::Custom(format!("invalid statement: {err}"))
}

async fn run_write<E: EntityTrait>(
    exec: &Executor<'_>,
    stmt: Statement,
    returning: bool,
) -> Result<WriteOutcome<E::Model>, DbErr> {
    tracing::trace!(sql = %stmt, "executing write");
    if returning {
        let rows = E::find().from_raw_sql(stmt).all(exec).await?;
        Ok(WriteOutcome::Rows(rows))
    } else {
        let result = exec.execute(stmt).await?;
        Ok(WriteOutcome::Executed {
            rows_affected: result.rows_affected(),
            last_insert_id: None,
        })
    }
}

/// Runs `select` and decodes every row.
pub(crate) async fn select_rows<E: EntityTrait>(
    exec: &Executor<'_>,
    select: Select<E>,
) -> Result<Vec<E::Model>, DbErr> {
    select.all(exec).await
}

/// Runs `select` limited to one row.
pub(crate) async fn select_first<E: EntityTrait>(
    exec: &Executor<'_>,
    select: Select<E>,
) -> Result<Option<E::Model>, DbErr> {
    select.one(exec).await
}

/// Runs `select` decoding the row as a JSON object, for column subsets that
/// cannot be decoded into the model.
pub(crate) async fn select_json<E: EntityTrait>(
    exec: &Executor<'_>,
    select: Select<E>,
) -> Result<Option<JsonValue>, DbErr> {
    select.into_json().one(exec).await
}

/// `SELECT COUNT(*)` over the predicate of `select`.
pub(crate) async fn count<E: EntityTrait<Model: Sync>>(
    exec: &Executor<'_>,
    select: Select<E>,
) -> Result<u64, DbErr> {
    sea_orm::PaginatorTrait::count(select, exec).await
}

/// Inserts one row.
///
/// Without `returning`, the generated key is reported through
/// `last_insert_id`. PostgreSQL has no last-insert id, so there only the
/// primary key column is returned and read back.
pub(crate) async fn insert<E: EntityTrait>(
    exec: &Executor<'_>,
    fields: Vec<(E::Column, Value)>,
    primary_key: E::Column,
    returning: bool,
) -> Result<WriteOutcome<E::Model>, DbErr> {
    let backend = exec.get_database_backend();
    let mut stmt = Query::insert();
    stmt.into_table(E::default());

    if fields.is_empty() {
        stmt.or_default_values();
    } else {
        let (columns, values): (Vec<_>, Vec<_>) = fields.into_iter().unzip();
        stmt.columns(columns);
        stmt.values(values.into_iter().map(SimpleExpr::from))
            .map_err(|err| sea_query_error(&err))?;
    }

    if returning {
        stmt.returning_all();
        return run_write::<E>(exec, backend.build(&stmt), true).await;
    }

    if backend == DatabaseBackend::Postgres {
        stmt.returning_col(primary_key);
        let statement = backend.build(&stmt);
        tracing::trace!(sql = %statement, "executing insert");
        let row = exec.query_one(statement).await?;
        let key = row
            .map(|row| JsonValue::from_query_result(&row, ""))
            .transpose()?
            .and_then(|json| {
                let name = sea_orm::IdenStatic::as_str(&primary_key);
                json.get(name).and_then(JsonValue::as_u64)
            });
        return Ok(WriteOutcome::Executed {
            rows_affected: 1,
            last_insert_id: key,
        });
    }

    let statement = backend.build(&stmt);
    tracing::trace!(sql = %statement, "executing insert");
    let result = exec.execute(statement).await?;
    Ok(WriteOutcome::Executed {
        rows_affected: result.rows_affected(),
        last_insert_id: Some(result.last_insert_id()),
    })
}

/// `UPDATE ... SET fields WHERE condition`.
pub(crate) async fn update<E: EntityTrait>(
    exec: &Executor<'_>,
    fields: Vec<(E::Column, SimpleExpr)>,
    condition: Condition,
    returning: bool,
) -> Result<WriteOutcome<E::Model>, DbErr> {
    let backend = exec.get_database_backend();
    let mut stmt = Query::update();
    stmt.table(E::default()).values(fields).cond_where(condition);
    if returning {
        stmt.returning_all();
    }
    run_write::<E>(exec, backend.build(&stmt), returning).await
}

/// `DELETE ... WHERE condition`.
pub(crate) async fn delete<E: EntityTrait>(
    exec: &Executor<'_>,
    condition: Condition,
) -> Result<WriteOutcome<E::Model>, DbErr> {
    let backend = exec.get_database_backend();
    let mut stmt = Query::delete();
    stmt.from_table(E::default()).cond_where(condition);
    run_write::<E>(exec, backend.build(&stmt), false).await
}

/// Converts a driver-reported insert id into a primary key value.
pub(crate) fn generated_key(kind: ValueKind, last_insert_id: u64) -> Option<Value> {
    json_to_value(kind, &JsonValue::from(last_insert_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_affected_counts_returned_rows() {
        let returned: WriteOutcome<u8> = WriteOutcome::Rows(vec![1, 2]);
        assert_eq!(returned.rows_affected(), 2);

        let executed: WriteOutcome<u8> = WriteOutcome::Executed {
            rows_affected: 3,
            last_insert_id: None,
        };
        assert_eq!(executed.rows_affected(), 3);
    }

    #[test]
    fn test_generated_key_follows_column_kind() {
        assert_eq!(
            generated_key(ValueKind::Integer, 7),
            Some(Value::from(7_i64))
        );
    }
}
