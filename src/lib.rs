//! Generic CRUD services over Sea-ORM entities.
//!
//! Implement [`CrudOperations`] for an entity (validation plus the mapping
//! from your create/update payloads to column values), then build a
//! [`CrudService`] for it. The service provides:
//!
//! - single-row operations: `find`, `find_projected`, `find_one`, `create`,
//!   `update`, `soft_delete`, `restore`, `delete`, `exists`
//! - listings: `find_all` with a [`FilterExpression`] and [`PaginationRequest`],
//!   `count`, `full_text_search`
//! - transactional batches: `mass_create`, `mass_update`, `mass_soft_delete`,
//!   `mass_restore`, `mass_delete`
//!
//! Soft-deleted rows are invisible to every read. Optional
//! [`LifecycleHooks`] run around the writes, and every operation can join a
//! caller's transaction through [`OperationOptions`].

pub mod config;
pub mod core;
pub mod errors;
pub mod filtering;
pub mod service;
pub mod validation;

pub use config::{CrudConfig, Dialect, PrimaryKeyKind, ResolvedConfig};
pub use crate::core::{
    CrudOperations, FieldValues, HookSkip, LifecycleHooks, LockMode, ModelOf, OperationOptions,
};
pub use errors::{BulkItemError, BulkItemKey, CrudError};
pub use filtering::{
    CompareOp, FilterExpression, FilterPredicate, Page, PaginationRequest, SearchResults,
    SortDirection,
};
pub use service::{BulkOperationOutcome, CrudService, CrudServiceBuilder};
pub use validation::{ValidationError, ValidationErrors};
