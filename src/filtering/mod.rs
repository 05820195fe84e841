//! # Filtering, Pagination & Search
//!
//! Turns caller input into query clauses for one entity:
//!
//! - **[`FilterExpression`]**: typed filter AST, parsed from JSON or built in code
//! - **[`build_filter_condition`]**: filter AST to an AND of column predicates
//! - **[`build_match_condition`]**: partial-row equality match used by `find_one`
//! - **[`PaginationRequest`]**: page, limit and sort resolution with a hard ceiling
//! - **[`build_fulltext_query`]**: dialect-specific full-text predicate and rank
//!
//! ## Filter Examples
//!
//! ```rust,ignore
//! // Plain strings search (case-insensitive substring) unless the service is
//! // configured case sensitive
//! {"title": "rust"}
//!
//! // Arrays are membership tests
//! {"author": ["ada", "grace"]}
//!
//! // Operator objects
//! {"views": {"gte": 10, "lt": 100}, "deleted_at": {"isNull": true}}
//! ```
//!
//! Field names that are not columns of the entity are skipped, so filters
//! can be passed through from clients without leaking arbitrary SQL.

pub mod conditions;
pub mod expression;
pub mod pagination;
pub mod search;
pub mod sort;

pub use conditions::{build_filter_condition, build_match_condition};
pub use expression::{CompareOp, FieldFilter, FilterExpression, FilterPredicate};
pub use pagination::{Page, PageWindow, PaginationRequest, SearchResults, SortDirection};
pub use search::{FullTextQuery, build_fulltext_query};
