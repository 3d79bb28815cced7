//! Common utilities shared across services.
//!
//! This crate provides:
//! - Unified error handling for store and decode failures
//! - Configuration structures
//! - The optional-filter query builder and pagination types

pub mod config;
pub mod error;
pub mod pagination;
pub mod query;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt, StoreError, StoreResult};
pub use pagination::Paginated;
pub use query::{
    Bound, Clause, Comparison, FieldMapping, FieldSort, FilterOptions, FindOptions, OptionKey,
    Predicate, Projection, QueryCompiler, SortOrder,
};
