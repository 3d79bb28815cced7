//! Document store abstraction.

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;

use common::{FindOptions, Predicate, Projection, StoreResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Forward-only, finite sequence of documents returned by a find.
pub type DocumentCursor = BoxStream<'static, StoreResult<Document>>;

/// Primitive operations over one collection of documents keyed by `_id`.
///
/// Implementations issue exactly one round trip per call and never retry.
/// Dropping a returned future abandons the in-flight call.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document; fails on duplicate `_id`
    async fn insert(&self, document: Document) -> StoreResult<()>;

    /// Delete the first matching document, returning how many were removed
    async fn delete_one(&self, predicate: &Predicate) -> StoreResult<u64>;

    /// Set `fields` on the first matching document, returning how many matched
    async fn update_one(&self, predicate: &Predicate, fields: Document) -> StoreResult<u64>;

    /// Fetch the first matching document
    async fn find_one(
        &self,
        predicate: &Predicate,
        projection: &Projection,
    ) -> StoreResult<Option<Document>>;

    /// Fetch every matching document, shaped by `options`
    async fn find(&self, predicate: &Predicate, options: &FindOptions)
        -> StoreResult<DocumentCursor>;

    /// Count matching documents
    async fn count(&self, predicate: &Predicate) -> StoreResult<u64>;
}
