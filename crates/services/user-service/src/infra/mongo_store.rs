//! MongoDB implementation of [`DocumentStore`].

use async_trait::async_trait;
use bson::{doc, Document};
use futures::{StreamExt, TryStreamExt};
use mongodb::options::{FindOneOptions, FindOptions as MongoFindOptions};
use mongodb::Collection;

use common::{FindOptions, Predicate, Projection, StoreError, StoreResult};

use super::store::{DocumentCursor, DocumentStore};

/// Document store backed by one MongoDB collection.
#[derive(Clone)]
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert(&self, document: Document) -> StoreResult<()> {
        self.collection.insert_one(document).await?;
        Ok(())
    }

    async fn delete_one(&self, predicate: &Predicate) -> StoreResult<u64> {
        let result = self.collection.delete_one(predicate.to_document()).await?;
        Ok(result.deleted_count)
    }

    async fn update_one(&self, predicate: &Predicate, fields: Document) -> StoreResult<u64> {
        let result = self
            .collection
            .update_one(predicate.to_document(), doc! { "$set": fields })
            .await?;
        Ok(result.matched_count)
    }

    async fn find_one(
        &self,
        predicate: &Predicate,
        projection: &Projection,
    ) -> StoreResult<Option<Document>> {
        let mut options = FindOneOptions::default();
        options.projection = projection.to_document();

        let document = self
            .collection
            .find_one(predicate.to_document())
            .with_options(options)
            .await?;
        Ok(document)
    }

    async fn find(
        &self,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> StoreResult<DocumentCursor> {
        let cursor = self
            .collection
            .find(predicate.to_document())
            .with_options(to_mongo_options(options))
            .await?;
        Ok(cursor.map_err(StoreError::from).boxed())
    }

    async fn count(&self, predicate: &Predicate) -> StoreResult<u64> {
        let count = self
            .collection
            .count_documents(predicate.to_document())
            .await?;
        Ok(count)
    }
}

/// Driver options for a find; zero skip and zero limit are left unset.
fn to_mongo_options(options: &FindOptions) -> MongoFindOptions {
    let mut find = MongoFindOptions::default();
    find.projection = options.projection.to_document();
    find.skip = (options.skip > 0).then_some(options.skip);
    // The server treats a missing limit as unbounded
    find.limit = (options.limit > 0).then(|| i64::try_from(options.limit).unwrap_or(i64::MAX));
    find.sort = options.sort.as_ref().map(|sort| sort.to_document());
    find
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::FieldSort;

    #[test]
    fn test_default_options_leave_everything_unset() {
        let find = to_mongo_options(&FindOptions::default());

        assert!(find.projection.is_none());
        assert!(find.skip.is_none());
        assert!(find.limit.is_none());
        assert!(find.sort.is_none());
    }

    #[test]
    fn test_paging_sort_and_projection_are_forwarded() {
        let options = FindOptions {
            projection: Projection::excluding(["token", "password"]),
            skip: 10,
            limit: 5,
            sort: Some(FieldSort {
                field: "create_time".into(),
                ascending: false,
            }),
        };

        let find = to_mongo_options(&options);

        assert_eq!(find.projection, Some(doc! { "token": 0, "password": 0 }));
        assert_eq!(find.skip, Some(10));
        assert_eq!(find.limit, Some(5));
        assert_eq!(find.sort, Some(doc! { "create_time": -1 }));
    }

    #[test]
    fn test_oversized_limit_is_clamped() {
        let options = FindOptions {
            limit: u64::MAX,
            ..FindOptions::default()
        };

        assert_eq!(to_mongo_options(&options).limit, Some(i64::MAX));
    }
}
