//! User repository implementation over a document store.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::TryStreamExt;
use tracing::{debug, warn};

use common::{AppResult, FilterOptions, Predicate, Projection, QueryCompiler};
use domain::{
    generate_secret, User, FIELD_ID, FIELD_LAST_MOD_TIME, FIELD_PASSWORD, FIELD_PHONE, FIELD_TOKEN,
};

use super::entities::user as entity;
use crate::infra::{Clock, DocumentStore, SystemClock};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// What to do with a stored document that does not decode into a [`User`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Log and drop the document
    #[default]
    Skip,
    /// Fail the whole call with `AppError::Decode`
    Strict,
}

/// User repository trait for dependency injection.
///
/// Lookups return `Ok(None)` when nothing matches. Updates and deletes that
/// match nothing succeed silently; check existence first when it matters.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user, stamping both timestamps to now
    async fn add(&self, user: User) -> AppResult<User>;

    /// Hard delete by identifier
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Overwrite every settable field and stamp the modification time
    async fn update(&self, user: User) -> AppResult<User>;

    /// Set the bearer token; an empty value generates a fresh one.
    /// Returns the value written.
    async fn update_token(&self, id: &str, token: &str) -> AppResult<String>;

    /// Set the credential; an empty value generates a fresh one.
    /// Returns the value written.
    async fn update_password(&self, id: &str, password: &str) -> AppResult<String>;

    /// Set the phone number verbatim
    async fn update_phone(&self, id: &str, phone: &str) -> AppResult<()>;

    /// Find user by identifier
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    /// Find user by bearer token
    async fn find_by_token(&self, token: &str) -> AppResult<Option<User>>;

    /// Find user by phone number
    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<User>>;

    /// Page of users matching `options`, with the total number of matches.
    ///
    /// The returned users carry no token or credential.
    async fn load(&self, options: &FilterOptions) -> AppResult<(Vec<User>, u64)>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    decode_policy: DecodePolicy,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            decode_policy: DecodePolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    async fn find_one(&self, predicate: Predicate) -> AppResult<Option<User>> {
        let Some(document) = self.store.find_one(&predicate, &Projection::all()).await? else {
            return Ok(None);
        };
        self.decode(document)
    }

    /// Decode under the configured policy; `Ok(None)` means skipped.
    fn decode(&self, document: Document) -> AppResult<Option<User>> {
        let id = document.get(FIELD_ID).cloned().unwrap_or(Bson::Null);
        match entity::from_document(document) {
            Ok(user) => Ok(Some(user)),
            Err(e) => match self.decode_policy {
                DecodePolicy::Skip => {
                    warn!(id = %id, error = %e, "Skipping undecodable user document");
                    Ok(None)
                }
                DecodePolicy::Strict => Err(e.into()),
            },
        }
    }

    async fn set_field(&self, id: &str, field: &str, value: impl Into<Bson> + Send) -> AppResult<()> {
        let mut fields = Document::new();
        fields.insert(field, value.into());
        fields.insert(FIELD_LAST_MOD_TIME, bson::DateTime::from_chrono(self.clock.now()));

        let matched = self.store.update_one(&Predicate::eq(FIELD_ID, id), fields).await?;
        debug!(id, field, matched, "User field updated");
        Ok(())
    }

    async fn set_secret(&self, id: &str, field: &str, value: &str) -> AppResult<String> {
        let value = if value.is_empty() {
            generate_secret()
        } else {
            value.to_string()
        };
        self.set_field(id, field, value.clone()).await?;
        Ok(value)
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn add(&self, mut user: User) -> AppResult<User> {
        user.stamp_created(self.clock.now());
        self.store.insert(entity::to_document(&user)?).await?;
        debug!(id = %user.id, "User added");
        Ok(user)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let deleted = self.store.delete_one(&Predicate::eq(FIELD_ID, id)).await?;
        debug!(id, deleted, "User delete issued");
        Ok(())
    }

    async fn update(&self, mut user: User) -> AppResult<User> {
        user.touch(self.clock.now());
        let fields = entity::settable_fields(&user)?;

        let matched = self
            .store
            .update_one(&Predicate::eq(FIELD_ID, user.id.as_str()), fields)
            .await?;
        debug!(id = %user.id, matched, "User updated");
        Ok(user)
    }

    async fn update_token(&self, id: &str, token: &str) -> AppResult<String> {
        self.set_secret(id, FIELD_TOKEN, token).await
    }

    async fn update_password(&self, id: &str, password: &str) -> AppResult<String> {
        self.set_secret(id, FIELD_PASSWORD, password).await
    }

    async fn update_phone(&self, id: &str, phone: &str) -> AppResult<()> {
        self.set_field(id, FIELD_PHONE, phone).await
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        self.find_one(Predicate::eq(FIELD_ID, id)).await
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<User>> {
        self.find_one(Predicate::eq(FIELD_TOKEN, token)).await
    }

    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<User>> {
        self.find_one(Predicate::eq(FIELD_PHONE, phone)).await
    }

    async fn load(&self, options: &FilterOptions) -> AppResult<(Vec<User>, u64)> {
        let mapping = entity::field_mapping();
        let (predicate, find) = QueryCompiler::new(&mapping).compile(options);
        let find = find.with_projection(entity::listing_projection());
        debug!(
            filter = %predicate.to_document(),
            skip = find.skip,
            limit = find.limit,
            "Loading users"
        );

        let total = self.store.count(&predicate).await?;
        let mut cursor = self.store.find(&predicate, &find).await?;

        let mut users = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            if let Some(user) = self.decode(document)? {
                users.push(user);
            }
        }

        Ok((users, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MockDocumentStore;
    use bson::doc;
    use common::{AppError, StoreError};
    use futures::stream::{self, StreamExt};

    fn store_with(mock: MockDocumentStore) -> UserStore {
        UserStore::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_store_errors_propagate_unmodified() {
        let mut mock = MockDocumentStore::new();
        mock.expect_insert()
            .times(1)
            .returning(|_| Err(StoreError::backend("connection reset")));

        let result = store_with(mock).add(User::new("u1")).await;

        match result {
            Err(AppError::Store(StoreError::Backend(msg))) => assert_eq!(msg, "connection reset"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_issues_single_equality() {
        let mut mock = MockDocumentStore::new();
        mock.expect_find_one()
            .withf(|predicate, projection| {
                predicate.to_document() == doc! { "phone": "555-0100" } && projection.is_all()
            })
            .times(1)
            .returning(|_, _| Ok(None));

        let user = store_with(mock).find_by_phone("555-0100").await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_load_count_error_stops_before_find() {
        let mut mock = MockDocumentStore::new();
        mock.expect_count()
            .times(1)
            .returning(|_| Err(StoreError::backend("timeout")));
        mock.expect_find().never();

        let result = store_with(mock).load(&FilterOptions::new()).await;
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_load_cursor_error_fails_the_page() {
        let mut mock = MockDocumentStore::new();
        mock.expect_count().returning(|_| Ok(2));
        mock.expect_find().returning(|_, _| {
            Ok(stream::iter(vec![Err(StoreError::backend("cursor killed"))]).boxed())
        });

        let result = store_with(mock).load(&FilterOptions::new()).await;
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_load_passes_projection_and_paging() {
        let mut mock = MockDocumentStore::new();
        mock.expect_count()
            .withf(|predicate| predicate.to_document() == doc! { "status": 1 })
            .returning(|_| Ok(0));
        mock.expect_find()
            .withf(|_, find| {
                find.skip == 10
                    && find.limit == 5
                    && find.projection.to_document() == Some(doc! { "token": 0, "password": 0 })
            })
            .returning(|_, _| Ok(stream::empty().boxed()));

        let options = FilterOptions::new().status(1).skip(10).limit(5);
        let (users, total) = store_with(mock).load(&options).await.unwrap();

        assert!(users.is_empty());
        assert_eq!(total, 0);
    }
}
