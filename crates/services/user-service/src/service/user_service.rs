//! User service - Handles user-related use cases.
//!
//! Thin layer over [`UserRepository`] for callers that prefer an error over
//! an absent result and want list results as a [`Paginated`] page.

use async_trait::async_trait;
use std::sync::Arc;

use common::{AppResult, FilterOptions, OptionExt, Paginated};
use domain::User;

use crate::repository::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID, `AppError::NotFound` when absent
    async fn get_user(&self, id: &str) -> AppResult<User>;

    /// Get user by bearer token, `AppError::NotFound` when absent
    async fn get_user_by_token(&self, token: &str) -> AppResult<User>;

    /// Get user by phone, `AppError::NotFound` when absent
    async fn get_user_by_phone(&self, phone: &str) -> AppResult<User>;

    /// List users matching the filter
    async fn list_users(&self, options: FilterOptions) -> AppResult<Paginated<User>>;

    /// Create a new user
    async fn create_user(&self, user: User) -> AppResult<User>;

    /// Replace user details
    async fn update_user(&self, user: User) -> AppResult<User>;

    /// Permanently delete user
    async fn delete_user(&self, id: &str) -> AppResult<()>;

    /// Replace the bearer token, generating one when `token` is `None`
    async fn rotate_token(&self, id: &str, token: Option<String>) -> AppResult<String>;

    /// Replace the credential, generating one when `password` is `None`
    async fn reset_password(&self, id: &str, password: Option<String>) -> AppResult<String>;

    /// Change the phone number
    async fn change_phone(&self, id: &str, phone: &str) -> AppResult<()>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
}

impl UserManager {
    /// Create new user service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn get_user(&self, id: &str) -> AppResult<User> {
        self.repo.find_by_id(id).await?.ok_or_not_found()
    }

    async fn get_user_by_token(&self, token: &str) -> AppResult<User> {
        self.repo.find_by_token(token).await?.ok_or_not_found()
    }

    async fn get_user_by_phone(&self, phone: &str) -> AppResult<User> {
        self.repo.find_by_phone(phone).await?.ok_or_not_found()
    }

    async fn list_users(&self, options: FilterOptions) -> AppResult<Paginated<User>> {
        let (users, total) = self.repo.load(&options).await?;
        Ok(Paginated::new(
            users,
            options.requested_skip(),
            options.requested_limit(),
            total,
        ))
    }

    async fn create_user(&self, user: User) -> AppResult<User> {
        self.repo.add(user).await
    }

    async fn update_user(&self, user: User) -> AppResult<User> {
        self.repo.update(user).await
    }

    async fn delete_user(&self, id: &str) -> AppResult<()> {
        self.repo.delete(id).await
    }

    async fn rotate_token(&self, id: &str, token: Option<String>) -> AppResult<String> {
        self.repo
            .update_token(id, token.as_deref().unwrap_or_default())
            .await
    }

    async fn reset_password(&self, id: &str, password: Option<String>) -> AppResult<String> {
        self.repo
            .update_password(id, password.as_deref().unwrap_or_default())
            .await
    }

    async fn change_phone(&self, id: &str, phone: &str) -> AppResult<()> {
        self.repo.update_phone(id, phone).await
    }
}
