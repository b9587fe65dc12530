use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{IssuedTokens, User};
use crate::error::AppError;

/// Persistence for user records and their current token pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. A taken email yields `DatabaseError::Duplicate`.
    async fn insert(&self, user: &User) -> Result<User, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Exact match against the stored refresh token.
    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Overwrites the user's token triple if `token_version` still equals
    /// `expected_version`, bumping the version. Returns `None` when another
    /// writer got there first.
    async fn rotate_tokens(
        &self,
        id: Uuid,
        expected_version: i64,
        tokens: &IssuedTokens,
    ) -> Result<Option<User>, AppError>;
}
