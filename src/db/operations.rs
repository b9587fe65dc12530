use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::db::models::{IssuedTokens, User};
use crate::db::store::UserStore;
use crate::error::{AppError, DatabaseError};

const USER_COLUMNS: &str = "id, name, email, password_hash, access_token, refresh_token, \
     expires_date, token_version, created_at, updated_at";

/// Postgres-backed [`UserStore`].
#[derive(Clone)]
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for DbOperations {
    async fn insert(&self, user: &User) -> Result<User, AppError> {
        let query = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, access_token, refresh_token,
                               expires_date, token_version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.access_token)
            .bind(&user.refresh_token)
            .bind(user.expires_date)
            .bind(user.token_version)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE refresh_token = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(token)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn rotate_tokens(
        &self,
        id: Uuid,
        expected_version: i64,
        tokens: &IssuedTokens,
    ) -> Result<Option<User>, AppError> {
        // The version predicate makes this a compare-and-swap; zero rows
        // means a concurrent rotation already won.
        let query = format!(
            r#"
            UPDATE users
            SET access_token = $1, refresh_token = $2, expires_date = $3,
                token_version = token_version + 1, updated_at = $4
            WHERE id = $5 AND token_version = $6
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(&tokens.access_token)
            .bind(&tokens.refresh_token)
            .bind(tokens.expires_date)
            .bind(Utc::now())
            .bind(id)
            .bind(expected_version)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(user)
    }
}
