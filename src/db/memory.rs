use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{IssuedTokens, User};
use crate::db::store::UserStore;
use crate::error::{AppError, DatabaseError};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    by_refresh_token: HashMap<String, Uuid>,
}

/// Process-local user store with the same uniqueness rules as the
/// `users` table.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;

        if tables.by_email.contains_key(&user.email) {
            return Err(DatabaseError::Duplicate("users_email_key".to_string()).into());
        }
        if tables.users.contains_key(&user.id) {
            return Err(DatabaseError::Duplicate("users_pkey".to_string()).into());
        }

        tables.by_email.insert(user.email.clone(), user.id);
        if let Some(token) = &user.refresh_token {
            tables.by_refresh_token.insert(token.clone(), user.id);
        }
        tables.users.insert(user.id, user.clone());

        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_refresh_token
            .get(token)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.tables.read().await.by_email.contains_key(email))
    }

    async fn rotate_tokens(
        &self,
        id: Uuid,
        expected_version: i64,
        tokens: &IssuedTokens,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;

        let current = match tables.users.get(&id) {
            Some(user) if user.token_version == expected_version => user.clone(),
            _ => return Ok(None),
        };

        if let Some(owner) = tables.by_refresh_token.get(&tokens.refresh_token) {
            if *owner != id {
                return Err(DatabaseError::Duplicate("users_refresh_token_key".to_string()).into());
            }
        }

        if let Some(previous) = &current.refresh_token {
            tables.by_refresh_token.remove(previous);
        }
        tables.by_refresh_token.insert(tokens.refresh_token.clone(), id);

        let rotated = current.with_tokens(tokens);
        tables.users.insert(id, rotated.clone());

        Ok(Some(rotated))
    }
}
