use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the `users` table.
///
/// Only the current token pair is kept; rotation overwrites it.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_date: Option<DateTime<Utc>>,
    pub token_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A freshly registered user: no tokens, version zero.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            access_token: None,
            refresh_token: None,
            expires_date: None,
            token_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `token` is this user's current, unexpired access token.
    pub fn has_active_access_token(&self, token: &str) -> bool {
        match (&self.access_token, self.expires_date) {
            (Some(current), Some(expires)) => current == token && Utc::now() < expires,
            _ => false,
        }
    }

    /// Copy of this user with `tokens` installed and the version bumped.
    pub fn with_tokens(&self, tokens: &IssuedTokens) -> Self {
        Self {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
            expires_date: Some(tokens.expires_date),
            token_version: self.token_version + 1,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Fields of a user that may leave the server.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// A freshly minted token pair and the access token's expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_date: DateTime<Utc>,
    pub token_type: &'static str,
}
