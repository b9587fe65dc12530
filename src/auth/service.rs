use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::PasswordHasher;
use crate::auth::tokens::{TokenIssuer, TokenKind};
use crate::auth::validation::{normalize_email, LoginRequest, RefreshRequest, RegisterRequest};
use crate::config::AuthConfig;
use crate::db::models::{IssuedTokens, User};
use crate::db::store::UserStore;
use crate::error::{AppError, AuthError, DatabaseError, FieldErrors};

pub const EMAIL_TAKEN_MESSAGE: &str = "The email has already been taken.";

/// Login retries this many times when a concurrent rotation bumps the
/// user's token version between the read and the write.
const MAX_ROTATION_ATTEMPTS: usize = 3;

/// Registration, login, refresh and access-token checks. Every operation
/// takes the caller's credentials explicitly; there is no ambient session.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenIssuer, hasher: PasswordHasher) -> Self {
        Self {
            store,
            tokens,
            hasher,
        }
    }

    pub fn from_config(store: Arc<dyn UserStore>, config: &AuthConfig) -> Result<Self, AppError> {
        Ok(Self::new(
            store,
            TokenIssuer::from_config(config),
            PasswordHasher::from_config(config)?,
        ))
    }

    /// Creates a user with no tokens. All field errors, including a taken
    /// email, are reported together and nothing is hashed or stored.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        let email = normalize_email(request.email.clone());

        let (registration, mut errors) = match request.check() {
            Ok(registration) => (Some(registration), FieldErrors::new()),
            Err(errors) => (None, errors),
        };

        if let Some(email) = email.filter(|_| !errors.has("email")) {
            if self.store.email_exists(&email).await? {
                errors.add("email", EMAIL_TAKEN_MESSAGE);
            }
        }

        let registration = match registration {
            Some(registration) if errors.is_empty() => registration,
            _ => return Err(AppError::ValidationError(errors)),
        };

        let password_hash = self.hasher.hash(&registration.password)?;
        let user = User::new(registration.name, registration.email, password_hash);

        match self.store.insert(&user).await {
            Ok(user) => {
                info!("Registered user {}", user.id);
                Ok(user)
            }
            // Lost a race with a concurrent registration for the same email.
            Err(AppError::DatabaseError(DatabaseError::Duplicate(_))) => {
                Err(FieldErrors::single("email", EMAIL_TAKEN_MESSAGE).into())
            }
            Err(e) => Err(e),
        }
    }

    /// Verifies the password and rotates the user's token pair.
    pub async fn login(&self, request: LoginRequest) -> Result<IssuedTokens, AppError> {
        let credentials = request.check()?;

        let user = match self.store.find_by_email(&credentials.email).await? {
            Some(user) => user,
            None => {
                self.hasher.verify_decoy(&credentials.password);
                warn!("Login rejected: unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !self.hasher.verify(&credentials.password, &user.password_hash) {
            warn!("Login rejected for user {}: wrong password", user.id);
            return Err(AuthError::InvalidCredentials.into());
        }

        let mut current = user;
        for attempt in 1..=MAX_ROTATION_ATTEMPTS {
            if let Some(tokens) = self.rotate(&current).await? {
                info!("User {} logged in", current.id);
                return Ok(tokens);
            }

            warn!(
                "Token rotation conflict for user {} (attempt {}/{})",
                current.id, attempt, MAX_ROTATION_ATTEMPTS
            );
            current = self
                .store
                .find_by_id(current.id)
                .await?
                .ok_or(DatabaseError::NotFound)?;
        }

        Err(AppError::InternalError(format!(
            "token rotation for user {} kept conflicting",
            current.id
        )))
    }

    /// Exchanges the user's current refresh token for a new pair.
    ///
    /// The token must be a valid, unexpired refresh JWT, it must be the one
    /// currently stored for its subject, and no other refresh may have
    /// rotated it in the meantime.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<IssuedTokens, AppError> {
        let presented = request.check()?;

        let claims = self.tokens.verify(&presented, TokenKind::Refresh).map_err(|e| {
            warn!("Refresh rejected: {}", e);
            e
        })?;

        let user = match self.store.find_by_refresh_token(&presented).await? {
            Some(user) => user,
            None => {
                warn!("Refresh rejected: token is not current");
                return Err(AuthError::UnknownRefreshToken.into());
            }
        };

        if claims.user_id()? != user.id {
            warn!("Refresh rejected: subject does not own token");
            return Err(AuthError::InvalidToken.into());
        }

        match self.rotate(&user).await? {
            Some(tokens) => {
                info!("Refreshed tokens for user {}", user.id);
                Ok(tokens)
            }
            None => {
                warn!("Refresh rejected for user {}: token already rotated", user.id);
                Err(AuthError::StaleSession.into())
            }
        }
    }

    /// Resolves a bearer access token to its user. The token must verify
    /// and still be the user's current, unexpired access token.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AppError> {
        let claims = self.tokens.verify(access_token, TokenKind::Access)?;
        let user_id: Uuid = claims.user_id()?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.has_active_access_token(access_token) {
            return Err(AuthError::InvalidToken.into());
        }

        Ok(user)
    }

    async fn rotate(&self, user: &User) -> Result<Option<IssuedTokens>, AppError> {
        let tokens = self.tokens.issue(user.id)?;
        let rotated = self
            .store
            .rotate_tokens(user.id, user.token_version, &tokens)
            .await?;
        Ok(rotated.map(|_| tokens))
    }
}
