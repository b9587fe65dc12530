use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::models::IssuedTokens;
use crate::error::{AppError, AuthError};

pub const TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub jti: String, // Unique per issuance
    pub typ: TokenKind,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// Mints and verifies the HS256 access/refresh token pair.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::minutes(config.refresh_token_ttl_minutes),
        )
    }

    /// Issues a new pair for `user_id`. `expires_date` is the access token's
    /// expiry: now plus the access TTL.
    pub fn issue(&self, user_id: Uuid) -> Result<IssuedTokens, AppError> {
        let now = Utc::now();
        let expires_date = now + self.access_ttl;

        let access_token = self.sign(user_id, TokenKind::Access, now, expires_date)?;
        let refresh_token =
            self.sign(user_id, TokenKind::Refresh, now, now + self.refresh_ttl)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expires_date,
            token_type: TOKEN_TYPE,
        })
    }

    /// Verifies signature, expiry and that the token is of `expected` kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if claims.typ != expected {
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    fn sign(
        &self,
        user_id: Uuid,
        typ: TokenKind,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            typ,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test_secret", Duration::minutes(5), Duration::days(1))
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let tokens = issuer.issue(user_id).unwrap();

        let access = issuer.verify(&tokens.access_token, TokenKind::Access).unwrap();
        assert_eq!(access.user_id().unwrap(), user_id);
        assert_eq!(access.exp, tokens.expires_date.timestamp());

        let refresh = issuer.verify(&tokens.refresh_token, TokenKind::Refresh).unwrap();
        assert_eq!(refresh.user_id().unwrap(), user_id);
        assert!(refresh.exp > access.exp);
        assert_eq!(tokens.token_type, "bearer");
    }

    #[test]
    fn test_every_issuance_is_distinct() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let first = issuer.issue(user_id).unwrap();
        let second = issuer.issue(user_id).unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_ne!(first.access_token, first.refresh_token);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let issuer = issuer();
        let tokens = issuer.issue(Uuid::new_v4()).unwrap();

        assert_eq!(
            issuer.verify(&tokens.refresh_token, TokenKind::Access).unwrap_err(),
            AuthError::InvalidToken
        );
        assert_eq!(
            issuer.verify(&tokens.access_token, TokenKind::Refresh).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let other = TokenIssuer::new("other_secret", Duration::minutes(5), Duration::days(1));
        let tokens = other.issue(Uuid::new_v4()).unwrap();

        assert_eq!(
            issuer().verify(&tokens.access_token, TokenKind::Access).unwrap_err(),
            AuthError::InvalidToken
        );
        assert_eq!(
            issuer().verify("not-a-jwt", TokenKind::Access).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Past the default 60s validation leeway.
        let issuer = TokenIssuer::new("test_secret", Duration::minutes(-5), Duration::minutes(-5));
        let tokens = issuer.issue(Uuid::new_v4()).unwrap();

        assert_eq!(
            issuer.verify(&tokens.access_token, TokenKind::Access).unwrap_err(),
            AuthError::TokenExpired
        );
        assert_eq!(
            issuer.verify(&tokens.refresh_token, TokenKind::Refresh).unwrap_err(),
            AuthError::TokenExpired
        );
    }
}
