//! Bearer-token guard for protected routes.
//!
//! Add `AuthenticatedUser` as a handler argument to require a current,
//! unexpired access token:
//!
//! ```rust,ignore
//! async fn profile(AuthenticatedUser(user): AuthenticatedUser) -> HttpResponse { .. }
//! ```

use std::future::Future;
use std::pin::Pin;

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use tracing::warn;

use crate::db::models::User;
use crate::error::{AppError, AuthError};
use crate::AppState;

pub struct AuthenticatedUser(pub User);

/// Token part of an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req).map(str::to_string);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                AppError::InternalError("application state is not registered".to_string())
            })?;
            let token = token.ok_or(AuthError::MissingToken)?;

            match state.auth_service.authenticate(&token).await {
                Ok(user) => Ok(AuthenticatedUser(user)),
                Err(e) => {
                    if let AppError::AuthError(reason) = &e {
                        warn!("Bearer token rejected: {}", reason);
                    }
                    Err(e)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def.ghi"));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer "))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }
}
