use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::extractor::AuthenticatedUser;
use crate::auth::validation::{LoginRequest, RefreshRequest, RegisterRequest};
use crate::db::models::{IssuedTokens, PublicUser};
use crate::error::{AppError, FieldErrors};
use crate::AppState;

pub const REGISTERED_MESSAGE: &str = "User successfully registered";

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub data: IssuedTokens,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request");

    match state.auth_service.register(req.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Created().json(RegisterResponse {
            message: REGISTERED_MESSAGE,
            user: PublicUser::from(&user),
        })),
        Err(e) => {
            if let AppError::ValidationError(fields) = &e {
                info!("Registration rejected: invalid {}", fields);
            }
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request");
    let tokens = state.auth_service.login(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AuthResponse { data: tokens }))
}

pub async fn refresh(
    req: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received token refresh request");
    let tokens = state.auth_service.refresh(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AuthResponse { data: tokens }))
}

pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse {
        user: PublicUser::from(&user),
    })
}

/// Turns body decoding failures into a 422 under the `body` key.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    warn!("Rejected request body: {}", err);
    AppError::ValidationError(FieldErrors::single(
        "body",
        "The request body must be a valid JSON object.",
    ))
    .into()
}
