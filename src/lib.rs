pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpResponse};
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, AuthenticatedUser};
pub use db::{DbOperations, InMemoryUserStore, User, UserStore};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Registers every route and the JSON body error handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(auth::handlers::json_error_handler))
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(auth::handlers::register))
                .route("/login", web::post().to(auth::handlers::login))
                .route("/refresh", web::post().to(auth::handlers::refresh))
                .route("/me", web::get().to(auth::handlers::me)),
        );
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and wires the auth service.
    pub async fn new(config: Settings) -> Result<Self> {
        let db = DbOperations::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(config.database.acquire_timeout_secs),
        )
        .await?;

        db.migrate().await?;
        info!("Database migrations applied");

        Self::with_store(config, Arc::new(db))
    }

    /// Wires the auth service on top of an existing store.
    pub fn with_store(config: Settings, store: Arc<dyn UserStore>) -> Result<Self> {
        let auth_service = AuthService::from_config(store, &config.auth)?;

        Ok(Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
        })
    }
}
