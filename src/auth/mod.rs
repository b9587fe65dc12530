//! Authentication module
//!
//! Registration, login, token refresh and the bearer-token guard for
//! protected routes.

pub mod extractor;
pub mod handlers;
pub mod password;
pub mod service;
pub mod tokens;
pub mod validation;

pub use extractor::AuthenticatedUser;
pub use password::PasswordHasher;
pub use service::AuthService;
pub use tokens::{Claims, TokenIssuer, TokenKind};
pub use validation::{LoginRequest, RefreshRequest, RegisterRequest};
