//! Database module for the auth server
//!
//! This module defines the user record, the `UserStore` persistence
//! trait and its Postgres and in-memory implementations.

pub mod memory;
pub mod models;
pub mod operations;
pub mod store;

pub use memory::InMemoryUserStore;
pub use models::{IssuedTokens, PublicUser, User};
pub use operations::DbOperations;
pub use store::UserStore;
