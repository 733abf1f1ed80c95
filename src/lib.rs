// Module exports for the account service.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod services;
pub mod store;

// Re-export common types
pub use crate::config::{AppConfig, DbPool};
pub use crate::errors::ApiError;
pub use crate::models::Account;
pub use crate::store::{AccountStore, PgStore};
