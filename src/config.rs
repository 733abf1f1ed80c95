use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use log::warn;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::env;

// Type aliases
pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

// Schema provisioning script, executed once at startup.
// Referential cleanup is manual (no ON DELETE CASCADE): every delete path
// removes child rows itself, inside the same transaction.
pub const DB_INIT_SQL: &str = r#"
-- Create tables if they don't exist
CREATE TABLE IF NOT EXISTS account (
    id SERIAL PRIMARY KEY,
    username VARCHAR(100) UNIQUE NOT NULL,
    email VARCHAR(255) UNIQUE NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS users (
    account_id INTEGER PRIMARY KEY REFERENCES account(id)
);

CREATE TABLE IF NOT EXISTS admin (
    account_id INTEGER PRIMARY KEY REFERENCES account(id),
    admin_name VARCHAR(100) NOT NULL
);

CREATE TABLE IF NOT EXISTS user_restrictions (
    account_id INTEGER NOT NULL REFERENCES account(id),
    restriction VARCHAR(100) NOT NULL,
    PRIMARY KEY (account_id, restriction)
);

CREATE TABLE IF NOT EXISTS session (
    session_id SERIAL PRIMARY KEY,
    account_id INTEGER NOT NULL REFERENCES account(id),
    token VARCHAR(255) UNIQUE NOT NULL,
    expires_at TIMESTAMP NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT NOW()
);
"#;

pub const DEFAULT_ADMIN_SECURITY_KEY: &str = "admin";

// Config
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub admin_security_key: String,
    pub session_expiry_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let admin_security_key = match env::var("ADMIN_SECURITY_KEY") {
            Ok(val) => val,
            Err(e) => {
                warn!("Failed to load ADMIN_SECURITY_KEY: {}", e);
                warn!("Using default admin security key - THIS IS NOT SECURE FOR PRODUCTION!");
                DEFAULT_ADMIN_SECURITY_KEY.to_string()
            }
        };

        let session_expiry_hours = env::var("SESSION_EXPIRY_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(24);

        Self {
            admin_security_key,
            session_expiry_hours,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.admin_security_key == DEFAULT_ADMIN_SECURITY_KEY {
            warn!("Using default admin security key is not secure for production!");
        }

        if self.admin_security_key.is_empty() {
            return Err("ADMIN_SECURITY_KEY must not be empty".to_string());
        }

        if self.session_expiry_hours <= 0 {
            return Err("SESSION_EXPIRY_HOURS must be positive".to_string());
        }

        Ok(())
    }

    pub fn generate_secure_key() -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str, hours: i64) -> AppConfig {
        AppConfig {
            admin_security_key: key.to_string(),
            session_expiry_hours: hours,
        }
    }

    #[test]
    fn default_key_validates_with_a_warning() {
        assert!(config("admin", 24).validate().is_ok());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(config("", 24).validate().is_err());
    }

    #[test]
    fn non_positive_expiry_is_rejected() {
        assert!(config("s3cret", 0).validate().is_err());
        assert!(config("s3cret", -1).validate().is_err());
    }

    #[test]
    fn generated_keys_are_long_and_distinct() {
        let a = AppConfig::generate_secure_key();
        let b = AppConfig::generate_secure_key();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
