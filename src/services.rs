use actix_web::{web, HttpRequest};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use log::{debug, error, info};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::models::*;
use crate::store::{AccountStore, PromoteOutcome, StoreError};

pub const SESSION_COOKIE: &str = "session";

/// Runs a store call on the blocking pool and flattens both error layers.
async fn run_store<T, F>(op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    web::block(op)
        .await
        .map_err(|e| {
            error!("Blocking task error: {}", e);
            ApiError::StoreFailure(e.to_string())
        })?
        .map_err(ApiError::from)
}

pub struct AuthService;

impl AuthService {
    pub fn hash_password(password: &str) -> Result<String, ApiError> {
        hash(password, DEFAULT_COST).map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::StoreFailure("Failed to hash password".to_string())
        })
    }

    pub fn verify_password(password: &str, hashed: &str) -> Result<bool, ApiError> {
        verify(password, hashed).map_err(|e| {
            error!("Failed to verify password: {}", e);
            ApiError::StoreFailure("Failed to verify password".to_string())
        })
    }

    pub fn generate_session_token() -> String {
        Uuid::new_v4().to_string()
    }

    /// Pulls the session token off the request: `session` cookie first,
    /// `Authorization: Bearer` as a fallback.
    pub fn session_token(req: &HttpRequest) -> Option<String> {
        if let Some(cookie) = req.cookie(SESSION_COOKIE) {
            return Some(cookie.value().to_string());
        }
        req.headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|v| v.to_string())
    }

    pub async fn issue_session(
        account_id: i32,
        config: &AppConfig,
        store: &Arc<dyn AccountStore>,
    ) -> Result<String, ApiError> {
        let token = Self::generate_session_token();
        let new_session = NewSession {
            account_id,
            token: token.clone(),
            expires_at: (Utc::now() + Duration::hours(config.session_expiry_hours)).naive_utc(),
        };
        let store = Arc::clone(store);
        run_store(move || store.create_session(new_session)).await?;
        Ok(token)
    }

    /// Resolves the request to a live session or answers Unauthenticated.
    pub async fn authenticate(
        req: &HttpRequest,
        store: &Arc<dyn AccountStore>,
    ) -> Result<Session, ApiError> {
        let Some(token) = Self::session_token(req) else {
            return Err(ApiError::Unauthenticated("User not logged in".to_string()));
        };
        let store = Arc::clone(store);
        let session = run_store(move || store.find_session(&token)).await?;
        match session {
            Some(session) if session.expires_at > Utc::now().naive_utc() => Ok(session),
            Some(_) => {
                debug!("Rejected expired session for account");
                Err(ApiError::Unauthenticated("Session expired".to_string()))
            }
            None => Err(ApiError::Unauthenticated("User not logged in".to_string())),
        }
    }

    pub async fn revoke_session(
        token: String,
        store: &Arc<dyn AccountStore>,
    ) -> Result<(), ApiError> {
        let store = Arc::clone(store);
        run_store(move || store.delete_session(&token)).await
    }
}

pub struct AccountService;

impl AccountService {
    pub async fn signup(
        request: &SignupRequest,
        store: &Arc<dyn AccountStore>,
    ) -> Result<i32, ApiError> {
        let new_account = NewAccount {
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash: AuthService::hash_password(&request.password)?,
        };
        let store = Arc::clone(store);
        let account_id = web::block(move || store.create_account(new_account))
            .await
            .map_err(|e| {
                error!("Blocking task error: {}", e);
                ApiError::StoreFailure(e.to_string())
            })?
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    debug!("Signup rejected, username or email taken: {}", request.username);
                    ApiError::Conflict("Username or email already exists".to_string())
                }
                other => ApiError::from(other),
            })?;

        info!("Created new account with ID: {}", account_id);
        Ok(account_id)
    }

    pub async fn login(
        request: &LoginRequest,
        config: &AppConfig,
        store: &Arc<dyn AccountStore>,
    ) -> Result<(Account, String), ApiError> {
        let username = request.username.clone();
        let lookup = Arc::clone(store);
        let found = run_store(move || lookup.find_account_by_username(&username)).await?;

        // Unknown user and wrong password are indistinguishable to the caller.
        let Some(account) = found else {
            debug!("Login failed: no account named {}", request.username);
            return Err(ApiError::InvalidCredential("Login failed".to_string()));
        };
        if !AuthService::verify_password(&request.password, &account.password_hash)? {
            debug!("Login failed: wrong password for {}", request.username);
            return Err(ApiError::InvalidCredential("Login failed".to_string()));
        }

        let token = AuthService::issue_session(account.id, config, store).await?;
        info!("Account {} logged in successfully", account.username);
        Ok((account, token))
    }

    pub async fn change_username(
        account_id: i32,
        new_username: String,
        store: &Arc<dyn AccountStore>,
    ) -> Result<(), ApiError> {
        let store = Arc::clone(store);
        run_store(move || store.update_username(account_id, &new_username)).await?;
        info!("Username updated for account {}", account_id);
        Ok(())
    }

    pub async fn change_password(
        account_id: i32,
        current_password: &str,
        new_password: &str,
        store: &Arc<dyn AccountStore>,
    ) -> Result<(), ApiError> {
        let lookup = Arc::clone(store);
        let account = run_store(move || lookup.find_account(account_id))
            .await?
            .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

        if !AuthService::verify_password(current_password, &account.password_hash)? {
            debug!("Password change rejected for account {}", account_id);
            return Err(ApiError::InvalidCredential(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = AuthService::hash_password(new_password)?;
        let store = Arc::clone(store);
        run_store(move || store.update_password(account_id, &new_hash)).await?;
        info!("Password updated for account {}", account_id);
        Ok(())
    }

    pub async fn change_email(
        account_id: i32,
        new_email: String,
        store: &Arc<dyn AccountStore>,
    ) -> Result<(), ApiError> {
        let store = Arc::clone(store);
        web::block(move || store.update_email(account_id, &new_email))
            .await
            .map_err(|e| {
                error!("Blocking task error: {}", e);
                ApiError::StoreFailure(e.to_string())
            })?
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    ApiError::Conflict("Email already exists".to_string())
                }
                other => ApiError::from(other),
            })?;
        info!("Email updated for account {}", account_id);
        Ok(())
    }

    pub async fn grant_admin(
        account_id: i32,
        security_key: &str,
        config: &AppConfig,
        store: &Arc<dyn AccountStore>,
    ) -> Result<PromoteOutcome, ApiError> {
        if security_key != config.admin_security_key {
            debug!("Admin promotion rejected for account {}: bad key", account_id);
            return Err(ApiError::InvalidInput("Invalid security key".to_string()));
        }

        let store = Arc::clone(store);
        let outcome = run_store(move || store.promote_to_admin(account_id)).await?;
        match outcome {
            PromoteOutcome::Granted => {
                info!("Account {} granted admin privileges", account_id)
            }
            PromoteOutcome::AlreadyAdmin => {
                debug!("Account {} already has admin privileges", account_id)
            }
            PromoteOutcome::NotFound => {
                return Err(ApiError::NotFound("User not found".to_string()))
            }
        }
        Ok(outcome)
    }

    pub async fn update_restrictions(
        account_id: i32,
        labels: Vec<String>,
        store: &Arc<dyn AccountStore>,
    ) -> Result<(), ApiError> {
        let count = labels.len();
        let store = Arc::clone(store);
        run_store(move || store.replace_restrictions(account_id, labels)).await?;
        info!("Replaced dietary restrictions for account {} ({} labels)", account_id, count);
        Ok(())
    }

    pub async fn delete_account(
        account_id: i32,
        store: &Arc<dyn AccountStore>,
    ) -> Result<(), ApiError> {
        let store = Arc::clone(store);
        run_store(move || store.delete_account(account_id)).await?;
        info!("Account {} deleted", account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hashed = AuthService::hash_password("pw1").unwrap();
        assert_ne!(hashed, "pw1");
        assert!(AuthService::verify_password("pw1", &hashed).unwrap());
        assert!(!AuthService::verify_password("pw2", &hashed).unwrap());
    }

    #[test]
    fn session_tokens_are_unique() {
        assert_ne!(
            AuthService::generate_session_token(),
            AuthService::generate_session_token()
        );
    }
}
