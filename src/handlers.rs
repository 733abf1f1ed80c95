use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use log::{debug, warn};
use serde_json::json;

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::models::{
    ChangeEmailForm, ChangePasswordForm, ChangeUsernameForm, LoginRequest, LoginResponse,
    SecurityKeyForm, SignupRequest,
};
use crate::services::{AccountService, AuthService, SESSION_COOKIE};
use crate::store::{AccountStore, PromoteOutcome};

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[post("/signup")]
pub async fn signup(
    store: web::Data<dyn AccountStore>,
    payload: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Signup request received for username: {}", payload.username);
    let store = store.into_inner();
    AccountService::signup(&payload, &store).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User created successfully"
    })))
}

#[post("/login")]
pub async fn login(
    store: web::Data<dyn AccountStore>,
    config: web::Data<AppConfig>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    debug!("Login attempt for username: {}", payload.username);
    let store = store.into_inner();
    let (account, token) = AccountService::login(&payload, &config, &store).await?;

    let cookie = Cookie::build(SESSION_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .finish();
    Ok(HttpResponse::Ok().cookie(cookie).json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        account_id: account.id,
        username: account.username,
    }))
}

// Clears the session unconditionally; a missing or stale token still
// redirects.
#[get("/logout")]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<dyn AccountStore>,
) -> Result<HttpResponse, ApiError> {
    let store = store.into_inner();
    if let Some(token) = AuthService::session_token(&req) {
        if let Err(e) = AuthService::revoke_session(token, &store).await {
            warn!("Failed to revoke session on logout: {}", e);
        }
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(removal)
        .finish())
}

#[post("/change_username")]
pub async fn change_username(
    req: HttpRequest,
    store: web::Data<dyn AccountStore>,
    form: web::Form<ChangeUsernameForm>,
) -> Result<HttpResponse, ApiError> {
    let store = store.into_inner();
    let session = AuthService::authenticate(&req, &store).await?;
    AccountService::change_username(session.account_id, form.into_inner().username, &store)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Username successfully updated" })))
}

#[post("/change_password")]
pub async fn change_password(
    req: HttpRequest,
    store: web::Data<dyn AccountStore>,
    form: web::Form<ChangePasswordForm>,
) -> Result<HttpResponse, ApiError> {
    let store = store.into_inner();
    let session = AuthService::authenticate(&req, &store).await?;
    AccountService::change_password(
        session.account_id,
        &form.current_password,
        &form.new_password,
        &store,
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password successfully updated" })))
}

#[post("/change_email")]
pub async fn change_email(
    req: HttpRequest,
    store: web::Data<dyn AccountStore>,
    form: web::Form<ChangeEmailForm>,
) -> Result<HttpResponse, ApiError> {
    let store = store.into_inner();
    let session = AuthService::authenticate(&req, &store).await?;
    AccountService::change_email(session.account_id, form.into_inner().email, &store).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Email successfully updated" })))
}

#[post("/update_security_key")]
pub async fn update_security_key(
    req: HttpRequest,
    store: web::Data<dyn AccountStore>,
    config: web::Data<AppConfig>,
    form: web::Form<SecurityKeyForm>,
) -> Result<HttpResponse, ApiError> {
    let store = store.into_inner();
    let session = AuthService::authenticate(&req, &store).await?;
    let outcome =
        AccountService::grant_admin(session.account_id, &form.security_key, &config, &store)
            .await?;
    let message = match outcome {
        PromoteOutcome::Granted => "User granted admin privileges",
        PromoteOutcome::AlreadyAdmin => "User already has admin privileges",
        // grant_admin surfaces this as an error; kept for exhaustiveness
        PromoteOutcome::NotFound => {
            return Err(ApiError::NotFound("User not found".to_string()))
        }
    };
    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}

// The checkbox form posts zero or more `diet[]` fields.
#[post("/update_diet_restrictions")]
pub async fn update_diet_restrictions(
    req: HttpRequest,
    store: web::Data<dyn AccountStore>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, ApiError> {
    let store = store.into_inner();
    let session = AuthService::authenticate(&req, &store).await?;
    let labels: Vec<String> = form
        .into_inner()
        .into_iter()
        .filter(|(key, _)| key == "diet[]")
        .map(|(_, value)| value)
        .collect();
    AccountService::update_restrictions(session.account_id, labels, &store).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Dietary restrictions updated successfully" })))
}

#[post("/delete_account")]
pub async fn delete_account(
    req: HttpRequest,
    store: web::Data<dyn AccountStore>,
) -> Result<HttpResponse, ApiError> {
    let store = store.into_inner();
    let session = AuthService::authenticate(&req, &store).await?;
    AccountService::delete_account(session.account_id, &store).await?;

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();
    Ok(HttpResponse::Ok()
        .cookie(removal)
        .json(json!({ "message": "Account deleted successfully" })))
}
