use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use log::{debug, error, warn};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

// Request-level error taxonomy. Each variant maps to one HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not logged in: {0}")]
    Unauthenticated(String),
    #[error("Invalid credentials: {0}")]
    InvalidCredential(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Store failure: {0}")]
    StoreFailure(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::NotFound => ApiError::NotFound("Record not found".to_string()),
            StoreError::Backend(msg) => ApiError::StoreFailure(msg),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Conflict(msg) => {
                warn!("\x1B[1;33mCONFLICT:\x1B[0m {}", msg);
                HttpResponse::Conflict().json(json!({ "error": msg }))
            }
            ApiError::Unauthenticated(msg) => {
                warn!("\x1B[1;33mUNAUTHENTICATED:\x1B[0m {}", msg);
                HttpResponse::Forbidden().json(json!({ "error": msg }))
            }
            ApiError::InvalidCredential(msg) => {
                warn!("\x1B[1;33mINVALID CREDENTIALS:\x1B[0m {}", msg);
                HttpResponse::Unauthorized().json(json!({ "error": msg }))
            }
            ApiError::NotFound(msg) => {
                debug!("\x1B[1;36mNOT FOUND:\x1B[0m {}", msg);
                HttpResponse::NotFound().json(json!({ "error": msg }))
            }
            ApiError::InvalidInput(msg) => {
                warn!("\x1B[1;33mINVALID INPUT:\x1B[0m {}", msg);
                HttpResponse::BadRequest().json(json!({ "error": msg }))
            }
            // The underlying store message stays in the log; echoing it to
            // the caller would leak schema details.
            ApiError::StoreFailure(msg) => {
                error!("\x1B[1;31mSTORE FAILURE:\x1B[0m {}", msg);
                HttpResponse::InternalServerError()
                    .json(json!({ "error": "Internal server error" }))
            }
        }
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthenticated(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
