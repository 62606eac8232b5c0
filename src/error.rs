use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Receipt text could not be turned into a structured receipt
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("no text could be recognized on the receipt")]
    NoText,

    #[error("no store name found on the receipt")]
    MissingStore,

    #[error("no total amount found on the receipt")]
    MissingTotal,

    #[error("text recognition failed: {0}")]
    Recognizer(String),
}

#[derive(Debug, Error)]
pub enum TotpError {
    #[error("TOTP secret is not valid base32")]
    InvalidSecret,

    #[error("TOTP is not configured for this user")]
    NotConfigured,

    #[error("TOTP provisioning failed: {0}")]
    Provisioning(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Totp(#[from] TotpError),

    #[error("{0}")]
    BadRequest(String),

    #[error("too many attempts, try again in {0} seconds")]
    RateLimited(u64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Totp(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Scheduled-function style response: every failure is a 400 with `{error}`
    pub fn into_function_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
