//! Function-style endpoints (MFA, scheduled jobs). Failures answer 400 `{error}`.

use crate::service::{JobService, MfaService};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct TotpSetupRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct TotpVerifyRequest {
    pub user_id: Uuid,
    pub code: String,
    pub secret: Option<String>,
}

pub async fn totp_setup(
    State(service): State<Arc<MfaService>>,
    Json(req): Json<TotpSetupRequest>,
) -> Response {
    match service.setup(req.user_id).await {
        Ok(setup) => (StatusCode::OK, Json(setup)).into_response(),
        Err(e) => {
            tracing::error!("TOTP setup for {} failed: {}", req.user_id, e);
            e.into_function_response()
        }
    }
}

pub async fn totp_verify(
    State(service): State<Arc<MfaService>>,
    Json(req): Json<TotpVerifyRequest>,
) -> Response {
    match service
        .verify(req.user_id, &req.code, req.secret.as_deref())
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            tracing::warn!("TOTP verify for {} failed: {}", req.user_id, e);
            e.into_function_response()
        }
    }
}

pub async fn daily_challenges(State(jobs): State<Arc<JobService>>) -> Response {
    match jobs.generate_daily_challenges(Utc::now()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            tracing::error!("daily challenge generation failed: {}", e);
            e.into_function_response()
        }
    }
}

pub async fn monthly_reset(State(jobs): State<Arc<JobService>>) -> Response {
    match jobs.reset_monthly_points(Utc::now()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            tracing::error!("monthly points reset failed: {}", e);
            e.into_function_response()
        }
    }
}
