use crate::error::AppError;
use crate::models::{ManualReceipt, PointsSummary};
use crate::service::{CaptureInput, CaptureOutcome, CaptureService};
use axum::{
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Image or manual entry, as sent over the wire
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePayload {
    ImageBase64(String),
    Manual(ManualReceipt),
}

impl CapturePayload {
    pub fn into_input(self) -> Result<CaptureInput, AppError> {
        match self {
            CapturePayload::ImageBase64(encoded) => {
                // data URLs carry a "data:image/jpeg;base64," prefix
                let raw = encoded.rsplit(',').next().unwrap_or_default();
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(raw.trim())
                    .map_err(|e| AppError::BadRequest(format!("invalid image encoding: {}", e)))?;
                Ok(CaptureInput::Image(bytes))
            }
            CapturePayload::Manual(manual) => Ok(CaptureInput::Manual(manual)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub user_id: Uuid,
    pub session_id: Uuid,
    #[serde(flatten)]
    pub payload: CapturePayload,
}

#[derive(Debug, Deserialize)]
pub struct SyncSubmission {
    pub id: Uuid,
    #[serde(flatten)]
    pub payload: CapturePayload,
}

/// Offline submissions replayed by the client
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub submissions: Vec<SyncSubmission>,
}

#[derive(Debug, Serialize)]
pub struct SyncFailure {
    pub id: Uuid,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub acknowledged: Vec<Uuid>,
    pub failed: Vec<SyncFailure>,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub history_size: usize,
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// Seed the duplicate history for a new capture session
pub async fn start_session(
    State(service): State<Arc<CaptureService>>,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>, AppError> {
    let history_size = service.start_session(req.user_id, req.session_id).await?;
    Ok(Json(StartSessionResponse {
        session_id: req.session_id,
        history_size,
    }))
}

/// Capture one receipt
pub async fn capture_receipt(
    State(service): State<Arc<CaptureService>>,
    Json(req): Json<CaptureRequest>,
) -> Result<(StatusCode, Json<CaptureOutcome>), AppError> {
    let input = req.payload.into_input()?;
    let outcome = service
        .capture(req.user_id, req.session_id, input, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Replay queued offline submissions; each is acknowledged only once saved.
/// A record id seen before is acknowledged again without a second save.
pub async fn sync_receipts(
    State(service): State<Arc<CaptureService>>,
    Json(req): Json<SyncRequest>,
) -> Json<SyncResponse> {
    let mut acknowledged = Vec::new();
    let mut failed = Vec::new();

    for submission in req.submissions {
        let result = match submission.payload.into_input() {
            Ok(input) => service
                .capture_offline(req.user_id, req.session_id, submission.id, input, Utc::now())
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => acknowledged.push(submission.id),
            Err(e) => {
                tracing::warn!("offline receipt {} failed: {}", submission.id, e);
                failed.push(SyncFailure {
                    id: submission.id,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "sync for user {}: {} acknowledged, {} failed",
        req.user_id,
        acknowledged.len(),
        failed.len()
    );
    Json(SyncResponse {
        acknowledged,
        failed,
    })
}

/// Balance and history
pub async fn points_summary(
    State(service): State<Arc<CaptureService>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PointsSummary>, AppError> {
    Ok(Json(service.points_summary(user_id).await?))
}

/// History as CSV
pub async fn export_points(
    State(service): State<Arc<CaptureService>>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let history = service.points_history(user_id).await?;

    let mut body = Vec::new();
    crate::db::export_points_csv(&history, &mut body)
        .map_err(|e| AppError::BadRequest(format!("CSV export failed: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"points-{}.csv\"", user_id),
            ),
        ],
        body,
    )
        .into_response())
}
