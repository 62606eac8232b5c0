//! Receipt capture pipeline: extract -> duplicate check -> points -> persist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::CaptureSettings;
use crate::db::ReceiptStore;
use crate::error::AppError;
use crate::models::{
    ManualReceipt, NewReceipt, PointsSummary, PointsTransaction, ProcessedReceipt, Receipt,
    ReceiptData,
};
use crate::service::duplicate::{DuplicateCheck, ReceiptHistory};
use crate::service::extraction::{ReceiptParser, TextRecognizer};
use crate::service::points::calculate_points;
use crate::service::sessions::SessionMap;

/// What the user submitted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureInput {
    /// Encoded receipt image
    Image(Vec<u8>),
    Manual(ManualReceipt),
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptureOutcome {
    pub receipt: Receipt,
    pub transaction: PointsTransaction,
    pub items: Vec<crate::models::ReceiptItem>,
    /// Set when the receipt looks like one already captured; never blocks saving
    pub duplicate_warning: bool,
    pub duplicate_score: f64,
    /// An earlier submission with the same client id was returned instead
    pub replayed: bool,
}

pub struct CaptureService {
    store: Arc<dyn ReceiptStore>,
    recognizer: Arc<dyn TextRecognizer>,
    parser: ReceiptParser,
    settings: CaptureSettings,
    histories: SessionMap<ReceiptHistory>,
}

impl CaptureService {
    pub fn new(
        store: Arc<dyn ReceiptStore>,
        recognizer: Arc<dyn TextRecognizer>,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            store,
            recognizer,
            parser: ReceiptParser::new(),
            settings,
            histories: SessionMap::new(),
        }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Extract receipt data from the submission
    pub async fn extract(&self, input: CaptureInput, now: DateTime<Utc>) -> Result<ReceiptData, AppError> {
        match input {
            CaptureInput::Image(bytes) => {
                if !self.settings.ocr_enabled {
                    return Err(AppError::BadRequest(
                        "OCR is disabled, enter the receipt manually".to_string(),
                    ));
                }
                let text = self.recognizer.recognize(&bytes).await?;
                Ok(self.parser.parse(&text, now, self.settings.ai_enabled)?)
            }
            CaptureInput::Manual(manual) => {
                if manual.store.trim().is_empty() {
                    return Err(AppError::BadRequest("store name is required".to_string()));
                }
                Ok(manual.into_receipt_data(now))
            }
        }
    }

    /// Duplicate check against the session history, without recording the candidate
    pub fn check_duplicates(&self, session_id: Uuid, candidate: &ReceiptData) -> DuplicateCheck {
        if !self.settings.fraud_detection_enabled {
            return DuplicateCheck::default();
        }
        self.histories
            .read(session_id, |h| h.check(candidate))
            .unwrap_or_default()
    }

    /// Full capture for one submission
    pub async fn capture(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        input: CaptureInput,
        now: DateTime<Utc>,
    ) -> Result<CaptureOutcome, AppError> {
        self.process(user_id, session_id, None, input, now).await
    }

    /// Capture a submission queued offline under `client_id`. Replaying the same
    /// id returns the receipt saved the first time and awards nothing new.
    pub async fn capture_offline(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        client_id: Uuid,
        input: CaptureInput,
        now: DateTime<Utc>,
    ) -> Result<CaptureOutcome, AppError> {
        self.process(user_id, session_id, Some(client_id), input, now).await
    }

    async fn process(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        client_id: Option<Uuid>,
        input: CaptureInput,
        now: DateTime<Utc>,
    ) -> Result<CaptureOutcome, AppError> {
        let data = self.extract(input, now).await?;
        let check = self.check_duplicates(session_id, &data);

        let processed = ProcessedReceipt {
            data,
            is_duplicate: check.is_duplicate,
            duplicate_score: check.score,
        };

        let points = calculate_points(&processed.data.total, 0);
        let saved = self
            .store
            .save_capture(&NewReceipt::from_processed(user_id, &processed, points, client_id))
            .await?;

        if saved.replayed {
            tracing::info!(
                "user {}: receipt {} was already saved, returning it",
                user_id,
                saved.receipt.id
            );
            return Ok(CaptureOutcome {
                duplicate_warning: saved.receipt.is_duplicate,
                duplicate_score: saved.receipt.duplicate_score,
                receipt: saved.receipt,
                transaction: saved.transaction,
                items: processed.data.items,
                replayed: true,
            });
        }

        if check.is_duplicate {
            tracing::warn!(
                "user {}: possible duplicate receipt from {} (score {:.2})",
                user_id,
                processed.data.store,
                check.score
            );
        }
        tracing::info!(
            "user {}: receipt {} from {} saved, {} points",
            user_id,
            saved.receipt.id,
            saved.receipt.store_name,
            points
        );

        let items = processed.data.items.clone();
        let capacity = self.settings.history_capacity;
        self.histories.update_or_insert_with(
            session_id,
            || ReceiptHistory::with_capacity(capacity),
            |history| history.push(processed),
        );

        Ok(CaptureOutcome {
            receipt: saved.receipt,
            transaction: saved.transaction,
            items,
            duplicate_warning: check.is_duplicate,
            duplicate_score: check.score,
            replayed: false,
        })
    }

    pub async fn points_summary(&self, user_id: Uuid) -> Result<PointsSummary, AppError> {
        let history = self.store.get_points_history(user_id).await?;
        Ok(PointsSummary::from_history(user_id, history))
    }

    pub async fn points_history(&self, user_id: Uuid) -> Result<Vec<PointsTransaction>, AppError> {
        Ok(self.store.get_points_history(user_id).await?)
    }

    /// Seed a new session's duplicate history from the user's saved receipts
    pub async fn start_session(&self, user_id: Uuid, session_id: Uuid) -> Result<usize, AppError> {
        let limit = self.settings.history_capacity as i64;
        let recent = self.store.recent_receipts(user_id, limit).await?;

        let mut history = ReceiptHistory::with_capacity(self.settings.history_capacity);
        // oldest first so the newest survive eviction
        for r in recent.into_iter().rev() {
            history.push(ProcessedReceipt {
                data: ReceiptData {
                    store: r.store_name,
                    total: r.total_amount,
                    items: Vec::new(),
                    timestamp: r.receipt_date,
                    raw_text: String::new(),
                    timestamp_confidence: 1.0,
                },
                is_duplicate: r.is_duplicate,
                duplicate_score: r.duplicate_score,
            });
        }

        let seeded = history.len();
        self.histories.insert(session_id, history);
        tracing::debug!("session {} seeded with {} receipts", session_id, seeded);
        Ok(seeded)
    }

    /// Drop duplicate histories of sessions idle longer than `idle`
    pub fn prune_idle_sessions(&self, now: Instant, idle: Duration) -> usize {
        self.histories.prune_idle(now, idle)
    }

    pub fn active_sessions(&self) -> usize {
        self.histories.len()
    }
}
