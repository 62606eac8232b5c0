use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries;
use crate::models::{NewReceipt, PointsTransaction, Receipt, SavedCapture};

/// Receipt and points persistence used by the capture pipeline
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Save the receipt and its points transaction atomically: both rows or neither.
    /// A receipt already stored under the same `client_id` comes back as `replayed`.
    async fn save_capture(&self, receipt: &NewReceipt) -> Result<SavedCapture, sqlx::Error>;

    async fn get_points_history(&self, user_id: Uuid) -> Result<Vec<PointsTransaction>, sqlx::Error>;

    async fn recent_receipts(&self, user_id: Uuid, limit: i64) -> Result<Vec<Receipt>, sqlx::Error>;
}

/// Postgres backed store
#[derive(Clone)]
pub struct PgReceiptStore {
    pool: PgPool,
}

impl PgReceiptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReceiptStore for PgReceiptStore {
    async fn save_capture(&self, receipt: &NewReceipt) -> Result<SavedCapture, sqlx::Error> {
        queries::insert_capture(&self.pool, receipt).await
    }

    async fn get_points_history(&self, user_id: Uuid) -> Result<Vec<PointsTransaction>, sqlx::Error> {
        queries::list_points_history(&self.pool, user_id).await
    }

    async fn recent_receipts(&self, user_id: Uuid, limit: i64) -> Result<Vec<Receipt>, sqlx::Error> {
        queries::list_recent_receipts(&self.pool, user_id, limit).await
    }
}
