use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::points::PointsTransaction;
use super::shopping::Category;

/// One purchased line on a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub price: BigDecimal,
    pub category: Category,
}

/// Structured receipt produced by extraction. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptData {
    pub store: String,
    pub total: BigDecimal,
    pub items: Vec<ReceiptItem>,
    pub timestamp: DateTime<Utc>,
    pub raw_text: String,
    /// 1.0 printed date and time, 0.5 printed date only, 0.0 capture time
    #[serde(default)]
    pub timestamp_confidence: f64,
}

/// Receipt annotated by the duplicate detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedReceipt {
    #[serde(flatten)]
    pub data: ReceiptData,
    pub is_duplicate: bool,
    pub duplicate_score: f64,
}

/// Receipt row (receipts)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub store_name: String,
    pub total_amount: BigDecimal,
    pub receipt_date: DateTime<Utc>,
    pub points_earned: i64,
    pub is_duplicate: bool,
    pub duplicate_score: f64,
    pub status: String,
    /// Offline record id the client submitted this receipt under
    pub client_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the receipts table
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub user_id: Uuid,
    pub store_name: String,
    pub total_amount: BigDecimal,
    pub receipt_date: DateTime<Utc>,
    pub points_earned: i64,
    pub is_duplicate: bool,
    pub duplicate_score: f64,
    pub status: String,
    pub client_id: Option<Uuid>,
}

impl NewReceipt {
    pub fn from_processed(
        user_id: Uuid,
        receipt: &ProcessedReceipt,
        points: i64,
        client_id: Option<Uuid>,
    ) -> Self {
        let status = if receipt.is_duplicate { "flagged" } else { "approved" };
        Self {
            user_id,
            store_name: receipt.data.store.clone(),
            total_amount: receipt.data.total.clone(),
            receipt_date: receipt.data.timestamp,
            points_earned: points,
            is_duplicate: receipt.is_duplicate,
            duplicate_score: receipt.duplicate_score,
            status: status.to_string(),
            client_id,
        }
    }
}

/// A receipt row together with the points transaction written with it
#[derive(Debug, Clone)]
pub struct SavedCapture {
    pub receipt: Receipt,
    pub transaction: PointsTransaction,
    /// The client id was already stored; nothing new was written
    pub replayed: bool,
}

/// Receipt typed in by the user when OCR is disabled or failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualReceipt {
    pub store: String,
    pub total: BigDecimal,
    #[serde(default)]
    pub items: Vec<ReceiptItem>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ManualReceipt {
    pub fn into_receipt_data(self, now: DateTime<Utc>) -> ReceiptData {
        let (timestamp, timestamp_confidence) = match self.timestamp {
            Some(ts) => (ts, 1.0),
            None => (now, 0.0),
        };
        ReceiptData {
            store: self.store,
            total: self.total,
            items: self.items,
            timestamp,
            raw_text: String::new(),
            timestamp_confidence,
        }
    }
}
