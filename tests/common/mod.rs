use async_trait::async_trait;
use chrono::Utc;
use receipt_rewards::models::{NewReceipt, PointsSource, PointsTransaction, Receipt, SavedCapture};
use receipt_rewards::ReceiptStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory store. `fail_receipts` fails the receipt insert, `fail_points`
/// fails the points insert after the receipt went in; either way nothing is kept.
#[derive(Default)]
pub struct MemoryStore {
    pub receipts: Mutex<Vec<Receipt>>,
    pub transactions: Mutex<Vec<PointsTransaction>>,
    pub fail_receipts: AtomicBool,
    pub fail_points: AtomicBool,
}

impl MemoryStore {
    pub fn receipt_count(&self) -> usize {
        self.receipts.lock().unwrap().len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.lock().unwrap().len()
    }
}

#[async_trait]
impl ReceiptStore for MemoryStore {
    async fn save_capture(&self, receipt: &NewReceipt) -> Result<SavedCapture, sqlx::Error> {
        let mut receipts = self.receipts.lock().unwrap();
        let mut transactions = self.transactions.lock().unwrap();

        if let Some(client_id) = receipt.client_id {
            let existing = receipts
                .iter()
                .find(|r| r.user_id == receipt.user_id && r.client_id == Some(client_id));
            if let Some(existing) = existing {
                let transaction = transactions
                    .iter()
                    .find(|t| t.receipt_id == Some(existing.id))
                    .cloned()
                    .ok_or(sqlx::Error::RowNotFound)?;
                return Ok(SavedCapture {
                    receipt: existing.clone(),
                    transaction,
                    replayed: true,
                });
            }
        }

        if self.fail_receipts.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let row = Receipt {
            id: Uuid::new_v4(),
            user_id: receipt.user_id,
            store_name: receipt.store_name.clone(),
            total_amount: receipt.total_amount.clone(),
            receipt_date: receipt.receipt_date,
            points_earned: receipt.points_earned,
            is_duplicate: receipt.is_duplicate,
            duplicate_score: receipt.duplicate_score,
            status: receipt.status.clone(),
            client_id: receipt.client_id,
            created_at: Utc::now(),
        };

        // rolled back: the receipt row is never published
        if self.fail_points.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let transaction = PointsTransaction {
            id: Uuid::new_v4(),
            user_id: row.user_id,
            points: row.points_earned,
            source: PointsSource::ReceiptScan,
            receipt_id: Some(row.id),
            created_at: Utc::now(),
        };

        receipts.push(row.clone());
        transactions.push(transaction.clone());
        Ok(SavedCapture {
            receipt: row,
            transaction,
            replayed: false,
        })
    }

    async fn get_points_history(&self, user_id: Uuid) -> Result<Vec<PointsTransaction>, sqlx::Error> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn recent_receipts(&self, user_id: Uuid, limit: i64) -> Result<Vec<Receipt>, sqlx::Error> {
        let receipts = self.receipts.lock().unwrap();
        Ok(receipts
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

pub const SAMPLE_RECEIPT: &str = "\
FRESH MART
04/02/2026 10:15
Whole Milk 3.49
Eggs 2.99
Bread 2.50
TOTAL 50.00
";
