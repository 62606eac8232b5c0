use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Where a points transaction came from. Stored as its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointsSource {
    #[serde(rename = "Receipt Scan")]
    ReceiptScan,
    Challenge,
    Referral,
    Redemption,
    Bonus,
}

impl PointsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointsSource::ReceiptScan => "Receipt Scan",
            PointsSource::Challenge => "Challenge",
            PointsSource::Referral => "Referral",
            PointsSource::Redemption => "Redemption",
            PointsSource::Bonus => "Bonus",
        }
    }

    /// Redemptions spend points; every other source earns them
    pub fn is_debit(&self) -> bool {
        matches!(self, PointsSource::Redemption)
    }
}

impl fmt::Display for PointsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown points source: {0}")]
pub struct UnknownPointsSource(pub String);

impl TryFrom<String> for PointsSource {
    type Error = UnknownPointsSource;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Receipt Scan" => Ok(PointsSource::ReceiptScan),
            "Challenge" => Ok(PointsSource::Challenge),
            "Referral" => Ok(PointsSource::Referral),
            "Redemption" => Ok(PointsSource::Redemption),
            "Bonus" => Ok(PointsSource::Bonus),
            _ => Err(UnknownPointsSource(value)),
        }
    }
}

/// Points ledger row (points_transactions)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PointsTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i64,
    #[sqlx(try_from = "String")]
    pub source: PointsSource,
    pub receipt_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PointsTransaction {
    /// `points` is stored unsigned; this is its effect on the balance
    pub fn balance_delta(&self) -> i64 {
        if self.source.is_debit() {
            -self.points
        } else {
            self.points
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPointsTransaction {
    pub user_id: Uuid,
    pub points: i64,
    pub source: PointsSource,
    pub receipt_id: Option<Uuid>,
}

/// Balance plus full history for one user
#[derive(Debug, Clone, Serialize)]
pub struct PointsSummary {
    pub user_id: Uuid,
    pub balance: i64,
    pub transactions: Vec<PointsTransaction>,
}

impl PointsSummary {
    pub fn from_history(user_id: Uuid, transactions: Vec<PointsTransaction>) -> Self {
        let balance = transactions.iter().map(PointsTransaction::balance_delta).sum();
        Self {
            user_id,
            balance,
            transactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(user_id: Uuid, points: i64, source: PointsSource) -> PointsTransaction {
        PointsTransaction {
            id: Uuid::new_v4(),
            user_id,
            points,
            source,
            receipt_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn redemptions_reduce_the_balance() {
        let user = Uuid::new_v4();
        let summary = PointsSummary::from_history(
            user,
            vec![
                tx(user, 500, PointsSource::ReceiptScan),
                tx(user, 200, PointsSource::Redemption),
                tx(user, 50, PointsSource::Bonus),
            ],
        );
        assert_eq!(summary.balance, 350);
        assert_eq!(summary.transactions.len(), 3);
    }

    #[test]
    fn source_labels_round_trip() {
        for source in [
            PointsSource::ReceiptScan,
            PointsSource::Challenge,
            PointsSource::Referral,
            PointsSource::Redemption,
            PointsSource::Bonus,
        ] {
            assert_eq!(PointsSource::try_from(source.to_string()).unwrap(), source);
        }
        assert!(PointsSource::try_from("Cashback".to_string()).is_err());
    }
}
