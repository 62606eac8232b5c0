use crate::models::{
    NewPointsTransaction, NewReceipt, PointsSource, PointsTransaction, Receipt, SavedCapture,
};
use sqlx::PgPool;
use uuid::Uuid;

const RECEIPT_COLUMNS: &str = "id, user_id, store_name, total_amount, receipt_date, \
     points_earned, is_duplicate, duplicate_score, status, client_id, created_at";

/// Insert a receipt and its "Receipt Scan" points transaction in one database
/// transaction. A receipt whose `(user_id, client_id)` is already stored is not
/// written again; the stored pair comes back with `replayed` set.
pub async fn insert_capture(pool: &PgPool, receipt: &NewReceipt) -> Result<SavedCapture, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query_as::<_, Receipt>(&format!(
        r#"
        INSERT INTO receipts (
            user_id, store_name, total_amount, receipt_date,
            points_earned, is_duplicate, duplicate_score, status, client_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (user_id, client_id) DO NOTHING
        RETURNING {RECEIPT_COLUMNS}
        "#
    ))
    .bind(receipt.user_id)
    .bind(&receipt.store_name)
    .bind(&receipt.total_amount)
    .bind(receipt.receipt_date)
    .bind(receipt.points_earned)
    .bind(receipt.is_duplicate)
    .bind(receipt.duplicate_score)
    .bind(&receipt.status)
    .bind(receipt.client_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = inserted else {
        tx.rollback().await?;
        let client_id = receipt.client_id.ok_or(sqlx::Error::RowNotFound)?;
        tracing::info!("receipt {} for user {} already stored", client_id, receipt.user_id);
        return find_capture(pool, receipt.user_id, client_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound);
    };

    let transaction = insert_points_transaction(
        &mut *tx,
        &NewPointsTransaction {
            user_id: row.user_id,
            points: row.points_earned,
            source: PointsSource::ReceiptScan,
            receipt_id: Some(row.id),
        },
    )
    .await?;

    tx.commit().await?;
    Ok(SavedCapture {
        receipt: row,
        transaction,
        replayed: false,
    })
}

/// Receipt stored under a client id, with its points transaction
pub async fn find_capture(
    pool: &PgPool,
    user_id: Uuid,
    client_id: Uuid,
) -> Result<Option<SavedCapture>, sqlx::Error> {
    let receipt = sqlx::query_as::<_, Receipt>(&format!(
        "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE user_id = $1 AND client_id = $2"
    ))
    .bind(user_id)
    .bind(client_id)
    .fetch_optional(pool)
    .await?;

    let Some(receipt) = receipt else {
        return Ok(None);
    };

    let transaction = sqlx::query_as::<_, PointsTransaction>(
        r#"
        SELECT id, user_id, points, source, receipt_id, created_at
        FROM points_transactions
        WHERE receipt_id = $1 AND source = $2
        ORDER BY created_at
        LIMIT 1
        "#,
    )
    .bind(receipt.id)
    .bind(PointsSource::ReceiptScan.as_str())
    .fetch_one(pool)
    .await?;

    Ok(Some(SavedCapture {
        receipt,
        transaction,
        replayed: true,
    }))
}

/// Most recent receipts of a user, newest first
pub async fn list_recent_receipts(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<Receipt>, sqlx::Error> {
    sqlx::query_as::<_, Receipt>(&format!(
        r#"
        SELECT {RECEIPT_COLUMNS}
        FROM receipts
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Insert a points transaction
pub async fn insert_points_transaction<'e, E>(
    executor: E,
    tx: &NewPointsTransaction,
) -> Result<PointsTransaction, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query_as::<_, PointsTransaction>(
        r#"
        INSERT INTO points_transactions (user_id, points, source, receipt_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, points, source, receipt_id, created_at
        "#,
    )
    .bind(tx.user_id)
    .bind(tx.points)
    .bind(tx.source.as_str())
    .bind(tx.receipt_id)
    .fetch_one(executor)
    .await
}

/// Points history of a user, newest first
pub async fn list_points_history(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<PointsTransaction>, sqlx::Error> {
    sqlx::query_as::<_, PointsTransaction>(
        r#"
        SELECT id, user_id, points, source, receipt_id, created_at
        FROM points_transactions
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Write the points history as CSV
pub fn export_points_csv<W: std::io::Write>(
    transactions: &[PointsTransaction],
    out: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["id", "user_id", "points", "source", "receipt_id", "created_at"])?;

    for tx in transactions {
        writer.write_record(&[
            tx.id.to_string(),
            tx.user_id.to_string(),
            tx.points.to_string(),
            tx.source.to_string(),
            tx.receipt_id.map(|id| id.to_string()).unwrap_or_default(),
            tx.created_at.to_rfc3339(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn csv_has_header_and_blank_receipt_ids() {
        let user_id = Uuid::new_v4();
        let receipt_id = Uuid::new_v4();
        let created_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let rows = vec![
            PointsTransaction {
                id: Uuid::new_v4(),
                user_id,
                points: 500,
                source: PointsSource::ReceiptScan,
                receipt_id: Some(receipt_id),
                created_at,
            },
            PointsTransaction {
                id: Uuid::new_v4(),
                user_id,
                points: 50,
                source: PointsSource::Challenge,
                receipt_id: None,
                created_at,
            },
        ];

        let mut out = Vec::new();
        export_points_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "id,user_id,points,source,receipt_id,created_at");
        assert!(lines[1].contains(",500,Receipt Scan,"));
        assert!(lines[1].contains(&receipt_id.to_string()));
        assert!(lines[2].contains(",50,Challenge,,"));
        assert_eq!(lines.len(), 3);
    }
}
