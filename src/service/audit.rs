use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries_functions;

/// Best-effort audit log; failures are logged and dropped
pub async fn audit(pool: &PgPool, user_id: Option<Uuid>, action: &str, details: serde_json::Value) {
    if let Err(e) = queries_functions::insert_audit_log(pool, user_id, action, &details).await {
        tracing::warn!("audit log '{}' not written: {}", action, e);
    }
}
