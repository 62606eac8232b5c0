use crate::models::{Challenge, ChallengeTemplate, UserMfa};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Stored TOTP secret of a user
pub async fn get_user_mfa(pool: &PgPool, user_id: Uuid) -> Result<Option<UserMfa>, sqlx::Error> {
    sqlx::query_as::<_, UserMfa>(
        r#"
        SELECT user_id, totp_secret, enabled, updated_at
        FROM user_mfa
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Save a new (not yet enabled) TOTP secret
pub async fn upsert_totp_secret(
    pool: &PgPool,
    user_id: Uuid,
    secret: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_mfa (user_id, totp_secret, enabled, updated_at)
        VALUES ($1, $2, false, now())
        ON CONFLICT (user_id)
        DO UPDATE SET totp_secret = EXCLUDED.totp_secret, enabled = false, updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(secret)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark TOTP as enabled after the first successful verification
pub async fn enable_totp(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE user_mfa SET enabled = true, updated_at = now() WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Append an audit log entry
pub async fn insert_audit_log(
    pool: &PgPool,
    user_id: Option<Uuid>,
    action: &str,
    details: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (user_id, action, details)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(action)
    .bind(details)
    .execute(pool)
    .await?;
    Ok(())
}

/// Deactivate challenges whose end date has passed
pub async fn deactivate_expired_challenges(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE challenges
        SET is_active = false
        WHERE is_active = true
          AND end_date < $1
        "#,
    )
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Active challenge templates
pub async fn list_challenge_templates(pool: &PgPool) -> Result<Vec<ChallengeTemplate>, sqlx::Error> {
    sqlx::query_as::<_, ChallengeTemplate>(
        r#"
        SELECT id, title, description, challenge_type, target_value, points_reward
        FROM challenge_templates
        WHERE is_active = true
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Create challenges from templates for the given window
pub async fn insert_challenges(
    pool: &PgPool,
    templates: &[&ChallengeTemplate],
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<Vec<Challenge>, sqlx::Error> {
    if templates.is_empty() {
        return Ok(Vec::new());
    }

    let mut query_builder = sqlx::QueryBuilder::new(
        "INSERT INTO challenges (
            template_id, title, description, challenge_type,
            target_value, points_reward, start_date, end_date, is_active
        ) ",
    );

    query_builder.push_values(templates, |mut b, t| {
        b.push_bind(t.id)
            .push_bind(&t.title)
            .push_bind(&t.description)
            .push_bind(&t.challenge_type)
            .push_bind(t.target_value)
            .push_bind(t.points_reward)
            .push_bind(start_date)
            .push_bind(end_date)
            .push_bind(true);
    });
    query_builder.push(
        " RETURNING id, template_id, title, description, challenge_type,
                    target_value, points_reward, start_date, end_date, is_active",
    );

    query_builder
        .build_query_as::<Challenge>()
        .fetch_all(pool)
        .await
}

/// Run the stored monthly points reset procedure
pub async fn reset_monthly_points(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT reset_monthly_points()")
        .execute(pool)
        .await?;
    Ok(())
}
