use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;
use sqlx::PgPool;

use crate::db::queries_functions;
use crate::error::AppError;
use crate::models::{ChallengeTemplate, DailyChallengeReport, MonthlyResetReport};
use crate::service::audit::audit;

pub const MIN_DAILY_CHALLENGES: usize = 3;
pub const MAX_DAILY_CHALLENGES: usize = 5;

/// Pick 3 to 5 distinct templates (fewer when not enough exist)
pub fn select_templates<'a, R: Rng + ?Sized>(
    templates: &'a [ChallengeTemplate],
    rng: &mut R,
) -> Vec<&'a ChallengeTemplate> {
    if templates.is_empty() {
        return Vec::new();
    }
    let count = rng
        .gen_range(MIN_DAILY_CHALLENGES..=MAX_DAILY_CHALLENGES)
        .min(templates.len());
    templates.choose_multiple(rng, count).collect()
}

/// Scheduled jobs: daily challenges and the monthly points reset
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Expire old challenges and open today's set
    pub async fn generate_daily_challenges(
        &self,
        now: DateTime<Utc>,
    ) -> Result<DailyChallengeReport, AppError> {
        let (deactivated, templates) = futures::try_join!(
            queries_functions::deactivate_expired_challenges(&self.pool, now),
            queries_functions::list_challenge_templates(&self.pool),
        )?;

        let selected = select_templates(&templates, &mut rand::thread_rng());
        let start_date = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .unwrap_or(now);
        let end_date = start_date + Duration::days(1);

        let created =
            queries_functions::insert_challenges(&self.pool, &selected, start_date, end_date).await?;

        tracing::info!(
            "daily challenges: {} expired, {} created from {} templates",
            deactivated,
            created.len(),
            templates.len()
        );
        audit(
            &self.pool,
            None,
            "daily_challenges_generated",
            json!({ "deactivated": deactivated, "created": created.len() }),
        )
        .await;

        Ok(DailyChallengeReport {
            deactivated,
            created,
        })
    }

    pub async fn reset_monthly_points(&self, now: DateTime<Utc>) -> Result<MonthlyResetReport, AppError> {
        queries_functions::reset_monthly_points(&self.pool).await?;
        tracing::info!("monthly points reset at {}", now);
        audit(
            &self.pool,
            None,
            "monthly_points_reset",
            json!({ "reset_at": now.to_rfc3339() }),
        )
        .await;
        Ok(MonthlyResetReport { reset_at: now })
    }
}
