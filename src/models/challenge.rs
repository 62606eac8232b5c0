use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Challenge template (challenge_templates)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChallengeTemplate {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub challenge_type: String,
    pub target_value: i32,
    pub points_reward: i32,
}

/// Live challenge (challenges)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub template_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub challenge_type: String,
    pub target_value: i32,
    pub points_reward: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

/// Result of one daily challenge run
#[derive(Debug, Clone, Serialize)]
pub struct DailyChallengeReport {
    pub deactivated: u64,
    pub created: Vec<Challenge>,
}

/// Result of the monthly points reset
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyResetReport {
    pub reset_at: DateTime<Utc>,
}
