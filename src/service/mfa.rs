use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::MfaConfig;
use crate::db::queries_functions;
use crate::error::{AppError, TotpError};
use crate::models::{TotpSetup, TotpVerification, UserMfa};
use crate::service::audit::audit;
use crate::service::rate_limit::AttemptLimiter;
use crate::service::totp;

/// TOTP setup and verification backed by the user_mfa table
pub struct MfaService {
    pool: PgPool,
    issuer: String,
    limiter: AttemptLimiter,
}

impl MfaService {
    pub fn new(pool: PgPool, config: &MfaConfig) -> Self {
        Self {
            pool,
            issuer: config.issuer.clone(),
            limiter: AttemptLimiter::new(config.max_attempts, Duration::from_secs(config.cooldown_secs)),
        }
    }

    /// Generate and store a fresh secret. TOTP stays disabled until the first valid code.
    pub async fn setup(&self, user_id: Uuid) -> Result<TotpSetup, AppError> {
        let setup = totp::generate_secret(&user_id.to_string(), &self.issuer)?;
        queries_functions::upsert_totp_secret(&self.pool, user_id, &setup.secret).await?;

        tracing::info!("TOTP secret generated for user {}", user_id);
        audit(&self.pool, Some(user_id), "totp_setup", json!({})).await;
        Ok(setup)
    }

    /// Verify a code against `secret`, or the stored secret when none is given.
    /// TOTP is enabled only when the verified secret is the stored one.
    pub async fn verify(
        &self,
        user_id: Uuid,
        code: &str,
        secret: Option<&str>,
    ) -> Result<TotpVerification, AppError> {
        let stored = queries_functions::get_user_mfa(&self.pool, user_id).await?;
        let (secret, confirms_stored) = select_secret(secret, stored.as_ref())?;

        // no await between reserving the attempt and settling it
        let key = user_id.to_string();
        if let Err(wait) = self.limiter.try_acquire(&key, Instant::now()) {
            return Err(AppError::RateLimited(wait.as_secs().max(1)));
        }

        let now = Utc::now().timestamp().max(0) as u64;
        let valid = match totp::verify_code(secret, code, now) {
            Ok(valid) => valid,
            Err(e) => {
                self.limiter.record_failure(&key, Instant::now());
                return Err(e.into());
            }
        };

        if valid {
            self.limiter.record_success(&key);
        } else {
            self.limiter.record_failure(&key, Instant::now());
        }

        if valid && confirms_stored {
            queries_functions::enable_totp(&self.pool, user_id).await?;
        }

        tracing::info!("TOTP verification for user {}: valid={}", user_id, valid);
        audit(
            &self.pool,
            Some(user_id),
            "totp_verify",
            json!({ "valid": valid, "stored_secret": confirms_stored }),
        )
        .await;
        Ok(TotpVerification { valid })
    }

    /// Forget limiter keys whose lock or idle window has passed
    pub fn prune_limiter(&self, now: Instant) -> usize {
        self.limiter.prune(now)
    }
}

/// Secret to check, and whether it is the user's stored one
fn select_secret<'a>(
    supplied: Option<&'a str>,
    stored: Option<&'a UserMfa>,
) -> Result<(&'a str, bool), TotpError> {
    match (supplied, stored) {
        (Some(s), Some(m)) => Ok((
            s,
            totp::normalize_secret(s) == totp::normalize_secret(&m.totp_secret),
        )),
        (Some(s), None) => Ok((s, false)),
        (None, Some(m)) => Ok((m.totp_secret.as_str(), true)),
        (None, None) => Err(TotpError::NotConfigured),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(secret: &str) -> UserMfa {
        UserMfa {
            user_id: Uuid::new_v4(),
            totp_secret: secret.to_string(),
            enabled: false,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn other_secret_does_not_confirm_the_stored_one() {
        let mfa = stored("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
        let (secret, confirms) =
            select_secret(Some("JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP"), Some(&mfa)).unwrap();
        assert_eq!(secret, "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP");
        assert!(!confirms);
    }

    #[test]
    fn stored_secret_confirms_in_any_spelling() {
        let mfa = stored("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
        let (_, confirms) =
            select_secret(Some("gezd gnbv gy3t qojq gezd gnbv gy3t qojq"), Some(&mfa)).unwrap();
        assert!(confirms);

        let (secret, confirms) = select_secret(None, Some(&mfa)).unwrap();
        assert_eq!(secret, mfa.totp_secret);
        assert!(confirms);
    }

    #[test]
    fn supplied_secret_without_setup_never_enables() {
        let (_, confirms) = select_secret(Some("JBSWY3DPEHPK3PXP"), None).unwrap();
        assert!(!confirms);
        assert!(matches!(select_secret(None, None), Err(TotpError::NotConfigured)));
    }
}
