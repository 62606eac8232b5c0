use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub capture: CaptureSettings,
    pub mfa: MfaConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Toggles and limits for the receipt capture pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Run text recognition on uploaded images
    pub ocr_enabled: bool,
    /// Categorize extracted line items
    pub ai_enabled: bool,
    /// Run the duplicate detector
    pub fraud_detection_enabled: bool,
    /// Receipts kept per session for duplicate checks
    pub history_capacity: usize,
    /// Remote OCR service, bytes are read as text when unset
    pub ocr_endpoint: Option<String>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            ocr_enabled: true,
            ai_enabled: true,
            fraud_detection_enabled: true,
            history_capacity: 50,
            ocr_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaConfig {
    pub issuer: String,
    pub max_attempts: u32,
    pub cooldown_secs: u64,
}

impl Default for MfaConfig {
    fn default() -> Self {
        Self {
            issuer: "ReceiptRewards".to_string(),
            max_attempts: 5,
            cooldown_secs: 300,
        }
    }
}

/// Expiry of in-memory session state (duplicate histories, shopping lists, limiter keys)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub idle_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_secs: 2 * 60 * 60,
            sweep_interval_secs: 5 * 60,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost/receipt_rewards".to_string()),
            },
            capture: CaptureSettings::default(),
            mfa: MfaConfig::default(),
            sessions: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `rewards.toml` if present, then `REWARDS__SECTION__KEY` variables.
    /// `DATABASE_URL` overrides `database.url`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("database.url", defaults.database.url)?
            .set_default("capture.ocr_enabled", defaults.capture.ocr_enabled)?
            .set_default("capture.ai_enabled", defaults.capture.ai_enabled)?
            .set_default(
                "capture.fraud_detection_enabled",
                defaults.capture.fraud_detection_enabled,
            )?
            .set_default("capture.history_capacity", defaults.capture.history_capacity as i64)?
            .set_default("mfa.issuer", defaults.mfa.issuer)?
            .set_default("mfa.max_attempts", defaults.mfa.max_attempts as i64)?
            .set_default("mfa.cooldown_secs", defaults.mfa.cooldown_secs as i64)?
            .set_default("sessions.idle_secs", defaults.sessions.idle_secs as i64)?
            .set_default(
                "sessions.sweep_interval_secs",
                defaults.sessions.sweep_interval_secs as i64,
            )?
            .add_source(config::File::with_name("rewards").required(false))
            .add_source(
                config::Environment::with_prefix("REWARDS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_the_whole_pipeline() {
        let settings = CaptureSettings::default();
        assert!(settings.ocr_enabled);
        assert!(settings.ai_enabled);
        assert!(settings.fraud_detection_enabled);
        assert_eq!(settings.history_capacity, 50);
        assert!(settings.ocr_endpoint.is_none());
    }

    #[test]
    fn mfa_defaults_lock_after_five_attempts() {
        let mfa = MfaConfig::default();
        assert_eq!(mfa.max_attempts, 5);
        assert_eq!(mfa.cooldown_secs, 300);
    }

    #[test]
    fn idle_sessions_expire_after_two_hours() {
        let sessions = SessionConfig::default();
        assert_eq!(sessions.idle_secs, 7200);
        assert!(sessions.sweep_interval_secs < sessions.idle_secs);
    }
}
