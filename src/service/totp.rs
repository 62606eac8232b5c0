//! RFC 6238 time-based one-time passwords (SHA-1, 6 digits, 30 second step).

use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::TotpError;
use crate::models::TotpSetup;

pub const STEP_SECS: u64 = 30;
pub const DIGITS: usize = 6;
/// Steps accepted on either side of the current one
pub const DRIFT_STEPS: u8 = 1;

/// New random base32 secret and its otpauth provisioning URI
pub fn generate_secret(account: &str, issuer: &str) -> Result<TotpSetup, TotpError> {
    let key = Secret::generate_secret()
        .to_bytes()
        .map_err(|_| TotpError::InvalidSecret)?;
    let totp = TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        DRIFT_STEPS,
        STEP_SECS,
        key,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| TotpError::Provisioning(e.to_string()))?;

    Ok(TotpSetup {
        secret: totp.get_secret_base32(),
        qr_code_url: totp.get_url(),
    })
}

/// Uppercase, unpadded base32 as authenticator apps display it
pub fn normalize_secret(secret: &str) -> String {
    secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .flat_map(char::to_uppercase)
        .collect()
}

fn authenticator(secret: &str) -> Result<TOTP, TotpError> {
    let key = Secret::Encoded(normalize_secret(secret))
        .to_bytes()
        .map_err(|_| TotpError::InvalidSecret)?;
    if key.is_empty() {
        return Err(TotpError::InvalidSecret);
    }
    // stored secrets may predate the 128-bit minimum `TOTP::new` enforces
    Ok(TOTP::new_unchecked(
        Algorithm::SHA1,
        DIGITS,
        DRIFT_STEPS,
        STEP_SECS,
        key,
        None,
        String::new(),
    ))
}

/// Code for the step containing `unix_secs`
pub fn code_at(secret: &str, unix_secs: u64) -> Result<String, TotpError> {
    Ok(authenticator(secret)?.generate(unix_secs))
}

/// Check `code` against the current step and one step either side
pub fn verify_code(secret: &str, code: &str, unix_secs: u64) -> Result<bool, TotpError> {
    let totp = authenticator(secret)?;
    // the window starts DRIFT_STEPS back and must not go below zero
    let unix_secs = unix_secs.max(STEP_SECS * u64::from(DRIFT_STEPS));
    Ok(totp.check(code.trim(), unix_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 appendix B seed "12345678901234567890"
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn matches_rfc6238_vectors() {
        // RFC lists 8 digits; the 6-digit code is the low six
        assert_eq!(code_at(RFC_SECRET, 59).unwrap(), "287082");
        assert_eq!(code_at(RFC_SECRET, 1_111_111_109).unwrap(), "081804");
        assert_eq!(code_at(RFC_SECRET, 1_234_567_890).unwrap(), "005924");
    }

    #[test]
    fn accepts_one_step_of_drift() {
        let now = 1_700_000_000;
        let previous = code_at(RFC_SECRET, now - STEP_SECS).unwrap();
        let next = code_at(RFC_SECRET, now + STEP_SECS).unwrap();
        assert!(verify_code(RFC_SECRET, &previous, now).unwrap());
        assert!(verify_code(RFC_SECRET, &next, now).unwrap());
    }

    #[test]
    fn rejects_two_steps_away() {
        let now = 1_700_000_000;
        let stale = code_at(RFC_SECRET, now - 2 * STEP_SECS).unwrap();
        let window: Vec<String> = [now - STEP_SECS, now, now + STEP_SECS]
            .iter()
            .map(|t| code_at(RFC_SECRET, *t).unwrap())
            .collect();
        if !window.contains(&stale) {
            assert!(!verify_code(RFC_SECRET, &stale, now).unwrap());
        }
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(!verify_code(RFC_SECRET, "12345", 59).unwrap());
        assert!(!verify_code(RFC_SECRET, "abcdef", 59).unwrap());
    }

    #[test]
    fn lowercase_and_spaced_secrets_are_accepted() {
        let spaced = "gezd gnbv gy3t qojq gezd gnbv gy3t qojq";
        assert_eq!(normalize_secret(spaced), RFC_SECRET);
        assert!(verify_code(spaced, "287082", 59).unwrap());
    }

    #[test]
    fn issuer_with_colon_cannot_be_provisioned() {
        assert!(matches!(
            generate_secret("user", "Receipt:Rewards"),
            Err(TotpError::Provisioning(_))
        ));
    }

    #[test]
    fn invalid_secret_is_an_error() {
        assert!(matches!(
            verify_code("not base32!", "123456", 59),
            Err(TotpError::InvalidSecret)
        ));
    }

    #[test]
    fn generated_secret_round_trips() {
        let setup = generate_secret("shopper@example.com", "Receipt Rewards").unwrap();
        assert_eq!(setup.secret.len(), 32);
        assert!(setup.qr_code_url.starts_with("otpauth://totp/"));
        assert!(setup.qr_code_url.contains(&format!("secret={}", setup.secret)));
        assert!(setup.qr_code_url.contains("issuer=Receipt%20Rewards"));

        let code = code_at(&setup.secret, 1_000).unwrap();
        assert!(verify_code(&setup.secret, &code, 1_000).unwrap());
    }
}
