//! Time-based one-time passwords for the second login factor.
//!
//! RFC 6238 with SHA-1, 6 digits, 30 second steps. Verification accepts the
//! previous and next step as well.

use totp_rs::{Algorithm, Secret, TOTP};

use super::AuthError;

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP: u64 = 30;

/// A freshly generated secret and its provisioning URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpEnrollment {
    /// Base32 secret, stored on the user row.
    pub secret: String,
    /// `otpauth://totp/...` URL for authenticator apps.
    pub url: String,
}

fn build(secret_b32: &str, issuer: &str, account: &str) -> Result<TOTP, AuthError> {
    let bytes = Secret::Encoded(secret_b32.to_string())
        .to_bytes()
        .map_err(|e| AuthError::Totp(e.to_string()))?;

    // otpauth labels are "issuer:account"; a colon in either breaks parsing.
    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP,
        bytes,
        Some(issuer.replace(':', "")),
        account.replace(':', "_"),
    )
    .map_err(|e| AuthError::Totp(e.to_string()))
}

/// Generates a new 160-bit secret for `account`.
///
/// # Errors
///
/// Returns `AuthError::Totp` if the secret cannot be encoded.
pub fn enroll(issuer: &str, account: &str) -> Result<TotpEnrollment, AuthError> {
    let Secret::Encoded(secret) = Secret::generate_secret().to_encoded() else {
        return Err(AuthError::Totp("secret encoding failed".to_string()));
    };
    let totp = build(&secret, issuer, account)?;
    Ok(TotpEnrollment {
        secret,
        url: totp.get_url(),
    })
}

/// Checks `code` against `secret_b32` at unix time `now`.
///
/// # Errors
///
/// Returns `AuthError::Totp` if the stored secret is malformed.
pub fn verify_at(
    secret_b32: &str,
    issuer: &str,
    account: &str,
    code: &str,
    now: u64,
) -> Result<bool, AuthError> {
    let totp = build(secret_b32, issuer, account)?;
    Ok(totp.check(code.trim(), now))
}

/// Produces the code valid at unix time `now`.
///
/// # Errors
///
/// Returns `AuthError::Totp` if the stored secret is malformed.
pub fn code_at(secret_b32: &str, issuer: &str, account: &str, now: u64) -> Result<String, AuthError> {
    Ok(build(secret_b32, issuer, account)?.generate(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_760_000_000;

    #[test]
    fn test_enroll_produces_otpauth_url() {
        let enrollment = enroll("Foundry", "alice").unwrap();
        assert!(!enrollment.secret.is_empty());
        assert!(enrollment.url.starts_with("otpauth://totp/"));
        assert!(enrollment.url.contains("issuer=Foundry"));
    }

    #[test]
    fn test_current_code_verifies() {
        let enrollment = enroll("Foundry", "alice").unwrap();
        let code = code_at(&enrollment.secret, "Foundry", "alice", NOW).unwrap();
        assert_eq!(code.len(), 6);
        assert!(verify_at(&enrollment.secret, "Foundry", "alice", &code, NOW).unwrap());
    }

    #[test]
    fn test_one_step_skew_tolerated() {
        let enrollment = enroll("Foundry", "alice").unwrap();
        let previous = code_at(&enrollment.secret, "Foundry", "alice", NOW - STEP).unwrap();
        let next = code_at(&enrollment.secret, "Foundry", "alice", NOW + STEP).unwrap();
        assert!(verify_at(&enrollment.secret, "Foundry", "alice", &previous, NOW).unwrap());
        assert!(verify_at(&enrollment.secret, "Foundry", "alice", &next, NOW).unwrap());
    }

    #[test]
    fn test_stale_code_rejected() {
        let enrollment = enroll("Foundry", "alice").unwrap();
        let stale = code_at(&enrollment.secret, "Foundry", "alice", NOW - 5 * STEP).unwrap();
        let current = code_at(&enrollment.secret, "Foundry", "alice", NOW).unwrap();
        if stale != current {
            assert!(!verify_at(&enrollment.secret, "Foundry", "alice", &stale, NOW).unwrap());
        }
    }

    #[test]
    fn test_colon_in_account_is_sanitized() {
        assert!(enroll("Foundry", "dept:alice").is_ok());
    }

    #[test]
    fn test_malformed_secret() {
        assert!(matches!(
            verify_at("not base32 !!", "Foundry", "alice", "123456", NOW),
            Err(AuthError::Totp(_))
        ));
    }
}
