//! Verification of submitted one-time codes.

use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::secret::TotpSecret;
use crate::totp::{format_code, hotp, step_at, DIGITS};
use dmalock_common::{Error, Result};

/// Steps accepted on either side of the current one (clock skew tolerance).
pub const DEFAULT_SKEW_STEPS: u64 = 1;

/// Upper bound for the skew tolerance (five minutes either way).
pub const MAX_SKEW_STEPS: u64 = 10;

/// Gate guarding the unlock direction.
#[derive(Debug, Clone)]
pub struct SecondFactorGate {
    secret: TotpSecret,
    skew_steps: u64,
}

impl SecondFactorGate {
    /// Create a gate from the base32 secret on record.
    pub fn new(base32_secret: &str) -> Result<Self> {
        Ok(Self::from_secret(TotpSecret::from_base32(base32_secret)?))
    }

    /// Create a gate from a parsed secret.
    pub fn from_secret(secret: TotpSecret) -> Self {
        Self {
            secret,
            skew_steps: DEFAULT_SKEW_STEPS,
        }
    }

    /// Override the skew tolerance, capped at [`MAX_SKEW_STEPS`].
    pub fn with_skew_steps(mut self, skew_steps: u64) -> Self {
        self.skew_steps = skew_steps.min(MAX_SKEW_STEPS);
        self
    }

    /// Check `code` against the current time.
    pub fn verify(&self, code: &str) -> bool {
        self.verify_at(code, now_unix())
    }

    /// Check `code` as if the clock read `unix_seconds`.
    pub fn verify_at(&self, code: &str, unix_seconds: u64) -> bool {
        let code = code.trim();
        if code.len() != DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
            debug!("Rejected one-time code with invalid shape");
            return false;
        }

        let current = step_at(unix_seconds);
        let first = current.saturating_sub(self.skew_steps);
        let last = current.saturating_add(self.skew_steps);

        // evaluate every step in the window so timing does not reveal which matched
        let mut matched = subtle::Choice::from(0u8);
        for step in first..=last {
            let expected = format_code(hotp(&self.secret, step));
            matched |= expected.as_bytes().ct_eq(code.as_bytes());
        }
        bool::from(matched)
    }

    /// Like [`verify`](Self::verify) but fails with `SecondFactorRejected`.
    pub fn check(&self, code: &str) -> Result<()> {
        if self.verify(code) {
            Ok(())
        } else {
            Err(Error::SecondFactorRejected)
        }
    }
}

/// Verify `code` against a base32 `secret` at the current time.
///
/// An unparseable secret never verifies.
pub fn verify(secret: &str, code: &str) -> bool {
    SecondFactorGate::new(secret)
        .map(|gate| gate.verify(code))
        .unwrap_or(false)
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totp::{code_at, STEP_SECONDS};

    const T: u64 = 1_700_000_010;

    fn fixture() -> (SecondFactorGate, TotpSecret) {
        let secret = TotpSecret::generate();
        (SecondFactorGate::from_secret(secret.clone()), secret)
    }

    #[test]
    fn test_code_verifies_at_generation_time() {
        let (gate, secret) = fixture();
        let code = code_at(&secret, T);

        assert!(gate.verify_at(&code, T));
    }

    #[test]
    fn test_code_tolerates_one_step_of_skew() {
        let (gate, secret) = fixture();
        let code = code_at(&secret, T);

        assert!(gate.verify_at(&code, T + STEP_SECONDS));
        assert!(gate.verify_at(&code, T - STEP_SECONDS));
    }

    #[test]
    fn test_code_expires_after_window() {
        let (gate, secret) = fixture();
        let code = code_at(&secret, T);

        assert!(!gate.verify_at(&code, T + 3 * STEP_SECONDS));
        assert!(!gate.verify_at(&code, T - 3 * STEP_SECONDS));
    }

    #[test]
    fn test_zero_skew_is_strict() {
        let (gate, secret) = fixture();
        let gate = gate.with_skew_steps(0);
        let code = code_at(&secret, T);

        assert!(gate.verify_at(&code, T));
        assert!(!gate.verify_at(&code, T + STEP_SECONDS));
    }

    #[test]
    fn test_huge_skew_is_capped() {
        let (gate, secret) = fixture();
        let gate = gate.with_skew_steps(u64::MAX);
        let code = code_at(&secret, T);

        assert!(gate.verify_at(&code, T + MAX_SKEW_STEPS * STEP_SECONDS));
        assert!(!gate.verify_at(&code, T + (MAX_SKEW_STEPS + 1) * STEP_SECONDS));
    }

    #[test]
    fn test_malformed_codes_rejected() {
        let (gate, _) = fixture();

        assert!(!gate.verify_at("", T));
        assert!(!gate.verify_at("12345", T));
        assert!(!gate.verify_at("1234567", T));
        assert!(!gate.verify_at("12a456", T));
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let (gate, secret) = fixture();
        let code = format!(" {}\n", code_at(&secret, T));

        assert!(gate.verify_at(&code, T));
    }

    #[test]
    fn test_free_verify_with_bad_secret() {
        assert!(!verify("!!!", "123456"));
    }

    #[test]
    fn test_check_live_clock() {
        let (gate, secret) = fixture();

        assert!(gate.check(&code_at(&secret, now_unix())).is_ok());
        assert!(matches!(
            gate.check("abcdef"),
            Err(Error::SecondFactorRejected)
        ));
    }
}
