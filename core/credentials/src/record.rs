//! The persisted credential record.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use dmalock_common::Password;

/// Locking password plus the second-factor secret bound to it.
///
/// Serialized as `{"password": ..., "totp": ...}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    password: String,
    #[serde(rename = "totp", default)]
    totp_secret: String,
}

impl CredentialRecord {
    /// Create a record from a password and a base32 TOTP secret.
    pub fn new(password: impl Into<String>, totp_secret: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            totp_secret: totp_secret.into(),
        }
    }

    /// Transient copy of the locking password for one run.
    pub fn password(&self) -> Password {
        Password::new(self.password.clone())
    }

    /// Base32 second-factor secret.
    pub fn totp_secret(&self) -> &str {
        &self.totp_secret
    }

    /// Whether a second factor is on record.
    pub fn has_second_factor(&self) -> bool {
        !self.totp_secret.is_empty()
    }

    /// Both password and second-factor secret are present.
    pub fn is_configured(&self) -> bool {
        !self.password.is_empty() && !self.totp_secret.is_empty()
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("password", &"[REDACTED]")
            .field("totp_secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_field_names() {
        let record = CredentialRecord::new("pw", "JBSWY3DPEHPK3PXP");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["password"], "pw");
        assert_eq!(json["totp"], "JBSWY3DPEHPK3PXP");
    }

    #[test]
    fn test_is_configured() {
        assert!(CredentialRecord::new("pw", "SECRET").is_configured());
        assert!(!CredentialRecord::new("", "SECRET").is_configured());
        assert!(!CredentialRecord::new("pw", "").is_configured());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let record = CredentialRecord::new("hunter2", "JBSWY3DPEHPK3PXP");
        let debug = format!("{:?}", record);

        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("JBSWY3DPEHPK3PXP"));
    }
}
