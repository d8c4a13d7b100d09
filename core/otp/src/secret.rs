//! Shared TOTP secret.

use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use dmalock_common::{Error, Result};

/// Length of freshly generated secrets (160 bits, the HMAC-SHA1 block size
/// recommendation of RFC 4226).
pub const SECRET_LENGTH: usize = 20;

/// Raw TOTP key bytes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct TotpSecret(Vec<u8>);

impl TotpSecret {
    /// Generate a random secret.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; SECRET_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse a base32 secret as stored in the credential record.
    ///
    /// Tolerates lowercase, embedded spaces and trailing padding, which is
    /// how people retype secrets by hand.
    pub fn from_base32(encoded: &str) -> Result<Self> {
        let normalized: String = encoded
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '=')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.is_empty() {
            return Err(Error::InvalidInput("TOTP secret is empty".to_string()));
        }

        BASE32_NOPAD
            .decode(normalized.as_bytes())
            .map(Self)
            .map_err(|e| Error::InvalidInput(format!("Invalid base32 TOTP secret: {}", e)))
    }

    /// Base32 text form, uppercase without padding.
    pub fn to_base32(&self) -> String {
        BASE32_NOPAD.encode(&self.0)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TotpSecret([REDACTED; {} bytes])", self.0.len())
    }
}
