//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is part of the on-disk contract: containers do not
//! record it, so changing [`PBKDF2_ITERATIONS`] makes every existing
//! container undecryptable.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::keys::{ContainerKey, Salt, KEY_LENGTH};
use dmalock_common::{Error, Result};

/// PBKDF2 rounds used for every derived key.
pub const PBKDF2_ITERATIONS: u32 = 200_000;

/// Derive a container key from a password and salt.
///
/// # Preconditions
/// - `password` must not be empty
///
/// # Postconditions
/// - The derived key is deterministic given the same inputs
///
/// # Errors
/// - Returns error if password is empty
///
/// # Security
/// - Password is not stored or logged
pub fn derive_key(password: &[u8], salt: &Salt) -> Result<ContainerKey> {
    if password.is_empty() {
        return Err(Error::InvalidInput("Password cannot be empty".to_string()));
    }

    let mut key_bytes = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password, salt.as_bytes(), PBKDF2_ITERATIONS, &mut key_bytes);

    Ok(ContainerKey::from_bytes(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let password = b"test-password-123";
        let salt = Salt::from_bytes([42u8; 16]);

        let key1 = derive_key(password, &salt).unwrap();
        let key2 = derive_key(password, &salt).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_salt() {
        let password = b"test-password-123";

        let key1 = derive_key(password, &Salt::from_bytes([1u8; 16])).unwrap();
        let key2 = derive_key(password, &Salt::from_bytes([2u8; 16])).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_password() {
        let salt = Salt::from_bytes([42u8; 16]);

        let key1 = derive_key(b"password1", &salt).unwrap();
        let key2 = derive_key(b"password2", &salt).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_empty_password_fails() {
        let salt = Salt::generate();
        assert!(matches!(
            derive_key(b"", &salt),
            Err(Error::InvalidInput(_))
        ));
    }
}
