//! Password-based cipher engine.
//!
//! `encrypt` turns a plaintext file body into a complete container and
//! `decrypt` reverses it. Neither touches the filesystem.

use tracing::trace;

use crate::aead::{decrypt_with_nonce, encrypt_with_nonce};
use crate::compress::{compress, decompress};
use crate::container::Container;
use crate::kdf::derive_key;
use crate::keys::{Nonce, Salt};
use dmalock_common::Result;

/// Encrypt a payload into serialized container bytes.
///
/// # Postconditions
/// - A fresh salt and nonce are drawn on every call
/// - The payload is zlib-compressed before encryption
///
/// # Errors
/// - `InvalidInput` if password is empty
pub fn encrypt(plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    let salt = Salt::generate();
    let nonce = Nonce::generate();
    let key = derive_key(password, &salt)?;

    let compressed = compress(plaintext)?;
    let ciphertext = encrypt_with_nonce(key.as_bytes(), &nonce, &compressed)?;

    trace!(
        plain = plaintext.len(),
        compressed = compressed.len(),
        "sealed container payload"
    );

    Ok(Container {
        salt,
        nonce,
        ciphertext: &ciphertext,
    }
    .to_bytes())
}

/// Decrypt serialized container bytes back into the original payload.
///
/// # Errors
/// - `MalformedContainer` for a short buffer, unknown magic or a payload
///   that does not inflate
/// - `AuthenticationFailure` for a wrong password or tampered bytes
pub fn decrypt(container_bytes: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    let container = Container::parse(container_bytes)?;
    let key = derive_key(password, &container.salt)?;

    let compressed = decrypt_with_nonce(key.as_bytes(), &container.nonce, container.ciphertext)?;
    decompress(&compressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{HEADER_SIZE, MIN_CONTAINER_SIZE};
    use dmalock_common::Error;
    use proptest::prelude::*;

    #[test]
    fn test_roundtrip() {
        let plaintext = b"JFIF pretend this is a photo".repeat(50);

        let sealed = encrypt(&plaintext, b"correct horse").unwrap();
        let opened = decrypt(&sealed, b"correct horse").unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let sealed = encrypt(b"", b"pw").unwrap();
        assert!(decrypt(&sealed, b"pw").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let sealed = encrypt(b"payroll.xlsx contents", b"first").unwrap();

        assert!(matches!(
            decrypt(&sealed, b"second"),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_salt_nonce_unique_per_call() {
        let a = encrypt(b"same bytes", b"same password").unwrap();
        let b = encrypt(b"same bytes", b"same password").unwrap();

        let ca = Container::parse(&a).unwrap();
        let cb = Container::parse(&b).unwrap();

        assert_ne!(ca.salt, cb.salt);
        assert_ne!(ca.nonce, cb.nonce);
        assert_ne!(ca.ciphertext, cb.ciphertext);
    }

    #[test]
    fn test_single_bit_flips_fail_authentication() {
        let sealed = encrypt(b"tamper target", b"pw").unwrap();

        // first ciphertext byte, a middle byte, last tag byte, and a salt byte
        for index in [HEADER_SIZE, HEADER_SIZE + 3, sealed.len() - 1, 4] {
            let mut corrupted = sealed.clone();
            corrupted[index] ^= 0x01;

            assert!(
                matches!(decrypt(&corrupted, b"pw"), Err(Error::AuthenticationFailure)),
                "bit flip at {} was not detected",
                index
            );
        }
    }

    #[test]
    fn test_truncation_is_malformed() {
        let sealed = encrypt(b"short", b"pw").unwrap();

        assert!(matches!(
            decrypt(&sealed[..MIN_CONTAINER_SIZE - 1], b"pw"),
            Err(Error::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_truncation_above_minimum_fails_authentication() {
        let sealed = encrypt(b"a longer payload that will be cut", b"pw").unwrap();

        assert!(matches!(
            decrypt(&sealed[..sealed.len() - 3], b"pw"),
            Err(Error::AuthenticationFailure)
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_roundtrip(
            payload in proptest::collection::vec(any::<u8>(), 0..4096),
            password in "[ -~]{1,32}",
        ) {
            let sealed = encrypt(&payload, password.as_bytes()).unwrap();
            prop_assert_eq!(decrypt(&sealed, password.as_bytes()).unwrap(), payload);
        }
    }
}
