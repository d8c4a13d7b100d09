//! Authenticated encryption using AES-256-GCM.
//!
//! GCM takes a 12-byte nonce. Nonces here are always random; with one key
//! per container (fresh salt) a nonce collision would need the same salt too.

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm,
};

use crate::keys::{Nonce, KEY_LENGTH, NONCE_SIZE};
use dmalock_common::{Error, Result};

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

fn cipher_for(key: &[u8]) -> Result<Aes256Gcm> {
    if key.len() != KEY_LENGTH {
        return Err(Error::Crypto(format!(
            "Invalid key length: expected {}, got {}",
            KEY_LENGTH,
            key.len()
        )));
    }
    Ok(Aes256Gcm::new(GenericArray::from_slice(key)))
}

/// Encrypt plaintext using AES-256-GCM with a random nonce.
///
/// # Postconditions
/// - Returns nonce || ciphertext || tag
/// - The output length is plaintext length + NONCE_SIZE + TAG_SIZE
///
/// # Errors
/// - Returns error if key length is incorrect
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let nonce = Nonce::generate();
    let ciphertext = encrypt_with_nonce(key, &nonce, plaintext)?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(nonce.as_bytes());
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Decrypt data produced by [`encrypt`].
///
/// # Errors
/// - `Crypto` if key length is incorrect
/// - `AuthenticationFailure` if the input is too short or the tag does not verify
pub fn decrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::AuthenticationFailure);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(nonce_bytes);

    decrypt_with_nonce(key, &Nonce::from_bytes(nonce), ciphertext)
}

/// Encrypt plaintext with a caller-supplied nonce.
///
/// No associated data is bound. Output is ciphertext || tag.
///
/// # Security
/// - Caller is responsible for nonce uniqueness per key
pub fn encrypt_with_nonce(key: &[u8], nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(key)?;

    cipher
        .encrypt(GenericArray::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))
}

/// Decrypt ciphertext || tag with a caller-supplied nonce.
pub fn decrypt_with_nonce(key: &[u8], nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(key)?;

    if ciphertext.len() < TAG_SIZE {
        return Err(Error::AuthenticationFailure);
    }

    cipher
        .decrypt(GenericArray::from_slice(nonce.as_bytes()), ciphertext)
        .map_err(|_| Error::AuthenticationFailure)
}
