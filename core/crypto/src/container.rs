//! On-disk container layout.
//!
//! ```text
//! magic(4) || salt(16) || nonce(12) || ciphertext || tag(16)
//! ```
//!
//! The magic doubles as the format version: a container written by a
//! future layout is rejected before any key derivation happens.

use crate::aead::TAG_SIZE;
use crate::keys::{Nonce, Salt, NONCE_SIZE, SALT_SIZE};
use dmalock_common::{Error, Result};

/// Format tag of the current container layout.
pub const MAGIC: [u8; 4] = *b"DMA2";

/// Bytes preceding the ciphertext.
pub const HEADER_SIZE: usize = MAGIC.len() + SALT_SIZE + NONCE_SIZE;

/// Smallest well-formed container: header plus an empty payload's tag.
pub const MIN_CONTAINER_SIZE: usize = HEADER_SIZE + TAG_SIZE;

/// A parsed container borrowing its ciphertext from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container<'a> {
    /// Salt the key was derived with.
    pub salt: Salt,
    /// AES-GCM nonce.
    pub nonce: Nonce,
    /// Ciphertext followed by the authentication tag.
    pub ciphertext: &'a [u8],
}

impl<'a> Container<'a> {
    /// Parse a serialized container.
    ///
    /// # Errors
    /// - `MalformedContainer` if the buffer is shorter than
    ///   [`MIN_CONTAINER_SIZE`] or the magic does not match
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < MIN_CONTAINER_SIZE {
            return Err(Error::MalformedContainer(format!(
                "Container too short: {} bytes, need at least {}",
                bytes.len(),
                MIN_CONTAINER_SIZE
            )));
        }

        let (magic, rest) = bytes.split_at(MAGIC.len());
        if magic != MAGIC {
            return Err(Error::MalformedContainer(
                "Unrecognized container magic".to_string(),
            ));
        }

        let (salt_bytes, rest) = rest.split_at(SALT_SIZE);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(salt_bytes);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            salt: Salt::from_bytes(salt),
            nonce: Nonce::from_bytes(nonce),
            ciphertext,
        })
    }

    /// Serialize to the on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(self.salt.as_bytes());
        out.extend_from_slice(self.nonce.as_bytes());
        out.extend_from_slice(self.ciphertext);
        out
    }
}

/// Cheap header check: long enough and carries the current magic.
pub fn is_container(bytes: &[u8]) -> bool {
    bytes.len() >= MIN_CONTAINER_SIZE && bytes[..MAGIC.len()] == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        let body = [0xEEu8; 40];
        Container {
            salt: Salt::from_bytes([1u8; SALT_SIZE]),
            nonce: Nonce::from_bytes([2u8; NONCE_SIZE]),
            ciphertext: &body,
        }
        .to_bytes()
    }

    #[test]
    fn test_layout_offsets() {
        let bytes = sample();

        assert_eq!(&bytes[..4], b"DMA2");
        assert_eq!(&bytes[4..20], &[1u8; SALT_SIZE]);
        assert_eq!(&bytes[20..32], &[2u8; NONCE_SIZE]);
        assert_eq!(bytes.len(), HEADER_SIZE + 40);
    }

    #[test]
    fn test_parse_borrows_ciphertext() {
        let bytes = sample();
        let container = Container::parse(&bytes).unwrap();

        assert_eq!(container.salt.as_bytes(), &[1u8; SALT_SIZE]);
        assert_eq!(container.nonce.as_bytes(), &[2u8; NONCE_SIZE]);
        assert_eq!(container.ciphertext, &[0xEEu8; 40][..]);
    }

    #[test]
    fn test_minimum_length_boundary() {
        let bytes = sample();

        assert!(Container::parse(&bytes[..MIN_CONTAINER_SIZE]).is_ok());
        assert!(matches!(
            Container::parse(&bytes[..MIN_CONTAINER_SIZE - 1]),
            Err(Error::MalformedContainer(_))
        ));
        assert!(matches!(
            Container::parse(&[]),
            Err(Error::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_magic_mismatch() {
        let mut bytes = sample();
        bytes[..4].copy_from_slice(b"DMA1");

        assert!(matches!(
            Container::parse(&bytes),
            Err(Error::MalformedContainer(_))
        ));
        assert!(!is_container(&bytes));
    }

    #[test]
    fn test_is_container() {
        assert!(is_container(&sample()));
        assert!(!is_container(b"DMA2"));
    }
}
