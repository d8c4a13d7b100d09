//! Cryptographic primitives for DMA Locker.
//!
//! This module provides:
//! - Key derivation using PBKDF2-HMAC-SHA256
//! - Authenticated encryption using AES-256-GCM
//! - The `DMA2` container format wrapping one encrypted file
//! - The password-based cipher engine tying the three together
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext, password or key material is ever logged
//! - Decryption never returns unauthenticated bytes

pub mod aead;
pub mod cipher;
pub mod compress;
pub mod container;
pub mod kdf;
pub mod keys;

pub use cipher::{decrypt, encrypt};
pub use container::{is_container, Container, MAGIC, MIN_CONTAINER_SIZE};
pub use kdf::{derive_key, PBKDF2_ITERATIONS};
pub use keys::{ContainerKey, Nonce, Salt, KEY_LENGTH, NONCE_SIZE, SALT_SIZE};
