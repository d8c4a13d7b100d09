//! Machine-bound credential store.
//!
//! The locking password and second-factor secret live in a single file
//! encrypted under a key derived from the local account identity. This is
//! an obfuscation boundary: anyone able to run the locker as the same
//! account can recover the record, nobody copying the file elsewhere can.

pub mod identity;
pub mod record;
pub mod store;

pub use identity::{IdentityProvider, OsAccountIdentity, StaticIdentity};
pub use record::CredentialRecord;
pub use store::{CredentialStore, CREDENTIAL_FILENAME};
