//! Account identity used as key material for the credential store.

use dmalock_common::{Error, Result};

/// Source of the account-bound identity string.
///
/// Injected into [`crate::CredentialStore`] so tests can impersonate
/// another account without touching process state.
pub trait IdentityProvider: Send + Sync {
    /// Identity of the executing account.
    fn identity(&self) -> Result<String>;
}

/// Login name of the executing OS account.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsAccountIdentity;

impl IdentityProvider for OsAccountIdentity {
    fn identity(&self) -> Result<String> {
        let name = whoami::username();
        if name.is_empty() {
            return Err(Error::CredentialStoreUnavailable(
                "Could not determine the OS account name".to_string(),
            ));
        }
        Ok(name)
    }
}

/// Fixed identity, for tests and tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity(String);

impl StaticIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }
}

impl IdentityProvider for StaticIdentity {
    fn identity(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Box<T> {
    fn identity(&self) -> Result<String> {
        (**self).identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_identity() {
        let id = StaticIdentity::new("alice");
        assert_eq!(id.identity().unwrap(), "alice");
    }

    #[test]
    fn test_boxed_provider_delegates() {
        let boxed: Box<dyn IdentityProvider> = Box::new(StaticIdentity::new("bob"));
        assert_eq!(boxed.identity().unwrap(), "bob");
    }
}
