//! One-time enrollment of an authenticator app.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::secret::TotpSecret;
use crate::totp::{DIGITS, STEP_SECONDS};

/// Characters escaped inside the URI label and parameters.
const LABEL: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A freshly provisioned secret and the URI to show once as a QR code.
#[derive(Debug, Clone)]
pub struct Provisioning {
    /// The new secret.
    pub secret: TotpSecret,
    /// `otpauth://` URI embedding the secret.
    pub enrollment_uri: String,
}

impl Provisioning {
    /// Base32 form of the secret, as persisted in the credential record.
    pub fn secret_base32(&self) -> String {
        self.secret.to_base32()
    }
}

/// Generate a new secret labelled `issuer:account`.
pub fn provision(issuer: &str, account: &str) -> Provisioning {
    let secret = TotpSecret::generate();
    let enrollment_uri = enrollment_uri(&secret, issuer, account);
    Provisioning {
        secret,
        enrollment_uri,
    }
}

/// Key URI in the format authenticator apps scan.
pub fn enrollment_uri(secret: &TotpSecret, issuer: &str, account: &str) -> String {
    let issuer = utf8_percent_encode(issuer, LABEL).to_string();
    let account = utf8_percent_encode(account, LABEL);
    format!(
        "otpauth://totp/{issuer}:{account}?secret={secret}&issuer={issuer}&digits={DIGITS}&period={STEP_SECONDS}",
        secret = secret.to_base32(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::SecondFactorGate;
    use crate::totp::code_at;

    #[test]
    fn test_uri_format() {
        let secret = TotpSecret::from_base32("JBSWY3DPEHPK3PXP").unwrap();
        let uri = enrollment_uri(&secret, "DMA", "FolderLocker");

        assert_eq!(
            uri,
            "otpauth://totp/DMA:FolderLocker?secret=JBSWY3DPEHPK3PXP&issuer=DMA&digits=6&period=30"
        );
    }

    #[test]
    fn test_labels_are_escaped() {
        let secret = TotpSecret::from_base32("JBSWY3DPEHPK3PXP").unwrap();
        let uri = enrollment_uri(&secret, "Studio A&B", "front desk");

        assert!(uri.starts_with("otpauth://totp/Studio%20A%26B:front%20desk?"));
        assert!(uri.contains("&issuer=Studio%20A%26B&"));
    }

    #[test]
    fn test_provisioned_secret_verifies() {
        let provisioning = provision("DMA", "FolderLocker");
        let stored = provisioning.secret_base32();

        assert!(provisioning.enrollment_uri.contains(&stored));

        let gate = SecondFactorGate::new(&stored).unwrap();
        let t = 1_650_000_000;
        assert!(gate.verify_at(&code_at(&provisioning.secret, t), t));
    }

    #[test]
    fn test_each_provision_is_unique() {
        let a = provision("DMA", "FolderLocker");
        let b = provision("DMA", "FolderLocker");
        assert_ne!(a.secret_base32(), b.secret_base32());
    }
}
