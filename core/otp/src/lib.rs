//! Second-factor gate for unlocking.
//!
//! Time-based one-time codes (RFC 6238, HMAC-SHA1, 30 second steps, six
//! digits), the parameters every authenticator app assumes when scanning
//! an `otpauth://` URI without explicit overrides.

pub mod gate;
pub mod provision;
pub mod secret;
pub mod totp;

pub use gate::{verify, SecondFactorGate, DEFAULT_SKEW_STEPS, MAX_SKEW_STEPS};
pub use provision::{enrollment_uri, provision, Provisioning};
pub use secret::TotpSecret;
pub use totp::{code_at, DIGITS, STEP_SECONDS};
