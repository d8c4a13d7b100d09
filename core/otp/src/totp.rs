//! RFC 6238 code computation.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::secret::TotpSecret;

/// Number of digits in a code.
pub const DIGITS: u32 = 6;

/// Length of one time step in seconds.
pub const STEP_SECONDS: u64 = 30;

type HmacSha1 = Hmac<Sha1>;

/// Time step containing `unix_seconds`.
pub fn step_at(unix_seconds: u64) -> u64 {
    unix_seconds / STEP_SECONDS
}

/// HOTP value for one counter (RFC 4226 dynamic truncation).
pub fn hotp(secret: &TotpSecret, counter: u64) -> u32 {
    // HMAC accepts keys of any length, new_from_slice cannot fail here
    let mut mac = match HmacSha1::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return 0,
    };
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    binary % 10u32.pow(DIGITS)
}

/// Zero-padded code for the step containing `unix_seconds`.
pub fn code_at(secret: &TotpSecret, unix_seconds: u64) -> String {
    format_code(hotp(secret, step_at(unix_seconds)))
}

pub(crate) fn format_code(value: u32) -> String {
    format!("{:0width$}", value, width = DIGITS as usize)
}
