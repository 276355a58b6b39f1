//! Delivery payload signing.
//!
//! `X-Hub-Signature: sha256=<hex>` where `<hex>` is the lowercase hex
//! HMAC-SHA256 of the delivered body keyed with the subscription secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// Algorithm prefix of the signature header value.
const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the signature header value for `body` keyed with `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(digest(secret, body)))
}

/// Check a received signature header value against `body`.
///
/// The comparison is constant-time.
pub fn verify(secret: &str, body: &[u8], header_value: &str) -> bool {
    let Some(hex_digest) = header_value.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let mut mac = new_mac(secret);
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn digest(secret: &str, body: &[u8]) -> Vec<u8> {
    let mut mac = new_mac(secret);
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

fn new_mac(secret: &str) -> HmacSha256 {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
    }
}
