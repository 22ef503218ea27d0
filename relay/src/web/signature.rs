//! TradingView webhook signature verification.
//!
//! The sender signs the raw request body with HMAC-SHA256 using the shared
//! webhook secret and puts the hex digest in `X-Tradingview-Signature`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Tradingview-Signature";

/// Outcome of checking a request's signature header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    /// Signature present and matches the body.
    Valid,
    /// No signature supplied and none required; the request is let through.
    Skipped,
    /// Signature missing while required, or present and wrong.
    Invalid,
}

impl SignatureCheck {
    pub fn is_accepted(self) -> bool {
        !matches!(self, SignatureCheck::Invalid)
    }
}

/// Compute the hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign_body(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a webhook body signature.
///
/// # Arguments
///
/// * `secret` - The shared webhook secret
/// * `body` - The request body exactly as received
/// * `signature` - The hex digest from the signature header
///
/// # Returns
///
/// `true` if the signature matches the body, `false` otherwise.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let expected_signature = match sign_body(secret, body) {
        Some(sig) => sig,
        None => {
            warn!("webhook_signature_invalid_key");
            return false;
        }
    };

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected_signature, signature);

    if !valid {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Check the signature header of a request.
///
/// An absent or empty header is indistinguishable from a valid signature
/// unless `require_signature` is set.
pub fn check_signature(
    secret: &str,
    body: &[u8],
    signature: Option<&str>,
    require_signature: bool,
) -> SignatureCheck {
    match signature.filter(|s| !s.is_empty()) {
        Some(sig) if verify_webhook_signature(secret, body, sig) => SignatureCheck::Valid,
        Some(_) => SignatureCheck::Invalid,
        None if require_signature => {
            warn!("webhook_signature_missing");
            SignatureCheck::Invalid
        }
        None => SignatureCheck::Skipped,
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
