use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature, in `ts=<timestamp>,v1=<hex>` form.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Checks a webhook signature header against the raw request body.
///
/// Without a configured secret every request is accepted. Otherwise the
/// header must carry both `ts` and `v1`, and `v1` must equal the hex
/// HMAC-SHA256 of `"<ts>.<body>"`. Malformed input yields `false`.
pub fn verify_signature(header: Option<&str>, body: &[u8], secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    let Some(header) = header else {
        return false;
    };

    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("ts", value)) => timestamp = Some(value.trim()),
            Some(("v1", value)) => signature = Some(value.trim()),
            _ => {}
        }
    }

    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return false;
    };
    if timestamp.is_empty() || signature.is_empty() {
        return false;
    }

    let Some(expected) = digest(timestamp, body, secret) else {
        return false;
    };

    // ct_eq is false for slices of different lengths
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Builds a header value for `body`, as the payment gateway would send it.
pub fn sign(timestamp: &str, body: &[u8], secret: &str) -> Option<String> {
    digest(timestamp, body, secret).map(|v1| format!("ts={timestamp},v1={v1}"))
}

fn digest(timestamp: &str, body: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}
