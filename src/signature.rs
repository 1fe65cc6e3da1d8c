//! Webhook signature verification.
//!
//! Signatures use the header format `t=<unix-ts>,v1=<hex hmac-sha256>` where
//! the MAC covers `"{t}.{payload}"` keyed by the webhook secret. The timestamp
//! must be within the tolerance window of the current time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TOLERANCE_SECONDS: u64 = 300;

/// Build a signature header for a payload at the given unix timestamp.
/// Used by the health checks (and tests) to exercise verification.
pub fn sign_webhook_payload(payload: &str, secret: &str, timestamp: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify a webhook signature against the payload and secret. Returns false
/// for malformed headers, timestamps outside the tolerance window, and MAC
/// mismatches. Comparison is constant-time.
pub fn verify_webhook_signature(
    payload: &str,
    signature: &str,
    secret: &str,
    tolerance_seconds: u64,
) -> bool {
    verify_at(payload, signature, secret, tolerance_seconds, unix_now())
}

fn verify_at(
    payload: &str,
    signature: &str,
    secret: &str,
    tolerance_seconds: u64,
    now: i64,
) -> bool {
    let Some((timestamp, mac_hex)) = parse_signature(signature) else {
        return false;
    };
    if (now - timestamp).unsigned_abs() > tolerance_seconds {
        return false;
    }
    let Ok(mac_bytes) = hex::decode(mac_hex) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    mac.verify_slice(&mac_bytes).is_ok()
}

fn parse_signature(signature: &str) -> Option<(i64, &str)> {
    let mut timestamp = None;
    let mut mac_hex = None;
    for part in signature.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t.parse::<i64>().ok();
        } else if let Some(v) = part.strip_prefix("v1=") {
            mac_hex = Some(v);
        }
    }
    Some((timestamp?, mac_hex?))
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret_12345";
    const PAYLOAD: &str = r#"{"event": "charge.created", "data": {}}"#;

    #[test]
    fn valid_signature_passes() {
        let now = unix_now();
        let sig = sign_webhook_payload(PAYLOAD, SECRET, now);
        assert!(verify_webhook_signature(
            PAYLOAD,
            &sig,
            SECRET,
            DEFAULT_TOLERANCE_SECONDS
        ));
    }

    #[test]
    fn invalid_signature_fails() {
        assert!(!verify_webhook_signature(
            PAYLOAD,
            "t=123,v1=invalid_signature",
            SECRET,
            DEFAULT_TOLERANCE_SECONDS
        ));
    }

    #[test]
    fn tampered_payload_fails() {
        let now = unix_now();
        let sig = sign_webhook_payload(PAYLOAD, SECRET, now);
        assert!(!verify_webhook_signature(
            r#"{"event": "charge.created", "data": {"amount": 999}}"#,
            &sig,
            SECRET,
            DEFAULT_TOLERANCE_SECONDS
        ));
    }

    #[test]
    fn wrong_secret_fails() {
        let now = unix_now();
        let sig = sign_webhook_payload(PAYLOAD, SECRET, now);
        assert!(!verify_webhook_signature(
            PAYLOAD,
            &sig,
            "whsec_other",
            DEFAULT_TOLERANCE_SECONDS
        ));
    }

    #[test]
    fn expired_timestamp_fails() {
        let now = unix_now();
        let sig = sign_webhook_payload(PAYLOAD, SECRET, now - 600);
        assert!(!verify_at(PAYLOAD, &sig, SECRET, 300, now));
    }

    #[test]
    fn timestamp_within_tolerance_passes() {
        let now = unix_now();
        let sig = sign_webhook_payload(PAYLOAD, SECRET, now - 60);
        assert!(verify_at(PAYLOAD, &sig, SECRET, 300, now));
    }

    #[test]
    fn future_timestamp_outside_tolerance_fails() {
        let now = unix_now();
        let sig = sign_webhook_payload(PAYLOAD, SECRET, now + 600);
        assert!(!verify_at(PAYLOAD, &sig, SECRET, 300, now));
    }

    #[test]
    fn malformed_headers_fail() {
        for sig in [
            "malformed_signature",
            "v1=somehash",
            "t=123456789",
            "t=notanumber,v1=abcd",
            "",
        ] {
            assert!(
                !verify_webhook_signature(PAYLOAD, sig, SECRET, DEFAULT_TOLERANCE_SECONDS),
                "accepted malformed signature {sig:?}"
            );
        }
    }

    #[test]
    fn non_hex_mac_fails() {
        let now = unix_now();
        assert!(!verify_at(
            PAYLOAD,
            &format!("t={now},v1=zzzz"),
            SECRET,
            300,
            now
        ));
    }
}
