//! Inbound webhook signature checks

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Malformed signature header")]
    MalformedHeader,
    #[error("Signed timestamp outside tolerance")]
    TimestampOutOfTolerance,
    #[error("Signature mismatch")]
    Mismatch,
    #[error("Webhook verification is not configured")]
    NotConfigured,
}

/// Verifies a `Stripe-Signature` header against the raw request body.
///
/// The header carries `t=<unix>,v1=<hex>[,v1=<hex>...]`; the signed payload
/// is `{t}.{body}` and any matching `v1` accepts. `now` is passed in so the
/// tolerance window is testable.
pub fn verify_stripe_signature(
    secret: &str,
    header: &str,
    payload: &str,
    tolerance: i64,
    now: i64,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::NotConfigured);
    }

    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = v.parse().ok(),
            Some(("v1", v)) => candidates.push(v),
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if candidates.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }
    if (now - timestamp).abs() > tolerance {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    let signed_payload = format!("{timestamp}.{payload}");
    for candidate in candidates {
        let Ok(sig) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::NotConfigured)?;
        mac.update(signed_payload.as_bytes());
        if mac.verify_slice(&sig).is_ok() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

/// PayPal events are accepted when the transmission headers are present and
/// the webhook id matches configuration. Full certificate verification needs
/// a callback to PayPal's verify endpoint, which this service does not make.
pub fn verify_paypal_transmission(
    configured_webhook_id: &str,
    transmission_id: Option<&str>,
    transmission_sig: Option<&str>,
    webhook_id: Option<&str>,
) -> Result<(), SignatureError> {
    if configured_webhook_id.is_empty() {
        return Err(SignatureError::NotConfigured);
    }
    match (transmission_id, transmission_sig, webhook_id) {
        (Some(id), Some(sig), Some(hook)) if !id.is_empty() && !sig.is_empty() => {
            if hook == configured_webhook_id {
                Ok(())
            } else {
                Err(SignatureError::Mismatch)
            }
        }
        _ => Err(SignatureError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: i64, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_stripe_signature_accepted() {
        let secret = "whsec_test";
        let payload = r#"{"id":"evt_1"}"#;
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(secret, now, payload));
        verify_stripe_signature(secret, &header, payload, 300, now).unwrap();
    }

    #[test]
    fn tampered_payload_rejected() {
        let secret = "whsec_test";
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(secret, now, "original"));
        let err = verify_stripe_signature(secret, &header, "tampered", 300, now).unwrap_err();
        assert!(matches!(err, SignatureError::Mismatch));
    }

    #[test]
    fn stale_timestamp_rejected() {
        let secret = "whsec_test";
        let payload = "{}";
        let then = 1_700_000_000;
        let header = format!("t={then},v1={}", sign(secret, then, payload));
        let err = verify_stripe_signature(secret, &header, payload, 300, then + 301).unwrap_err();
        assert!(matches!(err, SignatureError::TimestampOutOfTolerance));
    }

    #[test]
    fn second_v1_candidate_accepted() {
        let secret = "whsec_test";
        let payload = "{}";
        let now = 1_700_000_000;
        let header = format!("t={now},v1=deadbeef,v1={}", sign(secret, now, payload));
        verify_stripe_signature(secret, &header, payload, 300, now).unwrap();
    }

    #[test]
    fn paypal_requires_matching_webhook_id() {
        verify_paypal_transmission("WH-1", Some("tid"), Some("sig"), Some("WH-1")).unwrap();
        let err =
            verify_paypal_transmission("WH-1", Some("tid"), Some("sig"), Some("WH-2")).unwrap_err();
        assert!(matches!(err, SignatureError::Mismatch));
        let err = verify_paypal_transmission("WH-1", None, Some("sig"), Some("WH-1")).unwrap_err();
        assert!(matches!(err, SignatureError::MalformedHeader));
    }
}
