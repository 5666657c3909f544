//! Gateway signature verification.
//!
//! The gateway signs `"{order_id}|{payment_id}"` with HMAC-SHA256 under the
//! shared secret and sends the hex digest. Verification is constant-time via
//! the Mac comparison; any mismatch, malformed hex included, is
//! `SignatureInvalid`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

fn mac_for(order_id: &str, payment_id: &str, secret: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac
}

/// Hex digest the gateway is expected to send for this order/payment pair.
pub fn expected_signature(order_id: &str, payment_id: &str, secret: &str) -> String {
    hex::encode(mac_for(order_id, payment_id, secret).finalize().into_bytes())
}

/// Verify a received signature. Fails closed on any mismatch.
pub fn verify(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> Result<()> {
    let received = hex::decode(signature).map_err(|_| AppError::SignatureInvalid)?;
    mac_for(order_id, payment_id, secret)
        .verify_slice(&received)
        .map_err(|_| AppError::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_valid_signature_verifies() {
        let sig = expected_signature("order_123", "pay_456", SECRET);
        assert!(verify("order_123", "pay_456", &sig, SECRET).is_ok());
    }

    #[test]
    fn test_tampered_signature_fails() {
        let mut sig = expected_signature("order_123", "pay_456", SECRET);
        // Flip the last hex digit
        let last = sig.pop().unwrap();
        sig.push(if last == '0' { '1' } else { '0' });
        assert!(matches!(
            verify("order_123", "pay_456", &sig, SECRET),
            Err(AppError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_signature_binds_order_and_payment() {
        let sig = expected_signature("order_123", "pay_456", SECRET);
        assert!(verify("order_999", "pay_456", &sig, SECRET).is_err());
        assert!(verify("order_123", "pay_999", &sig, SECRET).is_err());
    }

    #[test]
    fn test_wrong_secret_fails() {
        let sig = expected_signature("order_123", "pay_456", "other-secret");
        assert!(verify("order_123", "pay_456", &sig, SECRET).is_err());
    }

    #[test]
    fn test_malformed_hex_fails_closed() {
        assert!(verify("order_123", "pay_456", "not-hex!!", SECRET).is_err());
        assert!(verify("order_123", "pay_456", "", SECRET).is_err());
    }
}
