//! Payment-provider webhook contract.

use chrono::{DateTime, Utc};
use common::InvoiceId;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// The payment event carried by a provider webhook.
///
/// `payment_reference` is the provider's external identifier for the
/// payment and serves as the idempotency key under at-least-once
/// delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWebhook {
    pub invoice_id: InvoiceId,
    pub payment_reference: String,
    pub amount_cents: i64,
    pub paid_at: DateTime<Utc>,
}

/// Verifies the authenticity of a webhook delivery.
pub trait SignatureVerifier: Send + Sync {
    /// Returns true if `signature` is valid for `raw_payload`.
    fn verify(&self, signature: &str, raw_payload: &str) -> bool;
}

/// HMAC-SHA256 verifier over the raw request body, hex-encoded, as payment
/// providers sign their webhook deliveries.
#[derive(Debug, Clone)]
pub struct SharedSecretVerifier {
    secret: String,
}

type HmacSha256 = Hmac<Sha256>;

impl SharedSecretVerifier {
    /// Creates a verifier for the given shared webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Computes the expected signature for a payload. Exposed so tests and
    /// provider simulators can sign deliveries.
    pub fn sign(&self, raw_payload: &str) -> String {
        // new_from_slice only fails for unusable key lengths, which
        // HMAC-SHA256 does not have.
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        mac.update(raw_payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl SignatureVerifier for SharedSecretVerifier {
    fn verify(&self, signature: &str, raw_payload: &str) -> bool {
        let expected = self.sign(raw_payload);
        let is_valid = expected == signature;
        if !is_valid {
            tracing::warn!("webhook signature verification failed");
        }
        is_valid
    }
}
