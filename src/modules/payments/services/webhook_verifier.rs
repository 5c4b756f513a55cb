use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::core::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the raw callback body
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Checks gateway callback signatures
///
/// Without a secret every callback is accepted.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
}

impl WebhookVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// # Errors
    /// * `Unauthorized` - signature missing, not hex, or not matching the body
    pub fn verify(&self, signature: Option<&str>, body: &[u8]) -> Result<()> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };

        let signature = signature
            .map(str::trim)
            .map(|s| s.strip_prefix("sha256=").unwrap_or(s))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::unauthorized("Missing webhook signature"))?;

        let expected = hex::decode(signature)
            .map_err(|_| AppError::unauthorized("Webhook signature is not valid hex"))?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::internal(format!("Invalid webhook secret: {}", e)))?;
        mac.update(body);

        mac.verify_slice(&expected).map_err(|_| {
            tracing::warn!(body_len = body.len(), "Webhook signature mismatch");
            AppError::unauthorized("Invalid webhook signature")
        })
    }

    /// Hex signature for `body`, as a gateway would compute it
    pub fn sign(secret: &str, body: &[u8]) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::internal(format!("Invalid webhook secret: {}", e)))?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
