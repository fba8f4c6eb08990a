//! Credential minting.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::Mac;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::SigningSecret;
use crate::errors::CodewardenError;
use crate::token::claims::CredentialClaims;
use crate::token::HmacSha256;

/// Mints signed, expiring credentials.
///
/// The TTL is fixed at construction from configuration; callers never
/// influence credential lifetime.
pub struct CredentialIssuer {
    secret: SigningSecret,
    ttl: Duration,
}

impl CredentialIssuer {
    /// Create an issuer over the process-wide secret.
    pub fn new(secret: SigningSecret, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Credential lifetime in seconds.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.as_secs() as i64
    }

    /// Issue a credential with `exp = now + ttl`.
    ///
    /// The tag covers the exact serialized payload bytes; any later change
    /// to the payload invalidates the signature.
    pub fn issue(
        &self,
        type_tag: &str,
        subject_code: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<String, CodewardenError> {
        let now = clock.now_unix();
        let claims = CredentialClaims {
            type_tag: type_tag.to_string(),
            issued_at: now,
            expires_at: now + self.ttl_seconds(),
            subject_code: subject_code.map(String::from),
        };

        let payload = serde_json::to_vec(&claims).map_err(|e| {
            CodewardenError::ConfigError(format!("failed to serialize claims: {e}"))
        })?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| CodewardenError::ConfigError(format!("invalid HMAC key: {e}")))?;
        mac.update(&payload);
        let tag = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(tag)
        ))
    }
}
