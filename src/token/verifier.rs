//! Credential verification.
//!
//! Check order is fixed: signature integrity first (forged or malformed
//! tokens are rejected before any claim is inspected), then expiry, then
//! type tag. All three failure kinds collapse to one generic `Unauthorized`
//! at the API boundary.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::Mac;

use crate::clock::Clock;
use crate::config::SigningSecret;
use crate::errors::CodewardenError;
use crate::token::claims::CredentialClaims;
use crate::token::HmacSha256;

/// Validates presented credentials.
///
/// Pure function of `(token, secret, now)`: no store access, no side
/// effects. Live revocation policy lives in the access guard, not here.
pub struct CredentialVerifier {
    secret: SigningSecret,
}

impl CredentialVerifier {
    /// Create a verifier over the process-wide secret.
    pub fn new(secret: SigningSecret) -> Self {
        Self { secret }
    }

    /// Verify signature, expiry, and type tag, in that order.
    pub fn verify(
        &self,
        token: &str,
        expected_type_tag: &str,
        clock: &dyn Clock,
    ) -> Result<CredentialClaims, CodewardenError> {
        let (payload_b64, tag_b64) = token
            .split_once('.')
            .ok_or(CodewardenError::TokenMalformed)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| CodewardenError::TokenMalformed)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| CodewardenError::TokenMalformed)?;

        // 1. Signature over the raw payload bytes. `verify_slice` compares
        //    in constant time.
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| CodewardenError::ConfigError(format!("invalid HMAC key: {e}")))?;
        mac.update(&payload);
        mac.verify_slice(&tag)
            .map_err(|_| CodewardenError::SignatureInvalid)?;

        let claims: CredentialClaims =
            serde_json::from_slice(&payload).map_err(|_| CodewardenError::TokenMalformed)?;

        // 2. Expiry: valid strictly before `exp`.
        if claims.expires_at <= clock.now_unix() {
            return Err(CodewardenError::CredentialExpired);
        }

        // 3. Type tag.
        if claims.type_tag != expected_type_tag {
            return Err(CodewardenError::WrongTokenType {
                got: claims.type_tag,
            });
        }

        Ok(claims)
    }
}
