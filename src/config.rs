//! Codewarden configuration.

use std::fmt;
use std::time::Duration;

use crate::errors::CodewardenError;
use crate::store::record::UsagePolicy;

/// Default length of generated activation codes.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default credential lifetime (30 days).
pub const DEFAULT_CREDENTIAL_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Process-wide HMAC-SHA256 signing key.
///
/// Loaded once at startup and never mutated at runtime. Rotating the secret
/// (by restarting with a new value) invalidates every outstanding credential;
/// that is a break-glass action, not a normal operational path.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Decode a hex-encoded 32-byte secret (64 hex characters).
    pub fn from_hex(hex_secret: &str) -> Result<Self, CodewardenError> {
        if hex_secret.len() != 64 {
            return Err(CodewardenError::ConfigError(format!(
                "signing secret must be 64 hex characters, got {}",
                hex_secret.len()
            )));
        }
        let bytes = hex::decode(hex_secret)
            .map_err(|e| CodewardenError::ConfigError(format!("invalid signing secret hex: {e}")))?;
        Ok(Self(bytes))
    }

    /// Raw key bytes for MAC construction.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// Secrets must never leak through Debug formatting.
impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(..)")
    }
}

/// Configuration for the activation service.
///
/// Passed by reference to the issuer, verifier, and gate at construction
/// time, never as ambient mutable globals, so tests can run with a
/// distinct secret per case.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HMAC key for credential signing.
    pub signing_secret: SigningSecret,

    /// Bearer secret required by admin operations (create/list/revoke).
    pub admin_secret: String,

    /// Length of generated activation codes.
    pub code_length: usize,

    /// Lifetime of issued credentials. Fixed policy, never caller-supplied.
    pub credential_ttl: Duration,

    /// Usage policy applied when a create request does not specify one.
    pub default_policy: UsagePolicy,

    /// Re-check the store's `active` flag on every protected call, so
    /// revocation takes effect before natural credential expiry. Costs one
    /// store lookup per request. When `false`, a credential stays usable for
    /// its full TTL regardless of later revocation.
    pub live_revocation: bool,
}

impl ServiceConfig {
    /// Build a configuration with default policy knobs.
    pub fn new(signing_secret_hex: &str, admin_secret: &str) -> Result<Self, CodewardenError> {
        let config = Self {
            signing_secret: SigningSecret::from_hex(signing_secret_hex)?,
            admin_secret: admin_secret.to_string(),
            code_length: DEFAULT_CODE_LENGTH,
            credential_ttl: DEFAULT_CREDENTIAL_TTL,
            default_policy: UsagePolicy::SingleUse,
            live_revocation: true,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), CodewardenError> {
        if self.admin_secret.is_empty() {
            return Err(CodewardenError::ConfigError(
                "admin_secret cannot be empty".to_string(),
            ));
        }
        if self.code_length < 4 || self.code_length > 32 {
            return Err(CodewardenError::ConfigError(format!(
                "code_length must be within 4..=32, got {}",
                self.code_length
            )));
        }
        if self.credential_ttl.as_secs() == 0 {
            return Err(CodewardenError::ConfigError(
                "credential_ttl cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}
