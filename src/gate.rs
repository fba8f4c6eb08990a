//! Activation gate: exchanges a redeemable code for a signed credential.

use std::sync::Arc;

use crate::clock::Clock;
use crate::errors::CodewardenError;
use crate::store::CodeStore;
use crate::token::claims::ACTIVATION_TYPE_TAG;
use crate::token::issuer::CredentialIssuer;

/// A freshly issued credential and its lifetime in seconds.
#[derive(Debug, Clone)]
pub struct CredentialGrant {
    /// The signed credential string the client presents on protected calls.
    pub credential: String,

    /// Seconds until the credential expires.
    pub expires_in: i64,
}

/// Orchestrates redemption: consume from the store, then mint.
///
/// Consumption and the redeemability check are one atomic store operation,
/// so a single-use code redeemed by concurrent callers yields exactly one
/// credential.
pub struct ActivationGate {
    store: Arc<dyn CodeStore>,
    issuer: CredentialIssuer,
    clock: Arc<dyn Clock>,
}

impl ActivationGate {
    /// Build a gate over the shared store and issuer.
    pub fn new(store: Arc<dyn CodeStore>, issuer: CredentialIssuer, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            issuer,
            clock,
        }
    }

    /// Redeem an activation code.
    ///
    /// Any store-side refusal (unknown, revoked, expired, exhausted)
    /// propagates with its specific internal reason; callers collapse it to
    /// a generic `Unauthorized` before it crosses the API boundary.
    pub fn redeem(&self, code: &str) -> Result<CredentialGrant, CodewardenError> {
        let now = self.clock.now_utc();
        let record = self.store.try_consume(code, now)?;

        let credential =
            self.issuer
                .issue(ACTIVATION_TYPE_TAG, Some(&record.value), self.clock.as_ref())?;

        let fingerprint = crate::store::file::hash_code_value(&record.value);
        tracing::debug!(
            code = %&fingerprint[..8],
            usage_count = record.usage_count,
            "activation code redeemed"
        );

        Ok(CredentialGrant {
            credential,
            expires_in: self.issuer.ttl_seconds(),
        })
    }
}
