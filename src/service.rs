//! Activation service - the main public API.
//!
//! One facade over the whole lifecycle: admin code issuance, redemption,
//! credential verification, and the guarded protected call. This is the
//! trust boundary: detailed failure reasons are logged here, then collapsed
//! to generic [`Rejection`] kinds before anything reaches a caller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use subtle::ConstantTimeEq;

use crate::capability::Capability;
use crate::clock::{Clock, SystemClock};
use crate::codegen;
use crate::config::ServiceConfig;
use crate::errors::{CodewardenError, Rejection};
use crate::gate::{ActivationGate, CredentialGrant};
use crate::guard::AccessGuard;
use crate::store::memory::MemoryStore;
use crate::store::record::{ActivationCode, UsagePolicy};
use crate::store::CodeStore;
use crate::token::claims::ACTIVATION_TYPE_TAG;
use crate::token::issuer::CredentialIssuer;
use crate::token::verifier::CredentialVerifier;

/// Admin request to mint a new activation code.
#[derive(Debug, Clone, Default)]
pub struct CreateCodeRequest {
    /// Optional code lifetime; `None` means the code never expires on its own.
    pub ttl: Option<Duration>,

    /// Usage policy; `None` applies the configured default.
    pub policy: Option<UsagePolicy>,
}

/// A newly minted activation code.
#[derive(Debug, Clone)]
pub struct CodeGrant {
    /// The code value to hand to the end user out-of-band.
    pub code: String,

    /// Seconds until the code expires, if it expires at all.
    pub expires_in: Option<i64>,
}

/// The activation service facade.
///
/// Create one instance per process and share it across request handlers;
/// all methods take `&self`.
pub struct ActivationService {
    config: ServiceConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn CodeStore>,
    gate: ActivationGate,
    guard: AccessGuard,
    verifier: CredentialVerifier,
    capability: Option<Arc<dyn Capability>>,
}

impl ActivationService {
    /// Create a service over an in-memory store and the system clock.
    pub fn new(config: ServiceConfig) -> Result<Self, CodewardenError> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create a service over a chosen store backend.
    pub fn with_store(
        config: ServiceConfig,
        store: Arc<dyn CodeStore>,
    ) -> Result<Self, CodewardenError> {
        Self::build(config, store, Arc::new(SystemClock))
    }

    /// Create a service with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn with_store_and_clock(
        config: ServiceConfig,
        store: Arc<dyn CodeStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CodewardenError> {
        Self::build(config, store, clock)
    }

    fn build(
        config: ServiceConfig,
        store: Arc<dyn CodeStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CodewardenError> {
        config.validate()?;

        let issuer = CredentialIssuer::new(config.signing_secret.clone(), config.credential_ttl);
        let gate = ActivationGate::new(Arc::clone(&store), issuer, Arc::clone(&clock));
        let guard = AccessGuard::new(
            CredentialVerifier::new(config.signing_secret.clone()),
            Arc::clone(&store),
            config.live_revocation,
            Arc::clone(&clock),
        );
        let verifier = CredentialVerifier::new(config.signing_secret.clone());

        Ok(Self {
            config,
            clock,
            store,
            gate,
            guard,
            verifier,
            capability: None,
        })
    }

    /// Attach the downstream capability gated by `protected_call`.
    pub fn with_capability(mut self, capability: Arc<dyn Capability>) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Mint a new activation code. Admin operation.
    pub fn create_code(
        &self,
        admin_secret: &str,
        request: CreateCodeRequest,
    ) -> Result<CodeGrant, Rejection> {
        self.check_admin(admin_secret)
            .map_err(|e| self.reject("create_code", e))?;

        let now = self.clock.now_utc();
        let expires_at = match request.ttl {
            Some(ttl) => Some(
                chrono::Duration::from_std(ttl)
                    .map(|d| now + d)
                    .map_err(|_| {
                        self.reject(
                            "create_code",
                            CodewardenError::MalformedRequest("ttl out of range".to_string()),
                        )
                    })?,
            ),
            None => None,
        };
        let policy = request.policy.unwrap_or(self.config.default_policy);

        let record = codegen::create_unique(
            self.store.as_ref(),
            self.config.code_length,
            now,
            expires_at,
            policy,
        )
        .map_err(|e| self.reject("create_code", e))?;

        Ok(CodeGrant {
            code: record.value,
            expires_in: request.ttl.map(|ttl| ttl.as_secs() as i64),
        })
    }

    /// List all stored codes. Admin operation.
    pub fn list_codes(&self, admin_secret: &str) -> Result<Vec<ActivationCode>, Rejection> {
        self.check_admin(admin_secret)
            .map_err(|e| self.reject("list_codes", e))?;
        self.store
            .list()
            .map_err(|e| self.reject("list_codes", e))
    }

    /// Deactivate a code. Admin operation; idempotent, unknown codes included.
    pub fn revoke_code(&self, admin_secret: &str, code: &str) -> Result<(), Rejection> {
        self.check_admin(admin_secret)
            .map_err(|e| self.reject("revoke_code", e))?;
        match self.store.revoke(code) {
            Ok(()) | Err(CodewardenError::CodeNotFound) => Ok(()),
            Err(e) => Err(self.reject("revoke_code", e)),
        }
    }

    /// Exchange an activation code for a signed credential.
    ///
    /// Every failure (unknown, revoked, expired, exhausted) surfaces as
    /// the same generic `Unauthorized`.
    pub fn redeem(&self, code: &str) -> Result<CredentialGrant, Rejection> {
        self.gate.redeem(code).map_err(|e| self.reject("redeem", e))
    }

    /// Check a presented credential's signature, expiry, and type tag.
    ///
    /// This is the stateless check; live revocation applies only to
    /// `protected_call`.
    pub fn verify(&self, credential: &str) -> Result<(), Rejection> {
        self.verifier
            .verify(credential, ACTIVATION_TYPE_TAG, self.clock.as_ref())
            .map(|_| ())
            .map_err(|e| self.reject("verify", e))
    }

    /// Run the protected capability for a valid credential holder.
    pub fn protected_call(&self, credential: &str, payload: Value) -> Result<Value, Rejection> {
        let claims = self
            .guard
            .authorize(credential)
            .map_err(|e| self.reject("protected_call", e))?;

        let capability = self.capability.as_deref().ok_or_else(|| {
            self.reject(
                "protected_call",
                CodewardenError::CapabilityFailed("no capability configured".to_string()),
            )
        })?;

        capability
            .call(&claims, &payload)
            .map_err(|e| self.reject("protected_call", e))
    }

    fn check_admin(&self, presented: &str) -> Result<(), CodewardenError> {
        let matches: bool = presented
            .as_bytes()
            .ct_eq(self.config.admin_secret.as_bytes())
            .into();
        if matches {
            Ok(())
        } else {
            Err(CodewardenError::AdminAuthFailed)
        }
    }

    /// Log the detailed internal reason, emit the collapsed external kind.
    fn reject(&self, operation: &str, error: CodewardenError) -> Rejection {
        let rejection = error.rejection();
        match rejection {
            Rejection::ServiceError(_) => {
                tracing::warn!(operation, error = %error, "operation failed");
            }
            _ => {
                tracing::debug!(operation, error = %error, "request rejected");
            }
        }
        rejection
    }
}
