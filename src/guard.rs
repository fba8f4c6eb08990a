//! Access guard: validates a presented credential before the protected
//! capability runs.
//!
//! With live revocation enabled (the default), the guard re-reads the
//! store's `active` flag for the credential's subject code on every call,
//! so revoking a code cuts off its credentials immediately rather than at
//! natural expiry. Usage caps are NOT re-applied here: they bound
//! redemptions, not protected calls, so a consumed single-use code still
//! backs a working credential until that credential expires or the code is
//! revoked.

use std::sync::Arc;

use crate::clock::Clock;
use crate::errors::CodewardenError;
use crate::store::CodeStore;
use crate::token::claims::{CredentialClaims, ACTIVATION_TYPE_TAG};
use crate::token::verifier::CredentialVerifier;

/// Per-request credential check ahead of the protected capability.
pub struct AccessGuard {
    verifier: CredentialVerifier,
    store: Arc<dyn CodeStore>,
    live_revocation: bool,
    clock: Arc<dyn Clock>,
}

impl AccessGuard {
    /// Build a guard over the shared store and verifier.
    pub fn new(
        verifier: CredentialVerifier,
        store: Arc<dyn CodeStore>,
        live_revocation: bool,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier,
            store,
            live_revocation,
            clock,
        }
    }

    /// Authorize a presented credential, returning its claims on success.
    pub fn authorize(&self, token: &str) -> Result<CredentialClaims, CodewardenError> {
        let claims = self
            .verifier
            .verify(token, ACTIVATION_TYPE_TAG, self.clock.as_ref())?;

        if self.live_revocation {
            if let Some(subject) = &claims.subject_code {
                let record = self
                    .store
                    .get(subject)?
                    .ok_or(CodewardenError::CodeNotFound)?;
                if !record.active {
                    return Err(CodewardenError::CodeInactive);
                }
            }
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::config::SigningSecret;
    use crate::store::memory::MemoryStore;
    use crate::store::record::{ActivationCode, UsagePolicy};
    use crate::token::issuer::CredentialIssuer;
    use chrono::TimeZone;
    use std::time::Duration;

    const SECRET_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn fixed_clock() -> MockClock {
        MockClock::new(chrono::Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap())
    }

    fn secret() -> SigningSecret {
        SigningSecret::from_hex(SECRET_HEX).unwrap()
    }

    fn issue_for(code: &str) -> String {
        CredentialIssuer::new(secret(), Duration::from_secs(3600))
            .issue(ACTIVATION_TYPE_TAG, Some(code), &fixed_clock())
            .unwrap()
    }

    fn guard_with(store: Arc<MemoryStore>, live_revocation: bool) -> AccessGuard {
        AccessGuard::new(
            CredentialVerifier::new(secret()),
            store,
            live_revocation,
            Arc::new(fixed_clock()),
        )
    }

    fn seed_consumed_single_use(store: &MemoryStore, value: &str) {
        store
            .create(ActivationCode::new(
                value.to_string(),
                fixed_clock().now_utc(),
                None,
                UsagePolicy::SingleUse,
            ))
            .unwrap();
        store.try_consume(value, fixed_clock().now_utc()).unwrap();
    }

    #[test]
    fn valid_credential_is_authorized() {
        let store = Arc::new(MemoryStore::new());
        seed_consumed_single_use(&store, "K7H2PX");
        let guard = guard_with(Arc::clone(&store), true);

        let claims = guard.authorize(&issue_for("K7H2PX")).unwrap();
        assert_eq!(claims.subject_code.as_deref(), Some("K7H2PX"));
    }

    #[test]
    fn consumed_single_use_code_still_authorizes_protected_calls() {
        // Usage caps bound redemptions; the credential earned by the one
        // redemption keeps working.
        let store = Arc::new(MemoryStore::new());
        seed_consumed_single_use(&store, "K7H2PX");
        let guard = guard_with(Arc::clone(&store), true);

        for _ in 0..5 {
            assert!(guard.authorize(&issue_for("K7H2PX")).is_ok());
        }
    }

    #[test]
    fn revocation_cuts_off_live_credentials() {
        let store = Arc::new(MemoryStore::new());
        seed_consumed_single_use(&store, "K7H2PX");
        let guard = guard_with(Arc::clone(&store), true);
        let token = issue_for("K7H2PX");

        assert!(guard.authorize(&token).is_ok());
        store.revoke("K7H2PX").unwrap();
        assert!(matches!(
            guard.authorize(&token),
            Err(CodewardenError::CodeInactive)
        ));
    }

    #[test]
    fn purged_subject_code_is_refused_under_live_revocation() {
        let store = Arc::new(MemoryStore::new());
        let guard = guard_with(store, true);

        // Credential references a code the store has never seen.
        assert!(matches!(
            guard.authorize(&issue_for("GHOST1")),
            Err(CodewardenError::CodeNotFound)
        ));
    }

    #[test]
    fn stateless_policy_ignores_revocation_until_expiry() {
        let store = Arc::new(MemoryStore::new());
        seed_consumed_single_use(&store, "K7H2PX");
        let guard = guard_with(Arc::clone(&store), false);
        let token = issue_for("K7H2PX");

        store.revoke("K7H2PX").unwrap();
        assert!(guard.authorize(&token).is_ok());
    }

    #[test]
    fn forged_credential_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let guard = guard_with(store, true);

        let token = issue_for("K7H2PX");
        let replacement = if token.ends_with('A') { 'B' } else { 'A' };
        let forged = format!("{}{replacement}", &token[..token.len() - 1]);
        assert!(guard.authorize(&forged).is_err());
    }
}
