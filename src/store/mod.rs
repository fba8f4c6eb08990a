//! Activation code registry.
//!
//! One trait, two backends: an in-memory map and a file-per-code directory.
//! Both uphold the same contract: `try_consume` evaluates the redeemability
//! invariant and increments the usage counter in one indivisible step, so
//! two concurrent redemptions of a code with one use remaining produce
//! exactly one success.

pub mod file;
pub mod memory;
pub mod record;

use chrono::{DateTime, Utc};

use crate::errors::CodewardenError;
use record::ActivationCode;

/// Persistent registry of activation codes and their redemption state.
///
/// All mutation flows through `create`, `try_consume`, and `revoke`.
pub trait CodeStore: Send + Sync {
    /// Insert a new record. Fails with `CodeExists` if the value is taken.
    fn create(&self, record: ActivationCode) -> Result<(), CodewardenError>;

    /// Fetch a record by code value.
    fn get(&self, code: &str) -> Result<Option<ActivationCode>, CodewardenError>;

    /// Atomically check redeemability and consume one use.
    ///
    /// On success the returned record reflects the consumption (incremented
    /// `usage_count`, updated `last_used_at`). On failure the record is
    /// untouched and the error names the specific internal reason
    /// (`CodeNotFound`, `CodeInactive`, `CodeExpired`, `UsageExhausted`).
    fn try_consume(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<ActivationCode, CodewardenError>;

    /// Set `active = false`. Idempotent: revoking an already-revoked code
    /// succeeds. Unknown codes fail with `CodeNotFound`.
    fn revoke(&self, code: &str) -> Result<(), CodewardenError>;

    /// All stored records. Admin-only surface.
    fn list(&self) -> Result<Vec<ActivationCode>, CodewardenError>;
}
