//! Activation code records and the redeemability invariant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CodewardenError;

/// How many times a code may be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsagePolicy {
    /// Exactly one successful redemption, ever.
    SingleUse,
    /// At most this many successful redemptions.
    LimitedUse(u32),
    /// No redemption cap (expiry and revocation still apply).
    Unlimited,
}

/// One activation code and its redemption state.
///
/// The store owns these records exclusively; redemption (`try_consume`) is
/// the only mutator of `usage_count` and `last_used_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationCode {
    /// The short opaque bearer string. Unique across all stored codes.
    pub value: String,

    /// When the code was created.
    pub created_at: DateTime<Utc>,

    /// Optional expiry; absence means the code never expires on its own.
    pub expires_at: Option<DateTime<Utc>>,

    /// Redemption cap policy.
    pub usage_policy: UsagePolicy,

    /// Successful redemptions so far. Monotonically non-decreasing.
    pub usage_count: u32,

    /// Administrative kill switch, independent of expiry and usage.
    pub active: bool,

    /// Instant of the most recent successful redemption.
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ActivationCode {
    /// Create a fresh, active, unused record.
    pub fn new(
        value: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        usage_policy: UsagePolicy,
    ) -> Self {
        Self {
            value,
            created_at,
            expires_at,
            usage_policy,
            usage_count: 0,
            active: true,
            last_used_at: None,
        }
    }

    /// Evaluate the redeemability invariant at `now`.
    ///
    /// Check order matches the failure taxonomy: revocation, then expiry,
    /// then usage. The specific reason is internal-only; callers collapse it
    /// before anything crosses the API boundary.
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<(), CodewardenError> {
        if !self.active {
            return Err(CodewardenError::CodeInactive);
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= now {
                return Err(CodewardenError::CodeExpired);
            }
        }
        match self.usage_policy {
            UsagePolicy::SingleUse if self.usage_count > 0 => {
                Err(CodewardenError::UsageExhausted)
            }
            UsagePolicy::LimitedUse(limit) if self.usage_count >= limit => {
                Err(CodewardenError::UsageExhausted)
            }
            _ => Ok(()),
        }
    }

    /// Record one successful redemption.
    ///
    /// Store implementations call this only after `check_redeemable` passed,
    /// inside their atomic section.
    pub(crate) fn mark_consumed(&mut self, now: DateTime<Utc>) {
        self.usage_count += 1;
        self.last_used_at = Some(now);
    }
}
