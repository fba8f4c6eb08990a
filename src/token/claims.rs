//! Credential payload shape.

use serde::{Deserialize, Serialize};

/// Type tag carried by every credential this crate mints.
///
/// Verification rejects any other tag even when the signature is valid, so
/// a different token family signed with the same secret can never pass as
/// an activation credential.
pub const ACTIVATION_TYPE_TAG: &str = "activation";

/// The signed payload: exactly `{typ, iat, exp, sub?}`, nothing else.
///
/// Timestamps are unix seconds. `sub` references the activation code that
/// produced the credential; informational, not ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Type discriminator distinguishing this credential family.
    #[serde(rename = "typ")]
    pub type_tag: String,

    /// Issuance instant.
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Expiry instant; mandatory, unlike code expiry.
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// The activation code this credential was redeemed from.
    #[serde(rename = "sub", default, skip_serializing_if = "Option::is_none")]
    pub subject_code: Option<String>,
}
