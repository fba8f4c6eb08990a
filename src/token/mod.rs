//! Signed usage credentials.
//!
//! A credential is `base64url(payload JSON) . base64url(HMAC-SHA256 tag)`,
//! keyed by the process-wide signing secret (HS256-equivalent semantics).
//! Issuer and verifier are pure: no store access, no side effects beyond
//! reading the clock.

pub mod claims;
pub mod issuer;
pub mod verifier;

use hmac::Hmac;
use sha2::Sha256;

pub(crate) type HmacSha256 = Hmac<Sha256>;
