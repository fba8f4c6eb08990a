//! Codewarden error types.
//!
//! Internal errors carry full detail for logging. The API boundary collapses
//! them to [`Rejection`] kinds so callers cannot distinguish, say, an expired
//! code from one that never existed (enumeration resistance).

use thiserror::Error;

/// Errors that can occur inside the activation core.
#[derive(Debug, Error)]
pub enum CodewardenError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Request payload or parameters are malformed.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Admin secret did not match.
    #[error("Admin authentication failed")]
    AdminAuthFailed,

    /// No activation code with this value exists.
    #[error("Activation code not found")]
    CodeNotFound,

    /// The code has been administratively revoked.
    #[error("Activation code revoked")]
    CodeInactive,

    /// The code's own expiry has passed.
    #[error("Activation code expired")]
    CodeExpired,

    /// The code's usage policy permits no further redemptions.
    #[error("Activation code usage exhausted")]
    UsageExhausted,

    /// A code with this value already exists in the store.
    #[error("Activation code already exists")]
    CodeExists,

    /// Could not find an unused code value within the retry limit.
    #[error("Code generation exhausted {attempts} collision retries")]
    CodeSpaceExhausted {
        /// How many generation attempts were made.
        attempts: u32,
    },

    /// The credential is not structurally a token (encoding/shape).
    #[error("Credential is malformed")]
    TokenMalformed,

    /// The credential's signature does not verify.
    #[error("Credential signature invalid")]
    SignatureInvalid,

    /// The credential's expiry has passed.
    #[error("Credential expired")]
    CredentialExpired,

    /// The credential carries a different type tag than expected.
    #[error("Credential type mismatch: got {got:?}")]
    WrongTokenType {
        /// The type tag found in the credential.
        got: String,
    },

    /// Store I/O failure (after internal retries).
    #[error("Store I/O error: {0}")]
    StoreIo(String),

    /// The downstream protected capability failed.
    #[error("Capability error: {0}")]
    CapabilityFailed(String),
}

impl CodewardenError {
    /// Collapse this error to its externally visible kind.
    ///
    /// Every activation/credential validation failure maps to the same
    /// generic [`Rejection::Unauthorized`]; the specific reason is for
    /// internal logging only.
    pub fn rejection(&self) -> Rejection {
        match self {
            Self::ConfigError(_) | Self::MalformedRequest(_) => Rejection::BadRequest,
            Self::AdminAuthFailed => Rejection::Forbidden,
            Self::CodeNotFound
            | Self::CodeInactive
            | Self::CodeExpired
            | Self::UsageExhausted
            | Self::TokenMalformed
            | Self::SignatureInvalid
            | Self::CredentialExpired
            | Self::WrongTokenType { .. } => Rejection::Unauthorized,
            Self::CodeExists => Rejection::Conflict,
            Self::CodeSpaceExhausted { .. } | Self::StoreIo(_) => {
                Rejection::ServiceError("storage unavailable".to_string())
            }
            // Downstream detail is not a trust-boundary leak and may surface.
            Self::CapabilityFailed(detail) => Rejection::ServiceError(detail.clone()),
        }
    }
}

/// Externally visible failure kinds.
///
/// Messages are stable and generic per kind; 400/403/401/409/500-equivalent
/// for transports that map onto HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Malformed input; no state was changed.
    #[error("bad request")]
    BadRequest,

    /// Admin authentication failure.
    #[error("forbidden")]
    Forbidden,

    /// Any activation or credential validation failure.
    #[error("unauthorized")]
    Unauthorized,

    /// The resource already exists.
    #[error("conflict")]
    Conflict,

    /// Storage or downstream capability failure.
    #[error("service error: {0}")]
    ServiceError(String),
}
