//! Downstream protected capability.
//!
//! The activation core only gates access; the capability itself (in the
//! source deployments, a generative-AI completion endpoint) is an external
//! collaborator. It receives the validated caller's claims and an opaque
//! JSON payload, and returns an opaque JSON response or a failure.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::errors::CodewardenError;
use crate::store::file::hash_code_value;
use crate::token::claims::CredentialClaims;

/// The protected operation behind the access guard.
pub trait Capability: Send + Sync {
    /// Invoke the capability for an authorized caller.
    fn call(&self, claims: &CredentialClaims, payload: &Value) -> Result<Value, CodewardenError>;
}

/// HTTP-backed capability: POSTs the payload as JSON to a fixed endpoint.
pub struct HttpCapability {
    client: Client,
    endpoint: String,
}

impl HttpCapability {
    /// Build a client for the given endpoint with a 30-second timeout.
    pub fn new(endpoint: &str) -> Result<Self, CodewardenError> {
        Self::with_timeout(endpoint, Duration::from_secs(30))
    }

    /// Build a client with an explicit request timeout.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, CodewardenError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            CodewardenError::ConfigError(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl Capability for HttpCapability {
    fn call(&self, claims: &CredentialClaims, payload: &Value) -> Result<Value, CodewardenError> {
        if let Some(subject) = &claims.subject_code {
            let fingerprint = hash_code_value(subject);
            tracing::debug!(subject = %&fingerprint[..8], "forwarding protected call");
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .map_err(|e| CodewardenError::CapabilityFailed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CodewardenError::CapabilityFailed(format!(
                "upstream returned {status}"
            )));
        }

        response
            .json()
            .map_err(|e| CodewardenError::CapabilityFailed(format!("invalid response body: {e}")))
    }
}
