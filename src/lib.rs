//! # Codewarden
//!
//! **Activation-code licensing core for Rust services.**
//!
//! Codewarden issues short human-shareable activation codes, exchanges a
//! valid code for a signed, time-bounded usage credential, and validates
//! that credential on every protected request before the downstream
//! capability runs.
//!
//! ## Features
//!
//! - **HMAC-SHA256 credentials** — HS256-equivalent signed tokens carrying
//!   a type tag, expiry, and the originating code
//! - **Atomic redemption** — single-use and limited-use codes consume
//!   exactly as many times as their policy allows, even under concurrent
//!   redeemers
//! - **Enumeration resistance** — every validation failure collapses to one
//!   generic `Unauthorized`; detailed reasons stay in the logs
//! - **Live revocation** — optional store re-check per protected call, so
//!   revoking a code cuts off its credentials before natural expiry
//! - **Pluggable store** — in-memory map or atomic-write file directory
//!   behind one `CodeStore` trait
//!
//! ## Quickstart
//!
//! ```no_run
//! use codewarden::{ActivationService, CreateCodeRequest, ServiceConfig};
//!
//! fn main() {
//!     let config = ServiceConfig::new(
//!         "0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796a5b4c3d2e1f0",
//!         "admin-secret",
//!     )
//!     .expect("valid configuration");
//!
//!     let service = ActivationService::new(config).expect("service construction");
//!
//!     let grant = service
//!         .create_code("admin-secret", CreateCodeRequest::default())
//!         .expect("code creation");
//!     println!("hand this to the user: {}", grant.code);
//!
//!     let credential = service.redeem(&grant.code).expect("redemption");
//!     println!("credential valid for {}s", credential.expires_in);
//! }
//! ```
//!
//! ## Threat Model
//!
//! Codewarden protects against:
//! - **Forged credentials** — tokens are HMAC-signed; any tampering with
//!   payload or tag fails verification
//! - **Code enumeration** — unknown, expired, revoked, and exhausted codes
//!   produce byte-identical rejections
//! - **Double redemption** — the store's consume operation is atomic, so a
//!   single-use code presented concurrently yields one credential
//!
//! Codewarden does **not** protect a signing secret that leaks: anyone
//! holding the secret can mint credentials. Rotating the secret (restart
//! with a new value) invalidates every outstanding credential — a
//! break-glass action, not a normal path.
//!
//! ## Configuration
//!
//! - `signing_secret` — 32-byte hex-encoded HMAC key, fixed at startup
//! - `admin_secret` — bearer secret gating create/list/revoke
//! - `credential_ttl` — credential lifetime (default 30 days)
//! - `live_revocation` — store re-check per protected call (default on)
//!
//! See [`ServiceConfig`] for full documentation.

#![deny(warnings)]
#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/codewarden/0.1.0")]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Code generation
pub mod codegen;

// Credential layer
pub mod token;

// Store layer
pub mod store;

// Orchestration
pub mod gate;
pub mod guard;

// Downstream collaborator
pub mod capability;

// Service facade (main public API)
pub mod service;

// Re-exports for public API
pub use capability::{Capability, HttpCapability};
pub use clock::{Clock, SystemClock};
pub use config::{ServiceConfig, SigningSecret};
pub use errors::{CodewardenError, Rejection};
pub use gate::CredentialGrant;
pub use service::{ActivationService, CodeGrant, CreateCodeRequest};
pub use store::file::FileStore;
pub use store::memory::MemoryStore;
pub use store::record::{ActivationCode, UsagePolicy};
pub use store::CodeStore;
pub use token::claims::{CredentialClaims, ACTIVATION_TYPE_TAG};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
