//! End-to-end activation flow example.
//!
//! This example walks the full lifecycle: mint a code as the admin, redeem
//! it as the end user, and call the protected capability with the resulting
//! credential.
//!
//! # Running
//!
//! ```bash
//! cargo run --example activation_flow
//! ```
//!
//! # Note
//!
//! In production the signing secret and admin secret come from your secret
//! store at process startup. Hard-coded here to demonstrate the pattern;
//! never commit real secrets.

use std::sync::Arc;

use codewarden::{
    ActivationService, Capability, CodewardenError, CreateCodeRequest, CredentialClaims,
    Rejection, ServiceConfig,
};
use serde_json::Value;

const SIGNING_SECRET_HEX: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
const ADMIN_SECRET: &str = "demo-admin-secret";

/// Stand-in for the real downstream service (e.g. a generative-AI call).
struct DemoCapability;

impl Capability for DemoCapability {
    fn call(&self, _claims: &CredentialClaims, payload: &Value) -> Result<Value, CodewardenError> {
        Ok(serde_json::json!({
            "answer": format!("demo response to {}", payload["prompt"]),
        }))
    }
}

fn main() {
    let config = match ServiceConfig::new(SIGNING_SECRET_HEX, ADMIN_SECRET) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let service = ActivationService::new(config)
        .expect("in-memory service construction cannot fail with valid config")
        .with_capability(Arc::new(DemoCapability));

    // Admin side: mint a single-use code (the default policy).
    let grant = service
        .create_code(ADMIN_SECRET, CreateCodeRequest::default())
        .expect("admin secret matches");
    println!("Issued activation code: {}", grant.code);

    // User side: redeem the code for a credential.
    let credential = service.redeem(&grant.code).expect("fresh code redeems");
    println!("Credential valid for {}s", credential.expires_in);

    // The credential gates the protected capability.
    let answer = service
        .protected_call(
            &credential.credential,
            serde_json::json!({"prompt": "hello"}),
        )
        .expect("valid credential passes the guard");
    println!("Protected call answered: {}", answer["answer"]);

    // Second redemption of a single-use code is refused, indistinguishably
    // from a code that never existed.
    match service.redeem(&grant.code) {
        Err(Rejection::Unauthorized) => println!("Second redemption refused, as designed"),
        other => {
            eprintln!("Unexpected outcome: {:?}", other);
            std::process::exit(1);
        }
    }
}
