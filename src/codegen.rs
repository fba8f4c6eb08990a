//! Short-code generation.
//!
//! Codes are bearer secrets distributed out-of-band, so randomness comes
//! from the operating system CSPRNG, never a seeded PRNG. The alphabet
//! drops visually confusable characters (`0/O`, `1/I`).

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::Rng;

use crate::errors::CodewardenError;
use crate::store::record::{ActivationCode, UsagePolicy};
use crate::store::CodeStore;

/// Unambiguous code alphabet: uppercase letters and digits minus `0 O 1 I`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Collision retries before giving up.
///
/// At the default length the code space is 32^6 ≈ 10^9; hitting this limit
/// means the store is saturated far beyond its design envelope.
pub const MAX_GENERATION_ATTEMPTS: u32 = 16;

/// Generate one candidate code of `length` characters.
pub fn generate(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Generate a code and insert it into the store, regenerating on collision.
///
/// Collision probability is non-zero and handled: the candidate is claimed
/// via `CodeStore::create`, whose `CodeExists` failure triggers a fresh
/// candidate. Bounded by [`MAX_GENERATION_ATTEMPTS`].
pub fn create_unique(
    store: &dyn CodeStore,
    length: usize,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    policy: UsagePolicy,
) -> Result<ActivationCode, CodewardenError> {
    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let record = ActivationCode::new(generate(length), created_at, expires_at, policy);
        match store.create(record.clone()) {
            Ok(()) => return Ok(record),
            Err(CodewardenError::CodeExists) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(CodewardenError::CodeSpaceExhausted {
        attempts: MAX_GENERATION_ATTEMPTS,
    })
}
