//! Password digest computation
//!
//! Stored form is `base32(SHA-256(salt || password))` with the RFC 4648
//! standard alphabet and padding. Comparison is constant-time.

use data_encoding::BASE32;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Computes the stored digest for a password and its per-user salt.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    BASE32.encode(&hasher.finalize())
}

/// Verifies a password attempt against the stored digest in constant time.
pub fn verify_password(attempt: &str, salt: &str, stored: &str) -> bool {
    let computed = hash_password(attempt, salt);
    computed.as_bytes().ct_eq(stored.as_bytes()).into()
}
