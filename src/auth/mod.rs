//! Credential hashing for rowdb
//!
//! Users live in the reserved `_users` resource; the record id is the
//! username and the `password` field stores a salted digest, never
//! plaintext.

mod crypto;

pub use crypto::{hash_password, verify_password};
