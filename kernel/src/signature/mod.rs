//! Ed25519 signing and verification over canonical payload bytes.
//!
//! Depends on `proof` (canonical bytes, digests) and `bundle`.

pub mod keys;
pub mod sign;
pub mod verify;
