//! Proof module: canonical bytes and content digests.
//!
//! Depends on nothing internal. `signature` depends on `proof`.

pub mod canon;
pub mod hash;
