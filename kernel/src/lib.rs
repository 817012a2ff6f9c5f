//! Bauform Kernel: canonical bytes, signatures and the trust boundary.
//!
//! # API Surface
//!
//! - [`proof::canon::canonical_json_bytes`] -- the single canonical encoding of a JSON value
//! - [`signature::sign::sign`] -- wrap a payload into a [`bundle::SignedBundle`]
//! - [`signature::verify::verify`] -- check a bundle and yield a
//!   [`signature::verify::VerifiedPayload`]
//!
//! # Module Dependency Direction
//!
//! `proof` ← `bundle` ← `signature`
//!
//! One-way only. No cycles. `proof` depends on nothing internal.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bundle;
pub mod proof;
pub mod signature;
