//! Bauform Harness: checks layered on the kernel's signature trust boundary.
//!
//! Every checker here consumes a [`VerifiedPayload`] for the digests and
//! index it trusts, so nothing unverified can drive a hash comparison,
//! coverage decision or HTTP replay.
//!
//! - [`hash_check`]: artifact digests against `hashes.*`.
//! - [`coverage`]: signed suite index against the on-disk suite layout.
//! - [`links`], [`replay`]: recorded HTTP checks against a live deployment.
//! - [`suite`]: signing results and the suite index.
//! - [`runner`], [`report`]: orchestration into a structured report.
//!
//! The harness does NOT implement canonicalization or signatures; it
//! delegates to the kernel.
//!
//! [`VerifiedPayload`]: bauform_kernel::signature::verify::VerifiedPayload

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod coverage;
pub mod hash_check;
pub mod links;
pub mod replay;
pub mod report;
pub mod runner;
pub mod suite;
