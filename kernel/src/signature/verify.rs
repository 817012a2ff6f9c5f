//! `verify()`: the trust boundary.
//!
//! A [`VerifiedPayload`] can only be obtained from a successful [`verify`]
//! call. Every downstream checker (artifact hashes, suite coverage, HTTP
//! replay) takes a `&VerifiedPayload`, so none of them can be run on parsed
//! but unverified JSON.

use ed25519_dalek::{Signature, VerifyingKey, SIGNATURE_LENGTH};

use crate::bundle::{SignedBundle, SIG_PREFIX};
use crate::proof::canon::canonical_json_bytes;
use crate::proof::hash::sha256_hex;

/// Verification failure.
///
/// Wrong key, tampered payload and tampered signature all surface as
/// [`VerifyError::SignatureInvalid`]; the caller cannot tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// `sig` is not `"ed25519:"` followed by 128 lowercase hex characters.
    #[error("malformed signature: {detail}")]
    MalformedSignature { detail: String },
    /// The signature does not verify over the payload's canonical bytes.
    #[error("signature invalid: payload was not signed by this key or has been altered")]
    SignatureInvalid,
}

/// A payload whose signature has been checked.
#[derive(Debug, Clone)]
pub struct VerifiedPayload {
    value: serde_json::Value,
    canonical: Vec<u8>,
}

impl VerifiedPayload {
    /// The trusted payload value.
    #[must_use]
    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    /// The exact bytes the signature covers.
    #[must_use]
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical
    }

    /// SHA-256 of the canonical bytes.
    #[must_use]
    pub fn payload_sha256(&self) -> String {
        sha256_hex(&self.canonical)
    }

    /// String at `payload.hashes.<field>`, if the payload attests one.
    #[must_use]
    pub fn attested_digest(&self, field: &str) -> Option<&str> {
        self.value.get("hashes")?.get(field)?.as_str()
    }

    /// Consume into the trusted value.
    #[must_use]
    pub fn into_value(self) -> serde_json::Value {
        self.value
    }
}

/// Parse the `sig` field into signature bytes.
///
/// Only lowercase hex is accepted, so every distinct `sig` string maps to
/// distinct bytes and no edit to the hex can verify.
///
/// # Errors
///
/// Returns [`VerifyError::MalformedSignature`] on a missing prefix, non-hex or
/// uppercase characters, or wrong length.
pub fn parse_sig(sig: &str) -> Result<Signature, VerifyError> {
    let hex_part = sig
        .strip_prefix(SIG_PREFIX)
        .ok_or_else(|| VerifyError::MalformedSignature {
            detail: format!("missing \"{SIG_PREFIX}\" prefix"),
        })?;

    if let Some(bad) = hex_part
        .chars()
        .find(|c| !matches!(c, '0'..='9' | 'a'..='f'))
    {
        return Err(VerifyError::MalformedSignature {
            detail: format!("non-lowercase-hex character {bad:?}"),
        });
    }

    let raw = hex::decode(hex_part).map_err(|e| VerifyError::MalformedSignature {
        detail: e.to_string(),
    })?;
    let got = raw.len();
    let bytes = <[u8; SIGNATURE_LENGTH]>::try_from(raw).map_err(|_| {
        VerifyError::MalformedSignature {
            detail: format!("expected {SIGNATURE_LENGTH} signature bytes, got {got}"),
        }
    })?;
    Ok(Signature::from_bytes(&bytes))
}

/// Verify a bundle's signature against `key`.
///
/// Recomputes `canonical_json_bytes(bundle.payload)` and checks the
/// signature with strict Ed25519 verification. No other bundle field
/// participates.
///
/// # Errors
///
/// Returns [`VerifyError::MalformedSignature`] if `sig` cannot be parsed, or
/// [`VerifyError::SignatureInvalid`] if it does not verify.
pub fn verify(bundle: &SignedBundle, key: &VerifyingKey) -> Result<VerifiedPayload, VerifyError> {
    let signature = parse_sig(&bundle.sig)?;
    let canonical = canonical_json_bytes(&bundle.payload);
    key.verify_strict(&canonical, &signature)
        .map_err(|_| VerifyError::SignatureInvalid)?;
    Ok(VerifiedPayload {
        value: bundle.payload.clone(),
        canonical,
    })
}
