//! Signed bundle: a payload plus its detached Ed25519 signature.
//!
//! ```text
//! {"payload": <any JSON value>, "sig": "ed25519:<128 lowercase hex chars>"}
//! ```
//!
//! The signature covers `canonical_json_bytes(payload)` only. The `sig` field,
//! the wrapper object, any extra top-level keys and the on-disk formatting of
//! the file never participate in signing or verification.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::proof::canon::storage_json_bytes;

/// Literal prefix of the `sig` field.
pub const SIG_PREFIX: &str = "ed25519:";

/// Conventional file name of a signed spec result.
pub const RESULT_BUNDLE_FILENAME: &str = "result.json.signed";

/// Conventional file name of a signed suite index.
pub const SUITE_INDEX_FILENAME: &str = "suite.index.json.signed";

/// A payload wrapped with its signature string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedBundle {
    /// Attested content. Arbitrary JSON.
    pub payload: serde_json::Value,
    /// `"ed25519:" + lowercase-hex(signature)`.
    pub sig: String,
}

/// Error loading a bundle file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BundleError {
    /// The file could not be read.
    #[error("cannot read bundle {path}: {detail}")]
    Io { path: String, detail: String },
    /// The bytes are not a JSON object with `payload` and string `sig`.
    #[error("bundle is not well-formed: {detail}")]
    Parse { detail: String },
}

impl SignedBundle {
    /// Parse a bundle from JSON bytes (any formatting).
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Parse`] if the bytes are not JSON, or `payload`
    /// or `sig` is missing, or `sig` is not a string.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BundleError> {
        serde_json::from_slice(bytes).map_err(|e| BundleError::Parse {
            detail: e.to_string(),
        })
    }

    /// Read and parse a bundle file.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Io`] if the file cannot be read, otherwise as
    /// [`SignedBundle::from_slice`].
    pub fn read_from(path: &Path) -> Result<Self, BundleError> {
        let bytes = std::fs::read(path).map_err(|e| BundleError::Io {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        Self::from_slice(&bytes)
    }

    /// On-disk bytes: sorted keys, two-space indent, `": "` separators.
    #[must_use]
    pub fn to_storage_bytes(&self) -> Vec<u8> {
        storage_json_bytes(&serde_json::json!({
            "payload": self.payload,
            "sig": self.sig,
        }))
    }
}
