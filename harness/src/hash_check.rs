//! Artifact hash checks: recompute a file digest and compare it to the value
//! a verified payload attests under `hashes`.

use std::path::Path;

use bauform_kernel::proof::hash::sha256_file;
use bauform_kernel::signature::verify::VerifiedPayload;

/// Which attested artifact a digest belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashLabel {
    /// The specification document (`hashes.spec_sha256`).
    Spec,
    /// The code artifact (`hashes.code_sha256`).
    Code,
}

impl HashLabel {
    /// Short name used in diagnostics (`"spec"`, `"code"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spec => "spec",
            Self::Code => "code",
        }
    }

    /// Key under `payload.hashes` holding the attested digest.
    #[must_use]
    pub const fn payload_field(self) -> &'static str {
        match self {
            Self::Spec => "spec_sha256",
            Self::Code => "code_sha256",
        }
    }
}

impl std::fmt::Display for HashLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifact hash check failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    /// The file's digest differs from the attested digest.
    #[error("{label} sha mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        label: HashLabel,
        expected: String,
        actual: String,
    },
    /// The file does not exist.
    #[error("{label} file not found: {path}")]
    MissingFile { label: HashLabel, path: String },
    /// The file exists but could not be read.
    #[error("cannot read {label} file {path}: {detail}")]
    Io {
        label: HashLabel,
        path: String,
        detail: String,
    },
    /// The payload carries no digest for this artifact.
    #[error("payload does not attest hashes.{}", .label.payload_field())]
    ExpectedDigestAbsent { label: HashLabel },
}

/// Stream `path` through SHA-256 and compare with `expected_hex`.
///
/// Returns the computed digest on success.
///
/// # Errors
///
/// [`HashError::MissingFile`] if `path` does not exist, [`HashError::Io`] on
/// other read failures, [`HashError::HashMismatch`] if the digests differ.
pub fn check_hash(label: HashLabel, path: &Path, expected_hex: &str) -> Result<String, HashError> {
    let actual = sha256_file(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HashError::MissingFile {
                label,
                path: path.display().to_string(),
            }
        } else {
            HashError::Io {
                label,
                path: path.display().to_string(),
                detail: e.to_string(),
            }
        }
    })?;

    tracing::debug!(%label, path = %path.display(), %actual, "computed artifact digest");

    if actual != expected_hex {
        return Err(HashError::HashMismatch {
            label,
            expected: expected_hex.to_string(),
            actual,
        });
    }
    Ok(actual)
}

/// Check `path` against the digest attested by a verified payload under
/// `hashes.<label>_sha256`.
///
/// # Errors
///
/// [`HashError::ExpectedDigestAbsent`] if the payload attests no digest for
/// `label`; otherwise as [`check_hash`].
pub fn check_payload_hash(
    payload: &VerifiedPayload,
    label: HashLabel,
    path: &Path,
) -> Result<String, HashError> {
    let expected = payload
        .attested_digest(label.payload_field())
        .ok_or(HashError::ExpectedDigestAbsent { label })?;
    check_hash(label, path, expected)
}
