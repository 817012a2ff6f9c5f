//! Suite signing and member verification.
//!
//! Signing turns every `<suite_dir>/<name>/result.json` into a sibling
//! `result.json.signed` in storage form. The suite index is an ordinary
//! signed bundle whose payload lists each `<spec_id>_v1` directory that
//! holds a signed result.
//!
//! Writes go through a temp file in the target directory followed by a
//! rename, so a reader never observes a half-written bundle.

use std::path::{Path, PathBuf};

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde_json::{json, Value};

use bauform_kernel::bundle::{SignedBundle, RESULT_BUNDLE_FILENAME, SUITE_INDEX_FILENAME};
use bauform_kernel::signature::sign::sign;
use bauform_kernel::signature::verify::{verify, VerifiedPayload};

use crate::coverage::{index_entries, spec_dirs, SPEC_DIR_SUFFIX};

/// Unsigned result file name inside each spec directory.
pub const RESULT_FILENAME: &str = "result.json";

/// Error signing a suite.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuiteError {
    #[error("cannot access {path}: {detail}")]
    Io { path: String, detail: String },
    /// A `result.json` is not valid JSON.
    #[error("{path} is not valid JSON: {detail}")]
    Parse { path: String, detail: String },
    /// Listing spec directories for the index failed.
    #[error("cannot build suite index: {detail}")]
    Index { detail: String },
}

fn io_error(path: &Path, e: &std::io::Error) -> SuiteError {
    SuiteError::Io {
        path: path.display().to_string(),
        detail: e.to_string(),
    }
}

/// `<suite_dir>/*/result.json`, sorted by path.
///
/// # Errors
///
/// [`SuiteError::Io`] if `suite_dir` cannot be listed.
pub fn discover_results(suite_dir: &Path) -> Result<Vec<PathBuf>, SuiteError> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(suite_dir).map_err(|e| io_error(suite_dir, &e))? {
        let entry = entry.map_err(|e| io_error(suite_dir, &e))?;
        let candidate = entry.path().join(RESULT_FILENAME);
        if candidate.is_file() {
            found.push(candidate);
        }
    }
    found.sort();
    Ok(found)
}

/// Sign one `result.json`, writing `result.json.signed` next to it.
///
/// Returns the path of the written bundle.
///
/// # Errors
///
/// [`SuiteError::Io`] on read/write failure, [`SuiteError::Parse`] if the
/// file is not JSON.
pub fn sign_result_file(result_path: &Path, key: &SigningKey) -> Result<PathBuf, SuiteError> {
    let bytes = std::fs::read(result_path).map_err(|e| io_error(result_path, &e))?;
    let payload: Value = serde_json::from_slice(&bytes).map_err(|e| SuiteError::Parse {
        path: result_path.display().to_string(),
        detail: e.to_string(),
    })?;
    let signed_path = result_path.with_file_name(RESULT_BUNDLE_FILENAME);
    write_atomic(&signed_path, &sign(payload, key).to_storage_bytes())?;
    tracing::debug!(path = %signed_path.display(), "signed result");
    Ok(signed_path)
}

/// Sign every result in `suite_dir`. An empty suite yields an empty list.
///
/// # Errors
///
/// The first [`SuiteError`]; results already signed stay on disk.
pub fn sign_suite(suite_dir: &Path, key: &SigningKey) -> Result<Vec<PathBuf>, SuiteError> {
    let results = discover_results(suite_dir)?;
    if results.is_empty() {
        tracing::warn!(suite_dir = %suite_dir.display(), "no result.json files found to sign");
    }
    let signed = results
        .iter()
        .map(|path| sign_result_file(path, key))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(count = signed.len(), "suite signed");
    Ok(signed)
}

/// Index payload for the `<spec_id>_v1` directories of `suite_dir` that hold
/// a `result.json.signed`, in sorted spec id order.
///
/// # Errors
///
/// [`SuiteError::Index`] if the suite directory cannot be listed.
pub fn build_suite_index(suite_dir: &Path) -> Result<Value, SuiteError> {
    let ids = spec_dirs(suite_dir).map_err(|e| SuiteError::Index {
        detail: e.to_string(),
    })?;
    let specs: Vec<Value> = ids
        .into_iter()
        .filter_map(|spec_id| {
            let rel = format!("{spec_id}{SPEC_DIR_SUFFIX}/{RESULT_BUNDLE_FILENAME}");
            suite_dir
                .join(&rel)
                .is_file()
                .then(|| json!({"spec_id": spec_id, "path": rel}))
        })
        .collect();
    Ok(json!({ "specs": specs }))
}

/// Sign the suite index and write it as `suite.index.json.signed`.
///
/// # Errors
///
/// As [`build_suite_index`], plus [`SuiteError::Io`] on write failure.
pub fn write_suite_index(suite_dir: &Path, key: &SigningKey) -> Result<PathBuf, SuiteError> {
    let index = build_suite_index(suite_dir)?;
    let path = suite_dir.join(SUITE_INDEX_FILENAME);
    write_atomic(&path, &sign(index, key).to_storage_bytes())?;
    tracing::info!(path = %path.display(), "suite index written");
    Ok(path)
}

/// Verdict for one suite member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberVerdict {
    pub spec_id: String,
    pub path: PathBuf,
    /// `Ok(payload_sha256)` or the failure diagnostic.
    pub outcome: Result<String, String>,
}

/// Verify every member bundle listed by a verified index with `key`.
///
/// Every member is attempted; failures are collected, not propagated.
///
/// # Errors
///
/// Returns the coverage error if the index itself is malformed.
pub fn verify_members(
    index: &VerifiedPayload,
    suite_dir: &Path,
    key: &VerifyingKey,
) -> Result<Vec<MemberVerdict>, crate::coverage::CoverageError> {
    let verdicts = index_entries(index)?
        .into_iter()
        .map(|entry| {
            let path = suite_dir.join(&entry.path);
            let outcome = SignedBundle::read_from(&path)
                .map_err(|e| e.to_string())
                .and_then(|bundle| verify(&bundle, key).map_err(|e| e.to_string()))
                .map(|payload| payload.payload_sha256());
            if let Err(detail) = &outcome {
                tracing::debug!(spec_id = %entry.spec_id, %detail, "member failed verification");
            }
            MemberVerdict {
                spec_id: entry.spec_id,
                path,
                outcome,
            }
        })
        .collect();
    Ok(verdicts)
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<(), SuiteError> {
    let dir = path.parent().ok_or_else(|| SuiteError::Io {
        path: path.display().to_string(),
        detail: "no parent directory".into(),
    })?;
    let temp_path = dir.join(format!(
        ".tmp_{}",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));
    std::fs::write(&temp_path, content).map_err(|e| io_error(&temp_path, &e))?;
    std::fs::rename(&temp_path, path).map_err(|e| io_error(path, &e))
}
