//! Suite coverage: the signed index must describe exactly the spec bundles
//! present on disk.
//!
//! # Suite layout
//!
//! ```text
//! <suite_dir>/
//!   suite.index.json.signed      bundle, payload {"specs": [{spec_id, path}, ...]}
//!   <spec_id>_v1/
//!     result.json
//!     result.json.signed
//! ```
//!
//! Coverage holds iff the `spec_id` set of the index equals the set of
//! `*_v1` subdirectory names with the suffix stripped, the index has no
//! duplicate ids, and every declared `path` resolves to a regular file under
//! `suite_dir`. An index can be validly signed and still fail coverage when
//! the disk layout has drifted.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use bauform_kernel::signature::verify::VerifiedPayload;

/// Suffix marking a spec directory.
pub const SPEC_DIR_SUFFIX: &str = "_v1";

/// One `{spec_id, path}` member of a suite index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Spec identifier; matches a `<spec_id>_v1` directory.
    pub spec_id: String,
    /// Bundle path relative to the suite directory.
    pub path: String,
}

/// A passing coverage check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageSummary {
    /// Covered spec ids, sorted.
    pub spec_ids: Vec<String>,
}

/// Coverage check failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoverageError {
    /// The payload has no `specs` array, or an entry lacks string fields.
    #[error("suite index malformed: {detail}")]
    IndexMalformed { detail: String },
    /// The index lists the same spec id more than once.
    #[error("suite index lists spec_id {spec_id:?} more than once")]
    DuplicateSpecId { spec_id: String },
    /// The index spec set and the on-disk spec directory set differ.
    #[error("coverage mismatch: index={index:?} dirs={dirs:?}{}", set_difference(.index, .dirs))]
    CoverageMismatch { index: Vec<String>, dirs: Vec<String> },
    /// A declared bundle path does not resolve to a file.
    #[error("missing bundle {path}")]
    MissingBundle { path: String },
    /// A declared bundle path is absolute or climbs out of the suite directory.
    #[error("bundle path {path:?} escapes the suite directory")]
    UnsafeBundlePath { path: String },
    /// The suite directory could not be listed.
    #[error("cannot list suite directory {path}: {detail}")]
    Io { path: String, detail: String },
}

fn set_difference(index: &[String], dirs: &[String]) -> String {
    let index: BTreeSet<&String> = index.iter().collect();
    let dirs: BTreeSet<&String> = dirs.iter().collect();
    let missing: Vec<&&String> = index.difference(&dirs).collect();
    let extra: Vec<&&String> = dirs.difference(&index).collect();
    format!(" (no directory for {missing:?}; not in index {extra:?})")
}

/// Extract the `specs` entries of a verified suite index, in declared order.
///
/// # Errors
///
/// Returns [`CoverageError::IndexMalformed`] if `specs` is missing or not an
/// array, or an entry lacks a string `spec_id` or `path`.
pub fn index_entries(index: &VerifiedPayload) -> Result<Vec<IndexEntry>, CoverageError> {
    let specs = index
        .value()
        .get("specs")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoverageError::IndexMalformed {
            detail: "\"specs\" is missing or not an array".into(),
        })?;

    specs
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let field = |name: &str| {
                entry
                    .get(name)
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| CoverageError::IndexMalformed {
                        detail: format!("specs[{i}] has no string \"{name}\""),
                    })
            };
            Ok(IndexEntry {
                spec_id: field("spec_id")?,
                path: field("path")?,
            })
        })
        .collect()
}

/// Spec ids derived from `<spec_id>_v1` subdirectories of `suite_dir`, sorted.
///
/// # Errors
///
/// Returns [`CoverageError::Io`] if the directory cannot be listed.
pub fn spec_dirs(suite_dir: &Path) -> Result<Vec<String>, CoverageError> {
    let io_err = |e: std::io::Error| CoverageError::Io {
        path: suite_dir.display().to_string(),
        detail: e.to_string(),
    };

    let mut ids = Vec::new();
    for entry in std::fs::read_dir(suite_dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(spec_id) = name.strip_suffix(SPEC_DIR_SUFFIX) {
            ids.push(spec_id.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

/// Check that a verified suite index covers exactly the spec directories of
/// `suite_dir` and that every declared bundle exists.
///
/// Fail-fast, in this order: index structure, duplicate ids, set equality,
/// then each entry's path in declared order.
///
/// # Errors
///
/// Returns the first [`CoverageError`] encountered.
pub fn check_coverage(
    index: &VerifiedPayload,
    suite_dir: &Path,
) -> Result<CoverageSummary, CoverageError> {
    let entries = index_entries(index)?;

    let mut seen = BTreeSet::new();
    for entry in &entries {
        if !seen.insert(entry.spec_id.as_str()) {
            return Err(CoverageError::DuplicateSpecId {
                spec_id: entry.spec_id.clone(),
            });
        }
    }

    let mut index_ids: Vec<String> = entries.iter().map(|e| e.spec_id.clone()).collect();
    index_ids.sort();
    let dir_ids = spec_dirs(suite_dir)?;
    if index_ids != dir_ids {
        return Err(CoverageError::CoverageMismatch {
            index: index_ids,
            dirs: dir_ids,
        });
    }

    for entry in &entries {
        if !is_contained(&entry.path) {
            return Err(CoverageError::UnsafeBundlePath {
                path: entry.path.clone(),
            });
        }
        let resolved = suite_dir.join(&entry.path);
        if !resolved.is_file() {
            return Err(CoverageError::MissingBundle {
                path: resolved.display().to_string(),
            });
        }
    }

    tracing::debug!(specs = index_ids.len(), suite_dir = %suite_dir.display(), "suite coverage holds");
    Ok(CoverageSummary { spec_ids: index_ids })
}

/// Relative, with no `..`, root or prefix components.
fn is_contained(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
