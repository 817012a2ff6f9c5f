//! `links.json`: recorded HTTP checks against a live deployment.
//!
//! ```text
//! {
//!   "live": "https://service.example/",
//!   "checks": [
//!     {"name": "...", "method": "POST", "path": "/api/x",
//!      "headers": {"X-Key": "v"}, "json": {...} | "body_b64": "...",
//!      "expect_status": 200, "resp_sha256": "<hex>"}
//!   ]
//! }
//! ```
//!
//! The manifest is optional. A missing file is an explicit
//! [`LinksLoad::Absent`] outcome, which callers report as "skipped", never
//! as a pass or a failure.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use bauform_kernel::proof::hash::sha256_hex;

/// Conventional file name, looked up next to the bundle being verified.
pub const LINKS_FILENAME: &str = "links.json";

/// Parsed links manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinksManifest {
    /// Base URL of the live deployment.
    pub live: String,
    /// Checks, in the order they must be replayed.
    #[serde(default)]
    pub checks: Vec<Check>,
}

/// One recorded request and the response it must reproduce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body, sent as canonical bytes. `Some(Null)` is an explicit
    /// `"json": null`, distinct from an absent key.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub json: Option<serde_json::Value>,
    /// Raw body, standard base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_b64: Option<String>,
    pub expect_status: u16,
    pub resp_sha256: String,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// A parsed manifest together with the digest of the exact bytes it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedLinks {
    pub manifest: LinksManifest,
    /// SHA-256 of the raw file bytes, for `hashes.links_sha256` binding.
    pub sha256: String,
}

impl LoadedLinks {
    /// Parse manifest bytes.
    ///
    /// # Errors
    ///
    /// Returns [`LinksError::Parse`] if the bytes are not a valid manifest.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LinksError> {
        let manifest = serde_json::from_slice(bytes).map_err(|e| LinksError::Parse {
            detail: e.to_string(),
        })?;
        Ok(Self {
            manifest,
            sha256: sha256_hex(bytes),
        })
    }
}

/// Outcome of looking for a links manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum LinksLoad {
    /// No manifest at `path`; HTTP checks are skipped.
    Absent { path: PathBuf },
    /// Manifest found and parsed.
    Loaded(LoadedLinks),
}

/// Error loading a links manifest that exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinksError {
    #[error("cannot read links manifest {path}: {detail}")]
    Io { path: String, detail: String },
    #[error("links manifest is not well-formed: {detail}")]
    Parse { detail: String },
}

/// `links.json` in the bundle's directory.
#[must_use]
pub fn default_links_path(bundle_path: &Path) -> PathBuf {
    bundle_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(LINKS_FILENAME)
}

/// Load the manifest at `path`, reporting absence as [`LinksLoad::Absent`].
///
/// # Errors
///
/// Returns [`LinksError`] if the file exists but cannot be read or parsed.
pub fn load_links(path: &Path) -> Result<LinksLoad, LinksError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(LinksLoad::Absent {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(LinksError::Io {
                path: path.display().to_string(),
                detail: e.to_string(),
            });
        }
    };
    LoadedLinks::from_slice(&bytes).map(LinksLoad::Loaded)
}
