//! Verification runner: orchestrates kernel and harness checks into a
//! [`VerifyReport`].
//!
//! The runner implements no proof logic itself. It calls `verify`, the hash
//! checkers, coverage and replay, and records one [`CheckLine`] per step.
//!
//! # Pipeline
//!
//! ```text
//! read bundle → verify signature → payload_sha256
//!   → [spec hash] → [code hash]                    (--verify-hashes)
//!   → load links.json → replay checks in order     (--http-checks)
//! ```
//!
//! Each stage is fail-fast: the first failed line ends the run. An absent
//! links manifest produces a `Skipped` line and the run succeeds.

use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;

use bauform_kernel::bundle::SignedBundle;
use bauform_kernel::signature::verify::verify;

use crate::coverage::check_coverage;
use crate::hash_check::{check_payload_hash, HashLabel};
use crate::links::{default_links_path, load_links, LinksLoad};
use crate::replay::{replay_observed, ReplayConfig};
use crate::report::{CheckLine, VerifyReport};
use crate::suite::verify_members;

/// Check name for the bundle signature.
pub const CHECK_SIGNATURE: &str = "signature";
/// Check name for the suite index signature.
pub const CHECK_SUITE_SIGNATURE: &str = "suite signature";
/// Check name for suite coverage.
pub const CHECK_SUITE_COVERAGE: &str = "suite coverage";
/// Check name for the HTTP replay stage as a whole.
pub const CHECK_HTTP: &str = "http checks";

/// What `run_verify` checks beyond the signature.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Run artifact hash checks for whichever of `spec`/`code` is given.
    pub verify_hashes: bool,
    pub spec: Option<PathBuf>,
    pub code: Option<PathBuf>,
    /// Replay the links manifest.
    pub http_checks: bool,
    /// Manifest path; defaults to `links.json` next to the bundle.
    pub links: Option<PathBuf>,
    pub replay: ReplayConfig,
}

/// Verify one bundle and its optional artifact and HTTP checks.
#[must_use]
pub fn run_verify(bundle_path: &Path, key: &VerifyingKey, options: &VerifyOptions) -> VerifyReport {
    let mut report = VerifyReport::default();

    let bundle = match SignedBundle::read_from(bundle_path) {
        Ok(bundle) => bundle,
        Err(e) => {
            report.push(CheckLine::failed(CHECK_SIGNATURE, e));
            return report;
        }
    };
    let payload = match verify(&bundle, key) {
        Ok(payload) => payload,
        Err(e) => {
            report.push(CheckLine::failed(CHECK_SIGNATURE, e));
            return report;
        }
    };
    report.push(CheckLine::passed(CHECK_SIGNATURE));
    report.payload_sha256 = Some(payload.payload_sha256());
    tracing::debug!(bundle = %bundle_path.display(), "signature verified");

    if options.verify_hashes {
        let artifacts = [
            (HashLabel::Spec, options.spec.as_deref()),
            (HashLabel::Code, options.code.as_deref()),
        ];
        for (label, path) in artifacts {
            let check = format!("{label} hash");
            let Some(path) = path else {
                let reason = format!("{label} hash: skipped (no {label} file given)");
                report.push(CheckLine::skipped(check, reason));
                continue;
            };
            if let Err(e) = check_payload_hash(&payload, label, path) {
                report.push(CheckLine::failed(check, e));
                return report;
            }
            report.push(CheckLine::passed(check));
        }
    }

    if options.http_checks {
        let links_path = options
            .links
            .clone()
            .unwrap_or_else(|| default_links_path(bundle_path));
        let links = match load_links(&links_path) {
            Ok(LinksLoad::Loaded(links)) => links,
            Ok(LinksLoad::Absent { path }) => {
                tracing::warn!(path = %path.display(), "no links manifest; skipping HTTP checks");
                report.push(CheckLine::skipped(
                    CHECK_HTTP,
                    "no links.json; skipping HTTP checks",
                ));
                return report;
            }
            Err(e) => {
                report.push(CheckLine::failed(CHECK_HTTP, e));
                return report;
            }
        };

        let mut passed = Vec::new();
        let result = replay_observed(&payload, &links, &options.replay, |outcome| {
            passed.push(CheckLine::passed_with(
                outcome.name.clone(),
                format!("{} bytes", outcome.bytes),
            ));
        });
        report.lines.extend(passed);
        if let Err(e) = result {
            report.push(CheckLine::failed(CHECK_HTTP, e));
        }
    }

    report
}

/// Validate a signed suite index: signature, coverage and optionally every
/// member bundle.
///
/// The suite directory is the directory containing `index_path`. Signature
/// and coverage are fail-fast; member verification is aggregate.
#[must_use]
pub fn validate_suite(index_path: &Path, key: &VerifyingKey, members: bool) -> VerifyReport {
    let mut report = VerifyReport::default();

    let index = match SignedBundle::read_from(index_path)
        .map_err(|e| e.to_string())
        .and_then(|bundle| verify(&bundle, key).map_err(|e| e.to_string()))
    {
        Ok(index) => index,
        Err(detail) => {
            report.push(CheckLine::failed(CHECK_SUITE_SIGNATURE, detail));
            return report;
        }
    };
    report.push(CheckLine::passed(CHECK_SUITE_SIGNATURE));
    report.payload_sha256 = Some(index.payload_sha256());

    let suite_dir = match index_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    if let Err(e) = check_coverage(&index, suite_dir) {
        report.push(CheckLine::failed(CHECK_SUITE_COVERAGE, e));
        return report;
    }
    report.push(CheckLine::passed(CHECK_SUITE_COVERAGE));

    if members {
        match verify_members(&index, suite_dir, key) {
            Ok(verdicts) => {
                for verdict in verdicts {
                    report.push(match verdict.outcome {
                        Ok(_) => CheckLine::passed(verdict.spec_id),
                        Err(detail) => CheckLine::failed(
                            verdict.spec_id.clone(),
                            format!("{}: {detail}", verdict.spec_id),
                        ),
                    });
                }
            }
            Err(e) => report.push(CheckLine::failed(CHECK_SUITE_COVERAGE, e)),
        }
    }

    tracing::info!(
        index = %index_path.display(),
        success = report.is_success(),
        "suite validation finished"
    );
    report
}
