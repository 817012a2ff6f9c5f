//! HTTP replay: re-issue recorded requests against the live deployment and
//! compare status and response-body digest with the recorded expectations.
//!
//! # Ordering
//!
//! Checks run sequentially, in manifest order. Later checks may depend on
//! side effects of earlier ones on the live service, so the order is part of
//! what is being verified. The first failing check aborts the sequence.
//!
//! # Request reconstruction
//!
//! - URL: `live` with trailing `/` trimmed plus `/`, joined with `path` with
//!   leading `/` trimmed. The result must stay under the base URL (same
//!   origin, same path prefix).
//! - Method upper-cased; header names lower-cased.
//! - Body: canonical bytes of `json` (with `content-type: application/json`
//!   unless a content type is given), or base64-decoded `body_b64`, or empty.
//! - Redirects are not followed; a 3xx status is compared like any other.
//! - Besides the manifest headers the client sends `host`, `content-length`
//!   and `user-agent`, plus `accept: */*` when the manifest declares no
//!   `Accept`. A declared header replaces the client's value. Services that
//!   vary their response on `Accept` must declare it in the manifest.
//!
//! No retries. Every request has a finite timeout and every response body is
//! buffered up to a fixed bound.

use std::io::Read;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

use bauform_kernel::proof::canon::canonical_json_bytes;
use bauform_kernel::proof::hash::sha256_hex;
use bauform_kernel::signature::verify::VerifiedPayload;

use crate::links::{Check, LoadedLinks};

/// Payload field binding a links manifest to a signed payload.
pub const LINKS_DIGEST_FIELD: &str = "links_sha256";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default response body bound (16 MiB).
pub const DEFAULT_MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// Replay tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Timeout covering connect, request and full body receipt.
    pub timeout: Duration,
    /// Largest response body that will be buffered and hashed.
    pub max_body_bytes: u64,
    /// `user-agent` sent unless a check sets its own.
    pub user_agent: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            user_agent: concat!("bauform-replay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A passing check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: String,
    /// Response body length in bytes.
    pub bytes: usize,
}

/// Replay failure. Every variant names the failing check where one exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// The manifest bytes do not match the digest the payload attests.
    #[error("links manifest sha mismatch: expected {expected}, got {actual}")]
    LinksDigestMismatch { expected: String, actual: String },
    /// `live` is not a usable http(s) base URL.
    #[error("invalid live base URL {live:?}: {detail}")]
    InvalidBaseUrl { live: String, detail: String },
    /// `path` does not resolve under the base URL.
    #[error("{name}: path {path:?} does not resolve under the live base URL")]
    InvalidCheckPath { name: String, path: String },
    /// The check cannot be turned into a request.
    #[error("{name}: invalid check: {detail}")]
    InvalidCheck { name: String, detail: String },
    /// Connection, TLS, timeout or body read failure.
    #[error("{name}: transport error: {detail}")]
    TransportError { name: String, detail: String },
    #[error("{name}: status {got} != {want}")]
    StatusMismatch { name: String, got: u16, want: u16 },
    /// The body exceeded [`ReplayConfig::max_body_bytes`].
    #[error("{name}: response body exceeds {limit} bytes")]
    BodyTooLarge { name: String, limit: u64 },
    #[error("{name}: resp sha mismatch {got} != {want}")]
    BodyHashMismatch {
        name: String,
        got: String,
        want: String,
    },
}

/// Request body reconstructed from a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// Canonical bytes of the check's `json` value.
    Json(Vec<u8>),
    /// Decoded `body_b64`.
    Raw(Vec<u8>),
}

impl RequestBody {
    /// Build the body for `check`.
    ///
    /// # Errors
    ///
    /// [`ReplayError::InvalidCheck`] if both `json` and `body_b64` are
    /// present or `body_b64` is not valid base64.
    pub fn for_check(check: &Check) -> Result<Self, ReplayError> {
        match (&check.json, &check.body_b64) {
            (Some(_), Some(_)) => Err(ReplayError::InvalidCheck {
                name: check.name.clone(),
                detail: "both \"json\" and \"body_b64\" are present".into(),
            }),
            (Some(value), None) => Ok(Self::Json(canonical_json_bytes(value))),
            (None, Some(b64)) => BASE64
                .decode(b64)
                .map(Self::Raw)
                .map_err(|e| ReplayError::InvalidCheck {
                    name: check.name.clone(),
                    detail: format!("body_b64: {e}"),
                }),
            (None, None) => Ok(Self::Empty),
        }
    }
}

/// Parse `live` into a base URL ending in `/`. A bare host defaults to https.
///
/// # Errors
///
/// [`ReplayError::InvalidBaseUrl`] if the URL does not parse, is not http(s)
/// or cannot serve as a base.
pub fn base_url(live: &str) -> Result<Url, ReplayError> {
    let invalid = |detail: String| ReplayError::InvalidBaseUrl {
        live: live.to_string(),
        detail,
    };
    let trimmed = live.trim().trim_end_matches('/');
    let with_scheme = if trimmed.contains("://") {
        format!("{trimmed}/")
    } else {
        format!("https://{trimmed}/")
    };
    let url = Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(invalid("URL has no host".into()));
    }
    Ok(url)
}

/// Join a check path onto the base URL, refusing anything that leaves it.
///
/// # Errors
///
/// [`ReplayError::InvalidCheckPath`] if the joined URL changes origin or
/// escapes the base path prefix.
pub fn check_url(base: &Url, check: &Check) -> Result<Url, ReplayError> {
    let escape = || ReplayError::InvalidCheckPath {
        name: check.name.clone(),
        path: check.path.clone(),
    };
    let joined = base
        .join(check.path.trim_start_matches('/'))
        .map_err(|_| escape())?;
    if joined.origin() != base.origin() || !joined.path().starts_with(base.path()) {
        return Err(escape());
    }
    Ok(joined)
}

/// Blocking HTTP client configured for replay.
pub struct Replayer {
    client: Client,
    config: ReplayConfig,
}

impl Replayer {
    /// Build a client with the configured timeout, no redirects and no
    /// response decompression.
    ///
    /// # Errors
    ///
    /// [`ReplayError::TransportError`] if the TLS backend cannot initialise.
    pub fn new(config: ReplayConfig) -> Result<Self, ReplayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ReplayError::TransportError {
                name: "client".into(),
                detail: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    /// Replay one check against `base`.
    ///
    /// # Errors
    ///
    /// Any [`ReplayError`] naming this check.
    pub fn run_check(&self, base: &Url, check: &Check) -> Result<CheckOutcome, ReplayError> {
        let url = check_url(base, check)?;
        let method = Method::from_bytes(check.method.to_uppercase().as_bytes()).map_err(|e| {
            ReplayError::InvalidCheck {
                name: check.name.clone(),
                detail: format!("method {:?}: {e}", check.method),
            }
        })?;
        let mut headers = request_headers(check)?;
        let body = match RequestBody::for_check(check)? {
            RequestBody::Empty => Vec::new(),
            RequestBody::Json(bytes) => {
                headers
                    .entry(CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static("application/json"));
                bytes
            }
            RequestBody::Raw(bytes) => bytes,
        };

        tracing::debug!(name = %check.name, %method, %url, body_len = body.len(), "replaying check");

        let transport = |e: &dyn std::fmt::Display| ReplayError::TransportError {
            name: check.name.clone(),
            detail: e.to_string(),
        };

        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .map_err(|e| transport(&e))?;

        let got = response.status().as_u16();
        if got != check.expect_status {
            return Err(ReplayError::StatusMismatch {
                name: check.name.clone(),
                got,
                want: check.expect_status,
            });
        }

        let limit = self.config.max_body_bytes;
        let mut data = Vec::new();
        response
            .take(limit.saturating_add(1))
            .read_to_end(&mut data)
            .map_err(|e| transport(&e))?;
        if u64::try_from(data.len()).unwrap_or(u64::MAX) > limit {
            return Err(ReplayError::BodyTooLarge {
                name: check.name.clone(),
                limit,
            });
        }

        let digest = sha256_hex(&data);
        if digest != check.resp_sha256 {
            return Err(ReplayError::BodyHashMismatch {
                name: check.name.clone(),
                got: digest,
                want: check.resp_sha256.clone(),
            });
        }

        tracing::debug!(name = %check.name, bytes = data.len(), "check passed");
        Ok(CheckOutcome {
            name: check.name.clone(),
            bytes: data.len(),
        })
    }
}

fn request_headers(check: &Check) -> Result<HeaderMap, ReplayError> {
    let invalid = |detail: String| ReplayError::InvalidCheck {
        name: check.name.clone(),
        detail,
    };
    let mut headers = HeaderMap::new();
    for (key, value) in &check.headers {
        let name = HeaderName::from_bytes(key.to_lowercase().as_bytes())
            .map_err(|e| invalid(format!("header name {key:?}: {e}")))?;
        let value =
            HeaderValue::from_str(value).map_err(|e| invalid(format!("header {key:?}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Replay every check of `links` in declared order, anchored to a verified
/// payload.
///
/// If the payload attests `hashes.links_sha256`, the manifest bytes must
/// match it before any request is sent.
///
/// # Errors
///
/// The first [`ReplayError`]; remaining checks are not attempted.
pub fn replay(
    anchor: &VerifiedPayload,
    links: &LoadedLinks,
    config: &ReplayConfig,
) -> Result<Vec<CheckOutcome>, ReplayError> {
    replay_observed(anchor, links, config, |_| {})
}

/// As [`replay`], calling `on_pass` after each passing check so callers can
/// report progress that precedes a failure.
///
/// # Errors
///
/// As [`replay`].
pub fn replay_observed(
    anchor: &VerifiedPayload,
    links: &LoadedLinks,
    config: &ReplayConfig,
    mut on_pass: impl FnMut(&CheckOutcome),
) -> Result<Vec<CheckOutcome>, ReplayError> {
    if let Some(expected) = anchor.attested_digest(LINKS_DIGEST_FIELD) {
        if expected != links.sha256 {
            return Err(ReplayError::LinksDigestMismatch {
                expected: expected.to_string(),
                actual: links.sha256.clone(),
            });
        }
    }

    let base = base_url(&links.manifest.live)?;
    let replayer = Replayer::new(config.clone())?;
    let mut outcomes = Vec::with_capacity(links.manifest.checks.len());
    for check in &links.manifest.checks {
        let outcome = replayer.run_check(&base, check)?;
        on_pass(&outcome);
        outcomes.push(outcome);
    }

    tracing::info!(checks = outcomes.len(), live = %base, "http replay complete");
    Ok(outcomes)
}
