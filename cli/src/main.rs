//! `bauform`: sign and verify Bauform result bundles.
//!
//! Usage:
//!   bauform sign --privkey <file> <suite_dir> [--index]
//!   bauform verify <bundle> --pubkey <file|hex> [--verify-hashes --spec <f> --code <f>]
//!                  [--http-checks [--links <f>] [--timeout-secs N] [--max-body-bytes N]]
//!   bauform validate-suite <suite.index.json.signed> --pubkey <file|hex> [--verify-members]
//!
//! stdout carries only the check lines; diagnostics go to stderr under
//! `BAUFORM_LOG` (default `warn`). Exit status: 0 success, 1 a check failed,
//! 2 usage error.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ed25519_dalek::VerifyingKey;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use bauform_harness::replay::{ReplayConfig, DEFAULT_MAX_BODY_BYTES};
use bauform_harness::report::{CheckStatus, VerifyReport};
use bauform_harness::runner::{run_verify, validate_suite, VerifyOptions, CHECK_SIGNATURE};
use bauform_harness::suite::{sign_suite, write_suite_index};
use bauform_kernel::signature::keys::{
    load_signing_key, load_verifying_key, parse_verifying_key_hex, KEY_BYTES,
};

#[derive(Parser)]
#[command(name = "bauform", version, about = "Sign and verify Bauform result bundles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign every <suite_dir>/*/result.json into result.json.signed
    Sign {
        /// Suite directory
        suite_dir: PathBuf,
        /// Ed25519 private key file (32 bytes hex)
        #[arg(long, env = "BAUFORM_PRIVKEY")]
        privkey: PathBuf,
        /// Also write suite.index.json.signed
        #[arg(long)]
        index: bool,
    },
    /// Verify a signed bundle and optional hashes and HTTP checks
    Verify {
        /// Signed bundle file
        bundle: PathBuf,
        /// Ed25519 public key: a file containing hex, or the hex itself
        #[arg(long, env = "BAUFORM_PUBKEY")]
        pubkey: String,
        /// Check --spec / --code against the attested digests
        #[arg(long)]
        verify_hashes: bool,
        /// Specification file
        #[arg(long)]
        spec: Option<PathBuf>,
        /// Code artifact file
        #[arg(long)]
        code: Option<PathBuf>,
        /// Replay recorded HTTP checks against the live deployment
        #[arg(long)]
        http_checks: bool,
        /// Links manifest (default: links.json next to the bundle)
        #[arg(long)]
        links: Option<PathBuf>,
        /// Per-request timeout in seconds (at least 1)
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_secs: u64,
        /// Largest response body accepted per check
        #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
        max_body_bytes: u64,
    },
    /// Validate a signed suite index against the suite directory
    ValidateSuite {
        /// suite.index.json.signed
        index: PathBuf,
        /// Ed25519 public key: a file containing hex, or the hex itself
        #[arg(long, env = "BAUFORM_PUBKEY")]
        pubkey: String,
        /// Also verify every member bundle (all members are attempted)
        #[arg(long)]
        verify_members: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("BAUFORM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            println!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `Ok(success)`; `Err` for failures before any check could run.
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Sign {
            suite_dir,
            privkey,
            index,
        } => cmd_sign(&suite_dir, &privkey, index),
        Commands::Verify {
            bundle,
            pubkey,
            verify_hashes,
            spec,
            code,
            http_checks,
            links,
            timeout_secs,
            max_body_bytes,
        } => {
            let key = resolve_pubkey(&pubkey)?;
            let options = VerifyOptions {
                verify_hashes,
                spec,
                code,
                http_checks,
                links,
                replay: ReplayConfig {
                    timeout: Duration::from_secs(timeout_secs),
                    max_body_bytes,
                    ..ReplayConfig::default()
                },
            };
            let report = run_verify(&bundle, &key, &options);
            print_report(&report, true);
            Ok(report.is_success())
        }
        Commands::ValidateSuite {
            index,
            pubkey,
            verify_members,
        } => {
            let key = resolve_pubkey(&pubkey)?;
            let report = validate_suite(&index, &key, verify_members);
            print_report(&report, false);
            Ok(report.is_success())
        }
    }
}

fn cmd_sign(suite_dir: &Path, privkey: &Path, index: bool) -> Result<bool> {
    tracing::debug!(suite_dir = %suite_dir.display(), index, "signing suite");
    let key = load_signing_key(privkey).context("loading private key")?;
    let signed = sign_suite(suite_dir, &key)
        .with_context(|| format!("signing suite {}", suite_dir.display()))?;
    if signed.is_empty() {
        println!("No result.json files found to sign.");
        return Ok(true);
    }
    for path in &signed {
        println!("Signed: {}", path.display());
    }
    if index {
        let path = write_suite_index(suite_dir, &key).context("writing suite index")?;
        println!("Index: {}", path.display());
    }
    println!("All {} files signed.", signed.len());
    Ok(true)
}

/// A readable file holding hex, or the hex string itself.
/// Exactly 64 hex characters is an inline key; anything else names a key file.
fn resolve_pubkey(arg: &str) -> Result<VerifyingKey> {
    let path = Path::new(arg);
    let inline = arg.len() == KEY_BYTES * 2 && arg.bytes().all(|b| b.is_ascii_hexdigit());
    if inline && !path.is_file() {
        return parse_verifying_key_hex(arg).context("parsing public key");
    }
    load_verifying_key(path).with_context(|| format!("loading public key {arg}"))
}

fn print_report(report: &VerifyReport, show_payload_digest: bool) {
    for line in &report.lines {
        match (line.status, &line.detail) {
            (CheckStatus::Passed, None) => println!("{}: OK", line.check),
            (CheckStatus::Passed, Some(detail)) => println!("{}: OK ({detail})", line.check),
            (CheckStatus::Skipped, detail) => {
                println!("{}", detail.as_deref().unwrap_or(&line.check));
            }
            (CheckStatus::Failed, detail) => {
                println!("ERROR: {}", detail.as_deref().unwrap_or(&line.check));
            }
        }
        if show_payload_digest && line.check == CHECK_SIGNATURE && line.status == CheckStatus::Passed {
            if let Some(digest) = &report.payload_sha256 {
                println!("payload_sha256: {digest}");
            }
        }
    }
}
