//! Binary that signs a fixed payload with the RFC 8032 test key, writes the
//! bundle to a temp directory, reads it back, verifies it, and prints
//! deterministic output lines for cross-process verification.
//!
//! Usage: `sign_fixture`
//! Output: five lines, each `key=value`:
//!   `canonical_sha256`=<hex>
//!   `sig`=ed25519:<hex>
//!   `payload_sha256`=<hex>
//!   `storage_sha256`=<hex>
//!   `roundtrip`=ok

use sha2::{Digest, Sha256};

use bauform_kernel::bundle::SignedBundle;
use bauform_kernel::proof::canon::canonical_json_bytes;
use bauform_kernel::signature::sign::sign;
use bauform_kernel::signature::verify::verify;
use lock_tests::rfc8032_key;

fn main() {
    // Keys deliberately out of order; floats and non-ASCII exercise the
    // formatting paths most likely to depend on process state.
    let payload = serde_json::json!({
        "spec_id": "kv_store",
        "name": "caf\u{e9} \u{1f30d}",
        "metrics": {
            "p99_ms": 0.00001, "p50_ms": 12.5, "p95_ms": 236.832_385_028_908_13,
            "ratio": 1e16, "ops": 100_000,
        },
        "list": [3, 1, 2],
        "ok": true,
        "none": null,
    });

    let key = rfc8032_key();
    let bundle = sign(payload.clone(), &key);

    let dir = std::env::temp_dir().join(format!("bauform_sign_fixture_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("result.json.signed");
    let storage = bundle.to_storage_bytes();
    std::fs::write(&path, &storage).expect("write bundle");

    let loaded = SignedBundle::read_from(&path).expect("read bundle");
    let verified = verify(&loaded, &key.verifying_key()).expect("verify bundle");
    let _ = std::fs::remove_dir_all(&dir);

    // Parsed number literals keep their source text, so compare what was signed.
    let roundtrip = if loaded.sig == bundle.sig
        && verified.canonical_bytes() == canonical_json_bytes(&payload)
    {
        "ok"
    } else {
        "MISMATCH"
    };

    println!(
        "canonical_sha256={}",
        hex::encode(Sha256::digest(canonical_json_bytes(&payload)))
    );
    println!("sig={}", bundle.sig);
    println!("payload_sha256={}", verified.payload_sha256());
    println!("storage_sha256={}", hex::encode(Sha256::digest(&storage)));
    println!("roundtrip={roundtrip}");
}
