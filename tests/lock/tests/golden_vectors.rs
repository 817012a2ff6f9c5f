//! Interoperability lock: bundles produced by the reference Python signer
//! (`json.dumps(sort_keys=True)` + PyNaCl) must verify here byte for byte,
//! and bundles produced here must be byte-identical to its output.
//!
//! Fixtures under `tests/fixtures/golden/` were written by the reference
//! signer with the RFC 8032 test 1 key.

use std::path::PathBuf;

use bauform_harness::suite::sign_result_file;
use bauform_kernel::bundle::SignedBundle;
use bauform_kernel::proof::canon::canonical_json_bytes;
use bauform_kernel::signature::keys::{parse_verifying_key_hex, verifying_key_hex};
use bauform_kernel::signature::sign::sign;
use bauform_kernel::signature::verify::verify;
use lock_tests::{rfc8032_key, workspace_root, RFC8032_PUBLIC_HEX};

const RESULT_SIG: &str = "ed25519:2414994a05921e83ea666a2e27fc0e0362641998b9970a21f8c5cb9f67716095e31a9e34520304378b62629e7d59440f5bf5a2c223c333ffd0fb31ec5ea1840d";
const RESULT_PAYLOAD_SHA256: &str =
    "0d1e30532e88bce5894e820ad00f98c1fdc892f7d73ba7149d35a4c267b230ff";
const NUMBERS_SIG: &str = "ed25519:0c4985a8f6b93f2087960cc9709083d1aaddf4fa2dc5e76666739406c7b0894e0fc57bb11d1c9fca277b627e072d7d1624dc7b7e3235945125e1defd17c52408";
const NUMBERS_PAYLOAD_SHA256: &str =
    "45235b53e3f82f50247a63ba0e08c644f1aa8d189fa311f6ab643eef0d94947c";
const INDEX_SIG: &str = "ed25519:2a00820b65b254e273861eba36a3c6a2757d4498a50291c3e9e40dae16978bd4949d93af5900c797639cd4b9c3dd06e464e5c608d9e223a3124895f207df1508";

fn golden(name: &str) -> PathBuf {
    workspace_root().join("tests/fixtures/golden").join(name)
}

fn golden_payload() -> serde_json::Value {
    serde_json::json!({
        "spec_id": "kv_store",
        "metrics": {
            "p50_ms": 12.5, "p99_ms": 0.00001, "ops": 100_000,
            "ratio": 1e16, "neg": -3, "big": 1.0
        },
        "name": "caf\u{e9} \u{1f30d}",
        "notes": "tab\there\u{7f}\u{8}\u{c}",
        "hashes": {"spec_sha256": "ab".repeat(32), "code_sha256": "cd".repeat(32)},
        "ok": true,
        "none": null,
        "list": [3, 1, 2],
    })
}

// --- keys ---

#[test]
fn rfc8032_public_key_derivation() {
    assert_eq!(verifying_key_hex(&rfc8032_key().verifying_key()), RFC8032_PUBLIC_HEX);
}

// --- reference bundle verifies here ---

#[test]
fn reference_result_bundle_verifies() {
    let bundle = SignedBundle::read_from(&golden("result.json.signed")).unwrap();
    let key = parse_verifying_key_hex(RFC8032_PUBLIC_HEX).unwrap();
    let verified = verify(&bundle, &key).unwrap();
    assert_eq!(verified.payload_sha256(), RESULT_PAYLOAD_SHA256);
    assert_eq!(verified.canonical_bytes(), canonical_json_bytes(&golden_payload()));
}

#[test]
fn reference_index_bundle_verifies() {
    let bundle = SignedBundle::read_from(&golden("suite.index.json.signed")).unwrap();
    let key = parse_verifying_key_hex(RFC8032_PUBLIC_HEX).unwrap();
    let verified = verify(&bundle, &key).unwrap();
    assert_eq!(
        verified.canonical_bytes(),
        br#"{"specs":[{"path":"alpha_v1/result.json.signed","spec_id":"alpha"},{"path":"beta_v1/result.json.signed","spec_id":"beta"}],"suite":"r0.1"}"#
    );
}

// --- bundles produced here match the reference byte for byte ---

#[test]
fn canonical_bytes_match_reference() {
    let expected = std::fs::read(golden("result.canonical.json")).unwrap();
    assert_eq!(canonical_json_bytes(&golden_payload()), expected);
}

#[test]
fn signature_matches_reference() {
    let bundle = sign(golden_payload(), &rfc8032_key());
    assert_eq!(bundle.sig, RESULT_SIG);
}

#[test]
fn storage_file_matches_reference() {
    let expected = std::fs::read(golden("result.json.signed")).unwrap();
    let bundle = sign(golden_payload(), &rfc8032_key());
    assert_eq!(
        String::from_utf8(bundle.to_storage_bytes()).unwrap(),
        String::from_utf8(expected).unwrap()
    );
}

#[test]
fn index_signature_matches_reference() {
    let index = serde_json::json!({
        "suite": "r0.1",
        "specs": [
            {"spec_id": "alpha", "path": "alpha_v1/result.json.signed"},
            {"spec_id": "beta", "path": "beta_v1/result.json.signed"},
        ],
    });
    let bundle = sign(index, &rfc8032_key());
    assert_eq!(bundle.sig, INDEX_SIG);
    let expected = std::fs::read(golden("suite.index.json.signed")).unwrap();
    assert_eq!(bundle.to_storage_bytes(), expected);
}

// --- number literals: round-trip floats, -0 and integers wider than 64 bits ---

#[test]
fn reference_numbers_bundle_verifies_after_reload() {
    let bundle = SignedBundle::read_from(&golden("numbers/result.json.signed")).unwrap();
    let key = parse_verifying_key_hex(RFC8032_PUBLIC_HEX).unwrap();
    let verified = verify(&bundle, &key).unwrap();
    assert_eq!(bundle.sig, NUMBERS_SIG);
    assert_eq!(verified.payload_sha256(), NUMBERS_PAYLOAD_SHA256);
    assert_eq!(
        verified.canonical_bytes(),
        std::fs::read(golden("numbers/result.canonical.json")).unwrap()
    );
}

#[test]
fn numbers_result_canonicalizes_like_reference() {
    let text = std::fs::read(golden("numbers/result.json")).unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&text).unwrap();
    assert_eq!(
        String::from_utf8(canonical_json_bytes(&payload)).unwrap(),
        std::fs::read_to_string(golden("numbers/result.canonical.json")).unwrap()
    );
}

#[test]
fn signing_numbers_result_matches_reference_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("result.json");
    std::fs::copy(golden("numbers/result.json"), &result).unwrap();
    let signed = sign_result_file(&result, &rfc8032_key()).unwrap();
    assert_eq!(
        std::fs::read_to_string(signed).unwrap(),
        std::fs::read_to_string(golden("numbers/result.json.signed")).unwrap()
    );
}
