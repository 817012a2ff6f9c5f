//! Signature lock: any edit to a signed bundle fails verification closed.
//!
//! Tamper cases cover payload edits through the on-disk bytes, signature hex
//! edits, prefix edits and key substitution.

use bauform_kernel::bundle::SignedBundle;
use bauform_kernel::signature::sign::sign;
use bauform_kernel::signature::verify::{verify, VerifyError};
use lock_tests::key_from_byte;
use serde_json::json;

fn signed() -> SignedBundle {
    sign(
        json!({
            "spec_id": "kv_store",
            "metrics": {"p50_ms": 12.5, "ops": 100_000},
            "hashes": {"spec_sha256": "ab".repeat(32)},
        }),
        &key_from_byte(1),
    )
}

// --- round trip ---

#[test]
fn sign_then_verify_returns_payload() {
    let bundle = signed();
    let verified = verify(&bundle, &key_from_byte(1).verifying_key()).unwrap();
    assert_eq!(*verified.value(), bundle.payload);
}

#[test]
fn storage_round_trip_verifies() {
    let bundle = signed();
    let reloaded = SignedBundle::from_slice(&bundle.to_storage_bytes()).unwrap();
    verify(&reloaded, &key_from_byte(1).verifying_key()).unwrap();
}

// --- tamper detection ---

#[test]
fn every_payload_digit_edit_is_detected() {
    let storage = String::from_utf8(signed().to_storage_bytes()).unwrap();
    let payload_end = storage.find("\"sig\"").unwrap();
    let key = key_from_byte(1).verifying_key();

    let mut tried = 0;
    for (i, c) in storage[..payload_end].char_indices() {
        let Some(d) = c.to_digit(10) else { continue };
        let mut edited = storage.clone();
        edited.replace_range(i..=i, &((d + 1) % 10).to_string());
        let bundle = SignedBundle::from_slice(edited.as_bytes()).unwrap();
        assert_eq!(
            verify(&bundle, &key).unwrap_err(),
            VerifyError::SignatureInvalid,
            "edit at byte {i} verified"
        );
        tried += 1;
    }
    assert!(tried > 10);
}

#[test]
fn added_field_is_detected() {
    let mut bundle = signed();
    bundle.payload["extra"] = json!(true);
    assert_eq!(
        verify(&bundle, &key_from_byte(1).verifying_key()).unwrap_err(),
        VerifyError::SignatureInvalid
    );
}

#[test]
fn every_signature_nibble_edit_is_rejected() {
    let bundle = signed();
    let key = key_from_byte(1).verifying_key();
    let prefix = "ed25519:".len();
    for i in prefix..bundle.sig.len() {
        let mut edited = bundle.clone();
        let c = edited.sig.as_bytes()[i];
        let replacement = if c == b'0' { '1' } else { '0' };
        edited.sig.replace_range(i..=i, &replacement.to_string());
        assert!(verify(&edited, &key).is_err(), "nibble {i} edit verified");
    }
}

#[test]
fn uppercase_hex_is_malformed() {
    let mut bundle = signed();
    bundle.sig = bundle.sig.to_uppercase().replacen("ED25519:", "ed25519:", 1);
    assert!(matches!(
        verify(&bundle, &key_from_byte(1).verifying_key()),
        Err(VerifyError::MalformedSignature { .. })
    ));
}

#[test]
fn wrong_prefix_is_malformed() {
    let mut bundle = signed();
    bundle.sig = bundle.sig.replacen("ed25519:", "rsa:", 1);
    assert!(matches!(
        verify(&bundle, &key_from_byte(1).verifying_key()),
        Err(VerifyError::MalformedSignature { .. })
    ));
}

#[test]
fn truncated_signature_is_malformed() {
    let mut bundle = signed();
    bundle.sig.truncate(bundle.sig.len() - 2);
    assert!(matches!(
        verify(&bundle, &key_from_byte(1).verifying_key()),
        Err(VerifyError::MalformedSignature { .. })
    ));
}

#[test]
fn other_key_is_rejected() {
    assert_eq!(
        verify(&signed(), &key_from_byte(2).verifying_key()).unwrap_err(),
        VerifyError::SignatureInvalid
    );
}
