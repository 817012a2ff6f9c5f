//! `sign()`: wrap a payload with an Ed25519 signature over its canonical bytes.

use ed25519_dalek::{Signer, SigningKey};

use crate::bundle::{SignedBundle, SIG_PREFIX};
use crate::proof::canon::canonical_json_bytes;

/// Sign `payload` and wrap it as a [`SignedBundle`].
///
/// Pure: no I/O. Persisting the bundle (see
/// [`SignedBundle::to_storage_bytes`]) is the caller's concern.
#[must_use]
pub fn sign(payload: serde_json::Value, key: &SigningKey) -> SignedBundle {
    let bytes = canonical_json_bytes(&payload);
    let signature = key.sign(&bytes);
    SignedBundle {
        payload,
        sig: format!("{SIG_PREFIX}{}", hex::encode(signature.to_bytes())),
    }
}
