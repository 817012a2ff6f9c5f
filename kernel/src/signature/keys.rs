//! Ed25519 key parsing.
//!
//! Key files hold a hex-encoded 32-byte key (64 hex characters), optionally
//! surrounded by whitespace. The same text form is accepted for private
//! (seed) and public keys.

use std::path::Path;

use ed25519_dalek::{SigningKey, VerifyingKey};

/// Raw key length in bytes, for both seed and public key.
pub const KEY_BYTES: usize = 32;

/// Error parsing or loading a key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The trimmed key text is not hex.
    #[error("key is not valid hex: {detail}")]
    NotHex { detail: String },
    /// The decoded key is not 32 bytes.
    #[error("key must be {} bytes ({} hex characters), got {got} bytes", KEY_BYTES, KEY_BYTES * 2)]
    WrongLength { got: usize },
    /// The 32 bytes do not decode to a valid Ed25519 public key.
    #[error("public key is not a valid Ed25519 point")]
    InvalidPoint,
    /// The key file could not be read.
    #[error("cannot read key file {path}: {detail}")]
    Io { path: String, detail: String },
}

/// Parse a hex-encoded private key (Ed25519 seed).
///
/// # Errors
///
/// Returns [`KeyError::NotHex`] or [`KeyError::WrongLength`].
pub fn parse_signing_key_hex(text: &str) -> Result<SigningKey, KeyError> {
    let seed = decode_key_bytes(text)?;
    Ok(SigningKey::from_bytes(&seed))
}

/// Parse a hex-encoded public key.
///
/// # Errors
///
/// Returns [`KeyError::NotHex`], [`KeyError::WrongLength`] or
/// [`KeyError::InvalidPoint`].
pub fn parse_verifying_key_hex(text: &str) -> Result<VerifyingKey, KeyError> {
    let bytes = decode_key_bytes(text)?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPoint)
}

/// Read and parse a private key file.
///
/// # Errors
///
/// Returns [`KeyError::Io`] if the file cannot be read, otherwise as
/// [`parse_signing_key_hex`].
pub fn load_signing_key(path: &Path) -> Result<SigningKey, KeyError> {
    parse_signing_key_hex(&read_key_text(path)?)
}

/// Read and parse a public key file.
///
/// # Errors
///
/// Returns [`KeyError::Io`] if the file cannot be read, otherwise as
/// [`parse_verifying_key_hex`].
pub fn load_verifying_key(path: &Path) -> Result<VerifyingKey, KeyError> {
    parse_verifying_key_hex(&read_key_text(path)?)
}

/// Lowercase hex of a public key, the key-file text form.
#[must_use]
pub fn verifying_key_hex(key: &VerifyingKey) -> String {
    hex::encode(key.as_bytes())
}

fn decode_key_bytes(text: &str) -> Result<[u8; KEY_BYTES], KeyError> {
    let raw = hex::decode(text.trim()).map_err(|e| KeyError::NotHex {
        detail: e.to_string(),
    })?;
    let got = raw.len();
    <[u8; KEY_BYTES]>::try_from(raw).map_err(|_| KeyError::WrongLength { got })
}

fn read_key_text(path: &Path) -> Result<String, KeyError> {
    std::fs::read_to_string(path).map_err(|e| KeyError::Io {
        path: path.display().to_string(),
        detail: e.to_string(),
    })
}
