//! SHA-256 digests rendered as lowercase hex.
//!
//! **Exactly one place defines content hashing.** Payload digests, artifact
//! file digests and HTTP response digests all come from this module, and all
//! of them are bare lowercase hex (no `sha256:` prefix), the form in which
//! payloads attest `spec_sha256` / `code_sha256` / `resp_sha256`.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Read size for streaming digests. Memory use is bounded by this regardless
/// of input size.
pub const STREAM_CHUNK_BYTES: usize = 1 << 20;

/// Length of a SHA-256 digest in hex characters.
pub const SHA256_HEX_LEN: usize = 64;

/// SHA-256 of an in-memory byte slice.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// SHA-256 of everything readable from `reader`, consumed in
/// [`STREAM_CHUNK_BYTES`] chunks.
///
/// # Errors
///
/// Propagates the first I/O error returned by the reader.
pub fn sha256_reader(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; STREAM_CHUNK_BYTES];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&chunk[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 of a file's contents, streamed.
///
/// # Errors
///
/// Returns the I/O error from opening or reading the file.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let file = std::fs::File::open(path)?;
    sha256_reader(file)
}

/// Whether `s` is a well-formed lowercase hex SHA-256 digest.
#[must_use]
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == SHA256_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
