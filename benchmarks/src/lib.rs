//! Shared helpers for bauform benchmark suites.

use ed25519_dalek::SigningKey;
use serde_json::{json, Value};

/// Fixed benchmark key.
#[must_use]
pub fn bench_key() -> SigningKey {
    SigningKey::from_bytes(&[0x42; 32])
}

/// A result payload shaped like a real suite member, with `metric_count`
/// metrics and `list_len` list entries.
#[must_use]
pub fn result_payload(metric_count: usize, list_len: usize) -> Value {
    let metrics: serde_json::Map<String, Value> = (0..metric_count)
        .map(|i| {
            let f = f64::from(u32::try_from(i).unwrap_or(u32::MAX));
            (format!("metric_{i:04}"), json!(f * 0.125 + 1e-6))
        })
        .collect();
    let list: Vec<Value> = (0..list_len)
        .map(|i| json!({"id": i, "label": format!("caf\u{e9} #{i}"), "ok": i % 2 == 0}))
        .collect();
    json!({
        "spec_id": "bench_spec",
        "hashes": {"spec_sha256": "ab".repeat(32), "code_sha256": "cd".repeat(32)},
        "metrics": metrics,
        "list": list,
    })
}

/// Write a suite of `n` spec directories with `result.json` under `dir`.
///
/// # Errors
///
/// Returns any filesystem error.
pub fn write_suite(dir: &std::path::Path, n: usize) -> std::io::Result<()> {
    for i in 0..n {
        let spec_dir = dir.join(format!("spec_{i:03}_v1"));
        std::fs::create_dir_all(&spec_dir)?;
        let bytes = serde_json::to_vec(&result_payload(8, 4)).map_err(std::io::Error::other)?;
        std::fs::write(spec_dir.join("result.json"), bytes)?;
    }
    Ok(())
}
