//! Cross-process signing determinism.
//!
//! Spawns the `sign_fixture` binary under several environment variants and
//! asserts that all produce identical output. Canonical bytes, signatures
//! and storage-form files must not depend on cwd, locale or time zone.

use std::process::Command;

use lock_tests::workspace_root;

/// `cargo test` puts test binaries in `target/<profile>/deps/`; the fixture
/// binary lives one level up.
fn binary_path() -> String {
    let mut path = std::env::current_exe()
        .expect("can resolve test binary path")
        .parent()
        .expect("binary dir exists")
        .parent()
        .expect("deps parent exists")
        .to_path_buf();
    path.push("sign_fixture");
    path.to_string_lossy().to_string()
}

fn run_variant(work_dir: &std::path::Path, env_overrides: &[(&str, &str)]) -> String {
    let bin = binary_path();
    let mut command = Command::new(&bin);
    command
        .current_dir(work_dir)
        .env_remove("LC_ALL")
        .env_remove("LC_NUMERIC")
        .env_remove("LANG")
        .env_remove("LANGUAGE")
        .env_remove("TZ");
    for &(key, val) in env_overrides {
        command.env(key, val);
    }

    let output = command.output().unwrap_or_else(|e| {
        panic!("failed to spawn {bin} (work_dir={}, overrides={env_overrides:?}): {e}", work_dir.display())
    });
    assert!(
        output.status.success(),
        "sign_fixture exited with {}: stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is valid UTF-8")
}

// --- cross-process determinism ---

#[test]
fn identical_output_across_env_variants() {
    let root = workspace_root();
    let tmp = tempfile::tempdir().unwrap();

    let baseline = run_variant(&root, &[]);
    let variants = [
        run_variant(tmp.path(), &[]),
        run_variant(&root, &[("LC_ALL", "de_DE.UTF-8"), ("LANG", "de_DE.UTF-8")]),
        run_variant(&root, &[("TZ", "Pacific/Kiritimati")]),
        run_variant(tmp.path(), &[("LC_NUMERIC", "fr_FR.UTF-8"), ("TZ", "America/St_Johns")]),
    ];

    for (i, output) in variants.iter().enumerate() {
        assert_eq!(&baseline, output, "variant {i} diverged from baseline");
    }
}

#[test]
fn fixture_output_has_expected_shape() {
    let output = run_variant(&workspace_root(), &[]);
    let keys: Vec<&str> = output
        .lines()
        .map(|l| l.split_once('=').expect("key=value line").0)
        .collect();
    assert_eq!(
        keys,
        vec!["canonical_sha256", "sig", "payload_sha256", "storage_sha256", "roundtrip"]
    );
    assert!(output.contains("roundtrip=ok\n"), "{output}");
    // The payload digest is the digest of the canonical bytes.
    let value = |k: &str| {
        output
            .lines()
            .find_map(|l| l.strip_prefix(&format!("{k}=")).map(str::to_string))
            .unwrap()
    };
    assert_eq!(value("canonical_sha256"), value("payload_sha256"));
    assert!(value("sig").starts_with("ed25519:"));
}
