//! Integration tests for engine asset acquisition.
//!
//! The engine bundle is simulated with in-memory zip archives so that
//! verification and extraction can be exercised without any network access.
//!
//! # What is tested
//!
//! - `install_bundle` verifies the archive digest before touching the disk
//! - Required entries are located by path suffix and flattened to file names
//! - Digest mismatches and missing entries fail with descriptive errors
//! - `ensure_assets` short-circuits without network when both files exist
//! - `ensure_assets` surfaces download failures as `AcquireError::Download`

use std::io::Write;

use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;

use squawkbox::{AcquireError, AssetManifest, ensure_assets, install_bundle};

// ── Fixtures ───────────────────────────────────────────────────────

const MODULE_BYTES: &[u8] = b"fake native module";
const DICTIONARY_BYTES: &[u8] = b"fake dictionary";

/// Build a zip archive in memory from `(entry path, contents)` pairs.
fn make_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A manifest whose digest matches `bytes`, with the default entry paths.
fn manifest_for(bytes: &[u8]) -> AssetManifest {
    AssetManifest {
        archive_url: "http://127.0.0.1:9/bundle.zip".to_string(),
        archive_sha256: format!("{:x}", Sha256::digest(bytes)),
        module_entry: "AMD64/DECtalk.dll".to_string(),
        dictionary_entry: "AMD64/dtalk_us.dic".to_string(),
    }
}

fn standard_bundle() -> Vec<u8> {
    make_zip(&[
        ("AMD64/DECtalk.dll", MODULE_BYTES),
        ("AMD64/dtalk_us.dic", DICTIONARY_BYTES),
    ])
}

// ── install_bundle ─────────────────────────────────────────────────

#[test]
fn install_extracts_both_entries_flattened_to_file_names() {
    let bytes = standard_bundle();
    let manifest = manifest_for(&bytes);
    let dir = tempfile::tempdir().unwrap();

    let assets = install_bundle(&manifest, &bytes, dir.path()).unwrap();

    assert_eq!(assets.module, dir.path().join("DECtalk.dll"));
    assert_eq!(assets.dictionary, dir.path().join("dtalk_us.dic"));
    assert_eq!(std::fs::read(&assets.module).unwrap(), MODULE_BYTES);
    assert_eq!(std::fs::read(&assets.dictionary).unwrap(), DICTIONARY_BYTES);
}

#[test]
fn entries_are_matched_by_path_suffix() {
    // Upstream archives nest the payload under a release directory.
    let bytes = make_zip(&[
        ("vs2022/AMD64/DECtalk.dll", MODULE_BYTES),
        ("vs2022/AMD64/dtalk_us.dic", DICTIONARY_BYTES),
    ]);
    let manifest = manifest_for(&bytes);
    let dir = tempfile::tempdir().unwrap();

    let assets = install_bundle(&manifest, &bytes, dir.path()).unwrap();
    assert_eq!(std::fs::read(&assets.module).unwrap(), MODULE_BYTES);
}

#[test]
fn digest_mismatch_fails_before_anything_is_written() {
    let bytes = standard_bundle();
    let mut manifest = manifest_for(&bytes);
    manifest.archive_sha256 = "00".repeat(32);
    let dir = tempfile::tempdir().unwrap();

    let err = install_bundle(&manifest, &bytes, dir.path()).unwrap_err();
    match &err {
        AcquireError::DigestMismatch { expected, actual } => {
            assert_eq!(*expected, "00".repeat(32));
            assert_eq!(*actual, format!("{:x}", Sha256::digest(&bytes)));
        }
        other => panic!("expected DigestMismatch, got {other:?}"),
    }

    assert!(
        std::fs::read_dir(dir.path()).unwrap().next().is_none(),
        "a rejected bundle must leave the install directory empty"
    );
}

#[test]
fn a_missing_entry_is_an_error_naming_it() {
    let bytes = make_zip(&[("AMD64/DECtalk.dll", MODULE_BYTES)]);
    let manifest = manifest_for(&bytes);
    let dir = tempfile::tempdir().unwrap();

    let err = install_bundle(&manifest, &bytes, dir.path()).unwrap_err();
    match err {
        AcquireError::MissingEntry { entry } => assert_eq!(entry, "AMD64/dtalk_us.dic"),
        other => panic!("expected MissingEntry, got {other:?}"),
    }
}

#[test]
fn garbage_bytes_fail_the_digest_check_not_the_archive_parse() {
    let bytes = b"definitely not a zip".to_vec();
    let manifest = manifest_for(b"something else");
    let dir = tempfile::tempdir().unwrap();

    let err = install_bundle(&manifest, &bytes, dir.path()).unwrap_err();
    assert!(matches!(err, AcquireError::DigestMismatch { .. }));
}

// ── ensure_assets ──────────────────────────────────────────────────

#[tokio::test]
async fn already_installed_assets_short_circuit_without_network() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("DECtalk.dll"), MODULE_BYTES).unwrap();
    std::fs::write(dir.path().join("dtalk_us.dic"), DICTIONARY_BYTES).unwrap();

    // The URL is unreachable; success proves no fetch was attempted.
    let manifest = manifest_for(b"irrelevant");
    let assets = ensure_assets(&manifest, dir.path()).await.unwrap();

    assert_eq!(std::fs::read(&assets.module).unwrap(), MODULE_BYTES);
    assert_eq!(std::fs::read(&assets.dictionary).unwrap(), DICTIONARY_BYTES);
}

#[tokio::test]
async fn an_unreachable_bundle_url_is_a_download_error() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = manifest_for(b"irrelevant");

    let err = ensure_assets(&manifest, dir.path().join("engine").as_path())
        .await
        .unwrap_err();
    match err {
        AcquireError::Download { name, .. } => {
            assert_eq!(name, manifest.archive_url);
        }
        other => panic!("expected Download, got {other:?}"),
    }
}
