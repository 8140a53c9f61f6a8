//! One-shot engine asset acquisition — download, verify, unpack.
//!
//! The synthesis engine is not bundled with the host: its native module and
//! pronunciation dictionary ship as a fixed upstream release archive that is
//! fetched once, pinned by content digest, and installed locally. Everything
//! here is a prerequisite the pool gates instance creation on.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::AcquireError;

// ── Manifest ───────────────────────────────────────────────────────

/// Describes the engine bundle: where to fetch it, what its digest must be,
/// and which archive entries to install.
///
/// `Default` pins the known-good upstream release; hosts can inject their own
/// manifest to sideload a mirror.
#[derive(Debug, Clone)]
pub struct AssetManifest {
    /// URL of the release archive (zip).
    pub archive_url: String,

    /// Expected SHA-256 of the archive bytes, lowercase hex.
    pub archive_sha256: String,

    /// Archive entry holding the native engine module, matched by path
    /// suffix.
    pub module_entry: String,

    /// Archive entry holding the pronunciation dictionary, matched by path
    /// suffix.
    pub dictionary_entry: String,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            archive_url:
                "https://github.com/dectalk/dectalk/releases/download/2023-10-30/vs2022.zip"
                    .to_string(),
            archive_sha256: "4a778056c109b37f95ade4b3d3e308b9396b22a4b0629f9756ec0e5051b9636d"
                .to_string(),
            module_entry: "AMD64/DECtalk.dll".to_string(),
            dictionary_entry: "AMD64/dtalk_us.dic".to_string(),
        }
    }
}

impl AssetManifest {
    /// On-disk paths the entries install to. Archive directories are
    /// flattened: only the entry's file name lands in `install_dir`.
    #[must_use]
    pub fn resolve(&self, install_dir: &Path) -> EngineAssets {
        EngineAssets {
            module: install_dir.join(entry_file_name(&self.module_entry)),
            dictionary: install_dir.join(entry_file_name(&self.dictionary_entry)),
        }
    }
}

/// Resolved on-disk locations of the installed engine assets.
#[derive(Debug, Clone)]
pub struct EngineAssets {
    /// The native engine module.
    pub module: PathBuf,

    /// The pronunciation dictionary instances are bound to.
    pub dictionary: PathBuf,
}

// ── Acquisition ────────────────────────────────────────────────────

/// Ensure the engine assets are installed under `install_dir`, downloading
/// and unpacking the release archive if they are not already present.
///
/// Short-circuits without any network traffic when both target files exist.
/// Hashing and extraction run on a blocking thread so the async runtime is
/// never stalled.
pub async fn ensure_assets(
    manifest: &AssetManifest,
    install_dir: &Path,
) -> Result<EngineAssets, AcquireError> {
    let assets = manifest.resolve(install_dir);

    // Already installed
    if assets.module.exists() && assets.dictionary.exists() {
        tracing::debug!(dir = %install_dir.display(), "engine assets already installed");
        return Ok(assets);
    }

    tokio::fs::create_dir_all(install_dir).await?;

    tracing::info!(url = %manifest.archive_url, "downloading engine bundle");

    let client = reqwest::Client::new();
    let response = client
        .get(&manifest.archive_url)
        .send()
        .await
        .map_err(|e| AcquireError::Download {
            name: manifest.archive_url.clone(),
            source: e.into(),
        })?;

    if !response.status().is_success() {
        return Err(AcquireError::Download {
            name: manifest.archive_url.clone(),
            source: anyhow::anyhow!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| AcquireError::Download {
        name: manifest.archive_url.clone(),
        source: e.into(),
    })?;

    tracing::info!(size_mb = bytes.len() / 1_048_576, "engine bundle downloaded, installing");

    // Verify + unpack on a blocking thread.
    let manifest = manifest.clone();
    let install_dir = install_dir.to_path_buf();
    let assets = tokio::task::spawn_blocking(move || {
        install_bundle(&manifest, &bytes, &install_dir)
    })
    .await
    .map_err(|e| AcquireError::Task(e.to_string()))??;

    tracing::info!(
        module = %assets.module.display(),
        dictionary = %assets.dictionary.display(),
        "engine assets installed"
    );
    Ok(assets)
}

/// Verify `bytes` against the manifest digest and extract the two required
/// entries into `install_dir`.
///
/// This is the synchronous half of [`ensure_assets`], public so hosts can
/// sideload a bundled archive and so verification is testable without a
/// network.
pub fn install_bundle(
    manifest: &AssetManifest,
    bytes: &[u8],
    install_dir: &Path,
) -> Result<EngineAssets, AcquireError> {
    let actual = format!("{:x}", Sha256::digest(bytes));
    if !actual.eq_ignore_ascii_case(&manifest.archive_sha256) {
        return Err(AcquireError::DigestMismatch {
            expected: manifest.archive_sha256.clone(),
            actual,
        });
    }

    std::fs::create_dir_all(install_dir)?;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    for entry in [&manifest.module_entry, &manifest.dictionary_entry] {
        extract_entry(&mut archive, entry, install_dir)?;
    }

    Ok(manifest.resolve(install_dir))
}

/// Extract the archive entry whose path ends in `entry`, flattening it to
/// its file name under `install_dir`.
fn extract_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    entry: &str,
    install_dir: &Path,
) -> Result<(), AcquireError> {
    let name = archive
        .file_names()
        .find(|name| name.ends_with(entry))
        .map(String::from)
        .ok_or_else(|| AcquireError::MissingEntry {
            entry: entry.to_string(),
        })?;

    let mut file = archive.by_name(&name)?;
    let dest = install_dir.join(entry_file_name(entry));
    let mut output = std::fs::File::create(&dest)?;
    std::io::copy(&mut file, &mut output)?;

    tracing::debug!(entry = %name, dest = %dest.display(), "extracted engine asset");
    Ok(())
}

/// File-name component of an archive entry path.
fn entry_file_name(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}
