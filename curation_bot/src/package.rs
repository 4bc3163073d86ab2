//! Bundling a harvest for delivery.
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use tempfile::TempDir;
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::harvest::Harvest;

#[derive(Deserialize, Clone, Debug)]
pub struct DeliveryConfig {
    /// where bundles too big for the chat go, via PUT
    pub upload_url: String,
}

/// A zipped harvest. Deleted on drop, like the harvest itself.
pub struct Bundle {
    _dir: TempDir,
    pub path: PathBuf,
}

/// Zip up the harvest folder as `pending_fixes {start} to {end}.zip`.
#[instrument(skip(harvest), fields(folder = %harvest.path().display()))]
pub async fn bundle(harvest: &Harvest) -> anyhow::Result<Bundle> {
    let dir = tempfile::Builder::new().prefix("pending_fixes_zip").tempdir()?;
    let path = dir.path().join(harvest.archive_name());
    let source = harvest.path().to_path_buf();
    let target = path.clone();
    tokio::task::spawn_blocking(move || zip_folder(&source, &target))
        .await?
        .context("failed to zip pending fixes")?;
    debug!("bundled into {}", path.display());
    Ok(Bundle { _dir: dir, path })
}

/// Write everything under `folder` into a new zip at `target`, paths relative to `folder`.
pub fn zip_folder(folder: &Path, target: &Path) -> zip::result::ZipResult<()> {
    let mut zip = ZipWriter::new(File::create(target)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    add_dir(&mut zip, folder, "", options)?;
    zip.finish()?;
    Ok(())
}

fn add_dir(
    zip: &mut ZipWriter<File>,
    dir: &Path,
    prefix: &str,
    options: SimpleFileOptions,
) -> zip::result::ZipResult<()> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let name = format!("{}{}", prefix, entry.file_name().to_string_lossy());
        if entry.file_type()?.is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
            add_dir(zip, &entry.path(), &format!("{}/", name), options)?;
        } else {
            zip.start_file(name, options)?;
            io::copy(&mut File::open(entry.path())?, zip)?;
        }
    }
    Ok(())
}

/// PUT the file at `path` to `url` and hand back whatever the server answered,
/// which is where the file ended up.
#[instrument(skip(client))]
pub async fn upload(client: &reqwest::Client, url: &str, path: &Path) -> anyhow::Result<String> {
    debug!("uploading");
    let body = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let location = client
        .put(url)
        .body(body)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(location.trim().to_string())
}
