//! Collecting pending fixes from a channel.
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use common::fixes::{archive_members_valid, is_plain_file_name, DownloadLedger, FixFilter};
use common::{Eligibility, HistoryMessage};
use futures_util::TryStreamExt;
use serde::Deserialize;
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

use crate::archive;
use crate::history::{self, AttachmentStore, ChannelHistory};

#[derive(Deserialize, Clone, Debug)]
pub struct HarvestConfig {
    /// attachments have to be smaller than this
    pub max_attachment_bytes: u64,
    /// archives unpacking to more than this get thrown out
    pub max_archive_unpacked_bytes: u64,
    /// files per numbered sub-folder
    pub partition_size: usize,
    /// the "needs manual review" marker
    pub warning_emoji: String,
    #[serde(default)]
    pub eligibility: Eligibility,
}

impl HarvestConfig {
    fn filter(&self) -> FixFilter {
        FixFilter {
            rule: self.eligibility,
            warning_emoji: self.warning_emoji.clone(),
            max_attachment_bytes: self.max_attachment_bytes,
        }
    }
}

/// Result of one harvest. The folder is deleted when this is dropped.
#[derive(Debug)]
pub struct Harvest {
    pub folder: TempDir,
    /// day of the pin the harvest started after, if there was one
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub scanned: usize,
    pub downloaded: usize,
    /// archives thrown out after download
    pub discarded: usize,
}

impl Harvest {
    pub fn path(&self) -> &Path {
        self.folder.path()
    }

    /// `pending_fixes 2024-01-01 to 2024-03-01.zip`
    pub fn archive_name(&self) -> String {
        format!(
            "pending_fixes {} to {}.zip",
            self.start_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "beginning".to_string()),
            self.end_date.format("%Y-%m-%d")
        )
    }
}

/// Download every eligible fix posted after the newest pin and before `newest`
/// (or up to now) into a fresh temp folder.
///
/// `today` is used as the end date when there is no `newest` message.
#[instrument(skip(source, newest, config), fields(newest = newest.map(|m| m.id)))]
pub async fn harvest<S>(
    source: &S,
    channel: u64,
    newest: Option<&HistoryMessage>,
    today: NaiveDate,
    config: &HarvestConfig,
) -> anyhow::Result<Harvest>
where
    S: ChannelHistory + AttachmentStore + ?Sized,
{
    let folder = tempfile::Builder::new().prefix("pending_fixes").tempdir()?;
    let mut pins = source.pins(channel).await?;
    pins.sort_by_key(|p| p.created_at);
    let oldest = pins.last();
    let start_date = oldest.map(|p| p.created_at.date_naive());
    let end_date = newest.map_or(today, |m| m.created_at.date_naive());

    let filter = config.filter();
    let mut ledger = DownloadLedger::new(config.partition_size);
    let mut scanned = 0;
    let mut discarded = 0;

    debug!("processing messages...");
    let messages = history::window(source, channel, oldest.map(|p| p.id), newest.map(|m| m.id));
    futures_util::pin_mut!(messages);
    while let Some(msg) = messages.try_next().await? {
        scanned += 1;
        let Some(kind) = filter.eligible(&msg) else {
            continue;
        };
        let Some(attachment) = msg.single_attachment() else {
            continue;
        };
        if !is_plain_file_name(&attachment.filename) {
            warn!(
                "skipping attachment with a weird name {:?} on {}",
                attachment.filename, msg.jump_url
            );
            continue;
        }
        debug!("Downloading file {} from message {}", attachment.filename, msg.id);
        let placement = ledger.place(&attachment.filename);
        let partition = folder.path().join(placement.partition.to_string());
        tokio::fs::create_dir_all(&partition).await?;
        let save_location = partition.join(&placement.file_name);
        source.save(attachment, &save_location).await?;

        if kind.is_archive() && !keep_archive(save_location, config.max_archive_unpacked_bytes).await? {
            discarded += 1;
        }
    }
    let downloaded = ledger.len();
    info!(
        "scanned {} messages, downloaded {} files, discarded {} archives",
        scanned, downloaded, discarded
    );
    Ok(Harvest {
        folder,
        start_date,
        end_date,
        scanned,
        downloaded,
        discarded,
    })
}

/// Check an archive's entries, deleting it if it doesn't belong. Returns whether it stayed.
async fn keep_archive(path: PathBuf, max_unpacked: u64) -> anyhow::Result<bool> {
    let listed = {
        let path = path.clone();
        tokio::task::spawn_blocking(move || archive::member_names(&path, max_unpacked)).await?
    };
    let keep = match listed {
        Ok(names) => archive_members_valid(&names),
        Err(e) => {
            info!("Error {} when opening {}, removing archive.", e, path.display());
            false
        }
    };
    if !keep {
        tokio::fs::remove_file(&path).await?;
    }
    Ok(keep)
}
