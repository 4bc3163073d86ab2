//! Rules for picking up pending fixes: which attachments qualify, where they land on
//! disk and which archives are kept.
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Eligibility, HistoryMessage};

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("uuid regex compiles")
});

/// Kinds of attachment the harvester cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixKind {
    Json,
    Zip,
    SevenZip,
}

impl FixKind {
    pub fn of(filename: &str) -> Option<Self> {
        if filename.ends_with(".json") {
            Some(Self::Json)
        } else if filename.ends_with(".zip") {
            Some(Self::Zip)
        } else if filename.ends_with(".7z") {
            Some(Self::SevenZip)
        } else {
            None
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Zip | Self::SevenZip)
    }
}

/// Limits applied when deciding whether a message's attachment gets downloaded.
#[derive(Debug, Clone)]
pub struct FixFilter {
    pub rule: Eligibility,
    /// the manual review marker
    pub warning_emoji: String,
    /// attachments must be strictly smaller than this
    pub max_attachment_bytes: u64,
}

impl FixFilter {
    /// Returns the kind of fix if `msg` should be downloaded.
    pub fn eligible(&self, msg: &HistoryMessage) -> Option<FixKind> {
        let attachment = msg.single_attachment()?;
        let kind = FixKind::of(&attachment.filename)?;
        let checked =
            || !msg.has_reaction(&self.warning_emoji) && attachment.size < self.max_attachment_bytes;
        let ok = match (self.rule, kind) {
            (Eligibility::Legacy, FixKind::Json | FixKind::Zip) => true,
            _ => checked(),
        };
        ok.then_some(kind)
    }
}

/// Where a downloaded file goes, relative to the harvest folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub partition: usize,
    pub file_name: String,
}

/// Run-scoped record of everything downloaded so far.
///
/// Files are spread over numbered partitions of `partition_size` files each, and a
/// filename seen `n` times before is stored as `dupe{n}-{filename}`.
#[derive(Debug)]
pub struct DownloadLedger {
    partition_size: usize,
    total: usize,
    seen: HashMap<String, usize>,
}

impl DownloadLedger {
    pub fn new(partition_size: usize) -> Self {
        Self {
            partition_size: partition_size.max(1),
            total: 0,
            seen: HashMap::new(),
        }
    }

    /// Record a download of `filename` and say where to put it.
    pub fn place(&mut self, filename: &str) -> Placement {
        let partition = self.total / self.partition_size;
        self.total += 1;
        let dupes = self.seen.entry(filename.to_string()).or_insert(0);
        let file_name = if *dupes == 0 {
            filename.to_string()
        } else {
            format!("dupe{}-{}", dupes, filename)
        };
        *dupes += 1;
        Placement {
            partition,
            file_name,
        }
    }

    /// how many files have been placed
    pub fn len(&self) -> usize {
        self.total
    }
}

/// Does `name` contain a lowercase hyphenated UUID?
pub fn contains_uuid(name: &str) -> bool {
    UUID_RE.is_match(name)
}

/// Curation archives must only contain entries named after the curation's UUID.
pub fn archive_members_valid<S: AsRef<str>>(members: &[S]) -> bool {
    members.iter().all(|m| contains_uuid(m.as_ref()))
}

/// Attachment names come from users; only accept plain file names.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
