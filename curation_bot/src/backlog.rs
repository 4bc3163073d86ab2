//! Measuring how far behind the reviewer is.
use common::{emoji_matches, HistoryMessage};
use poise::serenity_prelude::{ChannelId, UserId};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::history::{fetch_batch, ChannelHistory};

#[derive(Deserialize, Clone, Debug)]
pub struct BacklogConfig {
    /// reaction the reviewer leaves on messages they've handled
    pub marker_emoji: String,
    /// the reviewer
    pub reviewer: UserId,
    /// what to call the reviewer in replies
    pub reviewer_name: String,
    pub batch_size: usize,
    pub flash: ChannelId,
    pub other: ChannelId,
    pub animation: ChannelId,
}

/// Walk `channel` from the newest message back until one carries the marker from the
/// reviewer. Returns every message seen up to and including that one, newest first,
/// or the whole history if the reviewer never reacted.
#[instrument(skip(history, config))]
pub async fn count_backlog<H: ChannelHistory + ?Sized>(
    history: &H,
    channel: u64,
    config: &BacklogConfig,
) -> anyhow::Result<Vec<HistoryMessage>> {
    let reviewer = config.reviewer.get();
    let mut messages: Vec<HistoryMessage> = Vec::new();
    let mut oldest: Option<u64> = None;
    loop {
        debug!("getting {} messages before {:?}...", config.batch_size, oldest);
        let batch = fetch_batch(history, channel, oldest, config.batch_size).await?;
        let Some(last) = batch.last() else {
            warn!("no messages found, weird.");
            return Ok(messages);
        };
        oldest = Some(last.id);
        let first_new = messages.len();
        messages.extend(batch);

        debug!("processing messages...");
        let mut found = None;
        'scan: for (i, msg) in messages.iter().enumerate().skip(first_new) {
            for reaction in msg
                .reactions
                .iter()
                .filter(|r| emoji_matches(&r.emoji, &config.marker_emoji))
            {
                debug!("found marker on {}, getting reaction users...", msg.id);
                if history.reactors(msg, &reaction.emoji).await?.contains(&reviewer) {
                    found = Some(i);
                    break 'scan;
                }
            }
        }
        if let Some(i) = found {
            messages.truncate(i + 1);
            return Ok(messages);
        }
    }
}
