//! Reading channel history.
//!
//! Everything that talks to the chat platform goes through [`ChannelHistory`] and
//! [`AttachmentStore`], so the scanners can run against a fake channel in tests.
use std::cmp::Reverse;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use chrono::DateTime;
use common::{HistoryAttachment, HistoryMessage, HistoryReaction};
use futures_util::{stream, Stream};
use poise::serenity_prelude::{
    ChannelId, GetMessages, Http, Message, MessageId, ReactionType, UserId,
};
use tracing::{debug, instrument};

/// Most messages the platform hands out per request.
pub const PAGE_SIZE: u8 = 100;

/// Where a page of history starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Latest,
    /// strictly older than this message
    Before(u64),
    /// strictly newer than this message
    After(u64),
}

#[async_trait]
pub trait ChannelHistory: Send + Sync {
    /// At most `limit` messages next to `cursor`, newest first.
    async fn page(&self, channel: u64, cursor: Cursor, limit: u8)
        -> anyhow::Result<Vec<HistoryMessage>>;
    async fn pins(&self, channel: u64) -> anyhow::Result<Vec<HistoryMessage>>;
    /// ids of everyone who reacted to `message` with `emoji`
    async fn reactors(&self, message: &HistoryMessage, emoji: &str) -> anyhow::Result<Vec<u64>>;
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn save(&self, attachment: &HistoryAttachment, path: &Path) -> anyhow::Result<()>;
}

/// Fetch up to `limit` messages older than `before` (or the newest ones), newest first.
pub async fn fetch_batch<H: ChannelHistory + ?Sized>(
    history: &H,
    channel: u64,
    before: Option<u64>,
    limit: usize,
) -> anyhow::Result<Vec<HistoryMessage>> {
    let mut out = Vec::with_capacity(limit.min(1000));
    let mut cursor = before.map_or(Cursor::Latest, Cursor::Before);
    while out.len() < limit {
        let want = (limit - out.len()).min(PAGE_SIZE as usize) as u8;
        let mut page = history.page(channel, cursor, want).await?;
        let done = page.len() < want as usize;
        page.sort_by_key(|m| Reverse(m.id));
        if let Some(oldest) = page.last() {
            cursor = Cursor::Before(oldest.id);
        }
        out.extend(page);
        if done {
            break;
        }
    }
    Ok(out)
}

struct Window<'a, H: ?Sized> {
    history: &'a H,
    channel: u64,
    cursor: Cursor,
    upper: Option<u64>,
    buffer: VecDeque<HistoryMessage>,
    exhausted: bool,
}

impl<'a, H: ChannelHistory + ?Sized> Window<'a, H> {
    async fn refill(&mut self) -> anyhow::Result<()> {
        let mut page = self.history.page(self.channel, self.cursor, PAGE_SIZE).await?;
        debug!("fetched {} messages at {:?}", page.len(), self.cursor);
        if page.len() < PAGE_SIZE as usize {
            self.exhausted = true;
        }
        match self.cursor {
            Cursor::After(_) => {
                page.sort_by_key(|m| m.id);
                if let Some(newest) = page.last() {
                    self.cursor = Cursor::After(newest.id);
                }
                if let Some(upper) = self.upper {
                    if page.iter().any(|m| m.id >= upper) {
                        self.exhausted = true;
                    }
                    page.retain(|m| m.id < upper);
                }
            }
            Cursor::Before(_) | Cursor::Latest => {
                page.sort_by_key(|m| Reverse(m.id));
                if let Some(oldest) = page.last() {
                    self.cursor = Cursor::Before(oldest.id);
                }
            }
        }
        self.buffer.extend(page);
        Ok(())
    }
}

/// Lazily walk every message strictly between `after` and `before`.
///
/// With a lower bound the walk goes forward in time (oldest first), otherwise it
/// goes backward from `before`, or from the newest message. Pages are only requested
/// when the previous one has been consumed.
pub fn window<'a, H: ChannelHistory + ?Sized>(
    history: &'a H,
    channel: u64,
    after: Option<u64>,
    before: Option<u64>,
) -> impl Stream<Item = anyhow::Result<HistoryMessage>> + Send + 'a {
    let cursor = match (after, before) {
        (Some(a), _) => Cursor::After(a),
        (None, Some(b)) => Cursor::Before(b),
        (None, None) => Cursor::Latest,
    };
    let state = Window {
        history,
        channel,
        cursor,
        upper: before,
        buffer: VecDeque::new(),
        exhausted: false,
    };
    stream::try_unfold(state, |mut state| async move {
        loop {
            if let Some(msg) = state.buffer.pop_front() {
                return Ok(Some((msg, state)));
            }
            if state.exhausted {
                return Ok(None);
            }
            state.refill().await?;
        }
    })
}

pub fn from_serenity(msg: &Message) -> HistoryMessage {
    HistoryMessage {
        id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        guild_id: msg.guild_id.map(|g| g.get()),
        created_at: DateTime::from_timestamp(msg.timestamp.unix_timestamp(), 0)
            .unwrap_or_default(),
        jump_url: msg.link(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| HistoryAttachment {
                filename: a.filename.clone(),
                size: a.size as u64,
                url: a.url.clone(),
            })
            .collect(),
        reactions: msg
            .reactions
            .iter()
            .map(|r| HistoryReaction {
                emoji: r.reaction_type.to_string(),
                count: r.count,
                me: r.me,
            })
            .collect(),
    }
}

/// The real thing: serenity for history, reqwest for attachment bytes.
#[derive(Clone)]
pub struct SerenityChannels {
    http: Arc<Http>,
    client: reqwest::Client,
}

impl SerenityChannels {
    pub fn new(http: Arc<Http>, client: reqwest::Client) -> Self {
        Self { http, client }
    }
}

#[async_trait]
impl ChannelHistory for SerenityChannels {
    async fn page(
        &self,
        channel: u64,
        cursor: Cursor,
        limit: u8,
    ) -> anyhow::Result<Vec<HistoryMessage>> {
        let builder = GetMessages::new().limit(limit);
        let builder = match cursor {
            Cursor::Latest => builder,
            Cursor::Before(id) => builder.before(MessageId::new(id)),
            Cursor::After(id) => builder.after(MessageId::new(id)),
        };
        let messages = ChannelId::new(channel).messages(&self.http, builder).await?;
        Ok(messages.iter().map(from_serenity).collect())
    }

    async fn pins(&self, channel: u64) -> anyhow::Result<Vec<HistoryMessage>> {
        let pins = ChannelId::new(channel).pins(&self.http).await?;
        Ok(pins.iter().map(from_serenity).collect())
    }

    #[instrument(skip(self, message), fields(message = message.id))]
    async fn reactors(&self, message: &HistoryMessage, emoji: &str) -> anyhow::Result<Vec<u64>> {
        let reaction = ReactionType::try_from(emoji)
            .map_err(|e| anyhow!("can't turn {} into a reaction: {:?}", emoji, e))?;
        let channel = ChannelId::new(message.channel_id);
        let mut users = Vec::new();
        let mut after: Option<UserId> = None;
        loop {
            let page = channel
                .reaction_users(
                    &self.http,
                    MessageId::new(message.id),
                    reaction.clone(),
                    Some(PAGE_SIZE),
                    after,
                )
                .await?;
            let done = page.len() < PAGE_SIZE as usize;
            after = page.last().map(|u| u.id);
            users.extend(page.iter().map(|u| u.id.get()));
            if done || after.is_none() {
                break;
            }
        }
        Ok(users)
    }
}

#[async_trait]
impl AttachmentStore for SerenityChannels {
    async fn save(&self, attachment: &HistoryAttachment, path: &Path) -> anyhow::Result<()> {
        let bytes = self
            .client
            .get(&attachment.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        tokio::fs::write(path, &bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use futures_util::TryStreamExt;

    use super::fake::{message, FakeChannel, CHANNEL};
    use super::{fetch_batch, window, Cursor};

    fn channel(ids: impl IntoIterator<Item = u64>) -> FakeChannel {
        FakeChannel {
            messages: ids.into_iter().map(message).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_batch_stitches_pages() {
        let ch = channel(1..=250);
        let batch = fetch_batch(&ch, CHANNEL, None, 1000).await.unwrap();
        assert_eq!(batch.len(), 250);
        assert_eq!(batch[0].id, 250);
        assert_eq!(batch[249].id, 1);
        assert_eq!(
            ch.requests(),
            vec![Cursor::Latest, Cursor::Before(151), Cursor::Before(51)]
        );
    }

    #[tokio::test]
    async fn test_fetch_batch_respects_limit_and_cursor() {
        let ch = channel(1..=250);
        let batch = fetch_batch(&ch, CHANNEL, Some(200), 120).await.unwrap();
        assert_eq!(batch.len(), 120);
        assert_eq!(batch[0].id, 199);
        assert_eq!(batch[119].id, 80);
    }

    #[tokio::test]
    async fn test_window_backwards_without_lower_bound() {
        let ch = channel(1..=150);
        let ids: Vec<u64> = window(&ch, CHANNEL, None, Some(120))
            .map_ok(|m| m.id)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ids, (1..120).rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_window_forwards_between_bounds() {
        let ch = channel(1..=400);
        let ids: Vec<u64> = window(&ch, CHANNEL, Some(10), Some(260))
            .map_ok(|m| m.id)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ids, (11..260).collect::<Vec<_>>());
        // stopped as soon as the upper bound showed up
        assert_eq!(
            ch.requests(),
            vec![Cursor::After(10), Cursor::After(110), Cursor::After(210)]
        );
    }

    #[tokio::test]
    async fn test_window_is_lazy() {
        let ch = channel(1..=400);
        let first: Vec<u64> = {
            let s = window(&ch, CHANNEL, None, None);
            futures_util::pin_mut!(s);
            let mut out = vec![];
            while let Some(m) = s.try_next().await.unwrap() {
                out.push(m.id);
                if out.len() == 3 {
                    break;
                }
            }
            out
        };
        assert_eq!(first, vec![400, 399, 398]);
        assert_eq!(ch.requests(), vec![Cursor::Latest]);
    }

    #[tokio::test]
    async fn test_window_on_empty_channel() {
        let ch = channel([]);
        let ids: Vec<u64> = window(&ch, CHANNEL, Some(5), None)
            .map_ok(|m| m.id)
            .try_collect()
            .await
            .unwrap();
        assert!(ids.is_empty());
    }
}
