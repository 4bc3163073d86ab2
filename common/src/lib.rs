use chrono::{DateTime, Utc};
use serde::Deserialize;

pub mod access;
pub mod fixes;

pub use access::{Access, Role, UtilityCommand};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// A message as seen while scanning channel history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryMessage {
    /// snowflake of the message
    pub id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    /// link back to the message, used in replies and logs
    pub jump_url: String,
    pub attachments: Vec<HistoryAttachment>,
    pub reactions: Vec<HistoryReaction>,
}

impl HistoryMessage {
    /// Does any reaction on this message use `emoji`?
    pub fn has_reaction(&self, emoji: &str) -> bool {
        self.reactions.iter().any(|r| emoji_matches(&r.emoji, emoji))
    }
    /// The only attachment of this message, if it has exactly one.
    pub fn single_attachment(&self) -> Option<&HistoryAttachment> {
        match self.attachments.as_slice() {
            [a] => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryAttachment {
    pub filename: String,
    /// size in bytes
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryReaction {
    pub emoji: String,
    pub count: u64,
    /// did the bot itself react with this?
    pub me: bool,
}

/// Compare two unicode emoji, ignoring the emoji presentation selector (U+FE0F).
/// The chat platform is not consistent about sending it back.
pub fn emoji_matches(a: &str, b: &str) -> bool {
    a.chars()
        .filter(|c| *c != '\u{FE0F}')
        .eq(b.chars().filter(|c| *c != '\u{FE0F}'))
}

/// Strip the characters people tend to wrap launch commands in, so `"http://a b"`
/// and `http://ab` compare equal.
pub fn normalize_launch_command(launch_command: &str) -> String {
    launch_command
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | ' ' | '`'))
        .collect()
}

/// How the harvester decides which attachments to pick up.
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Eligibility {
    /// every extension has to pass the marker and size checks
    #[default]
    Uniform,
    /// `.json` and `.zip` skip the marker and size checks, only `.7z` is checked.
    /// This is how the old cog behaved.
    Legacy,
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::{
        emoji_matches, normalize_launch_command, Eligibility, HistoryAttachment, HistoryMessage,
        HistoryReaction,
    };

    fn attachment(filename: &str) -> HistoryAttachment {
        HistoryAttachment {
            filename: filename.to_string(),
            size: 1,
            url: format!("https://cdn.test/{}", filename),
        }
    }

    #[test]
    fn test_history_message_helpers() {
        let mut msg = HistoryMessage {
            id: 1,
            channel_id: 2,
            guild_id: Some(3),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            jump_url: "https://discord.com/channels/3/2/1".to_string(),
            attachments: vec![attachment("a.json")],
            reactions: vec![HistoryReaction {
                emoji: "⚠".to_string(),
                count: 1,
                me: false,
            }],
        };
        assert!(msg.has_reaction("⚠️"));
        assert!(!msg.has_reaction("🛠️"));
        assert_eq!(msg.single_attachment().map(|a| a.filename.as_str()), Some("a.json"));
        msg.attachments.push(attachment("b.json"));
        assert_eq!(msg.single_attachment(), None);
        msg.attachments.clear();
        assert_eq!(msg.single_attachment(), None);
    }

    #[test]
    fn test_normalize_launch_command() {
        assert_eq!(
            normalize_launch_command("\"http://example.com/game one.swf\""),
            "http://example.com/gameone.swf"
        );
        assert_eq!(normalize_launch_command("`a' b`"), "ab");
        assert_eq!(normalize_launch_command(""), "");
    }

    #[test]
    fn test_emoji_matches_ignores_variation_selector() {
        assert!(emoji_matches("🛠️", "🛠"));
        assert!(emoji_matches("⚠", "⚠️"));
        assert!(!emoji_matches("⚠️", "🛠️"));
    }

    #[test]
    fn test_eligibility_deserializes_lowercase() {
        #[derive(serde::Deserialize)]
        struct Wrap {
            rule: Eligibility,
        }
        let w: Wrap = toml::from_str("rule = \"legacy\"").unwrap();
        assert_eq!(w.rule, Eligibility::Legacy);
    }
}
