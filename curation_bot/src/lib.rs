//! Moderator utilities for the curation server: pending fix harvesting, the review
//! backlog counter, and the plumbing they share with the bot's commands.
pub mod archive;
pub mod backlog;
pub mod flight;
pub mod harvest;
pub mod history;
pub mod package;

use poise::serenity_prelude::{CacheHttp, Message, ReactionType};
use tracing::debug;

/// What moderators react with to wave a curation through.
pub const APPROVED: &str = "🤖";

/// Take back every reaction the bot left on `message` and mark it approved instead.
pub async fn approve_message(ctx: &impl CacheHttp, message: &Message) -> anyhow::Result<()> {
    for reaction in message.reactions.iter().filter(|r| r.me) {
        debug!(
            "removing bot's reaction {} from message {}",
            reaction.reaction_type, message.id
        );
        message
            .delete_reaction(ctx.http(), None, reaction.reaction_type.clone())
            .await?;
    }
    message
        .react(ctx, ReactionType::Unicode(APPROVED.to_string()))
        .await?;
    Ok(())
}
