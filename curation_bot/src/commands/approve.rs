use poise::serenity_prelude::Message;
use tracing::debug;

/// Override the bot's decision and approve the curation (Moderator only).
#[poise::command(prefix_command, slash_command)]
pub async fn approve(
    ctx: crate::Context<'_>,
    #[description = "Link to the curation message"] message: Message,
) -> anyhow::Result<()> {
    debug!(
        "approve command invoked from {} in channel {} for {}",
        ctx.author().id,
        ctx.channel_id(),
        message.id
    );
    curation_bot::approve_message(&ctx, &message).await?;
    if ctx.prefix() == "/" {
        ctx.say(format!("Approved {}", message.link())).await?;
    }
    Ok(())
}
