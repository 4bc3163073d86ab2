use poise::serenity_prelude::Message;
use tracing::debug;

/// Pin a message by url (Staff only).
#[poise::command(prefix_command, slash_command)]
pub async fn pin(
    ctx: crate::Context<'_>,
    #[description = "Link to the message to pin"] message: Message,
) -> anyhow::Result<()> {
    debug!(
        "pin command invoked from {} in channel {} for {}",
        ctx.author().id,
        ctx.channel_id(),
        message.id
    );
    message.pin(ctx).await?;
    if ctx.prefix() == "/" {
        ctx.say("Pinned!").await?;
    }
    Ok(())
}

/// Unpin a message by url (Staff only).
#[poise::command(prefix_command, slash_command)]
pub async fn unpin(
    ctx: crate::Context<'_>,
    #[description = "Link to the message to unpin"] message: Message,
) -> anyhow::Result<()> {
    debug!(
        "unpin command invoked from {} in channel {} for {}",
        ctx.author().id,
        ctx.channel_id(),
        message.id
    );
    message.unpin(ctx).await?;
    ctx.say("Unpinned!").await?;
    Ok(())
}
