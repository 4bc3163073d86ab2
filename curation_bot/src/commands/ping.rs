use tracing::debug;

/// Ping? Pong!
#[poise::command(prefix_command, slash_command, hide_in_help)]
pub async fn ping(ctx: crate::Context<'_>) -> anyhow::Result<()> {
    debug!(
        "received ping from {} in channel {}",
        ctx.author().id,
        ctx.channel_id()
    );
    ctx.say("pong").await?;
    Ok(())
}
