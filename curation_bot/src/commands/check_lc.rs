use tracing::debug;

/// Check if a given launch command is already in the master database.
#[poise::command(prefix_command, slash_command, rename = "check-lc")]
pub async fn check_lc(
    ctx: crate::Context<'_>,
    #[rest]
    #[description = "Launch command to look for"]
    launch_command: Option<String>,
) -> anyhow::Result<()> {
    debug!(
        "check_lc command invoked from {} in channel {}",
        ctx.author().id,
        ctx.channel_id()
    );
    let launch_command = launch_command.unwrap_or_default();
    let found = ctx.data().db.has_launch_command(&launch_command).await?;
    if found {
        ctx.say("Launch command **found** in the master database, most likely a duplicate.")
            .await?;
    } else {
        ctx.say("Launch command **not found** in the master database, most likely not a duplicate.")
            .await?;
    }
    Ok(())
}
