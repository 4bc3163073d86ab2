use std::path::Path;

use anyhow::anyhow;
use chrono::Local;
use curation_bot::harvest::harvest;
use curation_bot::history::{from_serenity, SerenityChannels};
use curation_bot::package::{bundle, upload};
use poise::serenity_prelude::{self as serenity, CreateAttachment, GuildChannel, Message};
use poise::CreateReply;
use tracing::{debug, info, warn};

/// Get all fixes in #pending-fixes not marked with a ⚠️ either before a message if
/// specified or up to now, and after the pin (Moderator only).
#[poise::command(prefix_command, slash_command, rename = "get-fixes")]
pub async fn get_fixes(
    ctx: crate::Context<'_>,
    #[description = "Only fixes posted before this message"] last_message: Option<Message>,
    #[description = "Channel to look in instead of #pending-fixes"] channel: Option<GuildChannel>,
    #[description = "Skip the chat and upload straight away"] upload_only: Option<bool>,
) -> anyhow::Result<()> {
    debug!(
        "pending fixes command invoked from {} in channel {}",
        ctx.author().id,
        ctx.channel_id()
    );
    let Some(_boarding) = ctx.data().harvesting.try_begin() else {
        ctx.say("Already getting fixes, try again once that's done.").await?;
        return Ok(());
    };
    // don't let a shutdown cut us off before the temp folders are cleaned up
    let _delay = ctx
        .data()
        .shutdown
        .delay_shutdown_token()
        .map_err(|_| anyhow!("shutting down"))?;

    let channel_id = channel
        .map(|c| c.id)
        .unwrap_or(ctx.data().config.discord.pending_fixes);
    ctx.defer_or_broadcast().await?;
    match &last_message {
        Some(m) => {
            ctx.say(format!(
                "Getting all fixes in <#{}> not marked with a ⚠️ before <{}> and after the pin. \
                 Sit back and relax, this will take a while 🦀.",
                channel_id,
                m.link()
            ))
            .await?
        }
        None => {
            ctx.say(format!(
                "Getting all fixes in <#{}> not marked with a ⚠️ since the pin. \
                 Sit back and relax, this will take a while 🦀.",
                channel_id
            ))
            .await?
        }
    };

    let source = SerenityChannels::new(ctx.serenity_context().http.clone(), ctx.data().http.clone());
    let newest = last_message.as_ref().map(from_serenity);
    let fixes = harvest(
        &source,
        channel_id.get(),
        newest.as_ref(),
        Local::now().date_naive(),
        &ctx.data().config.harvest,
    )
    .await?;
    info!(
        "harvested {} files ({} archives discarded) from {} messages",
        fixes.downloaded, fixes.discarded, fixes.scanned
    );
    let bundled = bundle(&fixes).await?;

    debug!("Sending fetched pending fixes");
    if upload_only.unwrap_or(false) {
        upload_and_report(ctx, &bundled.path).await?;
    } else {
        let reply = CreateReply::default().attachment(CreateAttachment::path(&bundled.path).await?);
        match ctx.send(reply).await {
            Ok(_) => {}
            Err(serenity::Error::Http(e)) => {
                warn!("couldn't send pending fixes inline: {}", e);
                ctx.say("Resulting file too large, uploading it instead.")
                    .await?;
                upload_and_report(ctx, &bundled.path).await?;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn upload_and_report(ctx: crate::Context<'_>, path: &Path) -> anyhow::Result<()> {
    let location = upload(&ctx.data().http, &ctx.data().config.delivery.upload_url, path).await?;
    ctx.say(format!("uploaded to {}", location)).await?;
    Ok(())
}
