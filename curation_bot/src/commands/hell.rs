use curation_bot::backlog::count_backlog;
use curation_bot::history::SerenityChannels;
use poise::serenity_prelude::ChannelId;
use tracing::{debug, info};

#[derive(Debug, poise::ChoiceParameter)]
enum Backlog {
    #[name = "flash"]
    Flash,
    #[name = "other"]
    Other,
    #[name = "animation"]
    Animation,
}

impl Backlog {
    fn alias(&self) -> &'static str {
        match self {
            Backlog::Flash => "flash",
            Backlog::Other => "other",
            Backlog::Animation => "animation",
        }
    }
}

/// Counts how many messages are still waiting for the reviewer, measured by looking
/// for their marker reaction.
#[poise::command(prefix_command, slash_command, hide_in_help)]
pub async fn hell(
    ctx: crate::Context<'_>,
    #[description = "Which submission channel"] channel_alias: Backlog,
) -> anyhow::Result<()> {
    debug!(
        "hell command invoked from {} in channel {}",
        ctx.author().id,
        ctx.channel_id()
    );
    let Some(_boarding) = ctx.data().counting.try_begin() else {
        ctx.say("Already counting, try again once that's done.").await?;
        return Ok(());
    };
    let config = &ctx.data().config.backlog;
    let channel: ChannelId = match channel_alias {
        Backlog::Flash => config.flash,
        Backlog::Other => config.other,
        Backlog::Animation => config.animation,
    };
    let alias = channel_alias.alias();

    ctx.say(format!(
        "Measuring the length of {}'s curation journey through hell. \
         Sit back and relax, this will take a while 🦀.",
        config.reviewer_name
    ))
    .await?;

    let source = SerenityChannels::new(ctx.serenity_context().http.clone(), ctx.data().http.clone());
    let messages = count_backlog(&source, channel.get(), config).await?;
    info!("backlog in {} is {} messages long", alias, messages.len());
    match messages.last() {
        Some(last) => {
            ctx.say(format!(
                "{}'s curation journey in `{}` channel is `{}` messages long.\n🔗 {}",
                config.reviewer_name,
                alias,
                messages.len(),
                last.jump_url
            ))
            .await?;
        }
        None => {
            ctx.say(format!(
                "{} has earned their freedom... for now.",
                config.reviewer_name
            ))
            .await?;
        }
    }
    Ok(())
}
