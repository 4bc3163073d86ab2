use std::str::FromStr;

use anyhow::Context;
use common::{Access, Role, UtilityCommand};

mod approve;
mod check_lc;
mod get_fixes;
mod hell;
mod mood;
mod pin;
mod ping;
pub fn commands() -> Vec<poise::Command<crate::CurationBot, anyhow::Error>> {
    vec![
        check_lc::check_lc(),
        ping::ping(),
        approve::approve(),
        pin::pin(),
        pin::unpin(),
        get_fixes::get_fixes(),
        hell::hell(),
        mood::mood(),
    ]
    .into_iter()
    .map(|mut i| {
        i.guild_only = UtilityCommand::from_str(&i.name)
            .map(|c| c.access() != Access::Everyone)
            .unwrap_or(true);
        i.checks.push(|ctx: crate::Context| Box::pin(async move {
            check_access(ctx).await
        }));
        i
    })
    .collect()
}

async fn check_access(ctx: crate::Context<'_>) -> anyhow::Result<bool> {
    let command: UtilityCommand = ctx.command().name.parse()?;
    let access = command.access();
    if access == Access::Everyone {
        return Ok(true);
    }
    let bot_guy = ctx.data().config.discord.bot_guys.contains(&ctx.author().id);
    let roles: Vec<Role> = ctx
        .author_member()
        .await
        .context("not in a guild")?
        .roles
        .iter()
        .filter_map(|role| role.to_role_cached(ctx))
        .filter_map(|role| role.name.parse().ok())
        .collect();
    Ok(access.permits(&roles, bot_guy))
}
