use crate::CurationBot;
use poise::serenity_prelude::{ActivityData, Context, FullEvent};
use poise::FrameworkContext;
use tracing::{info, instrument};

#[instrument(skip_all)]
pub async fn handle(
    ctx: &Context,
    evt: &FullEvent,
    _framework: FrameworkContext<'_, CurationBot, anyhow::Error>,
) -> anyhow::Result<()> {
    match evt {
        FullEvent::Ready { data_about_bot } => {
            info!(
                "And {} v{} takes the stage!",
                data_about_bot.user.name,
                env!("CARGO_PKG_VERSION")
            );
            ctx.set_activity(Some(ActivityData::watching(format!(
                "for pending fixes! (v{})",
                env!("CARGO_PKG_VERSION")
            ))));
        }
        _ => {}
    }
    Ok(())
}
