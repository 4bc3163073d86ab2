use std::path::PathBuf;
use std::sync::Arc;
mod commands;
use anyhow::Context as _;
use async_shutdown::ShutdownManager;
use curation_bot::backlog::BacklogConfig;
use curation_bot::flight::SingleFlight;
use curation_bot::harvest::HarvestConfig;
use curation_bot::package::DeliveryConfig;
use database::Database;
use poise::serenity_prelude::{ChannelId, Client, GuildId, UserId};
use poise::{CreateReply, FrameworkError, PrefixFrameworkOptions};
use poise::{Framework, FrameworkOptions};
use serde::Deserialize;
use tracing::info;
mod event;
#[derive(Deserialize, Clone)]
pub struct Config {
    main: MainConfig,
    discord: DiscordConfig,
    master: MasterConfig,
    backlog: BacklogConfig,
    harvest: HarvestConfig,
    delivery: DeliveryConfig,
}
#[derive(Deserialize, Clone)]
pub struct MainConfig {
    token: String,
    prefix: String,
}
#[derive(Deserialize, Clone)]
pub struct DiscordConfig {
    pending_fixes: ChannelId,
    debug_guild: Option<GuildId>,
    #[serde(default)]
    bot_guys: Vec<UserId>,
}
#[derive(Deserialize, Clone)]
pub struct MasterConfig {
    database: PathBuf,
}

pub const DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

fn load_or_create_config() -> anyhow::Result<Config> {
    let config_path = PathBuf::from("config.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, DEFAULT_CONFIG).context("Failed to create default config")?;
    }
    let config_file =
        String::from_utf8(std::fs::read(config_path).context("failed to read config file")?)
            .context("config file is not utf8!")?;
    toml::from_str(&config_file).context("Failed to parse config file")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    color_backtrace::install();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    info!("Hello, world!");
    // load config
    let config = load_or_create_config()?;
    let shutdown = ShutdownManager::new();
    // validate token
    poise::serenity_prelude::validate_token(&config.main.token).context("Invalid token")?;

    setup_control_c(shutdown.clone());

    let db = Database::open(&config.master.database)
        .await
        .context("failed to open the master database")?;
    bot(config, db, shutdown.clone()).await?;

    let reason = shutdown.wait_shutdown_triggered().await;
    info!("Shutting down: {:?}", reason);

    let _ = shutdown.wait_shutdown_complete().await;
    info!("Goodbye!");
    Ok(())
}

fn setup_control_c(s: ShutdownManager<&'static str>) {
    tokio::task::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            return;
        }
        let _ = s.trigger_shutdown("ctrl-c");
    });
}

pub type Context<'a> = poise::Context<'a, CurationBot, anyhow::Error>;

pub struct CurationBot {
    pub config: Config,
    pub db: Arc<Database>,
    /// for attachment downloads and uploads
    pub http: reqwest::Client,
    /// one harvest at a time
    pub harvesting: SingleFlight,
    /// one backlog count at a time
    pub counting: SingleFlight,
    pub shutdown: ShutdownManager<&'static str>,
}

impl Clone for CurationBot {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: Arc::clone(&self.db),
            http: self.http.clone(),
            harvesting: self.harvesting.clone(),
            counting: self.counting.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

async fn bot(config: Config, db: Database, s: ShutdownManager<&'static str>) -> anyhow::Result<()> {
    let framework_shutdown = s.clone();
    use poise::serenity_prelude::GatewayIntents;
    let prefix = config.main.prefix.clone();
    let client = Client::builder(
        &config.main.token,
        GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT,
    )
    .framework(Framework::new(
        FrameworkOptions {
            commands: commands::commands(),
            prefix_options: PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            event_handler: |ctx, evt, framework, _| {
                Box::pin(async move {
                    if let Err(e) = event::handle(ctx, evt, framework).await {
                        tracing::error!("Error handling event ({:?}): {:?}", evt, e);
                        return Err(e);
                    }
                    Ok(())
                })
            },
            initialize_owners: true,
            skip_checks_for_owners: true,
            on_error: |error| {
                Box::pin(async move {
                    if let FrameworkError::Command { ctx, error, .. } = error {
                        tracing::error!("Error in command {}: {:#}", ctx.command().name, error);
                        if let Err(e) = ctx
                            .send(
                                CreateReply::default()
                                    .content(format!("Something went wrong: {}", error))
                                    .ephemeral(true),
                            )
                            .await
                        {
                            tracing::error!("Error while handling error: {}", e);
                        }
                    } else if let Err(e) = poise::builtins::on_error(error).await {
                        tracing::error!("Error while handling error: {}", e);
                    }
                })
            },
            ..Default::default()
        },
        |ctx, _ready, framework: &Framework<CurationBot, anyhow::Error>| {
            Box::pin(async move {
                #[cfg(debug_assertions)]
                poise::builtins::register_in_guild(
                    ctx,
                    &framework.options().commands,
                    config
                        .discord
                        .debug_guild
                        .context("No debug guild in debug mode!")?,
                )
                .await?;
                #[cfg(not(debug_assertions))]
                poise::builtins::register_globally(ctx, &framework.options().commands)
                    .await
                    .context("failed to register commands")?;
                let bot = CurationBot {
                    config,
                    db: Arc::new(db),
                    http: reqwest::Client::new(),
                    harvesting: SingleFlight::new(),
                    counting: SingleFlight::new(),
                    shutdown: framework_shutdown,
                };
                Ok(bot)
            })
        },
    ))
    .await?;
    let client_shutdowner = s.clone();
    let client_wait_shutdowner = s.clone();
    let shard_man = client.shard_manager.clone();
    tokio::task::spawn(
        client_wait_shutdowner
            .wrap_delay_shutdown(async move {
                let _ = client_shutdowner.wait_shutdown_triggered().await;
                info!("Shutting down client");
                let _ = shard_man.shutdown_all().await;
                info!("Client shut down");
            })
            .expect("not already shutting down"),
    );
    tokio::task::spawn(async move {
        let mut client = client;

        if let Err(e) = client.start_autosharded().await {
            tracing::error!("Client error: {:?}", e);
        }
        let _ = s.trigger_shutdown("Client shutdown");
    });
    Ok(())
}
