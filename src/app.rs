use anyhow::{Context as AnyhowContext, Result};
use poise::Framework;
use serenity::all::{ClientBuilder, GatewayIntents};
use tracing_subscriber::EnvFilter;

use crate::commands::{guild, osu, shards};
use crate::config::Config;
use crate::events::event_handler;
use crate::state::AppState;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::from_env()?;
    let dev_guild = cfg.dev_guild;
    let db_cfg = cfg.db.clone();

    // Guild lifecycle events only; commands arrive as interactions.
    let intents = GatewayIntents::GUILDS;

    let framework = Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![guild::guild(), osu::osu(), shards::shards()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                let commands = &framework.options().commands;
                match dev_guild {
                    Some(gid) => {
                        poise::builtins::register_in_guild(ctx, commands, gid).await?;
                        tracing::info!("Registered {} commands in guild {}", commands.len(), gid);
                    }
                    None => {
                        poise::builtins::register_globally(ctx, commands).await?;
                        tracing::info!("Registered {} commands globally", commands.len());
                    }
                }
                AppState::new(&db_cfg).await
            })
        })
        .build();

    let mut client = ClientBuilder::new(&cfg.discord_token, intents)
        .framework(framework)
        .await
        .context("Failed to build Discord client")?;

    client.start().await.context("Discord client stopped")?;
    Ok(())
}
