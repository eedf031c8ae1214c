use std::sync::Arc;

use anyhow::Result;
use poise::FrameworkContext;
use poise::serenity_prelude as serenity;
use serenity::all::{GuildId, UnavailableGuild};
use serenity::prelude::Context;

use crate::state::AppState;

pub async fn event_handler(
    _ctx: &Context,
    event: &serenity::FullEvent,
    _framework: FrameworkContext<'_, Arc<AppState>, anyhow::Error>,
    state: &Arc<AppState>,
) -> Result<()> {
    use serenity::FullEvent::*;
    match event {
        Ready { data_about_bot } => handle_ready(state, data_about_bot).await?,
        GuildCreate { guild, is_new } => on_guild_create(state, guild.id, *is_new).await?,
        GuildDelete { incomplete, .. } => on_guild_delete(state, incomplete).await?,
        _ => {}
    }
    Ok(())
}

pub async fn handle_ready(state: &AppState, ready: &serenity::Ready) -> Result<()> {
    tracing::info!("Connected as {}", ready.user.name);

    let guild_ids: Vec<GuildId> = ready.guilds.iter().map(|g| g.id).collect();
    ensure_guild_records(state, guild_ids).await;
    Ok(())
}

/// Make sure every listed guild has a record, then report how many are stored.
/// Failures are logged per guild; `None` means the total could not be read.
async fn ensure_guild_records(
    state: &AppState,
    guilds: impl IntoIterator<Item = GuildId>,
) -> Option<i64> {
    let repo = state.guilds();
    for gid in guilds {
        repo.get_or_create(gid.get())
            .await
            .map_err(|e| tracing::warn!("Failed to load record for guild {}: {}", gid, e))
            .ok();
    }
    repo.count()
        .await
        .inspect(|n| tracing::info!("{} guild records on file", n))
        .map_err(|e| tracing::warn!("Failed to count guild records: {}", e))
        .ok()
}

/// `is_new` is only set for guilds joined after startup.
async fn on_guild_create(state: &AppState, guild_id: GuildId, is_new: Option<bool>) -> Result<()> {
    if is_new.unwrap_or(false) {
        tracing::info!("Joined guild {}", guild_id);
        state.guilds().get_or_create(guild_id.get()).await?;
    }
    Ok(())
}

/// Outages also arrive as deletes; only a real removal drops the record.
async fn on_guild_delete(state: &AppState, guild: &UnavailableGuild) -> Result<()> {
    if guild.unavailable {
        tracing::warn!("Guild {} became unavailable", guild.id);
        return Ok(());
    }
    tracing::info!("Removed from guild {}", guild.id);
    state.guilds().delete(guild.id.get()).await?;
    Ok(())
}
