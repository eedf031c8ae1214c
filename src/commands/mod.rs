use anyhow::Result;
use serenity::all::GuildId;

use crate::state::Ctx;

pub mod guild;
pub mod osu;
pub mod shards;

/// Current guild, or a polite refusal when invoked outside one.
pub async fn guild_or_reply(ctx: Ctx<'_>) -> Result<Option<GuildId>> {
    match ctx.guild_id() {
        Some(gid) => Ok(Some(gid)),
        None => {
            ctx.say("Use this command in a server channel.").await?;
            Ok(None)
        }
    }
}
