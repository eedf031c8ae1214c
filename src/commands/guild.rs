use anyhow::Result;
use poise::serenity_prelude as serenity;

use crate::commands::guild_or_reply;
use crate::repos::GuildRecord;
use crate::state::Ctx;

/// `/guild` parent command. All real work happens in the subcommands.
#[poise::command(
    slash_command,
    guild_only,
    subcommands("guild_info", "guild_ranking")
)]
pub async fn guild(_: Ctx<'_>) -> Result<()> {
    Ok(())
}

/// Show what the bot has stored for this server.
#[poise::command(slash_command, guild_only, ephemeral, rename = "info")]
pub async fn guild_info(ctx: Ctx<'_>) -> Result<()> {
    let Some(gid) = guild_or_reply(ctx).await? else {
        return Ok(());
    };

    let repo = ctx.data().guilds();
    let (rec, first_seen) = match repo.get(gid.get()).await? {
        Some(rec) => (rec, false),
        None => (repo.get_or_create(gid.get()).await?, true),
    };

    let mut embed = record_embed(&rec);
    if first_seen {
        embed = embed.footer(serenity::CreateEmbedFooter::new(
            "This server was not stored yet; a record was created just now.",
        ));
    }
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Set this server's ranking.
#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    rename = "ranking",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn guild_ranking(
    ctx: Ctx<'_>,
    #[description = "New ranking"]
    #[min = 1]
    value: i64,
) -> Result<()> {
    let Some(gid) = guild_or_reply(ctx).await? else {
        return Ok(());
    };

    let rec = ctx.data().guilds().set_ranking(gid.get(), value).await?;
    tracing::info!(
        "Guild {} ranking set to {} by {}",
        gid,
        rec.ranking,
        ctx.author().id
    );
    ctx.say(format!("Ranking is now **{}**.", rec.ranking))
        .await?;
    Ok(())
}

fn record_embed(rec: &GuildRecord) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Server record")
        .field("Guild ID", rec.guild_id.to_string(), true)
        .field("Record #", rec.internal_id.to_string(), true)
        .field("Ranking", rec.ranking.to_string(), true)
}
