use anyhow::Result;
use poise::serenity_prelude as serenity;

use crate::repos::{OsuMode, UserRecord};
use crate::state::Ctx;

/// `/osu` parent command.
#[poise::command(slash_command, subcommands("osu_set", "osu_profile", "osu_unlink", "osu_forget"))]
pub async fn osu(_: Ctx<'_>) -> Result<()> {
    Ok(())
}

/// Link your osu! account.
#[poise::command(slash_command, ephemeral, rename = "set")]
pub async fn osu_set(
    ctx: Ctx<'_>,
    #[description = "osu! username"]
    #[max_length = 32]
    username: String,
    #[description = "Default game mode"] mode: OsuMode,
) -> Result<()> {
    if username.trim().is_empty() {
        ctx.say("The username can't be blank.").await?;
        return Ok(());
    }

    let rec = ctx
        .data()
        .users()
        .set_osu_profile(ctx.author().id.get(), &username, mode)
        .await?;
    ctx.say(format!(
        "Linked **{}** ({}).",
        rec.osu_username.as_deref().unwrap_or_default(),
        mode.as_str()
    ))
    .await?;
    Ok(())
}

/// Show the osu! account linked to a user.
#[poise::command(slash_command, rename = "profile")]
pub async fn osu_profile(
    ctx: Ctx<'_>,
    #[description = "User to look up (defaults to you)"] user: Option<serenity::User>,
) -> Result<()> {
    let user = user.as_ref().unwrap_or_else(|| ctx.author());
    let rec = ctx.data().users().get_or_create(user.id.get()).await?;

    match profile_line(&rec) {
        Some(line) => {
            let embed = serenity::CreateEmbed::new()
                .title(format!("osu! profile of {}", user.tag()))
                .thumbnail(user.face())
                .description(line);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        None => {
            ctx.say(format!("{} has not linked an osu! account.", user.tag()))
                .await?;
        }
    }
    Ok(())
}

/// Unlink your osu! account. Shards are kept.
#[poise::command(slash_command, ephemeral, rename = "unlink")]
pub async fn osu_unlink(ctx: Ctx<'_>) -> Result<()> {
    let users = ctx.data().users();
    let uid = ctx.author().id.get();

    match users.get(uid).await? {
        Some(rec) if rec.osu_username.is_some() => {
            users.clear_osu_profile(uid).await?;
            ctx.say("Your osu! account is no longer linked.").await?;
        }
        _ => {
            ctx.say("You have no linked osu! account.").await?;
        }
    }
    Ok(())
}

/// Delete everything the bot stores about you (osu! link and shards).
#[poise::command(slash_command, ephemeral, rename = "forget")]
pub async fn osu_forget(ctx: Ctx<'_>) -> Result<()> {
    let uid = ctx.author().id.get();

    if ctx.data().users().delete(uid).await? {
        tracing::info!("Removed user record for user {}", uid);
        ctx.say("Your stored profile has been removed.").await?;
    } else {
        ctx.say("Nothing is stored for you.").await?;
    }
    Ok(())
}

fn profile_line(rec: &UserRecord) -> Option<String> {
    let name = rec.osu_username.as_deref()?;
    let mode = rec.osu_mode.unwrap_or(OsuMode::Osu).as_str();
    Some(format!(
        "[{name}](https://osu.ppy.sh/users/{name}/{mode}) ({mode})"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: Option<&str>, mode: Option<OsuMode>) -> UserRecord {
        UserRecord {
            internal_id: 1,
            user_id: 2,
            shards: None,
            osu_mode: mode,
            osu_username: name.map(str::to_owned),
        }
    }

    #[test]
    fn unlinked_users_have_no_profile_line() {
        assert_eq!(profile_line(&user(None, Some(OsuMode::Taiko))), None);
    }

    #[test]
    fn profile_line_falls_back_to_standard_mode() {
        let line = profile_line(&user(Some("peppy"), None)).unwrap();
        assert!(line.contains("https://osu.ppy.sh/users/peppy/osu"), "{line}");
    }
}
