use anyhow::Result;
use poise::serenity_prelude as serenity;

use crate::db::StoreError;
use crate::state::Ctx;

#[poise::command(slash_command, subcommands("shards_balance", "shards_grant"))]
pub async fn shards(_: Ctx<'_>) -> Result<()> {
    Ok(())
}

/// Show a user's shard balance.
#[poise::command(slash_command, rename = "balance")]
pub async fn shards_balance(
    ctx: Ctx<'_>,
    #[description = "User to look up (defaults to you)"] user: Option<serenity::User>,
) -> Result<()> {
    let user = user.as_ref().unwrap_or_else(|| ctx.author());
    let balance = ctx
        .data()
        .users()
        .get(user.id.get())
        .await?
        .map(|rec| rec.shard_balance())
        .unwrap_or(0);

    ctx.say(format!("{} has **{balance}** shards.", user.tag()))
        .await?;
    Ok(())
}

/// Add (or with a negative amount, remove) shards. Bot owners only.
#[poise::command(slash_command, ephemeral, owners_only, rename = "grant")]
pub async fn shards_grant(
    ctx: Ctx<'_>,
    #[description = "Recipient"] user: serenity::User,
    #[description = "Shards to add; negative to remove"] amount: i64,
) -> Result<()> {
    let rec = match ctx.data().users().add_shards(user.id.get(), amount).await {
        Ok(rec) => rec,
        Err(StoreError::OutOfRange(_)) => {
            ctx.say(format!("That would take {}'s balance out of range.", user.tag()))
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(
        "{} granted {} shards to {} (balance {})",
        ctx.author().id,
        amount,
        user.id,
        rec.shard_balance()
    );
    ctx.say(format!(
        "{} now has **{}** shards.",
        user.tag(),
        rec.shard_balance()
    ))
    .await?;
    Ok(())
}
