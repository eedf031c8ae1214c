use sqlx::FromRow;

use crate::db::{Db, StoreError, from_sql_id, to_sql_id};

/// Ranking every guild starts with.
pub const DEFAULT_RANKING: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRecord {
    /// Surrogate key, assigned on insert and never reused.
    pub internal_id: i64,
    pub guild_id: u64,
    pub ranking: i64,
}

#[derive(FromRow)]
struct GuildRow {
    internal_id: i64,
    guild_id: i64,
    ranking: i64,
}

impl From<GuildRow> for GuildRecord {
    fn from(row: GuildRow) -> Self {
        Self {
            internal_id: row.internal_id,
            guild_id: from_sql_id(row.guild_id),
            ranking: row.ranking,
        }
    }
}

const SELECT_GUILD: &str = r#"
    SELECT internal_id, guild_id, ranking
    FROM guilds WHERE guild_id = ?
    ORDER BY internal_id ASC
    LIMIT 1
"#;

#[derive(Clone)]
pub struct GuildsRepo<'a> {
    db: &'a Db,
}

impl<'a> GuildsRepo<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Return the record for `guild_id`, inserting one with default attributes
    /// if none exists. The row is committed before this returns.
    pub async fn get_or_create(&self, guild_id: u64) -> Result<GuildRecord, StoreError> {
        let mut tx = self.db.pool.begin().await?;
        let created = sqlx::query(
            r#"INSERT INTO guilds (guild_id, ranking) VALUES (?, ?) ON CONFLICT(guild_id) DO NOTHING"#,
        )
        .bind(to_sql_id(guild_id))
        .bind(DEFAULT_RANKING)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        let row = sqlx::query_as::<_, GuildRow>(SELECT_GUILD)
            .bind(to_sql_id(guild_id))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        if created {
            tracing::info!("Created guild record {} for guild {}", row.internal_id, guild_id);
        }
        Ok(row.into())
    }

    pub async fn get(&self, guild_id: u64) -> Result<Option<GuildRecord>, StoreError> {
        let row = sqlx::query_as::<_, GuildRow>(SELECT_GUILD)
            .bind(to_sql_id(guild_id))
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Creates the record first if the guild has never been seen.
    pub async fn set_ranking(&self, guild_id: u64, ranking: i64) -> Result<GuildRecord, StoreError> {
        let mut tx = self.db.pool.begin().await?;
        let row = sqlx::query_as::<_, GuildRow>(
            r#"
            INSERT INTO guilds (guild_id, ranking) VALUES (?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET ranking = excluded.ranking
            RETURNING internal_id, guild_id, ranking
            "#,
        )
        .bind(to_sql_id(guild_id))
        .bind(ranking)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    /// Returns whether a record was removed.
    pub async fn delete(&self, guild_id: u64) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM guilds WHERE guild_id = ?")
            .bind(to_sql_id(guild_id))
            .execute(&self.db.pool)
            .await?;
        if res.rows_affected() > 0 {
            tracing::info!("Removed guild record for guild {}", guild_id);
        }
        Ok(res.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM guilds")
            .fetch_one(&self.db.pool)
            .await?;
        Ok(n)
    }
}
