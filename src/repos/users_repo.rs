use std::str::FromStr;

use sqlx::sqlite::SqliteConnection;
use sqlx::FromRow;

use crate::db::{Db, StoreError, from_sql_id, to_sql_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum OsuMode {
    #[name = "osu"]
    Osu,
    #[name = "taiko"]
    Taiko,
    #[name = "fruits"]
    Fruits,
    #[name = "mania"]
    Mania,
}

impl OsuMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Osu => "osu",
            Self::Taiko => "taiko",
            Self::Fruits => "fruits",
            Self::Mania => "mania",
        }
    }
}

impl FromStr for OsuMode {
    type Err = ();

    /// Older rows were written title-cased ("Taiko"), so case is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "osu" | "std" | "standard" => Ok(Self::Osu),
            "taiko" => Ok(Self::Taiko),
            "fruits" | "ctb" | "catch" => Ok(Self::Fruits),
            "mania" => Ok(Self::Mania),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub internal_id: i64,
    pub user_id: u64,
    pub shards: Option<i64>,
    pub osu_mode: Option<OsuMode>,
    pub osu_username: Option<String>,
}

impl UserRecord {
    pub fn shard_balance(&self) -> i64 {
        self.shards.unwrap_or(0)
    }
}

#[derive(FromRow)]
struct UserRow {
    internal_id: i64,
    user_id: i64,
    shards: Option<i64>,
    osu_mode: Option<String>,
    osu_username: Option<String>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            internal_id: row.internal_id,
            user_id: from_sql_id(row.user_id),
            shards: row.shards,
            osu_mode: row.osu_mode.as_deref().and_then(|m| m.parse().ok()),
            osu_username: row.osu_username,
        }
    }
}

const SELECT_USER: &str = r#"
    SELECT internal_id, user_id, shards, osu_mode, osu_username
    FROM users WHERE user_id = ?
    ORDER BY internal_id ASC
    LIMIT 1
"#;

#[derive(Clone)]
pub struct UsersRepo<'a> {
    db: &'a Db,
}

impl<'a> UsersRepo<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    // ---------- reads ----------

    pub async fn get(&self, user_id: u64) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(SELECT_USER)
            .bind(to_sql_id(user_id))
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    // ---------- writes ----------

    /// Same contract as the guild accessor: insert if absent, commit, return.
    pub async fn get_or_create(&self, user_id: u64) -> Result<UserRecord, StoreError> {
        self.update(user_id, "user_id = user_id", Vec::new()).await
    }

    pub async fn set_osu_profile(
        &self,
        user_id: u64,
        username: &str,
        mode: OsuMode,
    ) -> Result<UserRecord, StoreError> {
        self.update(
            user_id,
            "osu_username = ?, osu_mode = ?",
            vec![username.trim().to_owned(), mode.as_str().to_owned()],
        )
        .await
    }

    pub async fn clear_osu_profile(&self, user_id: u64) -> Result<UserRecord, StoreError> {
        self.update(user_id, "osu_username = NULL, osu_mode = NULL", Vec::new())
            .await
    }

    /// Unset balances count as zero. `delta` may be negative; a result outside
    /// the i64 range is refused and nothing is written.
    pub async fn add_shards(&self, user_id: u64, delta: i64) -> Result<UserRecord, StoreError> {
        // Balances for which `balance + delta` stays representable.
        let (lo, hi) = if delta >= 0 {
            (i64::MIN, i64::MAX - delta)
        } else {
            (i64::MIN - delta, i64::MAX)
        };

        let uid = to_sql_id(user_id);
        let mut tx = self.db.pool.begin().await?;
        ensure_row(&mut tx, uid).await?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET shards = COALESCE(shards, 0) + ?
            WHERE user_id = ? AND COALESCE(shards, 0) BETWEEN ? AND ?
            RETURNING internal_id, user_id, shards, osu_mode, osu_username
            "#,
        )
        .bind(delta)
        .bind(uid)
        .bind(lo)
        .bind(hi)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(StoreError::OutOfRange("shard balance"));
        };
        tx.commit().await?;
        Ok(row.into())
    }

    pub async fn delete(&self, user_id: u64) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(to_sql_id(user_id))
            .execute(&self.db.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Ensure the row exists, apply `set_clause` to it and return the result,
    /// all inside one transaction. `set_clause` is always a literal from this
    /// file; values go through `binds`.
    async fn update(
        &self,
        user_id: u64,
        set_clause: &str,
        binds: Vec<String>,
    ) -> Result<UserRecord, StoreError> {
        let uid = to_sql_id(user_id);
        let mut tx = self.db.pool.begin().await?;

        let created = ensure_row(&mut tx, uid).await?;

        let q = format!(
            "UPDATE users SET {set_clause} WHERE user_id = ? \
             RETURNING internal_id, user_id, shards, osu_mode, osu_username"
        );
        let mut query = sqlx::query_as::<_, UserRow>(&q);
        for bind in binds {
            query = query.bind(bind);
        }
        let row = query.bind(uid).fetch_one(&mut *tx).await?;
        tx.commit().await?;

        if created {
            tracing::info!("Created user record {} for user {}", row.internal_id, user_id);
        }
        Ok(row.into())
    }
}

/// Insert a bare row for `uid` unless one exists. Returns whether it inserted.
async fn ensure_row(conn: &mut SqliteConnection, uid: i64) -> Result<bool, StoreError> {
    let res = sqlx::query(
        r#"INSERT INTO users (user_id) VALUES (?) ON CONFLICT(user_id) DO NOTHING"#,
    )
    .bind(uid)
    .execute(&mut *conn)
    .await?;
    Ok(res.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn new_user_has_no_attributes() {
        let db = Db::in_memory().await.unwrap();
        let repo = UsersRepo::new(&db);

        let rec = repo.get_or_create(1234).await.unwrap();
        assert_eq!(
            rec,
            UserRecord {
                internal_id: rec.internal_id,
                user_id: 1234,
                shards: None,
                osu_mode: None,
                osu_username: None,
            }
        );
        assert_eq!(repo.get_or_create(1234).await.unwrap(), rec);
        assert_eq!(repo.get(1234).await.unwrap(), Some(rec));
    }

    #[tokio::test]
    async fn osu_profile_can_be_set_and_cleared() {
        let db = Db::in_memory().await.unwrap();
        let repo = UsersRepo::new(&db);

        let created = repo.get_or_create(5).await.unwrap();
        let set = repo.set_osu_profile(5, " peppy ", OsuMode::Taiko).await.unwrap();
        assert_eq!(set.internal_id, created.internal_id);
        assert_eq!(set.osu_username.as_deref(), Some("peppy"));
        assert_eq!(set.osu_mode, Some(OsuMode::Taiko));

        let cleared = repo.clear_osu_profile(5).await.unwrap();
        assert_eq!(cleared.osu_username, None);
        assert_eq!(cleared.osu_mode, None);
    }

    #[tokio::test]
    async fn setting_a_profile_creates_the_user() {
        let db = Db::in_memory().await.unwrap();
        let repo = UsersRepo::new(&db);

        assert_eq!(repo.get(6).await.unwrap(), None);
        repo.set_osu_profile(6, "cookiezi", OsuMode::Osu).await.unwrap();
        let rec = repo.get(6).await.unwrap().unwrap();
        assert_eq!(rec.osu_mode, Some(OsuMode::Osu));
    }

    #[tokio::test]
    async fn shards_accumulate_from_unset() {
        let db = Db::in_memory().await.unwrap();
        let repo = UsersRepo::new(&db);

        assert_eq!(repo.get_or_create(3).await.unwrap().shard_balance(), 0);
        assert_eq!(repo.add_shards(3, 10).await.unwrap().shards, Some(10));
        assert_eq!(repo.add_shards(3, -4).await.unwrap().shards, Some(6));
    }

    #[tokio::test]
    async fn shard_overflow_is_refused_and_nothing_changes() {
        let db = Db::in_memory().await.unwrap();
        let repo = UsersRepo::new(&db);

        assert_eq!(repo.add_shards(1, i64::MAX).await.unwrap().shards, Some(i64::MAX));
        let err = repo.add_shards(1, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange(_)), "{err:?}");
        assert_eq!(repo.get(1).await.unwrap().unwrap().shards, Some(i64::MAX));

        assert_eq!(repo.add_shards(2, i64::MIN).await.unwrap().shards, Some(i64::MIN));
        let err = repo.add_shards(2, -1).await.unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange(_)), "{err:?}");
        assert_eq!(repo.add_shards(2, i64::MAX).await.unwrap().shards, Some(-1));
    }

    #[tokio::test]
    async fn forgetting_a_user_drops_profile_and_shards() {
        let db = Db::in_memory().await.unwrap();
        let repo = UsersRepo::new(&db);

        let before = repo.set_osu_profile(8, "peppy", OsuMode::Mania).await.unwrap();
        repo.add_shards(8, 25).await.unwrap();

        assert!(repo.delete(8).await.unwrap());
        assert!(!repo.delete(8).await.unwrap());
        assert_eq!(repo.get(8).await.unwrap(), None);

        let after = repo.get_or_create(8).await.unwrap();
        assert!(after.internal_id > before.internal_id);
        assert_eq!(after.osu_username, None);
        assert_eq!(after.shard_balance(), 0);
    }

    #[tokio::test]
    async fn legacy_mode_text_is_understood() {
        let db = Db::in_memory().await.unwrap();
        sqlx::query("INSERT INTO users (user_id, osu_mode) VALUES (1, 'Mania'), (2, 'bogus')")
            .execute(&db.pool)
            .await
            .unwrap();
        let repo = UsersRepo::new(&db);

        assert_eq!(repo.get(1).await.unwrap().unwrap().osu_mode, Some(OsuMode::Mania));
        assert_eq!(repo.get(2).await.unwrap().unwrap().osu_mode, None);
    }

    #[tokio::test]
    async fn delete_removes_only_that_user() {
        let db = Db::in_memory().await.unwrap();
        let repo = UsersRepo::new(&db);
        repo.get_or_create(1).await.unwrap();
        let two = repo.get_or_create(2).await.unwrap();

        assert!(repo.delete(1).await.unwrap());
        assert_eq!(repo.get(1).await.unwrap(), None);
        assert_eq!(repo.get(2).await.unwrap(), Some(two));
    }

    #[test]
    fn modes_round_trip_through_text() {
        for mode in [OsuMode::Osu, OsuMode::Taiko, OsuMode::Fruits, OsuMode::Mania] {
            assert_eq!(mode.as_str().parse::<OsuMode>(), Ok(mode));
        }
        assert_eq!("ctb".parse::<OsuMode>(), Ok(OsuMode::Fruits));
    }
}
