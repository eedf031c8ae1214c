use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};

use crate::config::DbConfig;
use crate::db::Db;
use crate::repos::{GuildsRepo, UsersRepo};

pub type Ctx<'a> = poise::Context<'a, Arc<AppState>, anyhow::Error>;

/// AppState: the shared database handle. Repos are cheap views over it.
pub struct AppState {
    pub db: Db,
}

impl AppState {
    pub async fn new(cfg: &DbConfig) -> Result<Arc<Self>> {
        let db = Db::connect(cfg)
            .await
            .with_context(|| format!("Failed to open database {}", cfg.url))?;
        Ok(Arc::new(Self { db }))
    }

    pub fn guilds(&self) -> GuildsRepo<'_> {
        GuildsRepo::new(&self.db)
    }

    pub fn users(&self) -> UsersRepo<'_> {
        UsersRepo::new(&self.db)
    }
}
