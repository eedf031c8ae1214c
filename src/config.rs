use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context as AnyhowContext, Result, bail};
use serenity::all::GuildId;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://bot.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long a writer waits on a locked database before giving up.
    pub busy_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub db: DbConfig,
    /// Register commands in this guild only (instant updates while developing).
    pub dev_guild: Option<GuildId>,
}

impl Config {
    /// Reads the process environment. Load `.env` before calling this.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .context("Set DISCORD_TOKEN in env")?;

        let defaults = DbConfig::default();
        let db = DbConfig {
            url: lookup("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            busy_timeout: parse_var::<u64, _>(&lookup, "DATABASE_BUSY_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.busy_timeout),
        };
        if db.max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        let dev_guild = match parse_var::<u64, _>(&lookup, "DEV_GUILD_ID")? {
            Some(0) => bail!("DEV_GUILD_ID must be a non-zero guild id"),
            Some(id) => Some(GuildId::new(id)),
            None => None,
        };

        Ok(Self {
            discord_token,
            db,
            dev_guild,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let cfg = config_from(&[("DISCORD_TOKEN", "abc")]).unwrap();
        assert_eq!(cfg.discord_token, "abc");
        assert_eq!(cfg.db, DbConfig::default());
        assert_eq!(cfg.dev_guild, None);
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = config_from(&[("DATABASE_URL", "sqlite::memory:")]).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn blank_token_is_an_error() {
        assert!(config_from(&[("DISCORD_TOKEN", "   ")]).is_err());
    }

    #[test]
    fn database_settings_are_read() {
        let cfg = config_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("DATABASE_URL", "sqlite://other.db"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("DATABASE_BUSY_TIMEOUT_SECS", "30"),
            ("DEV_GUILD_ID", "1429268494687408232"),
        ])
        .unwrap();
        assert_eq!(
            cfg.db,
            DbConfig {
                url: "sqlite://other.db".into(),
                max_connections: 2,
                busy_timeout: Duration::from_secs(30),
            }
        );
        assert_eq!(cfg.dev_guild, Some(GuildId::new(1429268494687408232)));
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = config_from(&[("DISCORD_TOKEN", "abc"), ("DATABASE_MAX_CONNECTIONS", "lots")])
            .unwrap_err();
        assert!(err.to_string().contains("DATABASE_MAX_CONNECTIONS"));
    }

    #[test]
    fn zero_ids_and_pool_sizes_are_rejected() {
        assert!(config_from(&[("DISCORD_TOKEN", "abc"), ("DEV_GUILD_ID", "0")]).is_err());
        assert!(
            config_from(&[("DISCORD_TOKEN", "abc"), ("DATABASE_MAX_CONNECTIONS", "0")]).is_err()
        );
    }
}
