pub mod guilds_repo;
pub mod users_repo;

pub use guilds_repo::{GuildRecord, GuildsRepo};
pub use users_repo::{OsuMode, UserRecord, UsersRepo};
