use sqlx::error::ErrorKind;
use sqlx::migrate::MigrateError;

/// Failures surfaced by the record store. Absence is never one of them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("constraint violated: {0}")]
    Constraint(#[source] sqlx::Error),

    #[error("schema migration failed: {0}")]
    Migrate(#[from] MigrateError),

    #[error("database error: {0}")]
    Query(#[source] sqlx::Error),

    /// The update would push a counter past the range of a 64-bit integer.
    #[error("{0} out of range")]
    OutOfRange(&'static str),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable(err),
            sqlx::Error::Database(db) => match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => Self::Constraint(err),
                _ => Self::Query(err),
            },
            _ => Self::Query(err),
        }
    }
}

