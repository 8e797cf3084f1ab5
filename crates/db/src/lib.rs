use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

pub mod entities;
pub mod models;
pub mod types;

pub use sea_orm::{DbErr, SqlErr, TransactionTrait};

#[derive(Clone)]
pub struct DBService {
    pub pool: DatabaseConnection,
}

impl DBService {
    /// Connect to `database_url`, apply pending migrations, and hand back a
    /// pooled connection. SQLite files are switched to WAL journaling;
    /// foreign-key enforcement is on by default in the driver, which the
    /// cascade rules in the schema rely on.
    pub async fn new(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);
        if database_url.contains(":memory:") {
            // One shared connection, or every pooled connection would get
            // its own empty in-memory database.
            options.max_connections(1).min_connections(1);
        } else {
            options.max_connections(5);
        }

        let pool = Database::connect(options).await?;
        if pool.get_database_backend() == DatabaseBackend::Sqlite {
            pool.execute_unprepared("PRAGMA journal_mode = WAL;").await?;
        }
        db_migration::Migrator::up(&pool, None).await?;
        Ok(DBService { pool })
    }
}
