use std::time::Duration;

use migration::Migrator;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    sqlx::sqlite::{SqliteJournalMode, SqliteSynchronous},
};
use sea_orm_migration::MigratorTrait;

use crate::error::AppResult;

const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url.to_string());
    opts.max_connections(max_connections.max(1))
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false)
        // Applied to every pooled connection; ignored for MySQL.
        .map_sqlx_sqlite_opts(|o| {
            o.journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .foreign_keys(true)
                .busy_timeout(SQLITE_BUSY_TIMEOUT)
        });

    let db = Database::connect(opts).await?;

    Migrator::up(&db, None).await?;
    tracing::info!(backend = ?db.get_database_backend(), "database ready");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use sea_orm::{
        ConnectionTrait, DatabaseBackend, EntityTrait, PaginatorTrait, Statement, TransactionTrait,
    };

    use super::*;
    use crate::entities::movie;

    async fn pragma<C: ConnectionTrait>(conn: &C, name: &str) -> i32 {
        let sql = format!("PRAGMA {name}");
        conn.query_one(Statement::from_string(DatabaseBackend::Sqlite, sql))
            .await
            .unwrap()
            .unwrap()
            .try_get_by_index::<i32>(0)
            .unwrap()
    }

    #[tokio::test]
    async fn migrations_create_schema() {
        let db = connect_and_migrate("sqlite::memory:", 1).await.unwrap();
        assert_eq!(movie::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = connect_and_migrate("sqlite::memory:", 1).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        assert!(Migrator::get_pending_migrations(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn every_pooled_connection_gets_sqlite_options() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("pool.db").display());
        let db = connect_and_migrate(&url, 3).await.unwrap();

        // Open transactions hold their connections, so each one is distinct.
        let mut held = Vec::new();
        for _ in 0..3 {
            held.push(db.begin().await.unwrap());
        }
        for txn in &held {
            assert_eq!(pragma(txn, "foreign_keys").await, 1);
            assert_eq!(pragma(txn, "synchronous").await, 1);
            assert_eq!(pragma(txn, "busy_timeout").await, 5000);
        }
    }
}
