/*!
# Database Connections

- `connect()` opens the pooled connection used by the server (PostgreSQL or SQLite URL).
- `migrate()` applies the baseline schema.
- `new_scratch_db()` creates a throwaway SQLite database with the schema applied, for tests
  and local experiments.
*/

use galang_migrations::MigratorTrait as _;
use sea_orm::{ConnectOptions, ConnectionTrait as _, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::Result;

/// Open a pooled connection to `database_url`
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(10)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let conn = Database::connect(options).await?;
    info!(backend = ?conn.get_database_backend(), "Connected to database");
    Ok(conn)
}

/// Apply pending migrations
pub async fn migrate(conn: &DatabaseConnection) -> Result<()> {
    galang_migrations::Migrator::up(conn, None).await?;
    Ok(())
}

/// Create a new scratch database
///
/// Backed by a temporary SQLite file with all migrations applied.
pub async fn new_scratch_db() -> Result<DatabaseConnection> {
    // A file rather than :memory: so every pooled connection sees the same database
    let temp = tempfile::NamedTempFile::new()?;
    let path = temp.path().to_string_lossy();

    let mut url = Url::parse("sqlite:///").expect("sqlite:/// is a valid URL base");
    url.set_path(&path);
    url.set_query(Some("mode=rw"));

    let conn = Database::connect(url.as_str()).await?;
    migrate(&conn).await?;

    // Keep the temp file alive by forgetting it (cleaned up when process exits)
    std::mem::forget(temp);

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, DbBackend, Statement};

    #[tokio::test]
    async fn test_new_scratch_db() {
        let conn = new_scratch_db().await.unwrap();
        assert!(conn.get_database_backend() == DbBackend::Sqlite);

        let table_check_sql = Statement::from_string(
            DbBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type='table' AND name='campaigns'".to_string(),
        );
        let result = conn.query_one(table_check_sql).await.unwrap();
        assert!(result.is_some(), "Migrations should have created campaign tables");
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let conn = new_scratch_db().await.unwrap();
        migrate(&conn).await.unwrap();
    }
}
