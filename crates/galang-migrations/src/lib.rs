pub use sea_orm_migration::prelude::*;

mod m20250301_000001_baseline_schema;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250301_000001_baseline_schema::Migration)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm_migration::sea_orm::{
        ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement,
    };

    async fn scratch_db(dir: &tempfile::TempDir) -> DatabaseConnection {
        let path = dir.path().join("migrations.db");
        Database::connect(format!("sqlite://{}?mode=rwc", path.display()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_baseline_creates_all_tables() {
        let dir = tempfile::TempDir::new().unwrap();
        let conn = scratch_db(&dir).await;
        Migrator::up(&conn, None).await.unwrap();

        for table in [
            "users",
            "sessions",
            "campaigns",
            "donations",
            "withdrawals",
            "proofs",
        ] {
            let stmt = Statement::from_string(
                DbBackend::Sqlite,
                format!("SELECT name FROM sqlite_master WHERE type='table' AND name='{table}'"),
            );
            let row = conn.query_one(stmt).await.unwrap();
            assert!(row.is_some(), "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_down_drops_tables() {
        let dir = tempfile::TempDir::new().unwrap();
        let conn = scratch_db(&dir).await;
        Migrator::up(&conn, None).await.unwrap();
        Migrator::down(&conn, None).await.unwrap();

        let stmt = Statement::from_string(
            DbBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type='table' AND name='donations'".to_string(),
        );
        assert!(conn.query_one(stmt).await.unwrap().is_none());
    }
}
