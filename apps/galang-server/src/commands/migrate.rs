use galang_server::{config::Config, error::ServerResult};

pub async fn execute(config: Config) -> ServerResult<()> {
    println!("Migrating {}", config.database_url);
    let db = galang_core::connect(&config.database_url).await?;
    galang_core::migrate(&db).await?;
    println!("Database is up to date");
    Ok(())
}
