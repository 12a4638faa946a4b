use galang_server::{config::Config, error::ServerResult, open_platform};

pub async fn execute(
    config: Config,
    name: String,
    email: String,
    password: String,
) -> ServerResult<()> {
    let platform = open_platform(&config).await?;
    let admin = platform
        .accounts
        .create_admin(&name, &email, &password)
        .await?;
    println!("Created admin {} <{}> with id {}", admin.name, admin.email, admin.id);
    Ok(())
}
