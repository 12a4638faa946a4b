use galang_server::{config::Config, error::ServerResult, open_platform, poller};

pub async fn execute(config: Config, batch: Option<u64>) -> ServerResult<()> {
    let batch = batch.unwrap_or(config.poll_batch);
    let platform = open_platform(&config).await?;

    println!("Checking up to {batch} pending donations");
    let sweep = poller::sweep(&platform, batch).await?;
    println!("{}", serde_json::to_string_pretty(&sweep)?);
    Ok(())
}
