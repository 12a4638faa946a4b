use galang_core::Actor;
use galang_server::{config::Config, error::ServerResult, open_platform};
use std::{fs::File, io, path::PathBuf};

pub async fn execute(
    config: Config,
    campaign: Option<i32>,
    output: Option<PathBuf>,
) -> ServerResult<()> {
    let platform = open_platform(&config).await?;
    let system = Actor::system();

    match output {
        Some(path) => {
            let file = File::create(&path)?;
            let rows = platform
                .reports
                .export_donations_csv(&system, campaign, file)
                .await?;
            println!("Wrote {rows} donations to {}", path.display());
        }
        None => {
            platform
                .reports
                .export_donations_csv(&system, campaign, io::stdout())
                .await?;
        }
    }
    Ok(())
}
