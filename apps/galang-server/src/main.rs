use clap::{Parser, Subcommand};
use galang_server::{config::Config, error::ServerResult};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "galang")]
#[command(about = "Galang donation platform - API server and maintenance tasks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the payment poller (default)
    Serve,

    /// Apply database migrations and exit
    Migrate,

    /// Create an admin account
    CreateAdmin {
        /// Display name
        #[arg(short, long, default_value = "Administrator")]
        name: String,

        /// Login email
        #[arg(short, long)]
        email: String,

        /// Login password
        #[arg(short, long, env = "GALANG_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Reconcile pending invoices and close expired campaigns once
    PollOnce {
        /// Maximum pending donations to check (defaults to POLL_BATCH)
        #[arg(short, long)]
        batch: Option<u64>,
    },

    /// Rebuild balances from the ledger
    Recompute {
        /// User whose funds to rebuild
        #[arg(short, long, required_unless_present = "campaign")]
        user: Option<i32>,

        /// Campaign whose collected total to rebuild
        #[arg(short, long)]
        campaign: Option<i32>,
    },

    /// Write paid donations as CSV
    ExportDonations {
        /// Only this campaign's donations
        #[arg(short, long)]
        campaign: Option<i32>,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ServerResult<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => galang_server::start_server(config).await,
        Commands::Migrate => commands::migrate::execute(config).await,
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => commands::create_admin::execute(config, name, email, password).await,
        Commands::PollOnce { batch } => commands::poll_once::execute(config, batch).await,
        Commands::Recompute { user, campaign } => {
            commands::recompute::execute(config, user, campaign).await
        }
        Commands::ExportDonations { campaign, output } => {
            commands::export_donations::execute(config, campaign, output).await
        }
    }
}
