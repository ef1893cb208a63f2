//! keka-clock - automated Keka attendance
//!
//! Clocks in and out against the Keka web API using a stored OAuth2 credential
//! that is refreshed silently before each punch.

mod api;
mod auth;
mod config;
mod context;
mod error;
mod server;
mod store;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{Direction, Outcome};
use config::Settings;
use context::Context;

#[derive(Parser)]
#[command(name = "keka-clock")]
#[command(about = "Automated Keka attendance clock-in/clock-out", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate in the browser and store the credential
    Setup,

    /// Clock in now (skipped on weekends)
    TestIn,

    /// Clock out now (skipped on weekends)
    TestOut,

    /// Show stored credential status
    Status,

    /// Serve the HTTP trigger (GET /api/cron?action=in|out)
    Serve {
        /// Address to listen on (overrides config)
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },
}

async fn clock(ctx: &Context, direction: Direction) -> Result<()> {
    match api::perform(ctx, direction).await {
        Ok(Outcome::Punched) => Ok(()),
        Ok(Outcome::Skipped) => {
            println!("Not a weekday. Skipped clock {}.", direction);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Clock {} failed: {}", direction, e);
            if e.needs_operator() {
                eprintln!("Run 'keka-clock setup' to re-authenticate.");
            }
            bail!("Clock {} failed", direction)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Commands::Serve {
        listen: Some(addr),
    } = cli.command
    {
        settings.listen = addr;
    }
    let ctx = Context::open(settings).await?;

    match cli.command {
        Commands::Setup => {
            tracing::info!("Starting authentication flow...");
            auth::setup(&ctx).await?;
        }
        Commands::TestIn => clock(&ctx, Direction::In).await?,
        Commands::TestOut => clock(&ctx, Direction::Out).await?,
        Commands::Status => auth::status(&ctx).await?,
        Commands::Serve { .. } => server::serve(ctx).await?,
    }

    Ok(())
}
