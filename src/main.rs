use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{handle_replay, handle_serve};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(name = "skytrail")]
#[command(about = "Live aircraft tracker with altitude-coloured trails")]
#[command(version)]
struct Cli {
    /// Config file (default: $SKYTRAIL_CONFIG, then ./skytrail.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for skytrail itself when RUST_LOG is unset
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the receiver and serve the map API
    Serve {
        /// Override the bind address from the config file
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run a recorded JSON-lines feed through the tracker
    Replay {
        /// Recording with one aircraft.json snapshot per line
        file: PathBuf,

        /// Snapshots processed as initial load before going live
        #[arg(long, default_value_t = 0)]
        warmup: usize,

        /// Aircraft to select once warmup is done (after the first snapshot without warmup)
        #[arg(long)]
        select: Option<String>,

        /// Write the final aircraft detail views here as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    skytrail::logging::init_tracing(cli.verbose)?;

    let config_path = cli.config.unwrap_or_else(skytrail::config::config_path);

    match cli.command {
        Commands::Serve { bind } => handle_serve(&config_path, bind).await,
        Commands::Replay {
            file,
            warmup,
            select,
            output,
        } => handle_replay(&config_path, file, warmup, select, output).await,
    }
}
