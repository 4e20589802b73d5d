use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use review_watch::config::DEFAULT_CONFIG_FILE;

mod cmd;

#[derive(Parser)]
#[command(name = "review-watch")]
#[command(version, about = "Relay review status changes to a Telegram chat")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file. Defaults apply when it does not exist.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Seconds between polls. Overrides poll.interval_secs.
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Diagnostic log file. Overrides logging.file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Poll the status API and relay changes (default)
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Stop after this many cycles
        #[arg(long, conflicts_with = "once")]
        max_cycles: Option<u64>,
    },
    /// Verify credentials and configuration without polling
    Check,
    /// View, validate or create the config file
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate the config file and show any warnings
    Validate,
    /// Write a default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may already carry the secrets.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Commands::Run {
        once: false,
        max_cycles: None,
    });

    match command {
        Commands::Run { once, max_cycles } => {
            let max_cycles = if once { Some(1) } else { max_cycles };
            cmd::cmd_run(&cli, max_cycles).await?;
        }
        Commands::Check => cmd::cmd_check(&cli)?,
        Commands::Config { command } => cmd::cmd_config(&cli, command)?,
    }

    Ok(())
}
