//! Configuration view and validation commands: `review-watch config`.

use anyhow::Result;

use review_watch::config::WatchToml;
use review_watch::status::ReviewStatus;

use super::super::{Cli, ConfigCommands};
use super::load_toml;

pub fn cmd_config(cli: &Cli, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = &cli.config;

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No config file at {}; using defaults.", config_path.display());
            }
            println!();

            let config = load_toml(cli)?.resolve();
            println!("[api]");
            println!("  endpoint = \"{}\"", config.endpoint);
            println!("  timeout_secs = {}", config.api_timeout.as_secs());
            println!("[telegram]");
            println!("  api_base = \"{}\"", config.telegram_api_base);
            println!("  timeout_secs = {}", config.telegram_timeout.as_secs());
            println!("[poll]");
            println!("  interval_secs = {}", config.interval.as_secs());
            println!("  notify_failures = {}", config.notify_failures);
            println!("[logging]");
            println!("  file = \"{}\"", config.log_file.display());
            println!("  format = \"{}\"", config.log_format);
            println!("[phrases]");
            let statuses = [
                ReviewStatus::Approved,
                ReviewStatus::Reviewing,
                ReviewStatus::Rejected,
            ];
            for status in statuses {
                println!("  {} = \"{}\"", status, config.verdicts.phrase(status));
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            if !config_path.exists() {
                println!("No config file found. Using defaults (valid).");
                return Ok(());
            }

            let warnings = WatchToml::load(config_path)?.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("Config file already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if let Some(parent) = config_path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            WatchToml::default().save(config_path)?;
            println!("Created {}", config_path.display());
        }
    }

    Ok(())
}
