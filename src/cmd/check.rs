//! Startup checks without polling: `review-watch check`.

use anyhow::Result;

use review_watch::credentials::{
    Credentials, PRACTICUM_TOKEN_VAR, TELEGRAM_CHAT_ID_VAR, TELEGRAM_TOKEN_VAR,
};

use super::super::Cli;
use super::load_toml;

pub fn cmd_check(cli: &Cli) -> Result<()> {
    let creds = Credentials::from_env();
    let missing = creds.missing();

    println!();
    println!("Credentials:");
    for var in [PRACTICUM_TOKEN_VAR, TELEGRAM_TOKEN_VAR, TELEGRAM_CHAT_ID_VAR] {
        let state = if missing.contains(&var) { "missing" } else { "set" };
        println!("  {} ... {}", var, state);
    }
    println!();

    let toml = load_toml(cli)?;
    let warnings = toml.validate();
    if warnings.is_empty() {
        println!("Configuration is valid.");
    } else {
        println!("Configuration warnings:");
        for warning in &warnings {
            println!("  - {}", warning);
        }
    }
    println!();

    if !missing.is_empty() {
        anyhow::bail!("Missing required credentials: {}", missing.join(", "));
    }
    Ok(())
}
