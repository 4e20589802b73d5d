//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `run`    | `Run` (default)  |
//! | `check`  | `Check`          |
//! | `config` | `Config`         |

pub mod check;
pub mod config;
pub mod run;

pub use check::cmd_check;
pub use config::cmd_config;
pub use run::cmd_run;

use anyhow::Result;
use review_watch::config::WatchToml;

use super::Cli;

/// Load the config file (or defaults) and apply CLI overrides.
pub fn load_toml(cli: &Cli) -> Result<WatchToml> {
    let mut toml = WatchToml::load_or_default(&cli.config)?;
    if let Some(interval) = cli.interval {
        toml.poll.interval_secs = interval;
    }
    if let Some(ref log_file) = cli.log_file {
        toml.logging.file = log_file.clone();
    }
    Ok(toml)
}
