//! Poll loop: `review-watch run`.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use review_watch::credentials::Credentials;
use review_watch::logging;
use review_watch::notify::{Notifier, TelegramSink};
use review_watch::poller::PollLoop;
use review_watch::status::HttpStatusFetcher;

use super::super::Cli;
use super::load_toml;

pub async fn cmd_run(cli: &Cli, max_cycles: Option<u64>) -> Result<()> {
    let toml = load_toml(cli)?;
    let warnings = toml.validate();
    let config = toml.resolve();

    let _guard = logging::init(&config.log_file, config.log_format, cli.verbose)?;
    for warning in warnings {
        warn!("Config: {}", warning);
    }

    let creds = Credentials::from_env();
    let fetcher =
        HttpStatusFetcher::new(&config.endpoint, creds.practicum_token(), config.api_timeout)?;
    let sink = TelegramSink::new(
        &config.telegram_api_base,
        creds.telegram_token(),
        config.telegram_timeout,
    )?;
    let notifier = Notifier::new(Arc::new(sink), creds.telegram_chat_id());

    let mut poll = PollLoop::new(Arc::new(fetcher), notifier, &config);
    if !poll.start(&creds) {
        anyhow::bail!(
            "Missing required credentials: {}",
            creds.missing().join(", ")
        );
    }

    let completed = poll.run(max_cycles).await?;
    info!(completed, "Poll loop finished");
    Ok(())
}
