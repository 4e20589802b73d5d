//! Configuration for the review watcher.
//!
//! Settings are read from an optional `review-watch.toml`. Every field has a
//! default, so a missing or partial file is valid. Secrets never live here;
//! see [`crate::credentials`].
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! endpoint = "https://practicum.yandex.ru/api/user_api/homework_statuses/"
//! timeout_secs = 30
//!
//! [telegram]
//! api_base = "https://api.telegram.org"
//! timeout_secs = 30
//!
//! [poll]
//! interval_secs = 600
//! notify_failures = false
//!
//! [logging]
//! file = "main.log"
//! format = "text"
//!
//! [phrases]
//! approved = "The work has been reviewed: the reviewer liked everything. Hooray!"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::status::verdict::VerdictTable;

pub const DEFAULT_CONFIG_FILE: &str = "review-watch.toml";
pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILE: &str = "main.log";

pub const APPROVED_PHRASE: &str =
    "The work has been reviewed: the reviewer liked everything. Hooray!";
pub const REVIEWING_PHRASE: &str = "The work has been taken for review.";
pub const REJECTED_PHRASE: &str = "The work has been reviewed: the reviewer has comments.";

/// Output format of the diagnostic log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `timestamp level message` lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Status API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Upper bound on a single status request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Messaging API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSection {
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Poll loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSection {
    /// Fixed sleep between cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Relay cycle failures to the recipient as well
    #[serde(default)]
    pub notify_failures: bool,
}

/// Diagnostic log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default)]
    pub format: LogFormat,
}

/// Human-readable phrase for each recognized review status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhrasesSection {
    #[serde(default = "default_approved")]
    pub approved: String,
    #[serde(default = "default_reviewing")]
    pub reviewing: String,
    #[serde(default = "default_rejected")]
    pub rejected: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_telegram_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

fn default_approved() -> String {
    APPROVED_PHRASE.to_string()
}

fn default_reviewing() -> String {
    REVIEWING_PHRASE.to_string()
}

fn default_rejected() -> String {
    REJECTED_PHRASE.to_string()
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            api_base: default_telegram_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            notify_failures: false,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            format: LogFormat::default(),
        }
    }
}

impl Default for PhrasesSection {
    fn default() -> Self {
        Self {
            approved: default_approved(),
            reviewing: default_reviewing(),
            rejected: default_rejected(),
        }
    }
}

/// Root of `review-watch.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub telegram: TelegramSection,
    #[serde(default)]
    pub poll: PollSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub phrases: PhrasesSection,
}

impl WatchToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse review-watch.toml")
    }

    /// Load `path` if it exists, otherwise return the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize review-watch.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !is_http_url(&self.api.endpoint) {
            warnings.push(format!(
                "Invalid api.endpoint '{}': should start with http:// or https://",
                self.api.endpoint
            ));
        }
        if !is_http_url(&self.telegram.api_base) {
            warnings.push(format!(
                "Invalid telegram.api_base '{}': should start with http:// or https://",
                self.telegram.api_base
            ));
        }
        if self.api.timeout_secs == 0 {
            warnings.push("api.timeout_secs is 0: requests would fail immediately".to_string());
        }
        if self.telegram.timeout_secs == 0 {
            warnings
                .push("telegram.timeout_secs is 0: requests would fail immediately".to_string());
        }
        if self.poll.interval_secs == 0 {
            warnings.push(
                "poll.interval_secs is 0: the status API would be polled in a tight loop"
                    .to_string(),
            );
        }
        for (status, phrase) in [
            ("approved", &self.phrases.approved),
            ("reviewing", &self.phrases.reviewing),
            ("rejected", &self.phrases.rejected),
        ] {
            if phrase.trim().is_empty() {
                warnings.push(format!("Empty phrase for status '{}'", status));
            }
        }

        warnings
    }

    /// Freeze into the runtime configuration handed to each component.
    pub fn resolve(self) -> WatchConfig {
        WatchConfig {
            endpoint: self.api.endpoint,
            api_timeout: Duration::from_secs(self.api.timeout_secs),
            telegram_api_base: self.telegram.api_base,
            telegram_timeout: Duration::from_secs(self.telegram.timeout_secs),
            interval: Duration::from_secs(self.poll.interval_secs),
            notify_failures: self.poll.notify_failures,
            log_file: self.logging.file,
            log_format: self.logging.format,
            verdicts: VerdictTable::from(&self.phrases),
        }
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Immutable runtime configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub endpoint: String,
    pub api_timeout: Duration,
    pub telegram_api_base: String,
    pub telegram_timeout: Duration,
    pub interval: Duration,
    pub notify_failures: bool,
    pub log_file: PathBuf,
    pub log_format: LogFormat,
    pub verdicts: VerdictTable,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchToml::default().resolve()
    }
}
