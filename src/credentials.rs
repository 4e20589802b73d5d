//! Credential gate.
//!
//! The three secrets are read once from the environment (after `.env` has been
//! loaded) and must all be present before the poll loop may start.

use tracing::error;

pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Older names still honoured when the current ones are unset.
pub const LEGACY_PRACTICUM_TOKEN_VAR: &str = "TOKEN_YANDEX";
pub const LEGACY_TELEGRAM_TOKEN_VAR: &str = "TOKEN";

/// Process-wide secrets. Any of them may be absent until verified.
#[derive(Clone, Default)]
pub struct Credentials {
    pub practicum_token: Option<String>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            practicum_token: get(PRACTICUM_TOKEN_VAR)
                .or_else(|| get(LEGACY_PRACTICUM_TOKEN_VAR)),
            telegram_token: get(TELEGRAM_TOKEN_VAR).or_else(|| get(LEGACY_TELEGRAM_TOKEN_VAR)),
            telegram_chat_id: get(TELEGRAM_CHAT_ID_VAR),
        }
    }

    /// Names of the variables that are absent or empty, in declaration order.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (PRACTICUM_TOKEN_VAR, &self.practicum_token),
            (TELEGRAM_TOKEN_VAR, &self.telegram_token),
            (TELEGRAM_CHAT_ID_VAR, &self.telegram_chat_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    pub fn practicum_token(&self) -> &str {
        self.practicum_token.as_deref().unwrap_or_default()
    }

    pub fn telegram_token(&self) -> &str {
        self.telegram_token.as_deref().unwrap_or_default()
    }

    pub fn telegram_chat_id(&self) -> &str {
        self.telegram_chat_id.as_deref().unwrap_or_default()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("practicum_token", &redact(&self.practicum_token))
            .field("telegram_token", &redact(&self.telegram_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

/// Returns `false`, logging each missing variable, if any credential is absent.
pub fn verify_credentials(creds: &Credentials) -> bool {
    let missing = creds.missing();
    for name in &missing {
        error!(
            severity = "critical",
            variable = *name,
            "Required credential {} is missing",
            name
        );
    }
    missing.is_empty()
}
