//! Mapping from raw review status codes to human-readable verdicts.

use serde_json::Value;
use tracing::error;

use super::{NAME_FIELD, STATUS_FIELD};
use crate::config::PhrasesSection;
use crate::errors::ParseError;

/// The closed set of review statuses the API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStatus::Approved => write!(f, "approved"),
            ReviewStatus::Reviewing => write!(f, "reviewing"),
            ReviewStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = ParseError;

    /// Exact match only; the API never varies the case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(ReviewStatus::Approved),
            "reviewing" => Ok(ReviewStatus::Reviewing),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(ParseError::UnknownStatus(other.to_string())),
        }
    }
}

/// Verdict phrase for each [`ReviewStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictTable {
    approved: String,
    reviewing: String,
    rejected: String,
}

impl VerdictTable {
    pub fn phrase(&self, status: ReviewStatus) -> &str {
        match status {
            ReviewStatus::Approved => &self.approved,
            ReviewStatus::Reviewing => &self.reviewing,
            ReviewStatus::Rejected => &self.rejected,
        }
    }
}

impl Default for VerdictTable {
    fn default() -> Self {
        Self::from(&PhrasesSection::default())
    }
}

impl From<&PhrasesSection> for VerdictTable {
    fn from(phrases: &PhrasesSection) -> Self {
        Self {
            approved: phrases.approved.clone(),
            reviewing: phrases.reviewing.clone(),
            rejected: phrases.rejected.clone(),
        }
    }
}

/// Format the notification text for one record.
pub fn format_verdict(name: &str, phrase: &str) -> String {
    format!("Changed review status of \"{}\": {}", name, phrase)
}

/// Interpret a single record as a verdict message.
///
/// Both `homework_name` and `status` must be present. A non-string name is
/// rendered as JSON; a non-string status is never a recognized code.
pub fn parse_status(record: &Value, verdicts: &VerdictTable) -> Result<String, ParseError> {
    let Some(name) = record.get(NAME_FIELD) else {
        error!(field = NAME_FIELD, "Record has no '{}' field", NAME_FIELD);
        return Err(ParseError::MissingField(NAME_FIELD));
    };
    let Some(raw_status) = record.get(STATUS_FIELD) else {
        error!(field = STATUS_FIELD, "Record has no '{}' field", STATUS_FIELD);
        return Err(ParseError::MissingField(STATUS_FIELD));
    };

    let status = match raw_status {
        Value::String(code) => code.parse::<ReviewStatus>(),
        other => Err(ParseError::UnknownStatus(other.to_string())),
    }
    .inspect_err(|e| {
        if let ParseError::UnknownStatus(code) = e {
            error!(status = %code, "Unrecognized review status '{}'", code);
        }
    })?;

    let name = match name {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(format_verdict(&name, verdicts.phrase(status)))
}
