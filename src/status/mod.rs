//! The status half of a poll cycle: fetch, validate, interpret.

pub mod fetcher;
pub mod validator;
pub mod verdict;

pub use fetcher::{HttpStatusFetcher, StatusSource};
pub use validator::validate;
pub use verdict::{ReviewStatus, VerdictTable, parse_status};

/// Field of the status payload that carries the record list.
pub const RECORDS_FIELD: &str = "homeworks";
/// Record field naming the reviewed work.
pub const NAME_FIELD: &str = "homework_name";
/// Record field carrying the raw status code.
pub const STATUS_FIELD: &str = "status";
