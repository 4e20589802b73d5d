pub mod config;
pub mod credentials;
pub mod errors;
pub mod logging;
pub mod notify;
pub mod poller;
pub mod status;
