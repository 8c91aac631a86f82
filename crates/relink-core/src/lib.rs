pub mod backlinks;
pub mod config;
pub mod error;
pub mod http_service;
pub mod link_parser;
pub mod rename;
pub mod runner;
pub mod service;
pub mod watchdog;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{RenameJob, Settings};
pub use error::{ConfigError, ServiceError};
pub use rename::{DocumentOutcome, RunReport};
pub use runner::{run_job, JobOutcome};
pub use service::DocumentService;
