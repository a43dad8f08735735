//! Error types for the load client

use thiserror::Error;

/// Errors raised while configuring or running a load test.
#[derive(Error, Debug)]
pub enum LoadTestError {
    /// Settings could not be loaded or deserialised
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Settings were loaded but are not usable
    #[error("invalid settings: {0}")]
    Invalid(String),

    /// The shared HTTP client could not be built
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// `record` or `finalize` was called after the run was finalized
    #[error("aggregator already finalized")]
    AlreadyFinalized,

    /// A dispatch unit panicked or was cancelled
    #[error("dispatch unit failed: {0}")]
    Join(String),

    #[error("concurrency semaphore closed")]
    SemaphoreClosed,
}

pub type Result<T> = std::result::Result<T, LoadTestError>;
