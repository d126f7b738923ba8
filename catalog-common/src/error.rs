//! Shared error type for catalog bootstrap code
//!
//! Covers what the common crate itself can fail on: opening and migrating the
//! database, touching the root folder, and reading configuration.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Pool creation, pragma, schema or migration failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Root folder or config file access
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable or malformed TOML configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
