//! Daemon error types.

use bus::BusError;
use thiserror::Error;

/// Errors that end the daemon with a non-zero exit code.
#[derive(Debug, Error)]
pub enum AppError {
    /// The bus stopped on a fatal error.
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// The metrics exporter could not be installed.
    #[error("Metrics error: {0}")]
    Metrics(String),
}
