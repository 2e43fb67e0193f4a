//! Parlance CLI error types.

use parlance_core::error::TurnError;
use parlance_core::scratch::ScratchError;
use thiserror::Error;

/// Startup and runtime errors for the driver.
#[derive(Debug, Error)]
pub enum AppError {
    /// A setting is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The session scratch directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scratch storage could not be prepared.
    #[error("scratch error: {0}")]
    Scratch(#[from] ScratchError),

    /// A conversation operation failed outright.
    #[error("turn error: {0}")]
    Turn(#[from] TurnError),
}
