//! Walk service error types

use stepand_core::StepandError;
use thiserror::Error;

/// Walk service errors
#[derive(Error, Debug)]
pub enum WalkError {
    /// Error from the walk model
    #[error(transparent)]
    Core(#[from] StepandError),

    /// Channel error
    #[error("Channel error: {0}")]
    Channel(String),

    /// Service already stopped
    #[error("Walk service not running")]
    NotRunning,
}

impl WalkError {
    /// Error code for logging and the CLI
    pub fn error_code(&self) -> &'static str {
        match self {
            WalkError::Core(e) => e.error_code(),
            WalkError::Channel(_) => "CHANNEL_ERROR",
            WalkError::NotRunning => "NOT_RUNNING",
        }
    }

    /// Whether the caller did something invalid
    pub fn is_client_error(&self) -> bool {
        match self {
            WalkError::Core(e) => e.is_client_error(),
            _ => false,
        }
    }
}

/// Result type for walk operations
pub type Result<T> = std::result::Result<T, WalkError>;
