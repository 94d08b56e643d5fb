//! Error types for the Step& walk engine
//!
//! This module provides the error type shared by geometry, missions,
//! configuration and session bookkeeping.

use thiserror::Error;

use crate::mission::{MissionId, MissionState};

/// Main error type for the walk engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepandError {
    // ===== Geometry Errors =====
    /// Coordinate is not finite or outside the valid degree range
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Heading is not finite or outside [0, 360)
    #[error("Invalid heading: {0}")]
    InvalidHeading(f64),

    // ===== Mission Errors =====
    /// Mission radius must be strictly positive
    #[error("Invalid mission radius: {0}m")]
    InvalidRadius(f64),

    /// Mission was not found in the session
    #[error("Mission not found: {0}")]
    MissionNotFound(MissionId),

    /// Mission cannot be completed while the user is out of range
    #[error("Mission {id} is not in range (state: {state:?})")]
    MissionNotInRange { id: MissionId, state: MissionState },

    /// Mission was already completed
    #[error("Mission {0} is already completed")]
    MissionAlreadyCompleted(MissionId),

    /// Mission state fields contradict each other
    #[error("Mission {id} has inconsistent state {state:?}")]
    InvalidMissionState { id: MissionId, state: MissionState },

    /// All missions are done or none were generated
    #[error("No active mission")]
    NoActiveMission,

    // ===== Location Errors =====
    /// The location source could not deliver a fix
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    // ===== Configuration Errors =====
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    // ===== Serialization Errors =====
    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ===== General Errors =====
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StepandError {
    /// Check if this error is a client error (bad input)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StepandError::InvalidCoordinate { .. }
                | StepandError::InvalidHeading(_)
                | StepandError::InvalidRadius(_)
                | StepandError::MissionNotInRange { .. }
                | StepandError::MissionAlreadyCompleted(_)
                | StepandError::InvalidMissionState { .. }
                | StepandError::InvalidConfig(_)
        )
    }

    /// Get an error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            StepandError::InvalidCoordinate { .. } => "INVALID_COORDINATE",
            StepandError::InvalidHeading(_) => "INVALID_HEADING",
            StepandError::InvalidRadius(_) => "INVALID_RADIUS",
            StepandError::MissionNotFound(_) => "MISSION_NOT_FOUND",
            StepandError::MissionNotInRange { .. } => "MISSION_NOT_IN_RANGE",
            StepandError::MissionAlreadyCompleted(_) => "MISSION_ALREADY_COMPLETED",
            StepandError::InvalidMissionState { .. } => "INVALID_MISSION_STATE",
            StepandError::NoActiveMission => "NO_ACTIVE_MISSION",
            StepandError::LocationUnavailable(_) => "LOCATION_UNAVAILABLE",
            StepandError::InvalidConfig(_) => "INVALID_CONFIG",
            StepandError::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            StepandError::Serialization(_) => "SERIALIZATION_ERROR",
            StepandError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for walk engine operations
pub type Result<T> = std::result::Result<T, StepandError>;

impl From<std::io::Error> for StepandError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StepandError::ConfigNotFound(err.to_string())
        } else {
            StepandError::Internal(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StepandError {
    fn from(err: serde_json::Error) -> Self {
        StepandError::Serialization(err.to_string())
    }
}
