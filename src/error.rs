//! Error types for drive-sweep
//!
//! Configuration problems surface before the robot moves; hardware faults
//! abort the run after the drive base has been told to stop.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// drive-sweep error types
#[derive(Error, Debug)]
pub enum Error {
    /// Sweep plan or configuration rejected before any motion
    #[error("Invalid configuration: {0}\nFix the sweep plan before running it on the robot")]
    InvalidConfig(String),

    /// Statistics requested over an empty trial sequence
    #[error("Cannot summarize zero trials: at least one trial is required")]
    NoTrials,

    /// Motor, IMU or hub communication fault
    #[error("Hardware fault: {0}")]
    Hardware(String),

    /// Mission step needs an attachment motor that is not connected
    #[error("Mission requires an arm motor but none is attached")]
    MissingArm,

    /// JSON configuration error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error was raised by the robot rather than by its configuration.
    #[must_use]
    pub const fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware(_))
    }
}
