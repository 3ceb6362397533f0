//! City configuration persistence
//!
//! Implements atomic writes and advisory locking for the JSON files that seed
//! a run with saved intervals and exclusions.

pub mod city;
pub mod lock;

pub use city::CityConfig;

/// Configuration persistence errors
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Configuration cannot seed a run
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file too large
    #[error("configuration file too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge {
        /// Actual file size
        size: u64,
        /// Maximum allowed size
        max: u64,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("deserialization error: {0}")]
    DeserializationError(String),

    /// Lock error
    #[error("lock error: {0}")]
    LockError(String),
}
