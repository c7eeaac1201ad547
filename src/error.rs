//! Error types for the allocation core

use std::fmt;

/// Errors surfaced by the allocation core
///
/// None of these are fatal to an agent's state machine: the engine treats
/// protocol faults (bad frames) as skippable and continues from the state
/// prior to the bad input.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Bundle or path is at its configured capacity
    CapacityFull,
    /// Task is already present in the bundle or path
    ItemAlreadyExists,
    /// Insertion position is outside the current sequence
    IndexOutOfBounds,
    /// Frame ended before a field could be fully read
    TruncatedFrame,
    /// Identifier bytes in a frame were not valid UTF-8
    InvalidIdentifier,
    /// Configuration could not be parsed
    ConfigError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CapacityFull => write!(f, "bundle capacity reached"),
            Error::ItemAlreadyExists => write!(f, "task already present"),
            Error::IndexOutOfBounds => write!(f, "position outside sequence"),
            Error::TruncatedFrame => write!(f, "frame truncated"),
            Error::InvalidIdentifier => write!(f, "identifier is not valid UTF-8"),
            Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
