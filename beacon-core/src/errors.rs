//! Error Types for Beacon Configuration and Command Decoding
//!
//! ## Design Philosophy
//!
//! The firmware loop never aborts on a runtime failure. Connectivity problems
//! are retried forever, publish failures are logged and dropped, and a command
//! that cannot be decoded is simply ignored. Errors therefore exist for two
//! narrow purposes:
//!
//! 1. **Rejecting bad configuration up front**: an empty beacon id or a
//!    zero-capacity history is caught when the config is built, not in the
//!    middle of the loop.
//!
//! 2. **Explaining why an inbound message was ignored**: the beacon logs the
//!    [`DecodeError`] at debug level and carries on without a state change.
//!
//! Both enums are `Copy` and carry no heap data so they can be returned from
//! the hot path without allocation.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use beacon_core::commands::{decode, CommandDialect};
//! use beacon_core::DecodeError;
//!
//! match decode(CommandDialect::Structured, b"not json", "BEACON_001") {
//!     Ok(command) => { /* apply command */ }
//!     Err(DecodeError::NotAddressed) => { /* someone else's command */ }
//!     Err(_) => { /* malformed body, ignore */ }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors raised while building a [`crate::config::BeaconConfig`]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Beacon identifier must not be empty
    #[error("Beacon id must not be empty")]
    EmptyBeaconId,

    /// Beacon identifier does not fit the inline id buffer
    #[error("Beacon id is {len} bytes, limit is {max}")]
    BeaconIdTooLong {
        /// Length of the rejected id in bytes
        len: usize,
        /// Maximum supported length
        max: usize,
    },

    /// A topic does not fit the inline topic buffer
    #[error("Topic is {len} bytes, limit is {max}")]
    TopicTooLong {
        /// Length of the rejected topic in bytes
        len: usize,
        /// Maximum supported length
        max: usize,
    },

    /// History capacity of zero would drop every event
    #[error("History capacity must be at least 1")]
    ZeroCapacity,

    /// Flush interval of zero has no meaning for a modulo trigger
    #[error("History flush interval must be at least 1")]
    ZeroFlushInterval,
}

/// Reasons an inbound command message is ignored
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Body is not a JSON object of the expected shape
    #[error("Malformed command payload")]
    Malformed,

    /// Body is not valid UTF-8 text
    #[error("Command payload is not valid UTF-8")]
    InvalidUtf8,

    /// Command is addressed to a different beacon
    #[error("Command addressed to another beacon")]
    NotAddressed,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::EmptyBeaconId => defmt::write!(fmt, "Empty beacon id"),
            Self::BeaconIdTooLong { len, max } =>
                defmt::write!(fmt, "Beacon id {} bytes, limit {}", len, max),
            Self::TopicTooLong { len, max } =>
                defmt::write!(fmt, "Topic {} bytes, limit {}", len, max),
            Self::ZeroCapacity => defmt::write!(fmt, "Zero history capacity"),
            Self::ZeroFlushInterval => defmt::write!(fmt, "Zero flush interval"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DecodeError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Malformed => defmt::write!(fmt, "Malformed payload"),
            Self::InvalidUtf8 => defmt::write!(fmt, "Invalid UTF-8"),
            Self::NotAddressed => defmt::write!(fmt, "Not addressed to us"),
        }
    }
}
