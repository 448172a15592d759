//! Error types for the USB3 PIPE core
//!
//! Protocol failures (LFPS timeout, lost training lock, framing errors) are
//! not errors here: the LTSSM recovers from them by retraining. The types
//! below cover the two things that can actually go wrong for a caller:
//! - [`ConfigError`]: a [`PipeConfig`](super::config::PipeConfig) that cannot
//!   describe a working link
//! - [`IoError`]: the transceiver collaborator failed a primitive
//!
//! The unified [`Error`] enum wraps both and is returned by
//! [`UsbPipe::tick`](super::pipe::UsbPipe::tick).

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
///
/// Returned by [`PipeConfig::validate`](super::config::PipeConfig::validate)
/// and by constructors that validate their configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Symbol clock rate is zero
    InvalidClock,
    /// A handshake or lock threshold is zero
    InvalidThreshold,
    /// An LFPS window is not ordered `min <= typ <= max`
    InvalidTiming,
    /// The typical LFPS burst does not fit inside the typical repeat period
    BurstExceedsRepeat,
    /// A duration rounds down to zero ticks at the configured clock
    DurationTooShort,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidClock => "invalid symbol clock",
            ConfigError::InvalidThreshold => "threshold must be non-zero",
            ConfigError::InvalidTiming => "LFPS timing window out of order",
            ConfigError::BurstExceedsRepeat => "LFPS burst longer than repeat period",
            ConfigError::DurationTooShort => "duration shorter than one tick",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Transceiver boundary errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// The transceiver failed to sample or drive a signal
    Transceiver,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Transceiver => "transceiver access failed",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match pipe.tick(&mut phy, input) {
///     Err(Error::Io(IoError::Transceiver)) => { /* SerDes fault */ }
///     Err(Error::Config(_)) => unreachable!(),
///     Ok(out) => { /* ... */ }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for PIPE operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for transceiver operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;

    #[test]
    fn config_error_as_str_non_empty() {
        let variants = [
            ConfigError::InvalidClock,
            ConfigError::InvalidThreshold,
            ConfigError::InvalidTiming,
            ConfigError::BurstExceedsRepeat,
            ConfigError::DurationTooShort,
        ];

        for variant in variants {
            assert!(!variant.as_str().is_empty(), "ConfigError::{variant:?} has empty string");
        }
    }

    #[test]
    fn config_error_display() {
        let display = format!("{}", ConfigError::InvalidTiming);
        assert_eq!(display, "LFPS timing window out of order");
    }

    #[test]
    fn io_error_display() {
        let display = format!("{}", IoError::Transceiver);
        assert_eq!(display, "transceiver access failed");
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::InvalidClock.into();
        assert_eq!(err, Error::Config(ConfigError::InvalidClock));
    }

    #[test]
    fn error_from_io_error() {
        let err: Error = IoError::Transceiver.into();
        assert_eq!(err, Error::Io(IoError::Transceiver));
    }

    #[test]
    fn error_display_prefixes_domain() {
        let display = format!("{}", Error::Config(ConfigError::InvalidThreshold));
        assert!(display.starts_with("config:"));
        assert!(display.contains("threshold"));

        let display = format!("{}", Error::Io(IoError::Transceiver));
        assert!(display.starts_with("io:"));
    }

    #[test]
    fn question_mark_converts_domain_errors() {
        fn fails() -> Result<()> {
            Err(IoError::Transceiver)?;
            Ok(())
        }

        assert_eq!(fails(), Err(Error::Io(IoError::Transceiver)));
    }
}
