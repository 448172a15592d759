//! Core driver components for the PIPE link-training core.
//!
//! - [`config`] - Protocol timing and thresholds with builder methods
//! - [`error`] - Error types and result aliases
//! - [`pipe`] - [`UsbPipe`], the per-tick composition of the link engines
//!
//! # Example
//!
//! ```ignore
//! use usb3_pipe::driver::{PipeConfig, UsbPipe};
//!
//! let config = PipeConfig::new()
//!     .with_symbol_clock_hz(250_000_000)
//!     .with_disable_scrambling(false);
//! let mut pipe = UsbPipe::with_config(config)?;
//! ```

// Submodules
pub mod config;
pub mod error;
pub mod pipe;

// Re-exports for convenience
pub use config::{LfpsTiming, PipeConfig, TickTimings, TickWindow};
pub use error::{ConfigError, ConfigResult, Error, IoError, IoResult, Result};
pub use pipe::{TickInput, TickOutput, UsbPipe};
