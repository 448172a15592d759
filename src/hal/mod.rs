//! Hardware Abstraction Layer
//!
//! This module defines the boundary between the link-training core and the
//! physical transceiver.
//!
//! # Modules
//!
//! - [`transceiver`]: the [`Transceiver`] trait and the [`Symbol`] type
//! - [`lfps_pins`]: GPIO-backed LFPS detect/drive lines
//!
//! # embedded-hal Integration
//!
//! [`LfpsPins`] uses `embedded_hal::digital::{InputPin, OutputPin}` directly.
//! Pass any pin types from your HAL.

pub mod lfps_pins;
pub mod transceiver;

pub use lfps_pins::LfpsPins;
pub use transceiver::{Symbol, Transceiver};
