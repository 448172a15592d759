//! GPIO-backed LFPS lines
//!
//! Some transceivers expose LFPS as two discrete signals rather than as part
//! of the PIPE interface: a squelch/burst-detect output and an out-of-band
//! transmit enable. [`LfpsPins`] wraps such a pair using the
//! `embedded_hal::digital` traits, so a [`Transceiver`] implementation can
//! delegate its two LFPS primitives to it.
//!
//! # Example
//!
//! ```ignore
//! use usb3_pipe::hal::{LfpsPins, Transceiver};
//!
//! struct Board<D, T> {
//!     lfps: LfpsPins<D, T>,
//!     // ...
//! }
//!
//! impl<D: InputPin, T: OutputPin> Transceiver for Board<D, T> {
//!     fn lfps_detected(&mut self) -> Result<bool> { self.lfps.detected() }
//!     fn set_lfps_drive(&mut self, active: bool) -> Result<()> { self.lfps.drive(active) }
//!     // ...
//! }
//! ```
//!
//! [`Transceiver`]: super::transceiver::Transceiver

use embedded_hal::digital::{InputPin, OutputPin};

use crate::driver::error::{IoError, Result};

/// Burst-detect input plus burst-drive output
#[derive(Debug)]
pub struct LfpsPins<DET, DRV> {
    detect: DET,
    drive: DRV,
    /// Detect line is active-low (squelch asserted = no burst)
    detect_active_low: bool,
    /// Last level driven, to skip redundant writes
    driving: Option<bool>,
}

impl<DET: InputPin, DRV: OutputPin> LfpsPins<DET, DRV> {
    /// Wrap an active-high detect input and a drive output
    pub fn new(detect: DET, drive: DRV) -> Self {
        Self {
            detect,
            drive,
            detect_active_low: false,
            driving: None,
        }
    }

    /// Wrap a squelch-style detect input that reads low during a burst
    pub fn with_active_low_detect(detect: DET, drive: DRV) -> Self {
        Self {
            detect_active_low: true,
            ..Self::new(detect, drive)
        }
    }

    /// Sample the detect line
    pub fn detected(&mut self) -> Result<bool> {
        let high = self.detect.is_high().map_err(|_| IoError::Transceiver)?;
        Ok(high != self.detect_active_low)
    }

    /// Drive the burst output
    pub fn drive(&mut self, active: bool) -> Result<()> {
        if self.driving == Some(active) {
            return Ok(());
        }
        let written = if active {
            self.drive.set_high()
        } else {
            self.drive.set_low()
        };
        written.map_err(|_| IoError::Transceiver)?;
        self.driving = Some(active);
        Ok(())
    }

    /// Level last written to the drive output
    pub fn is_driving(&self) -> bool {
        self.driving == Some(true)
    }

    /// Release the pins
    pub fn into_inner(self) -> (DET, DRV) {
        (self.detect, self.drive)
    }
}
