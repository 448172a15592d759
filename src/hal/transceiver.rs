//! Transceiver (SerDes) boundary
//!
//! The link-training core never touches the physical layer directly. Every
//! tick it samples and drives the transceiver through the [`Transceiver`]
//! trait, which keeps the core independent of the SerDes vendor and lets the
//! whole state machine run on the host against a mock.

use crate::driver::error::Result;
use crate::internal::constants::{D0_0, K28_5};

// =============================================================================
// Symbol
// =============================================================================

/// One 8b/10b symbol as seen across the PIPE boundary
///
/// `ctrl` marks a K-code. Data symbols (`ctrl == false`) are the ones the
/// scrambler whitens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Symbol {
    /// Decoded byte
    pub data: u8,
    /// Control (K-code) flag
    pub ctrl: bool,
}

impl Symbol {
    /// K28.5 comma symbol
    pub const COM: Self = Self::ctrl(K28_5);

    /// D0.0, the logical idle payload
    pub const IDLE: Self = Self::data(D0_0);

    /// Create a data symbol
    #[must_use]
    pub const fn data(data: u8) -> Self {
        Self { data, ctrl: false }
    }

    /// Create a control symbol
    #[must_use]
    pub const fn ctrl(data: u8) -> Self {
        Self { data, ctrl: true }
    }

    /// Whether this is the COM symbol
    #[inline(always)]
    pub const fn is_com(&self) -> bool {
        self.ctrl && self.data == K28_5
    }

    /// Whether this is a data symbol carrying `value`
    #[inline(always)]
    pub const fn is_data(&self, value: u8) -> bool {
        !self.ctrl && self.data == value
    }
}

// =============================================================================
// Transceiver Trait
// =============================================================================

/// Duplex symbol channel plus the out-of-band primitives of a SerDes
///
/// Every method is called at most once per tick. `receive` and `transmit`
/// carry one symbol each; `None` means no symbol this tick on receive and
/// electrical idle on transmit.
///
/// # Example Implementation
///
/// ```ignore
/// struct MySerdes { /* vendor handle */ }
///
/// impl Transceiver for MySerdes {
///     fn receive(&mut self) -> Result<Option<Symbol>> { /* pop RX FIFO */ }
///     fn transmit(&mut self, symbol: Option<Symbol>) -> Result<()> { /* push TX FIFO */ }
///     fn lfps_detected(&mut self) -> Result<bool> { /* squelch output */ }
///     fn set_lfps_drive(&mut self, active: bool) -> Result<()> { /* OOB TX */ }
///     fn rx_locked(&mut self) -> Result<bool> { /* CDR lock */ }
///     fn set_rx_polarity(&mut self, inverted: bool) -> Result<()> { /* RX invert */ }
/// }
/// ```
pub trait Transceiver {
    /// Take the next received symbol, if one arrived this tick
    fn receive(&mut self) -> Result<Option<Symbol>>;

    /// Drive one symbol, or electrical idle for `None`
    fn transmit(&mut self, symbol: Option<Symbol>) -> Result<()>;

    /// Sample the LFPS burst detector
    fn lfps_detected(&mut self) -> Result<bool>;

    /// Drive (or stop driving) an LFPS burst
    fn set_lfps_drive(&mut self, active: bool) -> Result<()>;

    /// Whether the clock-data recovery is locked to the incoming stream
    fn rx_locked(&mut self) -> Result<bool>;

    /// Invert (or restore) receive polarity
    fn set_rx_polarity(&mut self, inverted: bool) -> Result<()>;

    /// Whether receiver equalization has converged
    ///
    /// Transceivers without an adaptive equalizer report ready.
    fn rx_eq_ready(&mut self) -> Result<bool> {
        Ok(true)
    }

    /// Enable or disable the receive elastic buffer
    ///
    /// The core enables it once symbol lock is expected (Polling.Active) and
    /// disables it on every restart.
    fn set_elastic_buffer(&mut self, _enabled: bool) -> Result<()> {
        Ok(())
    }
}
