//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the link-training
//! core on the host without a SerDes.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::collections::VecDeque;
#[cfg(feature = "async")]
use std::sync::Arc;
#[cfg(feature = "async")]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(feature = "async")]
use std::task::{Wake, Waker};
use std::vec::Vec;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::driver::config::PipeConfig;
use crate::driver::error::{IoError, Result};
use crate::hal::transceiver::{Symbol, Transceiver};

/// Short configuration for simulated links at 50 MHz
///
/// LFPS bursts are 50 ticks every 500 ticks and TSEQ lasts four sets, so a
/// back-to-back link trains in a few thousand ticks.
pub fn fast_config() -> PipeConfig {
    PipeConfig::new()
        .with_symbol_clock_hz(50_000_000)
        .with_lfps_bursts(2, 4)
        .with_tseq_count(4)
}

// =============================================================================
// Mock Transceiver
// =============================================================================

/// Mock SerDes for driving a `UsbPipe` without hardware
///
/// Received symbols come from a queue, either pushed by the test or
/// delivered from another mock by [`exchange`]. Everything the pipe drives
/// is recorded.
///
/// `line_inverted` models a lane with swapped differential pair: while it
/// differs from the commanded receive polarity, data symbols arrive
/// complemented. K-codes are left intact.
#[derive(Debug)]
pub struct MockTransceiver {
    rx: VecDeque<Symbol>,
    corrupt_next: Option<Symbol>,
    lfps_in: bool,
    rx_locked: bool,
    rx_eq_ready: bool,
    line_inverted: bool,
    rx_polarity: bool,
    failing: bool,

    last_tx: Option<Symbol>,
    tx_log: Vec<Option<Symbol>>,
    lfps_out: bool,
    polarity_log: Vec<bool>,
    elastic_log: Vec<bool>,
}

impl Default for MockTransceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransceiver {
    /// Create a locked, equalized transceiver with nothing to receive
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            corrupt_next: None,
            lfps_in: false,
            rx_locked: true,
            rx_eq_ready: true,
            line_inverted: false,
            rx_polarity: false,
            failing: false,
            last_tx: None,
            tx_log: Vec::new(),
            lfps_out: false,
            polarity_log: Vec::new(),
            elastic_log: Vec::new(),
        }
    }

    // --- Receive side ---

    /// Queue symbols for reception
    pub fn push_rx(&mut self, symbols: impl IntoIterator<Item = Symbol>) {
        self.rx.extend(symbols);
    }

    /// Drop queued symbols
    pub fn clear_rx(&mut self) {
        self.rx.clear();
    }

    /// Replace the next delivered symbol
    pub fn corrupt_next_rx(&mut self, symbol: Symbol) {
        self.corrupt_next = Some(symbol);
    }

    /// Set the LFPS detector level
    pub fn set_lfps_in(&mut self, level: bool) {
        self.lfps_in = level;
    }

    pub fn set_rx_locked(&mut self, locked: bool) {
        self.rx_locked = locked;
    }

    pub fn set_rx_eq_ready(&mut self, ready: bool) {
        self.rx_eq_ready = ready;
    }

    pub fn set_line_inverted(&mut self, inverted: bool) {
        self.line_inverted = inverted;
    }

    /// Make every primitive fail
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Accept the partner's output for this tick
    pub fn deliver(&mut self, symbol: Option<Symbol>, lfps: bool) {
        if let Some(symbol) = symbol {
            let symbol = self.corrupt_next.take().unwrap_or(symbol);
            self.rx.push_back(symbol);
        }
        self.lfps_in = lfps;
    }

    // --- Transmit side ---

    /// Symbol driven by the most recent `transmit`
    pub fn last_tx(&self) -> Option<Symbol> {
        self.last_tx
    }

    /// Every `transmit` call in order
    pub fn tx_log(&self) -> &[Option<Symbol>] {
        &self.tx_log
    }

    /// Current LFPS drive level
    pub fn lfps_driving(&self) -> bool {
        self.lfps_out
    }

    /// Every `set_rx_polarity` call in order
    pub fn polarity_log(&self) -> &[bool] {
        &self.polarity_log
    }

    /// Every `set_elastic_buffer` call in order
    pub fn elastic_buffer_log(&self) -> &[bool] {
        &self.elastic_log
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            Err(IoError::Transceiver.into())
        } else {
            Ok(())
        }
    }
}

impl Transceiver for MockTransceiver {
    fn receive(&mut self) -> Result<Option<Symbol>> {
        self.check()?;
        let flip = self.line_inverted != self.rx_polarity;
        Ok(self.rx.pop_front().map(|s| {
            if flip && !s.ctrl {
                Symbol::data(!s.data)
            } else {
                s
            }
        }))
    }

    fn transmit(&mut self, symbol: Option<Symbol>) -> Result<()> {
        self.check()?;
        self.last_tx = symbol;
        self.tx_log.push(symbol);
        Ok(())
    }

    fn lfps_detected(&mut self) -> Result<bool> {
        self.check()?;
        Ok(self.lfps_in)
    }

    fn set_lfps_drive(&mut self, active: bool) -> Result<()> {
        self.check()?;
        self.lfps_out = active;
        Ok(())
    }

    fn rx_locked(&mut self) -> Result<bool> {
        self.check()?;
        Ok(self.rx_locked)
    }

    fn set_rx_polarity(&mut self, inverted: bool) -> Result<()> {
        self.check()?;
        self.rx_polarity = inverted;
        self.polarity_log.push(inverted);
        Ok(())
    }

    fn rx_eq_ready(&mut self) -> Result<bool> {
        self.check()?;
        Ok(self.rx_eq_ready)
    }

    fn set_elastic_buffer(&mut self, enabled: bool) -> Result<()> {
        self.check()?;
        self.elastic_log.push(enabled);
        Ok(())
    }
}

/// Cross-connect two mocks after both pipes ticked
///
/// Each side receives what the other drove this tick, on the next tick.
pub fn exchange(a: &mut MockTransceiver, b: &mut MockTransceiver) {
    let (a_sym, a_lfps) = (a.last_tx, a.lfps_out);
    let (b_sym, b_lfps) = (b.last_tx, b.lfps_out);
    a.deliver(b_sym, b_lfps);
    b.deliver(a_sym, a_lfps);
}

// =============================================================================
// Wakers
// =============================================================================

/// Waker target that counts wakes
#[cfg(feature = "async")]
#[derive(Debug, Default)]
pub struct WakeCounter {
    count: AtomicUsize,
}

#[cfg(feature = "async")]
impl WakeCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn waker(self: &Arc<Self>) -> Waker {
        Waker::from(Arc::clone(self))
    }
}

#[cfg(feature = "async")]
impl Wake for WakeCounter {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Mock GPIO Pins
// =============================================================================

/// Error returned by failing mock pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Input pin with a settable level
#[derive(Debug, Default)]
pub struct MockInputPin {
    level: bool,
    failing: bool,
}

impl MockInputPin {
    pub fn new(level: bool) -> Self {
        Self {
            level,
            failing: false,
        }
    }

    /// Pin whose every read fails
    pub fn failing() -> Self {
        Self {
            level: false,
            failing: true,
        }
    }

    pub fn set_level(&mut self, level: bool) {
        self.level = level;
    }
}

impl ErrorType for MockInputPin {
    type Error = MockPinError;
}

impl InputPin for MockInputPin {
    fn is_high(&mut self) -> core::result::Result<bool, Self::Error> {
        if self.failing {
            return Err(MockPinError);
        }
        Ok(self.level)
    }

    fn is_low(&mut self) -> core::result::Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Output pin that records every write
#[derive(Debug, Default)]
pub struct MockOutputPin {
    writes: Vec<bool>,
    failing: bool,
}

impl MockOutputPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin whose every write fails
    pub fn failing() -> Self {
        Self {
            writes: Vec::new(),
            failing: true,
        }
    }

    /// Levels written, in order
    pub fn writes(&self) -> &[bool] {
        &self.writes
    }

    fn write(&mut self, level: bool) -> core::result::Result<(), MockPinError> {
        if self.failing {
            return Err(MockPinError);
        }
        self.writes.push(level);
        Ok(())
    }
}

impl ErrorType for MockOutputPin {
    type Error = MockPinError;
}

impl OutputPin for MockOutputPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        self.write(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_crosses_symbols_and_lfps() {
        let mut a = MockTransceiver::new();
        let mut b = MockTransceiver::new();
        a.transmit(Some(Symbol::COM)).unwrap();
        a.set_lfps_drive(true).unwrap();
        b.transmit(None).unwrap();

        exchange(&mut a, &mut b);

        assert_eq!(b.receive().unwrap(), Some(Symbol::COM));
        assert!(b.lfps_detected().unwrap());
        assert_eq!(a.receive().unwrap(), None);
        assert!(!a.lfps_detected().unwrap());
    }

    #[test]
    fn inverted_line_complements_data_until_corrected() {
        let mut phy = MockTransceiver::new();
        phy.set_line_inverted(true);
        phy.push_rx([Symbol::data(0x4A), Symbol::COM, Symbol::data(0x4A)]);

        assert_eq!(phy.receive().unwrap(), Some(Symbol::data(0xB5)));
        assert_eq!(phy.receive().unwrap(), Some(Symbol::COM));

        phy.set_rx_polarity(true).unwrap();
        assert_eq!(phy.receive().unwrap(), Some(Symbol::data(0x4A)));
    }

    #[test]
    fn corrupt_replaces_one_delivery() {
        let mut phy = MockTransceiver::new();
        phy.corrupt_next_rx(Symbol::data(0x99));
        phy.deliver(Some(Symbol::COM), false);
        phy.deliver(Some(Symbol::COM), false);

        assert_eq!(phy.receive().unwrap(), Some(Symbol::data(0x99)));
        assert_eq!(phy.receive().unwrap(), Some(Symbol::COM));
    }

    #[test]
    fn failing_mock_rejects_everything() {
        let mut phy = MockTransceiver::new();
        phy.set_lfps_in(true);
        assert!(phy.lfps_detected().unwrap());

        phy.set_failing(true);
        assert!(phy.lfps_detected().is_err());
        assert!(phy.transmit(None).is_err());
        assert!(phy.tx_log().is_empty());
    }
}
