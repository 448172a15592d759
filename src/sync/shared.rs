//! ISR-safe pipe wrapper using critical sections.
//!
//! The usual deployment ticks the pipe from the symbol-clock (or SerDes
//! FIFO) interrupt while the link layer polls status from thread context.
//! [`SharedPipe`] makes both sides go through one critical section.

use super::primitives::CriticalSectionCell;
use crate::driver::config::PipeConfig;
use crate::driver::error::{ConfigResult, Result};
use crate::driver::pipe::{TickInput, TickOutput, UsbPipe};
use crate::hal::transceiver::Transceiver;
use crate::link::ltssm::LinkState;

/// ISR-safe [`UsbPipe`].
///
/// # Example
///
/// ```ignore
/// static PIPE: SharedPipe = SharedPipe::new();
///
/// #[interrupt]
/// fn SERDES_RX() {
///     let out = PIPE.tick(serdes(), TickInput::enabled()).ok();
/// }
///
/// fn link_task() {
///     if PIPE.is_ready() {
///         // start link-layer traffic
///     }
/// }
/// ```
pub struct SharedPipe {
    inner: CriticalSectionCell<UsbPipe>,
}

impl SharedPipe {
    /// Create a shared pipe with the default configuration (const, suitable
    /// for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(UsbPipe::new()),
        }
    }

    /// Create a shared pipe with a validated configuration.
    pub fn with_config(config: PipeConfig) -> ConfigResult<Self> {
        Ok(Self {
            inner: CriticalSectionCell::new(UsbPipe::with_config(config)?),
        })
    }

    /// Execute a closure with exclusive access to the pipe.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut UsbPipe) -> R,
    {
        self.inner.with(f)
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut UsbPipe) -> R,
    {
        self.inner.try_with(f)
    }

    /// [`UsbPipe::tick`] inside a critical section.
    pub fn tick<T: Transceiver>(&self, phy: &mut T, input: TickInput) -> Result<TickOutput> {
        self.inner.with(|pipe| pipe.tick(phy, input))
    }

    /// Current LTSSM state.
    pub fn state(&self) -> LinkState {
        self.inner.with_ref(UsbPipe::state)
    }

    /// Whether the link is in U0.
    pub fn is_ready(&self) -> bool {
        self.inner.with_ref(UsbPipe::is_ready)
    }

    /// Retrains since the last enable.
    pub fn retrains(&self) -> u32 {
        self.inner.with_ref(UsbPipe::retrains)
    }
}

impl Default for SharedPipe {
    fn default() -> Self {
        Self::new()
    }
}
