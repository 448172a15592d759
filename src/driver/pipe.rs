//! USB3 PIPE link-training core
//!
//! [`UsbPipe`] owns the LFPS engine, the TS engine, the scrambler pair and
//! the LTSSM, and advances all of them once per symbol clock in a fixed
//! order:
//!
//! 1. The LTSSM decides from the *previous* tick's engine status (plus this
//!    tick's equalizer and CDR indicators).
//! 2. The transceiver channel is routed by the state the tick started in:
//!    engines before U0, scramblers in U0.
//! 3. Entry actions of a newly entered state are applied for the next tick.
//!
//! A restart tick resets the engines instead of advancing them, so every
//! counter reads zero when Polling.LFPS is re-entered.
//!
//! U0 opens with a symbol boundary before any host data flows. The
//! transmitter sends COM until it has sent one and received one from the
//! partner, then one scrambled D0.0. The receiver drops everything up to the
//! partner's first COM and swallows the rest of that COM run. Since every
//! COM reseeds the scrambler, both directions are aligned however many ticks
//! apart the partners entered U0.

use crate::driver::config::PipeConfig;
use crate::driver::error::{ConfigResult, Result};
use crate::hal::transceiver::{Symbol, Transceiver};
use crate::link::lfps::{LfpsEngine, LfpsPattern, LfpsStatus};
use crate::link::ltssm::{Action, LinkState, Ltssm, LtssmInputs};
use crate::link::ordered_set::{LinkFunctionality, TxPattern};
use crate::link::scrambler::Scrambler;
use crate::link::training::{TsEngine, TsStatus};

// =============================================================================
// Tick I/O
// =============================================================================

/// Host-side inputs for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickInput {
    /// Level-sensitive enable; `false` holds everything in reset
    pub enable: bool,
    /// Symbol the host link layer wants to send
    pub host_tx: Option<Symbol>,
}

impl TickInput {
    /// Enabled tick with nothing to send
    pub const fn enabled() -> Self {
        Self {
            enable: true,
            host_tx: None,
        }
    }

    /// Disabled tick
    pub const fn disabled() -> Self {
        Self {
            enable: false,
            host_tx: None,
        }
    }

    /// Enabled tick offering `symbol` to the link
    pub const fn send(symbol: Symbol) -> Self {
        Self {
            enable: true,
            host_tx: Some(symbol),
        }
    }
}

/// Host-side outputs of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickOutput {
    /// Link is up; true iff `state` is U0
    pub ready: bool,
    /// State the tick was evaluated in
    pub state: LinkState,
    /// Descrambled symbol received from the partner
    pub host_rx: Option<Symbol>,
    /// `host_tx` was consumed; otherwise the host must hold it
    pub host_tx_accepted: bool,
}

impl TickOutput {
    const fn idle(state: LinkState) -> Self {
        Self {
            ready: state.is_ready(),
            state,
            host_rx: None,
            host_tx_accepted: false,
        }
    }
}

// =============================================================================
// U0 boundary
// =============================================================================

/// Transmit side of the U0 boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum TxBoundary {
    /// No COM sent yet
    Start,
    /// At least one COM sent
    ComSent,
    /// Boundary complete; host symbols are accepted
    Open,
}

/// Receive side of the U0 boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum RxBoundary {
    /// Waiting for the partner's first COM
    Hunting,
    /// Inside the partner's leading COM run
    Leading,
    /// Delivering descrambled symbols
    Open,
}

// =============================================================================
// Pipe
// =============================================================================

/// Link-training core for one USB3 SuperSpeed lane
///
/// # Example
///
/// ```ignore
/// let mut pipe = UsbPipe::new();
///
/// // Symbol-clock loop
/// loop {
///     let out = pipe.tick(&mut serdes, TickInput { enable, host_tx: pending })?;
///     if out.host_tx_accepted {
///         pending = next_symbol();
///     }
///     if let Some(symbol) = out.host_rx {
///         link_layer.push(symbol);
///     }
/// }
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbPipe {
    config: PipeConfig,
    ltssm: Ltssm,
    lfps: LfpsEngine,
    ts: TsEngine,
    scrambler: Scrambler,
    descrambler: Scrambler,
    tx_boundary: TxBoundary,
    rx_boundary: RxBoundary,
    rx_inverted: bool,
}

impl Default for UsbPipe {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbPipe {
    /// Create a pipe with the USB 3.2 Gen1 defaults
    pub const fn new() -> Self {
        Self::build(PipeConfig::new())
    }

    /// Create a pipe with a validated configuration
    pub fn with_config(config: PipeConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    const fn build(config: PipeConfig) -> Self {
        let flags = LinkFunctionality::NONE.with_disable_scrambling(config.disable_scrambling);
        Self {
            ltssm: Ltssm::new(&config),
            lfps: LfpsEngine::new(&config),
            ts: TsEngine::new(config.ts_match_threshold, config.idle_rx_symbols, flags),
            scrambler: Scrambler::new(),
            descrambler: Scrambler::new(),
            tx_boundary: TxBoundary::Start,
            rx_boundary: RxBoundary::Hunting,
            rx_inverted: false,
            config,
        }
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Active configuration
    pub fn config(&self) -> &PipeConfig {
        &self.config
    }

    /// Current LTSSM state
    #[inline(always)]
    pub fn state(&self) -> LinkState {
        self.ltssm.state()
    }

    /// Whether the link is in U0
    #[inline(always)]
    pub fn is_ready(&self) -> bool {
        self.ltssm.state().is_ready()
    }

    /// Retrains since the last `enable`
    pub fn retrains(&self) -> u32 {
        self.ltssm.retrains()
    }

    /// LFPS engine status
    pub fn lfps_status(&self) -> LfpsStatus {
        self.lfps.status()
    }

    /// TS engine status
    pub fn ts_status(&self) -> TsStatus {
        self.ts.status()
    }

    /// Whether receive polarity is currently inverted
    pub fn rx_polarity_inverted(&self) -> bool {
        self.rx_inverted
    }

    /// Whether U0 traffic is scrambled
    pub fn scrambling_enabled(&self) -> bool {
        !self.scrambler.is_bypassed()
    }

    /// Whether the U0 boundary is complete and host symbols are accepted
    pub fn host_data_open(&self) -> bool {
        self.is_ready() && self.tx_boundary == TxBoundary::Open
    }

    /// Transmit scrambler
    pub fn scrambler(&self) -> &Scrambler {
        &self.scrambler
    }

    /// Receive descrambler
    pub fn descrambler(&self) -> &Scrambler {
        &self.descrambler
    }

    // =========================================================================
    // Reset
    // =========================================================================

    /// Return every component to its power-on state
    ///
    /// Does not touch the transceiver; [`tick`](Self::tick) with
    /// `enable = false` also releases the transceiver controls.
    pub fn reset(&mut self) {
        self.ltssm.reset();
        self.lfps.reset();
        self.ts.reset();
        self.scrambler.reset();
        self.descrambler.reset();
        self.tx_boundary = TxBoundary::Start;
        self.rx_boundary = RxBoundary::Hunting;
        self.rx_inverted = false;
    }

    fn disable<T: Transceiver>(&mut self, phy: &mut T) -> Result<()> {
        if self.ltssm.state() != LinkState::Disabled {
            #[cfg(feature = "defmt")]
            defmt::info!("LTSSM: {} -> Disabled (enable deasserted)", self.ltssm.state());

            phy.set_elastic_buffer(false)?;
            if self.rx_inverted {
                phy.set_rx_polarity(false)?;
            }
        }
        self.reset();
        phy.set_lfps_drive(false)?;
        phy.transmit(None)
    }

    /// Clear training state ahead of Polling.LFPS
    fn reset_training<T: Transceiver>(&mut self, phy: &mut T) -> Result<()> {
        self.lfps.reset();
        self.ts.reset();
        self.scrambler.reset();
        self.descrambler.reset();
        self.tx_boundary = TxBoundary::Start;
        self.rx_boundary = RxBoundary::Hunting;
        phy.set_elastic_buffer(false)?;
        if self.rx_inverted {
            self.rx_inverted = false;
            phy.set_rx_polarity(false)?;
        }
        Ok(())
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Advance the core by one symbol clock
    ///
    /// # Errors
    ///
    /// Only transceiver failures are errors. Protocol failures retrain the
    /// link and show up as `ready` dropping.
    pub fn tick<T: Transceiver>(&mut self, phy: &mut T, input: TickInput) -> Result<TickOutput> {
        if !input.enable {
            self.disable(phy)?;
            return Ok(TickOutput::idle(LinkState::Disabled));
        }

        let state = self.ltssm.state();
        let inputs = LtssmInputs {
            lfps: self.lfps.status(),
            ts: self.ts.status(),
            rx_eq_ready: state == LinkState::PollingRxEq && phy.rx_eq_ready()?,
            rx_locked: state == LinkState::U0 && phy.rx_locked()?,
        };
        let action = self.ltssm.step(&inputs);

        let mut output = TickOutput::idle(state);
        match action {
            Action::Restart => {
                self.reset_training(phy)?;
                self.lfps.drive(Some(LfpsPattern::Polling));
                phy.set_lfps_drive(false)?;
                phy.transmit(None)?;
                return Ok(output);
            }
            Action::FlipPolarity => {
                self.rx_inverted = !self.rx_inverted;
                phy.set_rx_polarity(self.rx_inverted)?;
                self.ts.clear_inversion();

                #[cfg(feature = "defmt")]
                defmt::debug!("LTSSM: receive polarity inverted = {}", self.rx_inverted);
            }
            Action::Stay | Action::Enter(_) => {}
        }

        match state {
            LinkState::U0 => {
                output.host_rx = self.receive_data(phy)?;
                output.host_tx_accepted = self.transmit_data(phy, input.host_tx)?;
            }
            state if state.is_training() => self.train(phy, state)?,
            // Disabled
            _ => {
                phy.set_lfps_drive(false)?;
                phy.transmit(None)?;
            }
        }

        if let Action::Enter(next) = action {
            self.enter(phy, next)?;
        }
        Ok(output)
    }

    /// Training data path: LFPS on the out-of-band line, ordered sets on the
    /// symbol line
    fn train<T: Transceiver>(&mut self, phy: &mut T, state: LinkState) -> Result<()> {
        let drive = if state == LinkState::PollingLfps {
            let detected = phy.lfps_detected()?;
            self.lfps.tick(detected)
        } else {
            false
        };
        phy.set_lfps_drive(drive)?;

        let rx = phy.receive()?;
        let tx = self.ts.tick(rx);
        phy.transmit(tx)
    }

    fn receive_data<T: Transceiver>(&mut self, phy: &mut T) -> Result<Option<Symbol>> {
        let Some(symbol) = phy.receive()? else {
            return Ok(None);
        };
        match self.rx_boundary {
            RxBoundary::Hunting if symbol.is_com() => {
                self.descrambler.process(symbol);
                self.rx_boundary = RxBoundary::Leading;
                Ok(None)
            }
            // Partner's training fill or a torn boundary
            RxBoundary::Hunting => Ok(None),
            RxBoundary::Leading if symbol.is_com() => {
                self.descrambler.process(symbol);
                Ok(None)
            }
            RxBoundary::Leading | RxBoundary::Open => {
                self.rx_boundary = RxBoundary::Open;
                Ok(Some(self.descrambler.process(symbol)))
            }
        }
    }

    /// Returns whether `host_tx` was consumed
    fn transmit_data<T: Transceiver>(&mut self, phy: &mut T, host_tx: Option<Symbol>) -> Result<bool> {
        let (symbol, accepted) = match self.tx_boundary {
            TxBoundary::Start => {
                self.tx_boundary = TxBoundary::ComSent;
                (Symbol::COM, false)
            }
            TxBoundary::ComSent if self.rx_boundary == RxBoundary::Hunting => (Symbol::COM, false),
            TxBoundary::ComSent => {
                self.tx_boundary = TxBoundary::Open;

                #[cfg(feature = "defmt")]
                defmt::debug!("U0: symbol boundary complete");

                (Symbol::IDLE, false)
            }
            TxBoundary::Open => (host_tx.unwrap_or(Symbol::IDLE), host_tx.is_some()),
        };
        phy.transmit(Some(self.scrambler.process(symbol)))?;
        Ok(accepted)
    }

    fn enter<T: Transceiver>(&mut self, phy: &mut T, next: LinkState) -> Result<()> {
        match next {
            LinkState::Disabled => {}
            LinkState::PollingLfps => {
                self.reset_training(phy)?;
                self.lfps.drive(Some(LfpsPattern::Polling));
            }
            LinkState::PollingRxEq => {
                self.lfps.drive(None);
                self.ts.set_tx(TxPattern::Tseq);
            }
            LinkState::PollingActive => {
                self.ts.set_tx(TxPattern::Ts1);
                phy.set_elastic_buffer(true)?;
            }
            LinkState::PollingConfiguration => self.ts.set_tx(TxPattern::Ts2),
            LinkState::PollingIdle => self.ts.set_tx(TxPattern::Idle),
            LinkState::U0 => {
                let bypass = !self.ts.status().scrambling_allowed(self.ts.local_flags());
                self.ts.set_tx(TxPattern::Off);
                self.scrambler.reset();
                self.descrambler.reset();
                self.scrambler.set_bypass(bypass);
                self.descrambler.set_bypass(bypass);
                self.tx_boundary = TxBoundary::Start;
                self.rx_boundary = RxBoundary::Hunting;

                #[cfg(feature = "defmt")]
                defmt::info!("LTSSM: link up, scrambling {}", !bypass);
            }
        }
        Ok(())
    }
}
