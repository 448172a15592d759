//! Link Training and Status State Machine
//!
//! Decides the next [`LinkState`] from the previous tick's engine status and
//! this tick's transceiver indicators. The LTSSM itself never touches the
//! transceiver or the engines: it returns an [`Action`] and the pipe applies
//! it. Every failure edge is [`Action::Restart`], which always lands in
//! Polling.LFPS.

use crate::driver::config::PipeConfig;
use crate::link::lfps::LfpsStatus;
use crate::link::training::TsStatus;

// =============================================================================
// Link State
// =============================================================================

/// LTSSM state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Held in reset by `enable`
    #[default]
    Disabled,
    /// Polling.LFPS: out-of-band burst handshake
    PollingLfps,
    /// Polling.RxEQ: TSEQ for receiver equalization
    PollingRxEq,
    /// Polling.Active: TS1 exchange
    PollingActive,
    /// Polling.Configuration: TS2 exchange
    PollingConfiguration,
    /// Polling.Idle: idle symbol exchange
    PollingIdle,
    /// Link up
    U0,
}

impl LinkState {
    /// Every state, in training order
    pub const ALL: [LinkState; 7] = [
        LinkState::Disabled,
        LinkState::PollingLfps,
        LinkState::PollingRxEq,
        LinkState::PollingActive,
        LinkState::PollingConfiguration,
        LinkState::PollingIdle,
        LinkState::U0,
    ];

    /// Whether the link is up (the host `ready` signal)
    #[inline(always)]
    pub const fn is_ready(self) -> bool {
        matches!(self, LinkState::U0)
    }

    /// Whether the state belongs to link training
    pub const fn is_training(self) -> bool {
        !matches!(self, LinkState::Disabled | LinkState::U0)
    }

    /// Short name for logs
    pub const fn as_str(self) -> &'static str {
        match self {
            LinkState::Disabled => "Disabled",
            LinkState::PollingLfps => "Polling.LFPS",
            LinkState::PollingRxEq => "Polling.RxEQ",
            LinkState::PollingActive => "Polling.Active",
            LinkState::PollingConfiguration => "Polling.Configuration",
            LinkState::PollingIdle => "Polling.Idle",
            LinkState::U0 => "U0",
        }
    }
}

impl core::fmt::Display for LinkState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Inputs and Actions
// =============================================================================

/// Everything the LTSSM observes in one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LtssmInputs {
    /// LFPS engine status from the previous tick
    pub lfps: LfpsStatus,
    /// TS engine status from the previous tick
    pub ts: TsStatus,
    /// Receiver equalization has converged
    pub rx_eq_ready: bool,
    /// Clock-data recovery is locked
    pub rx_locked: bool,
}

/// What the pipe must do after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Nothing changes
    Stay,
    /// Flip receive polarity and acknowledge the inverted set
    FlipPolarity,
    /// A success edge was taken into the given state
    Enter(LinkState),
    /// A failure edge was taken; training starts over in Polling.LFPS
    Restart,
}

// =============================================================================
// State Machine
// =============================================================================

/// LTSSM with its per-state timers
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ltssm {
    state: LinkState,
    /// Ticks spent in the current state
    timer: u32,
    /// Ticks spent waiting for equalization after the TSEQ run
    eq_wait: u32,
    retrains: u32,

    tseq_count: u32,
    ts2_tx_after_rx: u32,
    idle_tx_after_rx: u32,
    rxeq_timeout: u32,
    active_timeout: u32,
    config_timeout: u32,
    idle_timeout: u32,
    disable_scrambling: bool,
}

impl Ltssm {
    /// Create a state machine in `Disabled`
    pub const fn new(config: &PipeConfig) -> Self {
        let timings = config.timings();
        Self {
            state: LinkState::Disabled,
            timer: 0,
            eq_wait: 0,
            retrains: 0,
            tseq_count: config.tseq_count,
            ts2_tx_after_rx: config.ts2_tx_after_rx,
            idle_tx_after_rx: config.idle_tx_after_rx,
            rxeq_timeout: timings.rxeq_timeout,
            active_timeout: timings.active_timeout,
            config_timeout: timings.config_timeout,
            idle_timeout: timings.idle_timeout,
            disable_scrambling: config.disable_scrambling,
        }
    }

    /// Return to `Disabled` and clear the retrain count
    pub fn reset(&mut self) {
        self.state = LinkState::Disabled;
        self.timer = 0;
        self.eq_wait = 0;
        self.retrains = 0;
    }

    /// Current state
    #[inline(always)]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Ticks spent in the current state
    #[inline(always)]
    pub fn elapsed(&self) -> u32 {
        self.timer
    }

    /// Failure edges taken since the last `enable`
    #[inline(always)]
    pub fn retrains(&self) -> u32 {
        self.retrains
    }

    /// Evaluate one tick
    pub fn step(&mut self, inputs: &LtssmInputs) -> Action {
        self.timer = self.timer.saturating_add(1);

        let action = self.decide(inputs);
        match action {
            Action::Stay | Action::FlipPolarity => {}
            Action::Enter(next) => self.enter(next),
            Action::Restart => {
                self.retrains = self.retrains.saturating_add(1);

                #[cfg(feature = "defmt")]
                defmt::info!(
                    "LTSSM: {} failed after {} ticks, retrain #{}",
                    self.state,
                    self.timer,
                    self.retrains
                );

                self.enter(LinkState::PollingLfps);
            }
        }
        action
    }

    fn enter(&mut self, next: LinkState) {
        #[cfg(feature = "defmt")]
        defmt::info!("LTSSM: {} -> {}", self.state, next);

        self.state = next;
        self.timer = 0;
        self.eq_wait = 0;
    }

    fn decide(&mut self, inputs: &LtssmInputs) -> Action {
        let ts = &inputs.ts;
        match self.state {
            LinkState::Disabled => Action::Enter(LinkState::PollingLfps),

            LinkState::PollingLfps => {
                if inputs.lfps.handshake_complete {
                    Action::Enter(LinkState::PollingRxEq)
                } else if inputs.lfps.timed_out {
                    Action::Restart
                } else {
                    Action::Stay
                }
            }

            LinkState::PollingRxEq => {
                if ts.sets_sent < self.tseq_count {
                    return Action::Stay;
                }
                if inputs.rx_eq_ready {
                    return Action::Enter(LinkState::PollingActive);
                }
                self.eq_wait = self.eq_wait.saturating_add(1);
                if self.eq_wait >= self.rxeq_timeout {
                    Action::Restart
                } else {
                    Action::Stay
                }
            }

            LinkState::PollingActive => {
                if ts.synchronized {
                    Action::Enter(LinkState::PollingConfiguration)
                } else if self.timer >= self.active_timeout {
                    Action::Restart
                } else if ts.inverted {
                    Action::FlipPolarity
                } else {
                    Action::Stay
                }
            }

            LinkState::PollingConfiguration => {
                let flags_agree =
                    ts.partner_flags.disable_scrambling() == self.disable_scrambling;
                if ts.framing_error {
                    Action::Restart
                } else if ts.synchronized
                    && flags_agree
                    && ts.sent_after_rx >= self.ts2_tx_after_rx
                {
                    Action::Enter(LinkState::PollingIdle)
                } else if self.timer >= self.config_timeout {
                    Action::Restart
                } else {
                    Action::Stay
                }
            }

            LinkState::PollingIdle => {
                if ts.framing_error && !ts.idle_confirmed {
                    Action::Restart
                } else if ts.idle_confirmed && ts.sent_after_rx >= self.idle_tx_after_rx {
                    Action::Enter(LinkState::U0)
                } else if self.timer >= self.idle_timeout {
                    Action::Restart
                } else {
                    Action::Stay
                }
            }

            LinkState::U0 => {
                if inputs.rx_locked {
                    Action::Stay
                } else {
                    Action::Restart
                }
            }
        }
    }
}
