//! LFPS engine
//!
//! Low-Frequency Periodic Signaling is the out-of-band burst pattern used in
//! Polling.LFPS before either side can recover symbols. The engine does two
//! independent things every tick:
//!
//! - **Transmit**: while a pattern is requested, drive bursts of `tBurst`
//!   (typical) separated so that bursts start every `tRepeat` (typical).
//! - **Receive**: measure the width and rise-to-rise period of incoming
//!   bursts. A burst is valid when its width lies in the burst window and,
//!   unless it opens a run, its period lies in the repeat window. Any invalid
//!   burst, or a gap longer than the longest repeat period, resets the count.
//!
//! The handshake completes once the consecutive-valid count has reached the
//! receive threshold at least once, the transmit threshold has been sent, and
//! enough bursts went out after the partner's first one for it to see ours.

use crate::driver::config::{PipeConfig, TickWindow};

// =============================================================================
// Types
// =============================================================================

/// LFPS burst pattern to transmit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LfpsPattern {
    /// Polling.LFPS bursts
    Polling,
}

/// LFPS engine status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LfpsStatus {
    /// At least one valid burst has been seen in the current run
    pub burst_detected: bool,
    /// Receive and transmit thresholds both met
    pub handshake_complete: bool,
    /// The handshake timer expired before completion
    pub timed_out: bool,
    /// Consecutive valid bursts received
    pub rx_bursts: u32,
    /// Bursts transmitted since the last reset
    pub tx_bursts: u32,
    /// Bursts transmitted since the first valid burst was received
    pub tx_after_rx: u32,
}

// =============================================================================
// Engine
// =============================================================================

/// Polling.LFPS burst generator and detector
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LfpsEngine {
    burst: TickWindow,
    repeat: TickWindow,
    rx_needed: u32,
    tx_needed: u32,
    tx_after_needed: u32,
    timeout: u32,

    // Transmit
    pattern: Option<LfpsPattern>,
    tx_phase: u32,
    tx_bursts: u32,
    tx_after_rx: u32,

    // Receive
    line: bool,
    high_ticks: u32,
    since_rise: u32,
    in_run: bool,
    period: Option<u32>,
    rx_bursts: u32,
    rx_seen: bool,
    rx_satisfied: bool,

    timer: u32,
}

impl LfpsEngine {
    /// Create an idle engine for the given configuration
    pub const fn new(config: &PipeConfig) -> Self {
        let timings = config.timings();
        Self {
            burst: timings.lfps_burst,
            repeat: timings.lfps_repeat,
            rx_needed: config.lfps_rx_bursts,
            tx_needed: config.lfps_tx_bursts,
            tx_after_needed: config.lfps_tx_after_rx,
            timeout: timings.lfps_timeout,
            pattern: None,
            tx_phase: 0,
            tx_bursts: 0,
            tx_after_rx: 0,
            line: false,
            high_ticks: 0,
            since_rise: 0,
            in_run: false,
            period: None,
            rx_bursts: 0,
            rx_seen: false,
            rx_satisfied: false,
            timer: 0,
        }
    }

    /// Clear all counters, the timer, and the transmit request
    pub fn reset(&mut self) {
        self.pattern = None;
        self.tx_phase = 0;
        self.tx_bursts = 0;
        self.tx_after_rx = 0;
        self.line = false;
        self.high_ticks = 0;
        self.since_rise = 0;
        self.in_run = false;
        self.period = None;
        self.rx_bursts = 0;
        self.rx_seen = false;
        self.rx_satisfied = false;
        self.timer = 0;
    }

    /// Request a burst pattern, or stop transmitting with `None`
    ///
    /// Changing the pattern restarts the burst cycle; the burst counter is
    /// kept.
    pub fn drive(&mut self, pattern: Option<LfpsPattern>) {
        if self.pattern != pattern {
            self.pattern = pattern;
            self.tx_phase = 0;
        }
    }

    /// Advance one tick: sample the detector, return the drive level
    pub fn tick(&mut self, detected: bool) -> bool {
        self.poll(detected);
        self.timer = self.timer.saturating_add(1);
        self.next_drive()
    }

    /// Sample the burst detector
    pub fn poll(&mut self, detected: bool) {
        if self.in_run {
            self.since_rise = self.since_rise.saturating_add(1);
        }

        if detected {
            if !self.line {
                // Rising edge opens a burst
                self.period = self.in_run.then_some(self.since_rise);
                self.since_rise = 0;
                self.in_run = true;
                self.high_ticks = 0;
            }
            self.high_ticks = self.high_ticks.saturating_add(1);
        } else if self.line {
            self.burst_ended();
        } else if self.in_run && self.since_rise > self.repeat.max {
            if self.rx_bursts > 0 {
                #[cfg(feature = "defmt")]
                defmt::debug!("LFPS: burst gap exceeded tRepeat max, run restarted");
            }
            self.rx_bursts = 0;
            self.in_run = false;
            self.period = None;
        }

        self.line = detected;
    }

    fn burst_ended(&mut self) {
        let width_ok = self.burst.contains(self.high_ticks);
        let period_ok = self.period.is_none_or(|p| self.repeat.contains(p));

        if width_ok && period_ok {
            self.rx_bursts = self.rx_bursts.saturating_add(1);
            self.rx_seen = true;
            if !self.rx_satisfied && self.rx_bursts >= self.rx_needed {
                self.rx_satisfied = true;

                #[cfg(feature = "defmt")]
                defmt::debug!("LFPS: {} consecutive bursts received", self.rx_bursts);
            }
        } else {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "LFPS: invalid burst (width {} ticks, period {})",
                self.high_ticks,
                self.period
            );
            self.rx_bursts = 0;
        }
    }

    fn next_drive(&mut self) -> bool {
        if self.pattern.is_none() {
            return false;
        }

        let level = self.tx_phase < self.burst.typ;
        self.tx_phase += 1;
        if self.tx_phase == self.burst.typ {
            self.tx_bursts = self.tx_bursts.saturating_add(1);
            if self.rx_seen {
                self.tx_after_rx = self.tx_after_rx.saturating_add(1);
            }
        }
        if self.tx_phase >= self.repeat.typ {
            self.tx_phase = 0;
        }
        level
    }

    /// Whether a pattern is currently requested
    #[inline(always)]
    pub fn is_driving(&self) -> bool {
        self.pattern.is_some()
    }

    /// Ticks since the last reset
    #[inline(always)]
    pub fn elapsed(&self) -> u32 {
        self.timer
    }

    /// Current status
    pub fn status(&self) -> LfpsStatus {
        let handshake_complete = self.rx_satisfied
            && self.tx_bursts >= self.tx_needed
            && self.tx_after_rx >= self.tx_after_needed;
        LfpsStatus {
            burst_detected: self.rx_bursts > 0 || self.rx_satisfied,
            handshake_complete,
            timed_out: !handshake_complete && self.timer >= self.timeout,
            rx_bursts: self.rx_bursts,
            tx_bursts: self.tx_bursts,
            tx_after_rx: self.tx_after_rx,
        }
    }
}
