//! Configuration types for the USB3 PIPE core

use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_SYMBOL_CLOCK_HZ, IDLE_RX_SYMBOLS, IDLE_TX_AFTER_RX, LFPS_BURST_MAX_NS,
    LFPS_BURST_MIN_NS, LFPS_BURST_TYP_NS, LFPS_REPEAT_MAX_NS, LFPS_REPEAT_MIN_NS,
    LFPS_REPEAT_TYP_NS, LFPS_RX_BURSTS, LFPS_TX_AFTER_RX, LFPS_TX_BURSTS,
    POLLING_ACTIVE_TIMEOUT_NS, POLLING_CONFIG_TIMEOUT_NS, POLLING_IDLE_TIMEOUT_NS,
    POLLING_LFPS_TIMEOUT_NS, POLLING_RXEQ_TIMEOUT_NS, TS_MATCH_THRESHOLD, TS2_TX_AFTER_RX,
    TSEQ_COUNT,
};

/// Convert a duration in nanoseconds to whole ticks of a `hz` clock
///
/// Saturates at `u32::MAX` ticks.
#[must_use]
pub const fn ns_to_ticks(ns: u32, hz: u32) -> u32 {
    let ticks = (ns as u64 * hz as u64) / 1_000_000_000;
    if ticks > u32::MAX as u64 {
        u32::MAX
    } else {
        ticks as u32
    }
}

/// LFPS timing window in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LfpsTiming {
    /// Shortest accepted duration
    pub min_ns: u32,
    /// Duration used when transmitting
    pub typ_ns: u32,
    /// Longest accepted duration
    pub max_ns: u32,
}

impl LfpsTiming {
    /// Create a timing window
    #[must_use]
    pub const fn new(min_ns: u32, typ_ns: u32, max_ns: u32) -> Self {
        Self {
            min_ns,
            typ_ns,
            max_ns,
        }
    }

    /// Polling.LFPS tBurst (0.6 / 1.0 / 1.4 us)
    #[must_use]
    pub const fn polling_burst() -> Self {
        Self::new(LFPS_BURST_MIN_NS, LFPS_BURST_TYP_NS, LFPS_BURST_MAX_NS)
    }

    /// Polling.LFPS tRepeat (6 / 10 / 14 us)
    #[must_use]
    pub const fn polling_repeat() -> Self {
        Self::new(LFPS_REPEAT_MIN_NS, LFPS_REPEAT_TYP_NS, LFPS_REPEAT_MAX_NS)
    }

    const fn is_ordered(&self) -> bool {
        self.min_ns <= self.typ_ns && self.typ_ns <= self.max_ns
    }

    const fn to_ticks(self, hz: u32) -> TickWindow {
        TickWindow {
            min: ns_to_ticks(self.min_ns, hz),
            typ: ns_to_ticks(self.typ_ns, hz),
            max: ns_to_ticks(self.max_ns, hz),
        }
    }
}

/// An [`LfpsTiming`] window converted to ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickWindow {
    /// Shortest accepted duration
    pub min: u32,
    /// Transmitted duration
    pub typ: u32,
    /// Longest accepted duration
    pub max: u32,
}

impl TickWindow {
    /// Whether `ticks` lies inside the window (inclusive)
    #[inline(always)]
    pub const fn contains(&self, ticks: u32) -> bool {
        ticks >= self.min && ticks <= self.max
    }
}

/// Tick counts derived from a [`PipeConfig`]
///
/// Computed once when the pipe is built so the per-tick path never divides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickTimings {
    /// Polling.LFPS burst width
    pub lfps_burst: TickWindow,
    /// Polling.LFPS rise-to-rise period
    pub lfps_repeat: TickWindow,
    /// Polling.LFPS handshake timeout
    pub lfps_timeout: u32,
    /// Polling.RxEQ equalizer-ready timeout
    pub rxeq_timeout: u32,
    /// Polling.Active timeout
    pub active_timeout: u32,
    /// Polling.Configuration timeout
    pub config_timeout: u32,
    /// Polling.Idle timeout
    pub idle_timeout: u32,
}

/// Complete PIPE core configuration
///
/// [`PipeConfig::new`] carries USB 3.2 Gen1 values. Tests and simulations
/// typically lower `symbol_clock_hz` and `tseq_count` to keep runs short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipeConfig {
    /// Symbol clock rate in Hz (one tick per symbol)
    pub symbol_clock_hz: u32,
    /// Polling.LFPS burst width window
    pub lfps_burst: LfpsTiming,
    /// Polling.LFPS repeat period window
    pub lfps_repeat: LfpsTiming,
    /// Consecutive valid bursts to receive (N)
    pub lfps_rx_bursts: u32,
    /// Bursts to transmit (M)
    pub lfps_tx_bursts: u32,
    /// Bursts to transmit after the first valid burst is received
    pub lfps_tx_after_rx: u32,
    /// Polling.LFPS timeout in nanoseconds
    pub lfps_timeout_ns: u32,
    /// TSEQ ordered sets sent in Polling.RxEQ
    pub tseq_count: u32,
    /// Equalizer-ready timeout in nanoseconds, once TSEQ is done
    pub rxeq_timeout_ns: u32,
    /// Consecutive identical TS1/TS2 ordered sets for lock
    pub ts_match_threshold: u32,
    /// TS2 sets to send after the first TS2 of the locking run
    pub ts2_tx_after_rx: u32,
    /// Polling.Active timeout in nanoseconds
    pub active_timeout_ns: u32,
    /// Polling.Configuration timeout in nanoseconds
    pub config_timeout_ns: u32,
    /// Consecutive idle symbols to receive in Polling.Idle
    pub idle_rx_symbols: u32,
    /// Idle symbols to send after the first idle symbol received
    pub idle_tx_after_rx: u32,
    /// Polling.Idle timeout in nanoseconds
    pub idle_timeout_ns: u32,
    /// Request that scrambling be disabled (TS2 link functionality bit 3)
    pub disable_scrambling: bool,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipeConfig {
    /// Create a new configuration with USB 3.2 Gen1 defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            symbol_clock_hz: DEFAULT_SYMBOL_CLOCK_HZ,
            lfps_burst: LfpsTiming::polling_burst(),
            lfps_repeat: LfpsTiming::polling_repeat(),
            lfps_rx_bursts: LFPS_RX_BURSTS,
            lfps_tx_bursts: LFPS_TX_BURSTS,
            lfps_tx_after_rx: LFPS_TX_AFTER_RX,
            lfps_timeout_ns: POLLING_LFPS_TIMEOUT_NS,
            tseq_count: TSEQ_COUNT,
            rxeq_timeout_ns: POLLING_RXEQ_TIMEOUT_NS,
            ts_match_threshold: TS_MATCH_THRESHOLD,
            ts2_tx_after_rx: TS2_TX_AFTER_RX,
            active_timeout_ns: POLLING_ACTIVE_TIMEOUT_NS,
            config_timeout_ns: POLLING_CONFIG_TIMEOUT_NS,
            idle_rx_symbols: IDLE_RX_SYMBOLS,
            idle_tx_after_rx: IDLE_TX_AFTER_RX,
            idle_timeout_ns: POLLING_IDLE_TIMEOUT_NS,
            disable_scrambling: false,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the symbol clock rate
    #[must_use]
    pub const fn with_symbol_clock_hz(mut self, hz: u32) -> Self {
        self.symbol_clock_hz = hz;
        self
    }

    /// Set the LFPS burst width window
    #[must_use]
    pub const fn with_lfps_burst(mut self, timing: LfpsTiming) -> Self {
        self.lfps_burst = timing;
        self
    }

    /// Set the LFPS repeat period window
    #[must_use]
    pub const fn with_lfps_repeat(mut self, timing: LfpsTiming) -> Self {
        self.lfps_repeat = timing;
        self
    }

    /// Set the LFPS handshake thresholds (received N, transmitted M)
    #[must_use]
    pub const fn with_lfps_bursts(mut self, rx: u32, tx: u32) -> Self {
        self.lfps_rx_bursts = rx;
        self.lfps_tx_bursts = tx;
        self
    }

    /// Set the bursts sent after the partner's first burst
    #[must_use]
    pub const fn with_lfps_tx_after_rx(mut self, count: u32) -> Self {
        self.lfps_tx_after_rx = count;
        self
    }

    /// Set the Polling.LFPS timeout
    #[must_use]
    pub const fn with_lfps_timeout_ns(mut self, ns: u32) -> Self {
        self.lfps_timeout_ns = ns;
        self
    }

    /// Set the number of TSEQ ordered sets sent in Polling.RxEQ
    #[must_use]
    pub const fn with_tseq_count(mut self, count: u32) -> Self {
        self.tseq_count = count;
        self
    }

    /// Set the ordered-set lock threshold
    #[must_use]
    pub const fn with_ts_match_threshold(mut self, threshold: u32) -> Self {
        self.ts_match_threshold = threshold;
        self
    }

    /// Set the TS2 sets sent after the first TS2 received
    #[must_use]
    pub const fn with_ts2_tx_after_rx(mut self, count: u32) -> Self {
        self.ts2_tx_after_rx = count;
        self
    }

    /// Set the Polling.Idle symbol thresholds (received, transmitted after)
    #[must_use]
    pub const fn with_idle_symbols(mut self, rx: u32, tx_after_rx: u32) -> Self {
        self.idle_rx_symbols = rx;
        self.idle_tx_after_rx = tx_after_rx;
        self
    }

    /// Set the Polling.Active and Polling.Configuration timeouts
    #[must_use]
    pub const fn with_training_timeout_ns(mut self, ns: u32) -> Self {
        self.active_timeout_ns = ns;
        self.config_timeout_ns = ns;
        self
    }

    /// Set the Polling.Idle timeout
    #[must_use]
    pub const fn with_idle_timeout_ns(mut self, ns: u32) -> Self {
        self.idle_timeout_ns = ns;
        self
    }

    /// Request scrambling be disabled
    #[must_use]
    pub const fn with_disable_scrambling(mut self, disable: bool) -> Self {
        self.disable_scrambling = disable;
        self
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check that the configuration can describe a working link
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.symbol_clock_hz == 0 {
            return Err(ConfigError::InvalidClock);
        }
        if self.lfps_rx_bursts == 0
            || self.lfps_tx_bursts == 0
            || self.tseq_count == 0
            || self.ts_match_threshold == 0
            || self.idle_rx_symbols == 0
        {
            return Err(ConfigError::InvalidThreshold);
        }
        if !self.lfps_burst.is_ordered() || !self.lfps_repeat.is_ordered() {
            return Err(ConfigError::InvalidTiming);
        }
        if self.lfps_burst.typ_ns >= self.lfps_repeat.typ_ns {
            return Err(ConfigError::BurstExceedsRepeat);
        }

        let t = self.timings();
        if t.lfps_burst.typ == 0
            || t.lfps_repeat.typ <= t.lfps_burst.typ
            || t.lfps_timeout == 0
            || t.rxeq_timeout == 0
            || t.active_timeout == 0
            || t.config_timeout == 0
            || t.idle_timeout == 0
        {
            return Err(ConfigError::DurationTooShort);
        }
        Ok(())
    }

    /// Derive tick counts at the configured symbol clock
    #[must_use]
    pub const fn timings(&self) -> TickTimings {
        let hz = self.symbol_clock_hz;
        TickTimings {
            lfps_burst: self.lfps_burst.to_ticks(hz),
            lfps_repeat: self.lfps_repeat.to_ticks(hz),
            lfps_timeout: ns_to_ticks(self.lfps_timeout_ns, hz),
            rxeq_timeout: ns_to_ticks(self.rxeq_timeout_ns, hz),
            active_timeout: ns_to_ticks(self.active_timeout_ns, hz),
            config_timeout: ns_to_ticks(self.config_timeout_ns, hz),
            idle_timeout: ns_to_ticks(self.idle_timeout_ns, hz),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = PipeConfig::new();

        assert_eq!(config.symbol_clock_hz, 500_000_000);
        assert_eq!(config.lfps_rx_bursts, 2);
        assert_eq!(config.lfps_tx_bursts, 16);
        assert_eq!(config.lfps_tx_after_rx, 4);
        assert_eq!(config.ts_match_threshold, 8);
        assert_eq!(config.tseq_count, 65_536);
        assert!(!config.disable_scrambling);
    }

    #[test]
    fn config_default_trait_matches_new() {
        assert_eq!(PipeConfig::default(), PipeConfig::new());
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(PipeConfig::new().validate(), Ok(()));
    }

    #[test]
    fn config_builder_chaining() {
        let config = PipeConfig::new()
            .with_symbol_clock_hz(50_000_000)
            .with_lfps_bursts(3, 4)
            .with_tseq_count(8)
            .with_ts_match_threshold(4)
            .with_ts2_tx_after_rx(2)
            .with_idle_symbols(2, 3)
            .with_disable_scrambling(true);

        assert_eq!(config.symbol_clock_hz, 50_000_000);
        assert_eq!(config.lfps_rx_bursts, 3);
        assert_eq!(config.lfps_tx_bursts, 4);
        assert_eq!(config.tseq_count, 8);
        assert_eq!(config.ts_match_threshold, 4);
        assert_eq!(config.ts2_tx_after_rx, 2);
        assert_eq!(config.idle_rx_symbols, 2);
        assert_eq!(config.idle_tx_after_rx, 3);
        assert!(config.disable_scrambling);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn ns_to_ticks_at_gen1_rate() {
        assert_eq!(ns_to_ticks(1_000, 500_000_000), 500);
        assert_eq!(ns_to_ticks(360_000_000, 500_000_000), 180_000_000);
        assert_eq!(ns_to_ticks(1, 500_000_000), 0);
    }

    #[test]
    fn ns_to_ticks_saturates() {
        // 4.29 s at 4.29 GHz does not fit in 32 bits
        assert_eq!(ns_to_ticks(u32::MAX, u32::MAX), u32::MAX);
        assert_eq!(ns_to_ticks(2_000_000_000, 3_000_000_000), u32::MAX);
        assert_eq!(ns_to_ticks(1_000_000_000, u32::MAX), u32::MAX);
    }

    #[test]
    fn timings_follow_clock() {
        let t = PipeConfig::new().with_symbol_clock_hz(50_000_000).timings();

        assert_eq!(t.lfps_burst, TickWindow { min: 30, typ: 50, max: 70 });
        assert_eq!(t.lfps_repeat, TickWindow { min: 300, typ: 500, max: 700 });
        assert_eq!(t.idle_timeout, 100_000);
    }

    #[test]
    fn timeout_builders_convert_at_clock() {
        let t = PipeConfig::new()
            .with_symbol_clock_hz(50_000_000)
            .with_lfps_timeout_ns(20_000)
            .with_training_timeout_ns(40_000)
            .with_idle_timeout_ns(2_000)
            .timings();

        assert_eq!(t.lfps_timeout, 1_000);
        assert_eq!(t.active_timeout, 2_000);
        assert_eq!(t.config_timeout, 2_000);
        assert_eq!(t.idle_timeout, 100);
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = PipeConfig::new().with_idle_timeout_ns(0);
        assert_eq!(config.validate(), Err(ConfigError::DurationTooShort));

        let mut config = PipeConfig::new();
        config.rxeq_timeout_ns = 0;
        assert_eq!(config.validate(), Err(ConfigError::DurationTooShort));

        // Under one tick at the default clock
        config.rxeq_timeout_ns = 1;
        assert_eq!(config.validate(), Err(ConfigError::DurationTooShort));
    }

    #[test]
    fn tick_window_contains_is_inclusive() {
        let w = TickWindow { min: 3, typ: 5, max: 7 };
        assert!(!w.contains(2));
        assert!(w.contains(3));
        assert!(w.contains(7));
        assert!(!w.contains(8));
    }

    #[test]
    fn validate_rejects_zero_clock() {
        let config = PipeConfig::new().with_symbol_clock_hz(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidClock));
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let config = PipeConfig::new().with_ts_match_threshold(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold));

        let config = PipeConfig::new().with_lfps_bursts(0, 16);
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold));
    }

    #[test]
    fn validate_rejects_unordered_window() {
        let config = PipeConfig::new().with_lfps_burst(LfpsTiming::new(1_400, 1_000, 600));
        assert_eq!(config.validate(), Err(ConfigError::InvalidTiming));
    }

    #[test]
    fn validate_rejects_burst_longer_than_repeat() {
        let config = PipeConfig::new()
            .with_lfps_burst(LfpsTiming::new(600, 20_000, 30_000))
            .with_lfps_repeat(LfpsTiming::new(6_000, 10_000, 14_000));
        assert_eq!(config.validate(), Err(ConfigError::BurstExceedsRepeat));
    }

    #[test]
    fn validate_rejects_sub_tick_durations() {
        // At 100 kHz a 1 us burst is a tenth of a tick.
        let config = PipeConfig::new().with_symbol_clock_hz(100_000);
        assert_eq!(config.validate(), Err(ConfigError::DurationTooShort));
    }
}
