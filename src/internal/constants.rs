//! Centralized Constants
//!
//! This module provides a single source of truth for the protocol constants
//! used by the link-training core.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Symbol codes**: 8b/10b data and control symbols used in training
//! - **Ordered sets**: TS1/TS2/TSEQ lengths and link-functionality bits
//! - **Clocking**: default symbol clock rate
//! - **LFPS timing**: Polling.LFPS burst and repeat windows
//! - **Handshake thresholds**: burst, ordered-set, and idle counts
//! - **Timeouts**: per-state training timeouts
//!
//! Values follow USB 3.2 Revision 1.0 for Gen1 (5 Gb/s) operation:
//! Table 6-30 for LFPS timing and Section 7.5.4 for the Polling substates.

// =============================================================================
// Symbol Codes
// =============================================================================

/// K28.5 (COM), the comma symbol that frames every ordered set
pub const K28_5: u8 = 0xBC;

/// D0.0, reserved symbol 4 of TS1/TS2 and the logical idle payload
pub const D0_0: u8 = 0x00;

/// D10.2, TS1 identifier symbol
pub const D10_2: u8 = 0x4A;

/// D5.2, TS2 identifier symbol
pub const D5_2: u8 = 0x45;

/// D21.5, a TS1 identifier received over an inverted lane
pub const D21_5: u8 = 0xB5;

// =============================================================================
// Ordered Sets
// =============================================================================

/// Number of COM symbols that open a TS1/TS2 ordered set
pub const TS_COM_COUNT: usize = 4;

/// Length of a TS1 or TS2 ordered set in symbols
pub const TS_LEN: usize = 16;

/// Symbol index of the link functionality byte within TS1/TS2
pub const TS_LINK_FUNC_INDEX: usize = 5;

/// First symbol index of the identifier run within TS1/TS2
pub const TS_IDENT_INDEX: usize = 6;

/// Length of a TSEQ ordered set in symbols
pub const TSEQ_LEN: usize = 32;

/// Data symbols 1..=15 of TSEQ (symbol 0 is K28.5, 16..=31 are D10.2)
pub const TSEQ_HEAD: [u8; 15] = [
    0xFF, // D31.7
    0x17, // D23.0
    0xC0, // D0.6
    0x14, // D20.0
    0xB2, // D18.5
    0xE7, // D7.7
    0x02, // D2.0
    0x82, // D2.4
    0x72, // D18.3
    0x6E, // D14.3
    0x28, // D8.1
    0xA6, // D6.5
    0xBE, // D30.5
    0x6D, // D13.3
    0xBF, // D31.5
];

/// Link functionality bit: hot reset requested
pub const LINK_FUNC_HOT_RESET: u8 = 1 << 0;

/// Link functionality bit: loopback requested
pub const LINK_FUNC_LOOPBACK: u8 = 1 << 2;

/// Link functionality bit: disable scrambling requested
pub const LINK_FUNC_DISABLE_SCRAMBLING: u8 = 1 << 3;

// =============================================================================
// Scrambler
// =============================================================================

/// LFSR seed loaded on every scrambler reset
pub const SCRAMBLER_SEED: u16 = 0xFFFF;

/// Feedback taps for `x^16 + x^5 + x^4 + x^3 + 1` (Galois form)
pub const SCRAMBLER_TAPS: u16 = 0x0039;

// =============================================================================
// Clocking
// =============================================================================

/// Gen1 symbol rate: 5 Gb/s line rate over 8b/10b is 500 Msym/s
pub const DEFAULT_SYMBOL_CLOCK_HZ: u32 = 500_000_000;

// =============================================================================
// LFPS Timing (nanoseconds)
// =============================================================================

/// Polling.LFPS tBurst minimum
pub const LFPS_BURST_MIN_NS: u32 = 600;

/// Polling.LFPS tBurst typical
pub const LFPS_BURST_TYP_NS: u32 = 1_000;

/// Polling.LFPS tBurst maximum
pub const LFPS_BURST_MAX_NS: u32 = 1_400;

/// Polling.LFPS tRepeat minimum
pub const LFPS_REPEAT_MIN_NS: u32 = 6_000;

/// Polling.LFPS tRepeat typical
pub const LFPS_REPEAT_TYP_NS: u32 = 10_000;

/// Polling.LFPS tRepeat maximum
pub const LFPS_REPEAT_MAX_NS: u32 = 14_000;

// =============================================================================
// Handshake Thresholds
// =============================================================================

/// Consecutive valid Polling.LFPS bursts that must be received
pub const LFPS_RX_BURSTS: u32 = 2;

/// Polling.LFPS bursts that must be sent before leaving Polling.LFPS
pub const LFPS_TX_BURSTS: u32 = 16;

/// Polling.LFPS bursts sent after the first valid burst is received
pub const LFPS_TX_AFTER_RX: u32 = 4;

/// TSEQ ordered sets sent in Polling.RxEQ
pub const TSEQ_COUNT: u32 = 65_536;

/// Consecutive identical TS1/TS2 ordered sets needed for lock
pub const TS_MATCH_THRESHOLD: u32 = 8;

/// TS2 ordered sets sent after the first TS2 of the locking run
pub const TS2_TX_AFTER_RX: u32 = 16;

/// Consecutive idle symbols received before U0
pub const IDLE_RX_SYMBOLS: u32 = 8;

/// Idle symbols sent after the first idle symbol received
pub const IDLE_TX_AFTER_RX: u32 = 16;

// =============================================================================
// Timeouts (nanoseconds)
// =============================================================================

/// tPollingLFPSTimeout
pub const POLLING_LFPS_TIMEOUT_NS: u32 = 360_000_000;

/// Polling.RxEQ equalizer-ready timeout, measured after the TSEQ run
pub const POLLING_RXEQ_TIMEOUT_NS: u32 = 12_000_000;

/// tPollingActiveTimeout
pub const POLLING_ACTIVE_TIMEOUT_NS: u32 = 12_000_000;

/// tPollingConfigurationTimeout
pub const POLLING_CONFIG_TIMEOUT_NS: u32 = 12_000_000;

/// tPollingIdleTimeout
pub const POLLING_IDLE_TIMEOUT_NS: u32 = 2_000_000;
