//! USB3 PIPE Link-Training Core
//!
//! A `no_std`, `no_alloc` implementation of USB 3.x SuperSpeed link
//! initialization: the LTSSM Polling substates that take a lane from
//! electrical idle to scrambled logical idle (`U0`).
//!
//! The crate sits above a PIPE-style transceiver (SerDes) and below a host
//! link layer. It is tick-driven: call [`UsbPipe::tick`] once per symbol
//! clock with the transceiver borrowed for the duration of the call.
//!
//! # Architecture
//!
//! 1. **Link Layer** ([`link`]): LFPS engine, TS engine, scrambler pair and
//!    the LTSSM that orchestrates them
//! 2. **Driver Layer** ([`driver`]): [`UsbPipe`], [`PipeConfig`] and errors
//! 3. **HAL Layer** ([`hal`]): the [`Transceiver`] trait and GPIO LFPS lines
//!
//! ## Standard Compliance
//!
//! - **USB 3.2 Gen1**: Polling.LFPS/RxEQ/Active/Configuration/Idle
//!   sequencing, TS1/TS2/TSEQ layouts, LFPS tBurst/tRepeat tolerances
//!   (Table 6-30), the x^16 + x^5 + x^4 + x^3 + 1 scrambler
//! - **PIPE**: one symbol per tick per direction, K-codes flagged out of band
//!
//! # Features
//!
//! - `defmt`: Enable defmt logging and formatting for public types
//! - `critical-section`: Enable the ISR-safe [`SharedPipe`] wrapper
//! - `async`: Enable [`AsyncPipeState`] and its readiness futures
//!
//! # Example
//!
//! ```ignore
//! use usb3_pipe::{PipeConfig, TickInput, UsbPipe};
//!
//! let config = PipeConfig::new().with_symbol_clock_hz(250_000_000);
//! let mut pipe = UsbPipe::with_config(config)?;
//!
//! loop {
//!     let out = pipe.tick(&mut serdes, TickInput { enable: true, host_tx })?;
//!     if out.ready {
//!         // exchange symbols with the link layer
//!     }
//! }
//! ```

#![no_std]
#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels mirror the [lints] tables in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod link;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
mod test_utils;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{LfpsTiming, PipeConfig, TickTimings, TickWindow};
pub use driver::error::{ConfigError, ConfigResult, Error, IoError, IoResult, Result};
pub use driver::pipe::{TickInput, TickOutput, UsbPipe};
pub use hal::{LfpsPins, Symbol, Transceiver};
pub use link::{LfpsStatus, LinkFunctionality, LinkState, OrderedSetKind, TsStatus, TxPattern};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedPipe;

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use sync::asynch::{AsyncPipeState, ReadyFuture};

/// Protocol constants.
///
/// Symbol values, ordered-set layout and the USB 3.2 Gen1 defaults that
/// [`PipeConfig::new`] starts from.
pub mod constants {
    pub use crate::internal::constants::{
        // Timing
        DEFAULT_SYMBOL_CLOCK_HZ,
        // Symbols
        D0_0,
        D5_2,
        D10_2,
        D21_5,
        // Thresholds
        IDLE_RX_SYMBOLS,
        IDLE_TX_AFTER_RX,
        K28_5,
        LFPS_BURST_MAX_NS,
        LFPS_BURST_MIN_NS,
        LFPS_BURST_TYP_NS,
        LFPS_REPEAT_MAX_NS,
        LFPS_REPEAT_MIN_NS,
        LFPS_REPEAT_TYP_NS,
        LFPS_RX_BURSTS,
        LFPS_TX_AFTER_RX,
        LFPS_TX_BURSTS,
        // Link functionality
        LINK_FUNC_DISABLE_SCRAMBLING,
        LINK_FUNC_HOT_RESET,
        LINK_FUNC_LOOPBACK,
        POLLING_ACTIVE_TIMEOUT_NS,
        POLLING_CONFIG_TIMEOUT_NS,
        POLLING_IDLE_TIMEOUT_NS,
        POLLING_LFPS_TIMEOUT_NS,
        POLLING_RXEQ_TIMEOUT_NS,
        // Scrambler
        SCRAMBLER_SEED,
        SCRAMBLER_TAPS,
        TS_LEN,
        TS_MATCH_THRESHOLD,
        TS2_TX_AFTER_RX,
        TSEQ_COUNT,
        TSEQ_LEN,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static, ISR-safe pipe with the default configuration.
///
/// # Examples
///
/// ```ignore
/// usb3_pipe::pipe_static!(PIPE);
///
/// #[interrupt]
/// fn SERDES_RX() {
///     PIPE.tick(serdes(), usb3_pipe::TickInput::enabled()).ok();
/// }
/// ```
#[cfg(feature = "critical-section")]
#[macro_export]
macro_rules! pipe_static {
    ($name:ident) => {
        static $name: $crate::sync::SharedPipe = $crate::sync::SharedPipe::new();
    };
}
