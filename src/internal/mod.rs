//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`constants`]: Ordered-set symbols, scrambler polynomial and USB 3.2
//!   Gen1 timing defaults
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Outside code should use the
//! [`crate::constants`] facade, which re-exports the stable subset.

pub(crate) mod constants;
