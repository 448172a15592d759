//! Data scrambler / descrambler
//!
//! Whitens data symbols with the Gen1 LFSR, `G(x) = x^16 + x^5 + x^4 + x^3 + 1`,
//! seeded with `0xFFFF`. Scrambling is an XOR with the LFSR output, so the
//! same type descrambles: one instance per direction, each stepped once per
//! data symbol.
//!
//! Every COM sent or received reseeds the LFSR, so the two ends of a link
//! agree on the mask sequence from the first COM on and advance in lockstep
//! afterwards. A dropped or duplicated data symbol desynchronizes them until
//! the next COM.

use crate::hal::transceiver::Symbol;
use crate::internal::constants::{SCRAMBLER_SEED, SCRAMBLER_TAPS};

/// Advance an LFSR value by eight serial steps
///
/// Returns the 8-bit mask (first output bit in bit 0) and the next LFSR value.
#[must_use]
pub const fn advance(lfsr: u16) -> (u8, u16) {
    let mut state = lfsr;
    let mut mask = 0u8;
    let mut i = 0;
    while i < 8 {
        let out = (state >> 15) & 1;
        mask |= (out as u8) << i;
        state <<= 1;
        if out != 0 {
            state ^= SCRAMBLER_TAPS;
        }
        i += 1;
    }
    (mask, state)
}

/// LFSR scrambler for one direction of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scrambler {
    lfsr: u16,
    bypass: bool,
}

impl Default for Scrambler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scrambler {
    /// Create a scrambler at the seed value
    pub const fn new() -> Self {
        Self {
            lfsr: SCRAMBLER_SEED,
            bypass: false,
        }
    }

    /// Reseed the LFSR and leave bypass
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Hold the scrambler in bypass (identity, LFSR frozen)
    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }

    /// Whether bypass is asserted
    #[inline(always)]
    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    /// Current LFSR value
    #[inline(always)]
    pub fn lfsr(&self) -> u16 {
        self.lfsr
    }

    /// Scramble (or descramble) one data byte
    pub fn step(&mut self, byte: u8) -> u8 {
        if self.bypass {
            return byte;
        }
        let (mask, next) = advance(self.lfsr);
        self.lfsr = next;
        byte ^ mask
    }

    /// Scramble one symbol
    ///
    /// Control symbols pass through without advancing the LFSR. COM also
    /// reseeds it.
    pub fn process(&mut self, symbol: Symbol) -> Symbol {
        if symbol.is_com() {
            self.lfsr = SCRAMBLER_SEED;
            symbol
        } else if symbol.ctrl {
            symbol
        } else {
            Symbol::data(self.step(symbol.data))
        }
    }
}
