//! Training ordered sets
//!
//! Symbol-level layout of TS1, TS2 and TSEQ, plus the receive-side framer
//! that recognizes TS1/TS2 one symbol at a time.
//!
//! | Symbol | TS1 | TS2 |
//! |--------|-----|-----|
//! | 0-3    | K28.5 (COM) | K28.5 (COM) |
//! | 4      | D0.0 | D0.0 |
//! | 5      | Link functionality | Link functionality |
//! | 6-15   | D10.2 | D5.2 |

use crate::hal::transceiver::Symbol;
use crate::internal::constants::{
    D0_0, D5_2, D10_2, D21_5, LINK_FUNC_DISABLE_SCRAMBLING, LINK_FUNC_HOT_RESET,
    LINK_FUNC_LOOPBACK, TS_COM_COUNT, TS_IDENT_INDEX, TS_LEN, TS_LINK_FUNC_INDEX, TSEQ_HEAD,
    TSEQ_LEN,
};

// =============================================================================
// Kinds and Patterns
// =============================================================================

/// Received training ordered set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OrderedSetKind {
    /// Training sequence 1
    Ts1,
    /// Training sequence 2
    Ts2,
}

impl OrderedSetKind {
    /// Identifier symbol repeated in symbols 6..=15
    pub const fn identifier(self) -> u8 {
        match self {
            OrderedSetKind::Ts1 => D10_2,
            OrderedSetKind::Ts2 => D5_2,
        }
    }
}

/// What the training-sequence transmitter emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxPattern {
    /// Nothing (electrical idle on the symbol path)
    #[default]
    Off,
    /// TSEQ, for receiver equalization
    Tseq,
    /// TS1 ordered sets
    Ts1,
    /// TS2 ordered sets
    Ts2,
    /// Unscrambled D0.0 idle fill
    Idle,
}

impl TxPattern {
    /// Period of the pattern in symbols (0 for `Off`)
    pub const fn len(self) -> usize {
        match self {
            TxPattern::Off => 0,
            TxPattern::Tseq => TSEQ_LEN,
            TxPattern::Ts1 | TxPattern::Ts2 => TS_LEN,
            TxPattern::Idle => 1,
        }
    }

    /// Whether the pattern is a training ordered set
    pub const fn is_training(self) -> bool {
        matches!(self, TxPattern::Tseq | TxPattern::Ts1 | TxPattern::Ts2)
    }

    /// Ordered-set kind this pattern transmits, if any
    pub const fn kind(self) -> Option<OrderedSetKind> {
        match self {
            TxPattern::Ts1 => Some(OrderedSetKind::Ts1),
            TxPattern::Ts2 => Some(OrderedSetKind::Ts2),
            _ => None,
        }
    }
}

// =============================================================================
// Link Functionality
// =============================================================================

/// Link functionality byte (symbol 5 of TS1/TS2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkFunctionality(pub u8);

impl LinkFunctionality {
    /// No flags set
    pub const NONE: Self = Self(0);

    /// Hot reset requested
    pub const fn hot_reset(self) -> bool {
        self.0 & LINK_FUNC_HOT_RESET != 0
    }

    /// Loopback requested
    pub const fn loopback(self) -> bool {
        self.0 & LINK_FUNC_LOOPBACK != 0
    }

    /// Scrambling disable requested
    pub const fn disable_scrambling(self) -> bool {
        self.0 & LINK_FUNC_DISABLE_SCRAMBLING != 0
    }

    /// Set or clear the disable-scrambling bit
    #[must_use]
    pub const fn with_disable_scrambling(self, disable: bool) -> Self {
        if disable {
            Self(self.0 | LINK_FUNC_DISABLE_SCRAMBLING)
        } else {
            Self(self.0 & !LINK_FUNC_DISABLE_SCRAMBLING)
        }
    }
}

// =============================================================================
// Transmit Encoding
// =============================================================================

/// Symbol `index` of a TS1/TS2 ordered set
pub const fn ts_symbol(kind: OrderedSetKind, flags: LinkFunctionality, index: usize) -> Symbol {
    if index < TS_COM_COUNT {
        Symbol::COM
    } else if index == TS_LINK_FUNC_INDEX {
        Symbol::data(flags.0)
    } else if index < TS_LINK_FUNC_INDEX {
        Symbol::data(D0_0)
    } else {
        Symbol::data(kind.identifier())
    }
}

/// Symbol `index` of TSEQ
pub const fn tseq_symbol(index: usize) -> Symbol {
    if index == 0 {
        Symbol::COM
    } else if index <= TSEQ_HEAD.len() {
        Symbol::data(TSEQ_HEAD[index - 1])
    } else {
        Symbol::data(D10_2)
    }
}

// =============================================================================
// Receive Framing
// =============================================================================

/// Outcome of feeding one symbol to the [`Framer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// Symbol consumed inside a set still being framed
    Pending,
    /// A complete, correctly framed TS1/TS2
    OrderedSet(OrderedSetKind, LinkFunctionality),
    /// A complete TS1 received over an inverted lane (D21.5 identifiers)
    Inverted,
    /// D0.0 at an ordered-set boundary
    Idle,
    /// Unframed or mismatched symbol
    Error,
}

/// Symbol-at-a-time TS1/TS2 recognizer
///
/// Symbols 4 and 5 of an inverted set are not checked: only the D21.5
/// identifier run marks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Framer {
    pos: usize,
    inverted: bool,
    flags: u8,
    ident: u8,
}

impl Framer {
    /// Create a framer waiting for COM
    pub const fn new() -> Self {
        Self {
            pos: 0,
            inverted: false,
            flags: 0,
            ident: 0,
        }
    }

    /// Whether the framer sits on an ordered-set boundary
    pub const fn at_boundary(&self) -> bool {
        self.pos == 0
    }

    /// Feed one received symbol
    pub fn feed(&mut self, s: Symbol) -> RxEvent {
        match self.pos {
            0 => {
                if s.is_com() {
                    self.pos = 1;
                    RxEvent::Pending
                } else if s.is_data(D0_0) {
                    RxEvent::Idle
                } else {
                    RxEvent::Error
                }
            }
            p if p < TS_COM_COUNT => {
                if s.is_com() {
                    self.pos += 1;
                    RxEvent::Pending
                } else {
                    self.resync(s)
                }
            }
            p if p < TS_LINK_FUNC_INDEX => {
                if s.ctrl {
                    return self.resync(s);
                }
                self.inverted = s.data != D0_0;
                self.pos += 1;
                RxEvent::Pending
            }
            TS_LINK_FUNC_INDEX => {
                if s.ctrl {
                    return self.resync(s);
                }
                self.flags = s.data;
                self.pos += 1;
                RxEvent::Pending
            }
            TS_IDENT_INDEX => {
                if s.ctrl {
                    return self.resync(s);
                }
                match (s.data, self.inverted) {
                    (D21_5, _) => self.inverted = true,
                    (D10_2 | D5_2, false) => {}
                    _ => return self.resync(s),
                }
                self.ident = s.data;
                self.pos += 1;
                RxEvent::Pending
            }
            _ => {
                if !s.is_data(self.ident) {
                    return self.resync(s);
                }
                self.pos += 1;
                if self.pos < TS_LEN {
                    return RxEvent::Pending;
                }
                self.pos = 0;
                if self.inverted {
                    RxEvent::Inverted
                } else if self.ident == D10_2 {
                    RxEvent::OrderedSet(OrderedSetKind::Ts1, LinkFunctionality(self.flags))
                } else {
                    RxEvent::OrderedSet(OrderedSetKind::Ts2, LinkFunctionality(self.flags))
                }
            }
        }
    }

    /// Abandon the current set; a COM that broke it opens the next one
    fn resync(&mut self, s: Symbol) -> RxEvent {
        *self = Self::new();
        if s.is_com() {
            self.pos = 1;
        }
        RxEvent::Error
    }
}
