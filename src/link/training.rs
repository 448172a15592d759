//! Training-sequence engine
//!
//! Generates TSEQ, TS1, TS2 and idle fill on the symbol path and tracks what
//! the partner is sending:
//!
//! - consecutive identical TS1/TS2 sets, latched into `synchronized` once the
//!   match threshold is reached for the requested kind
//! - inverted TS1 (lane polarity swapped)
//! - consecutive idle symbols, latched once the idle threshold is reached
//! - framing errors, reported as a one-tick pulse
//!
//! A new transmit pattern is adopted only at an ordered-set boundary, so the
//! partner never sees a truncated set.

use crate::hal::transceiver::Symbol;
use crate::link::ordered_set::{
    Framer, LinkFunctionality, OrderedSetKind, RxEvent, TxPattern, ts_symbol, tseq_symbol,
};

/// Training-sequence engine status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TsStatus {
    /// Kind of the last correctly framed set, cleared by any error or idle
    pub received: Option<OrderedSetKind>,
    /// Consecutive identical sets received
    pub matches: u32,
    /// Link functionality of the last received set
    pub flags: LinkFunctionality,
    /// Match threshold reached for the requested kind (latched)
    pub synchronized: bool,
    /// Link functionality of the set run that produced the lock
    pub partner_flags: LinkFunctionality,
    /// An inverted TS1 has been received and not yet acknowledged
    pub inverted: bool,
    /// Framing error on the last tick
    pub framing_error: bool,
    /// Consecutive idle symbols received
    pub idle_symbols: u32,
    /// Idle threshold reached (latched)
    pub idle_confirmed: bool,
    /// Sets (or idle symbols) sent since the first one of the current run
    pub sent_after_rx: u32,
    /// Complete sets of the current pattern sent
    pub sets_sent: u32,
    /// Pattern currently on the wire
    pub pattern: TxPattern,
}

impl TsStatus {
    /// Whether data may be scrambled given the current pattern and flags
    pub const fn scrambling_allowed(&self, local: LinkFunctionality) -> bool {
        !self.pattern.is_training()
            && !local.disable_scrambling()
            && !self.partner_flags.disable_scrambling()
    }
}

/// TS1/TS2/TSEQ generator and receiver
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TsEngine {
    match_threshold: u32,
    idle_threshold: u32,
    local_flags: LinkFunctionality,

    // Transmit
    pattern: TxPattern,
    requested: TxPattern,
    tx_pos: usize,
    sets_sent: u32,

    // Receive
    framer: Framer,
    last: Option<(OrderedSetKind, LinkFunctionality)>,
    matches: u32,
    synchronized: bool,
    partner_flags: LinkFunctionality,
    inverted: bool,
    framing_error: bool,
    idle_symbols: u32,
    idle_confirmed: bool,
    sent_after_rx: u32,
}

impl TsEngine {
    /// Create an engine transmitting nothing
    pub const fn new(
        match_threshold: u32,
        idle_threshold: u32,
        local_flags: LinkFunctionality,
    ) -> Self {
        Self {
            match_threshold,
            idle_threshold,
            local_flags,
            pattern: TxPattern::Off,
            requested: TxPattern::Off,
            tx_pos: 0,
            sets_sent: 0,
            framer: Framer::new(),
            last: None,
            matches: 0,
            synchronized: false,
            partner_flags: LinkFunctionality::NONE,
            inverted: false,
            framing_error: false,
            idle_symbols: 0,
            idle_confirmed: false,
            sent_after_rx: 0,
        }
    }

    /// Return to the power-on state, keeping the configuration
    pub fn reset(&mut self) {
        *self = Self::new(self.match_threshold, self.idle_threshold, self.local_flags);
    }

    /// Link functionality advertised in transmitted TS1/TS2
    pub fn local_flags(&self) -> LinkFunctionality {
        self.local_flags
    }

    /// Request a transmit pattern
    ///
    /// The pattern goes on the wire at the next set boundary. Lock, idle
    /// confirmation and the sent-after-receive counter restart; receive
    /// match counts are kept so an already running partner sequence is not
    /// lost.
    pub fn set_tx(&mut self, pattern: TxPattern) {
        self.requested = pattern;
        self.synchronized = false;
        self.idle_confirmed = false;
        self.sent_after_rx = 0;
        self.check_lock();
    }

    /// Acknowledge an inverted TS1 after the receive polarity was flipped
    pub fn clear_inversion(&mut self) {
        self.inverted = false;
    }

    /// Advance one tick with the received symbol; return the symbol to send
    pub fn tick(&mut self, rx: Option<Symbol>) -> Option<Symbol> {
        self.framing_error = false;
        if let Some(symbol) = rx {
            let event = self.framer.feed(symbol);
            self.on_rx(event);
        }
        self.next_tx()
    }

    fn on_rx(&mut self, event: RxEvent) {
        match event {
            RxEvent::Pending => {}
            RxEvent::OrderedSet(kind, flags) => {
                self.idle_symbols = 0;
                if self.last == Some((kind, flags)) {
                    self.matches = self.matches.saturating_add(1);
                } else {
                    self.last = Some((kind, flags));
                    self.matches = 1;
                    if !self.synchronized {
                        self.sent_after_rx = 0;
                    }
                }
                self.check_lock();
            }
            RxEvent::Inverted => {
                if !self.inverted {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("TS: inverted TS1 received");
                }
                self.inverted = true;
                self.last = None;
                self.matches = 0;
                self.idle_symbols = 0;
            }
            RxEvent::Idle => {
                self.last = None;
                self.matches = 0;
                self.idle_symbols = self.idle_symbols.saturating_add(1);
                if self.idle_symbols == 1 && !self.idle_confirmed {
                    self.sent_after_rx = 0;
                }
                if !self.idle_confirmed && self.idle_symbols >= self.idle_threshold {
                    self.idle_confirmed = true;

                    #[cfg(feature = "defmt")]
                    defmt::debug!("TS: {} idle symbols received", self.idle_symbols);
                }
            }
            RxEvent::Error => {
                self.last = None;
                self.matches = 0;
                self.idle_symbols = 0;
                self.framing_error = true;
            }
        }
    }

    /// A TS2 run also satisfies a TS1 request
    fn check_lock(&mut self) {
        if self.synchronized || self.matches < self.match_threshold {
            return;
        }
        let Some((kind, flags)) = self.last else {
            return;
        };
        let accepted = match self.requested.kind() {
            Some(OrderedSetKind::Ts1) => true,
            Some(OrderedSetKind::Ts2) => kind == OrderedSetKind::Ts2,
            None => false,
        };
        if accepted {
            self.synchronized = true;
            self.partner_flags = flags;

            #[cfg(feature = "defmt")]
            defmt::debug!("TS: locked on {} after {} sets", kind, self.matches);
        }
    }

    fn next_tx(&mut self) -> Option<Symbol> {
        if self.tx_pos == 0 && self.pattern != self.requested {
            self.pattern = self.requested;
            self.sets_sent = 0;
        }

        let symbol = match self.pattern {
            TxPattern::Off => return None,
            TxPattern::Tseq => tseq_symbol(self.tx_pos),
            TxPattern::Ts1 => ts_symbol(OrderedSetKind::Ts1, self.local_flags, self.tx_pos),
            TxPattern::Ts2 => ts_symbol(OrderedSetKind::Ts2, self.local_flags, self.tx_pos),
            TxPattern::Idle => Symbol::IDLE,
        };

        self.tx_pos += 1;
        if self.tx_pos == self.pattern.len() {
            self.tx_pos = 0;
            self.sets_sent = self.sets_sent.saturating_add(1);
            if self.pattern == self.requested && self.run_active() {
                self.sent_after_rx = self.sent_after_rx.saturating_add(1);
            }
        }
        Some(symbol)
    }

    /// Whether the partner has started the run the current pattern waits on
    fn run_active(&self) -> bool {
        match self.pattern {
            TxPattern::Idle => self.idle_symbols > 0 || self.idle_confirmed,
            TxPattern::Ts1 | TxPattern::Ts2 => self.matches > 0 || self.synchronized,
            TxPattern::Off | TxPattern::Tseq => false,
        }
    }

    /// Current status
    pub fn status(&self) -> TsStatus {
        TsStatus {
            received: self.last.map(|(kind, _)| kind),
            matches: self.matches,
            flags: self.last.map_or(LinkFunctionality::NONE, |(_, flags)| flags),
            synchronized: self.synchronized,
            partner_flags: self.partner_flags,
            inverted: self.inverted,
            framing_error: self.framing_error,
            idle_symbols: self.idle_symbols,
            idle_confirmed: self.idle_confirmed,
            sent_after_rx: self.sent_after_rx,
            sets_sent: self.sets_sent,
            pattern: self.pattern,
        }
    }
}
