//! Link training protocol
//!
//! The protocol components advanced by [`UsbPipe`](crate::UsbPipe) each tick:
//!
//! - [`lfps`] - Low-Frequency Periodic Signaling handshake (out-of-band)
//! - [`ordered_set`] - TS1/TS2/TSEQ layouts and the receive framer
//! - [`training`] - ordered-set exchange and lock detection
//! - [`scrambler`] - LFSR whitening, one instance per direction
//! - [`ltssm`] - the link training state machine
//!
//! The leaf engines never talk to each other or to the transceiver. They
//! take samples in and hand symbols back, and the LTSSM reads their status.

pub mod lfps;
pub mod ltssm;
pub mod ordered_set;
pub mod scrambler;
pub mod training;

pub use lfps::{LfpsEngine, LfpsPattern, LfpsStatus};
pub use ltssm::{Action, LinkState, Ltssm, LtssmInputs};
pub use ordered_set::{Framer, LinkFunctionality, OrderedSetKind, RxEvent, TxPattern};
pub use scrambler::Scrambler;
pub use training::{TsEngine, TsStatus};
