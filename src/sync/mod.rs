//! Synchronization and Concurrency Support
//!
//! Wrappers for ticking a [`UsbPipe`](crate::UsbPipe) from an interrupt
//! handler while other code watches the link.
//!
//! - **Primitives** (`primitives`)
//!   - [`CriticalSectionCell`] - ISR-safe interior mutability
//!   - [`AtomicWaker`] - waker slot shared between a future and an ISR
//! - **Shared Wrapper** (`shared`)
//!   - [`SharedPipe`] - critical-section protected pipe
//! - **Async Support** (`asynch`)
//!   - [`AsyncPipeState`] - `ready` tracking with [`ReadyFuture`]
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables `primitives` and `shared`
//! - `async`: Enables `asynch` (implies `critical-section`)

mod primitives;

#[cfg(feature = "async")]
pub use primitives::AtomicWaker;
pub use primitives::CriticalSectionCell;

mod shared;

pub use shared::SharedPipe;

#[cfg(feature = "async")]
pub mod asynch;

#[cfg(feature = "async")]
pub use asynch::{AsyncPipeState, ReadyFuture};
