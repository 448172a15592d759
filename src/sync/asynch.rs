//! Async support: a future that resolves when the link reaches U0.
//!
//! The tick loop stays synchronous. Whoever ticks the pipe reports each
//! [`TickOutput`] to an [`AsyncPipeState`], which wakes the task waiting on
//! the matching [`ReadyFuture`].
//!
//! # Example
//!
//! ```ignore
//! static PIPE: SharedPipe = SharedPipe::new();
//! static LINK: AsyncPipeState = AsyncPipeState::new();
//!
//! #[interrupt]
//! fn SERDES_RX() {
//!     if let Ok(out) = PIPE.tick(serdes(), TickInput::enabled()) {
//!         LINK.update(&out);
//!     }
//! }
//!
//! async fn link_task() {
//!     LINK.wait_ready().await;
//!     // U0: start link-layer traffic
//!     LINK.wait_down().await;
//!     // retraining
//! }
//! ```

use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use super::primitives::{AtomicWaker, CriticalSectionCell};
use crate::driver::pipe::TickOutput;

/// `ready` as last reported, plus the waker of the task watching it.
pub struct AsyncPipeState {
    ready: CriticalSectionCell<bool>,
    waker: AtomicWaker,
}

impl AsyncPipeState {
    /// Create a state that reads not-ready (const, suitable for static
    /// initialization).
    pub const fn new() -> Self {
        Self {
            ready: CriticalSectionCell::new(false),
            waker: AtomicWaker::new(),
        }
    }

    /// Record one tick's output, waking the waiter when `ready` changes.
    #[inline]
    pub fn update(&self, output: &TickOutput) {
        let changed = self.ready.with(|ready| {
            let changed = *ready != output.ready;
            *ready = output.ready;
            changed
        });
        if changed {
            #[cfg(feature = "defmt")]
            defmt::debug!("async: ready = {}", output.ready);

            self.waker.wake();
        }
    }

    /// `ready` from the last reported tick.
    pub fn is_ready(&self) -> bool {
        self.ready.with_ref(|ready| *ready)
    }

    /// Forget the last report and release any waiter (call after
    /// re-creating the pipe).
    pub fn reset(&self) {
        self.ready.with(|ready| *ready = false);
        self.waker.wake();
    }

    /// Resolve once `ready` is reported true.
    pub fn wait_ready(&self) -> ReadyFuture<'_> {
        ReadyFuture {
            state: self,
            ready: true,
        }
    }

    /// Resolve once `ready` is reported false.
    pub fn wait_down(&self) -> ReadyFuture<'_> {
        ReadyFuture {
            state: self,
            ready: false,
        }
    }
}

impl Default for AsyncPipeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`AsyncPipeState::wait_ready`] and
/// [`AsyncPipeState::wait_down`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct ReadyFuture<'a> {
    state: &'a AsyncPipeState,
    ready: bool,
}

impl Future for ReadyFuture<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.state.is_ready() == self.ready {
            return Poll::Ready(());
        }
        self.state.waker.register(cx.waker());
        // An update between the check and the register would be lost.
        if self.state.is_ready() == self.ready {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::ltssm::LinkState;
    use crate::test_utils::WakeCounter;
    use core::pin::pin;

    fn output(ready: bool) -> TickOutput {
        TickOutput {
            ready,
            state: if ready {
                LinkState::U0
            } else {
                LinkState::PollingLfps
            },
            ..TickOutput::default()
        }
    }

    #[test]
    fn wait_ready_pends_until_ready_rises() {
        let state = AsyncPipeState::new();
        let counter = WakeCounter::new();
        let waker = counter.waker();
        let mut cx = Context::from_waker(&waker);
        let mut fut = pin!(state.wait_ready());

        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Pending);

        state.update(&output(false));
        assert_eq!(counter.count(), 0);

        state.update(&output(true));
        assert_eq!(counter.count(), 1);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn wait_ready_resolves_immediately_when_up() {
        let state = AsyncPipeState::default();
        state.update(&output(true));

        let counter = WakeCounter::new();
        let waker = counter.waker();
        let mut cx = Context::from_waker(&waker);
        assert_eq!(pin!(state.wait_ready()).poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn wait_down_sees_retrain() {
        let state = AsyncPipeState::new();
        state.update(&output(true));

        let counter = WakeCounter::new();
        let waker = counter.waker();
        let mut cx = Context::from_waker(&waker);
        let mut fut = pin!(state.wait_down());
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Pending);

        state.update(&output(true));
        assert_eq!(counter.count(), 0);

        state.update(&output(false));
        assert_eq!(counter.count(), 1);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn reset_releases_waiter() {
        let state = AsyncPipeState::new();
        state.update(&output(true));

        let counter = WakeCounter::new();
        let waker = counter.waker();
        let mut cx = Context::from_waker(&waker);
        let mut fut = pin!(state.wait_down());
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Pending);

        state.reset();
        assert!(!state.is_ready());
        assert_eq!(counter.count(), 1);
        assert_eq!(fut.as_mut().poll(&mut cx), Poll::Ready(()));
    }
}
