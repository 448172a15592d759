//! Interrupt-safe cells.
//!
//! Everything in [`sync`](super) is built on [`CriticalSectionCell`]: the
//! symbol-clock interrupt and thread code both reach the pipe through one.

use core::cell::RefCell;
#[cfg(feature = "async")]
use core::task::Waker;
use critical_section::Mutex;

/// `RefCell` behind a `critical_section::Mutex`.
///
/// Every access runs with interrupts masked, so a tick from an ISR and a status
/// read from a task never observe each other half-done.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from inside another `with` on the same
    /// cell.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Like [`with`](Self::with), but returns `None` when the cell is
    /// already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let mut value = cell.try_borrow_mut().ok()?;
            Some(f(&mut value))
        })
    }

    /// Run `f` with shared access.
    #[inline]
    pub fn with_ref<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| f(&self.inner.borrow_ref(cs)))
    }
}

// SAFETY: every access goes through a critical section.
unsafe impl<T> Sync for CriticalSectionCell<T> {}

/// Single-slot waker storage, registered from `poll` and woken from an ISR.
#[cfg(feature = "async")]
pub struct AtomicWaker {
    slot: CriticalSectionCell<Option<Waker>>,
}

#[cfg(feature = "async")]
impl AtomicWaker {
    /// Create an empty slot (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            slot: CriticalSectionCell::new(None),
        }
    }

    /// Store `waker`, replacing any different waker already held.
    pub fn register(&self, waker: &Waker) {
        self.slot.with(|slot| {
            if !slot.as_ref().is_some_and(|held| held.will_wake(waker)) {
                *slot = Some(waker.clone());
            }
        });
    }

    /// Take and wake the stored waker, if any.
    #[inline]
    pub fn wake(&self) {
        if let Some(waker) = self.slot.with(Option::take) {
            waker.wake();
        }
    }

    /// Whether a waker is waiting.
    pub fn is_registered(&self) -> bool {
        self.slot.with_ref(Option::is_some)
    }
}

#[cfg(feature = "async")]
impl Default for AtomicWaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_mutates_and_returns() {
        let cell = CriticalSectionCell::new(5u32);
        let doubled = cell.with(|v| {
            *v += 1;
            *v * 2
        });
        assert_eq!(doubled, 12);
        assert_eq!(cell.with_ref(|v| *v), 6);
    }

    #[test]
    fn try_with_fails_while_borrowed() {
        let cell = CriticalSectionCell::new(0u32);
        let nested = cell.with(|_| cell.try_with(|v| *v));
        assert_eq!(nested, None);
        assert_eq!(cell.try_with(|v| *v), Some(0));
    }

    #[test]
    fn usable_as_static() {
        static CELL: CriticalSectionCell<u32> = CriticalSectionCell::new(0);
        CELL.with(|v| *v = 100);
        assert_eq!(CELL.with_ref(|v| *v), 100);
    }

    #[cfg(feature = "async")]
    mod waker {
        use super::super::AtomicWaker;
        use crate::test_utils::WakeCounter;

        #[test]
        fn wake_takes_the_registered_waker() {
            let slot = AtomicWaker::new();
            let counter = WakeCounter::new();
            assert!(!slot.is_registered());

            slot.register(&counter.waker());
            assert!(slot.is_registered());

            slot.wake();
            slot.wake();
            assert_eq!(counter.count(), 1);
            assert!(!slot.is_registered());
        }

        #[test]
        fn register_replaces_previous_waker() {
            let slot = AtomicWaker::default();
            let first = WakeCounter::new();
            let second = WakeCounter::new();

            slot.register(&first.waker());
            slot.register(&second.waker());
            slot.wake();

            assert_eq!(first.count(), 0);
            assert_eq!(second.count(), 1);
        }
    }
}
