//! A single-slot rendezvous between exactly one giver and one taker.
//!
//! Unlike a one-element buffer, a value can only be given while the taker is
//! parked waiting for one. The relay uses two of these links, one from the
//! producer to the worker and one from the worker to the consumer, so the
//! worker's queue is the only place values are ever buffered.

use self::inner::AtomicState;
use crate::error::{SendError, TryRecvError, TrySendError};
use crate::loom::{Arc, Ordering, UnsafeCell};
use futures_util::task::AtomicWaker;
use std::task::{Context, Poll};

#[cfg(feature = "cache-padded")]
mod inner {
    use crate::loom::AtomicU8;
    use cache_padded::CachePadded;
    use core::ops::Deref;

    pub(crate) struct AtomicState {
        inner: CachePadded<AtomicU8>,
    }

    impl AtomicState {
        pub(crate) fn new() -> Self {
            Self {
                inner: CachePadded::new(AtomicU8::new(0)),
            }
        }
    }

    impl Deref for AtomicState {
        type Target = AtomicU8;

        fn deref(&self) -> &Self::Target {
            &self.inner
        }
    }
}

#[cfg(not(feature = "cache-padded"))]
mod inner {
    use crate::loom::AtomicU8;
    use core::ops::Deref;

    pub(crate) struct AtomicState {
        inner: AtomicU8,
    }

    impl AtomicState {
        pub(crate) fn new() -> Self {
            Self {
                inner: AtomicU8::new(0),
            }
        }
    }

    impl Deref for AtomicState {
        type Target = AtomicU8;

        fn deref(&self) -> &Self::Target {
            &self.inner
        }
    }
}

/// The taker is parked and wants a value.
const WAITING: u8 = 0b0001;
/// The slot holds a value that has not been taken yet.
const FULL: u8 = 0b0010;
/// The giver is done; nothing will be given any more.
const CLOSED: u8 = 0b0100;
/// The taker is gone.
const DETACHED: u8 = 0b1000;
/// The giver went away without finishing; always set together with CLOSED.
const ABORTED: u8 = 0b1_0000;

struct Link<T> {
    state: AtomicState,
    slot: UnsafeCell<Option<T>>,
    /// Registered by the giver, woken by the taker.
    giver: AtomicWaker,
    /// Registered by the taker, woken by the giver.
    taker: AtomicWaker,
}

// Safety: the slot is written only by the giver while FULL is clear and read
// only by the taker while FULL is set, the bit being published with
// Release/Acquire ordering.
unsafe impl<T: Send> Send for Link<T> {}
unsafe impl<T: Send> Sync for Link<T> {}

pub(crate) fn link<T>() -> (Giver<T>, Taker<T>) {
    let shared = Arc::new(Link {
        state: AtomicState::new(),
        slot: UnsafeCell::new(None),
        giver: AtomicWaker::new(),
        taker: AtomicWaker::new(),
    });
    (
        Giver {
            inner: shared.clone(),
        },
        Taker { inner: shared },
    )
}

pub(crate) struct Giver<T> {
    inner: Arc<Link<T>>,
}

impl<T> Drop for Giver<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> Giver<T> {
    /// Ready once the taker is parked and the slot is free.
    pub(crate) fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), SendError>> {
        if let Poll::Ready(ret) = readiness(self.inner.state.load(Ordering::Acquire)) {
            return Poll::Ready(ret);
        }

        self.inner.giver.register(cx.waker());

        // check again, the taker may have parked between the first load and the register.
        //
        // `park` raises WAITING before it wakes us, and both the register and the
        // wake are RMWs on the waker's own state. If the wake comes first, the
        // register reads from it, so this load sees WAITING; otherwise the wake
        // finds our waker.
        readiness(self.inner.state.load(Ordering::Acquire))
    }

    /// Hands `t` over if the taker is parked right now.
    pub(crate) fn try_give(&mut self, t: T) -> Result<(), TrySendError<T>> {
        match readiness(self.inner.state.load(Ordering::Acquire)) {
            Poll::Ready(Ok(())) => {
                // Safety: FULL is clear and only this giver writes the slot.
                self.inner.slot.with_mut(|ptr| unsafe { *ptr = Some(t) });

                // Publishing the value and consuming the taker's WAITING bit must be
                // a single step, otherwise a later park could be wiped out.
                let _ = self
                    .inner
                    .state
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                        Some((state | FULL) & !WAITING)
                    });
                self.inner.taker.wake();
                Ok(())
            }
            Poll::Ready(Err(err)) => Err(TrySendError::new(err, t)),
            Poll::Pending => Err(TrySendError::new(SendError::Busy, t)),
        }
    }

    /// Whether the taker has been dropped.
    pub(crate) fn is_detached(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) & DETACHED != 0
    }

    /// Signals that nothing more will be given. A value still sitting in the
    /// slot stays takeable.
    pub(crate) fn close(&mut self) {
        if self.inner.state.fetch_or(CLOSED, Ordering::AcqRel) & CLOSED == 0 {
            self.inner.taker.wake();
        }
    }

    /// Like `close`, but tells the taker the stream was cut short.
    pub(crate) fn abort(&mut self) {
        if self.inner.state.fetch_or(ABORTED | CLOSED, Ordering::AcqRel) & CLOSED == 0 {
            self.inner.taker.wake();
        }
    }
}

fn readiness(state: u8) -> Poll<Result<(), SendError>> {
    if state & DETACHED != 0 {
        Poll::Ready(Err(SendError::Disconnected))
    } else if state & (WAITING | FULL) == WAITING {
        Poll::Ready(Ok(()))
    } else {
        Poll::Pending
    }
}

pub(crate) struct Taker<T> {
    inner: Arc<Link<T>>,
}

impl<T> Drop for Taker<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<T> Taker<T> {
    /// Tells the giver that nothing will be taken any more.
    pub(crate) fn detach(&mut self) {
        if self.inner.state.fetch_or(DETACHED, Ordering::AcqRel) & DETACHED == 0 {
            self.inner.giver.wake();
        }
    }

    /// Resolves to the next value, or `None` once the giver has closed and
    /// the slot is empty.
    pub(crate) fn poll_take(&mut self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if let Poll::Ready(item) = self.poll_slot(self.inner.state.load(Ordering::Acquire)) {
            return Poll::Ready(item);
        }

        let state = self.park(cx);
        self.poll_slot(state)
    }

    /// Parks without taking; ready once `try_take` would not report `Empty`.
    pub(crate) fn poll_want(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        if self.inner.state.load(Ordering::Acquire) & (FULL | CLOSED) != 0 {
            return Poll::Ready(());
        }

        if self.park(cx) & (FULL | CLOSED) != 0 {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }

    pub(crate) fn try_take(&mut self) -> Result<T, TryRecvError> {
        let state = self.inner.state.load(Ordering::Acquire);
        if state & FULL != 0 {
            self.take().ok_or(TryRecvError::Empty)
        } else if state & ABORTED != 0 {
            Err(TryRecvError::Aborted)
        } else if state & CLOSED != 0 {
            Err(TryRecvError::Disconnected)
        } else {
            Err(TryRecvError::Empty)
        }
    }

    /// Whether the giver aborted instead of closing.
    pub(crate) fn is_aborted(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) & ABORTED != 0
    }

    /// Whether the giver closed and the last value has been taken.
    pub(crate) fn is_terminated(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) & (FULL | CLOSED) == CLOSED
    }

    /// Registers the waker and raises WAITING, returning the state seen
    /// just before.
    fn park(&mut self, cx: &mut Context<'_>) -> u8 {
        self.inner.taker.register(cx.waker());

        // mirror of the handshake in `Giver::poll_ready`.
        let state = self.inner.state.fetch_or(WAITING, Ordering::AcqRel);
        if state & WAITING == 0 {
            self.inner.giver.wake();
        }
        state
    }

    fn poll_slot(&mut self, state: u8) -> Poll<Option<T>> {
        if state & FULL != 0 {
            Poll::Ready(self.take())
        } else if state & CLOSED != 0 {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }

    fn take(&mut self) -> Option<T> {
        // Safety: FULL was observed with Acquire, so the giver's write is visible,
        // and the giver leaves the slot alone until FULL is cleared below.
        let item = self.inner.slot.with_mut(|ptr| unsafe { (*ptr).take() });
        debug_assert!(item.is_some(), "slot marked full but empty");

        self.inner
            .state
            .fetch_and(!(FULL | WAITING), Ordering::AcqRel);
        item
    }
}
