use crate::handoff::{Giver, Taker};
use futures_util::ready;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RelayState {
    /// Accepting values and delivering buffered ones.
    Open,
    /// The producer closed; only delivering what is buffered.
    Draining,
    /// End-of-stream has been signaled.
    Closed,
}

/// The worker half of a relay.
///
/// It is the only owner of the pending queue: values come in from the
/// [`Sender`](super::Sender) and go out to the [`Receiver`](super::Receiver)
/// over two rendezvous links, and all buffering happens here. It completes
/// once every accepted value has been delivered after the producer closed,
/// or as soon as the receiver is dropped.
///
/// Dropping it before it completes discards whatever it still buffers. The
/// sender then sees `Disconnected`, and the receiver ends its stream with
/// [`TryRecvError::Aborted`](crate::TryRecvError::Aborted) instead of a clean
/// end-of-stream (see [`Receiver::is_aborted`](super::Receiver::is_aborted)).
///
/// [`Builder::spawn`](super::Builder::spawn) drives it on its own thread;
/// use [`Builder::build`](super::Builder::build) to spawn it on an executor
/// of your choice instead.
#[must_use = "a relay delivers nothing unless it is polled"]
pub struct Relay<T> {
    input: Taker<T>,
    output: Giver<T>,
    pending: VecDeque<T>,
    state: RelayState,
}

impl<T> Relay<T> {
    pub(crate) fn new(input: Taker<T>, output: Giver<T>, capacity: usize) -> Self {
        Self {
            input,
            output,
            pending: VecDeque::with_capacity(capacity),
            state: RelayState::Open,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> RelayState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Multiplexes accept and deliver until neither can make progress.
    /// Returns `Ready` when the state changed.
    fn poll_open(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        loop {
            let mut progress = false;

            match self.input.poll_take(cx) {
                Poll::Ready(Some(item)) => {
                    self.accept(item);
                    progress = true;
                }
                Poll::Ready(None) => {
                    debug!(pending = self.pending.len(), "sender closed, draining");
                    self.state = RelayState::Draining;
                    return Poll::Ready(());
                }
                Poll::Pending => {}
            }

            // polled even when nothing is buffered, so that a dropped receiver
            // wakes us up.
            match self.output.poll_ready(cx) {
                Poll::Ready(Ok(())) => {
                    if let Some(item) = self.pending.pop_front() {
                        self.deliver(item);
                        progress = true;
                    }
                }
                Poll::Ready(Err(_)) => {
                    self.detach();
                    return Poll::Ready(());
                }
                Poll::Pending => {}
            }

            if !progress {
                return Poll::Pending;
            }
        }
    }

    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        while let Some(item) = self.pending.pop_front() {
            match self.output.poll_ready(cx) {
                Poll::Ready(Ok(())) => self.deliver(item),
                Poll::Ready(Err(_)) => {
                    self.pending.push_front(item);
                    self.detach();
                    return Poll::Ready(());
                }
                Poll::Pending => {
                    self.pending.push_front(item);
                    return Poll::Pending;
                }
            }
        }

        self.output.close();
        self.state = RelayState::Closed;
        debug!("relay closed");
        Poll::Ready(())
    }

    fn accept(&mut self, item: T) {
        let item = if self.pending.is_empty() {
            // nothing queued ahead of it, so it may skip the queue if the
            // receiver is already waiting.
            match self.output.try_give(item) {
                Ok(()) => {
                    trace!("direct handoff");
                    return;
                }
                Err(err) => err.into_inner(),
            }
        } else {
            item
        };

        self.pending.push_back(item);
        trace!(pending = self.pending.len(), "buffered");
    }

    fn deliver(&mut self, item: T) {
        match self.output.try_give(item) {
            Ok(()) => trace!(pending = self.pending.len(), "delivered"),
            // the receiver went away in between, the next poll_ready reports it.
            Err(err) => self.pending.push_front(err.into_inner()),
        }
    }

    fn detach(&mut self) {
        debug!(
            discarded = self.pending.len(),
            "receiver dropped, discarding pending values"
        );
        self.pending.clear();
        self.input.detach();
        self.output.close();
        self.state = RelayState::Closed;
    }
}

// nothing is pinned structurally, the queue only moves values around.
impl<T> Unpin for Relay<T> {}

impl<T> Drop for Relay<T> {
    fn drop(&mut self) {
        if self.state != RelayState::Closed {
            debug!(
                discarded = self.pending.len(),
                state = ?self.state,
                "relay dropped before the stream ended"
            );
            self.output.abort();
        }
    }
}

impl<T> Future for Relay<T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match this.state {
                RelayState::Open => ready!(this.poll_open(cx)),
                RelayState::Draining => ready!(this.poll_drain(cx)),
                RelayState::Closed => return Poll::Ready(()),
            }
        }
    }
}

impl<T> fmt::Debug for Relay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .finish()
    }
}
