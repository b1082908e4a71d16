use crate::error::{SendError, TryRecvError, TrySendError};
use crate::handoff::{self, Giver, Taker};
use futures_executor::{block_on, block_on_stream, BlockingStream};
use futures_util::future::poll_fn;
use futures_util::stream::FusedStream;
use futures_util::Stream;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;
use tracing::{debug_span, Instrument};

mod worker;
pub mod wrapper;

pub use self::worker::Relay;

const DEFAULT_NAME: &str = "relay-worker";

/// Creates a relay and starts its worker on a dedicated thread.
///
/// Sending never waits for the receiver: whatever the receiver has not
/// taken yet is buffered by the worker, without bound. Once the sender is
/// closed or dropped, the receiver still gets every buffered value before
/// it sees the end of the stream.
///
/// # Panics
///
/// Panics if the OS fails to create the worker thread; use
/// [`Builder::spawn`] to handle that case.
pub fn relay<T: Send + 'static>() -> (Sender<T>, Receiver<T>) {
    match Builder::new().spawn() {
        Ok(endpoints) => endpoints,
        Err(err) => panic!("failed to spawn relay worker: {}", err),
    }
}

/// Relay factory, for naming the worker or running it on your own executor.
#[derive(Clone, Debug)]
pub struct Builder {
    name: String,
    capacity: usize,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            capacity: 0,
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the worker thread, also recorded on its tracing span.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Space reserved up front for pending values. The buffer still grows
    /// past it as needed.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds the endpoints and returns the worker without running it.
    ///
    /// Nothing is delivered until the [`Relay`] is polled, typically by
    /// spawning it onto an executor.
    pub fn build<T>(self) -> (Sender<T>, Receiver<T>, Relay<T>) {
        let (giver, input) = handoff::link();
        let (output, taker) = handoff::link();
        (
            Sender { inner: giver },
            Receiver { inner: taker },
            Relay::new(input, output, self.capacity),
        )
    }

    /// Builds the endpoints and drives the worker on a new thread.
    pub fn spawn<T: Send + 'static>(self) -> io::Result<(Sender<T>, Receiver<T>)> {
        let span = debug_span!("relay", name = %self.name);
        let thread = thread::Builder::new().name(self.name.clone());
        let (tx, rx, relay) = self.build();

        thread.spawn(move || block_on(relay.instrument(span)))?;
        Ok((tx, rx))
    }
}

/// The producer end of a relay.
///
/// Dropping it, or calling [`close`](Sender::close), ends the input; the
/// receiver sees end-of-stream after everything already sent.
pub struct Sender<T> {
    inner: Giver<T>,
}

impl<T> Sender<T> {
    /// Hands `t` to the worker.
    ///
    /// This only waits for the worker to come back to its accept point,
    /// never for the receiver. Fails if the receiver is gone.
    pub async fn send(&mut self, t: T) -> Result<(), TrySendError<T>> {
        if let Err(err) = poll_fn(|cx| self.inner.poll_ready(cx)).await {
            return Err(TrySendError::new(err, t));
        }

        self.inner.try_give(t)
    }

    /// Blocks the current thread until the worker took `t`.
    ///
    /// Must not be called from within an async task.
    pub fn send_blocking(&mut self, t: T) -> Result<(), TrySendError<T>> {
        block_on(self.send(t))
    }

    /// Hands `t` over only if the worker is at its accept point right now,
    /// otherwise gives it back with [`SendError::Busy`].
    pub fn try_send(&mut self, t: T) -> Result<(), TrySendError<T>> {
        self.inner.try_give(t)
    }

    pub fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), SendError>> {
        self.inner.poll_ready(cx)
    }

    /// Hands `t` over after [`poll_ready`](Sender::poll_ready) returned `Ready(Ok(()))`.
    pub fn start_send(&mut self, t: T) -> Result<(), SendError> {
        self.inner
            .try_give(t)
            .map_err(TrySendError::into_send_error)
    }

    /// Returns whether the worker is gone and sends would fail.
    pub fn is_closed(&self) -> bool {
        self.inner.is_detached()
    }

    /// Ends the input. Values already sent are still delivered.
    pub fn close(self) {
        drop(self)
    }
}

/// The consumer end of a relay.
pub struct Receiver<T> {
    inner: Taker<T>,
}

impl<T> Stream for Receiver<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.poll_recv(cx)
    }
}

impl<T> FusedStream for Receiver<T> {
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

impl<T> IntoIterator for Receiver<T> {
    type Item = T;
    type IntoIter = BlockingStream<Receiver<T>>;

    /// Iterates by blocking the current thread on each value.
    fn into_iter(self) -> Self::IntoIter {
        block_on_stream(self)
    }
}

impl<T> Receiver<T> {
    /// Receives the next value, or `None` once the sender closed and every
    /// buffered value has been received. Keeps returning `None` from then on.
    ///
    /// `None` is also returned if the worker was dropped before it finished;
    /// [`is_aborted`](Receiver::is_aborted) tells the two apart.
    pub async fn recv(&mut self) -> Option<T> {
        poll_fn(|cx| self.poll_recv(cx)).await
    }

    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.inner.poll_take(cx)
    }

    /// Blocking version of [`recv`](Receiver::recv).
    ///
    /// Must not be called from within an async task.
    pub fn recv_blocking(&mut self) -> Option<T> {
        block_on(self.recv())
    }

    /// Takes a value the worker already handed over.
    ///
    /// The worker only hands values to a receiver that waits for them, so
    /// pair this with [`want_recv`](Receiver::want_recv) when it reports
    /// [`TryRecvError::Empty`].
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.inner.try_take()
    }

    /// Tells the worker we are waiting, and resolves once
    /// [`try_recv`](Receiver::try_recv) has something to report.
    pub async fn want_recv(&mut self) {
        poll_fn(|cx| self.poll_want_recv(cx)).await
    }

    pub fn poll_want_recv(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        self.inner.poll_want(cx)
    }

    /// Returns whether the worker was dropped before delivering everything,
    /// in which case buffered values were lost.
    pub fn is_aborted(&self) -> bool {
        self.inner.is_aborted()
    }
}
