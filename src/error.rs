use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendError {
    /// The relay worker is not parked at its accept point right now.
    ///
    /// Only the non-waiting operations report this; `send` waits instead.
    Busy,
    /// The relay worker is gone, either because the receiver was dropped
    /// or because the worker future itself was dropped.
    Disconnected,
}

/// A failed send, carrying back the value that could not be handed over.
#[derive(Clone, PartialEq, Eq)]
pub struct TrySendError<T> {
    pub(crate) err: SendError,
    pub(crate) val: T,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SendError::Busy => write!(f, "send failed because the relay is not accepting yet"),
            SendError::Disconnected => write!(f, "send failed because receiver is gone"),
        }
    }
}

impl std::error::Error for SendError {}

impl SendError {
    pub fn is_busy(&self) -> bool {
        matches!(&self, SendError::Busy)
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(&self, SendError::Disconnected)
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrySendError")
            .field("kind", &self.err)
            .finish()
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl<T> std::error::Error for TrySendError<T> {}

impl<T> TrySendError<T> {
    pub(crate) fn new(err: SendError, val: T) -> Self {
        Self { err, val }
    }

    pub fn is_busy(&self) -> bool {
        self.err.is_busy()
    }

    pub fn is_disconnected(&self) -> bool {
        self.err.is_disconnected()
    }

    pub fn into_inner(self) -> T {
        self.val
    }

    pub fn into_send_error(self) -> SendError {
        self.err
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TryRecvError {
    /// Nothing has been handed over yet.
    Empty,
    /// End-of-stream: every value has been delivered and the producer is done.
    Disconnected,
    /// The relay worker was dropped before the producer closed, so values
    /// may have been lost. Nothing more will arrive.
    Aborted,
}

impl fmt::Display for TryRecvError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TryRecvError::Empty => "receiving on an empty relay".fmt(fmt),
            TryRecvError::Disconnected => "receiving on a closed relay".fmt(fmt),
            TryRecvError::Aborted => "receiving on a relay whose worker was dropped".fmt(fmt),
        }
    }
}

impl std::error::Error for TryRecvError {}
