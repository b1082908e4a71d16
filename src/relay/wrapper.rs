use crate::error::SendError;
use crate::relay::Sender;
use futures_sink::Sink;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A [`Sink`] over a relay [`Sender`].
///
/// Closing the sink drops the sender, which ends the input of the relay.
/// Closing twice is fine; anything after the first close fails with
/// [`SendError::Disconnected`].
pub struct SenderSink<T> {
    inner: Option<Sender<T>>,
}

impl<T> SenderSink<T> {
    pub fn new(sender: Sender<T>) -> Self {
        Self {
            inner: Some(sender),
        }
    }

    /// Gives the sender back, unless the sink was closed.
    pub fn into_inner(self) -> Option<Sender<T>> {
        self.inner
    }
}

impl<T> From<Sender<T>> for SenderSink<T> {
    fn from(sender: Sender<T>) -> Self {
        Self::new(sender)
    }
}

impl<T> Sink<T> for SenderSink<T> {
    type Error = SendError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .as_mut()
            .map(|sender| sender.poll_ready(cx))
            .unwrap_or(Poll::Ready(Err(SendError::Disconnected)))
    }

    fn start_send(mut self: Pin<&mut Self>, item: T) -> Result<(), Self::Error> {
        self.inner
            .as_mut()
            .map(|sender| sender.start_send(item))
            .unwrap_or(Err(SendError::Disconnected))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // a started send is already with the worker, there is nothing to flush.
        self.inner
            .as_ref()
            .and_then(|sender| (!sender.is_closed()).then(|| Poll::Ready(Ok(()))))
            .unwrap_or(Poll::Ready(Err(SendError::Disconnected)))
    }

    fn poll_close(mut self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner = None;
        Poll::Ready(Ok(()))
    }
}
