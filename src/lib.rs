//! An unbounded relay between one producer and one consumer.
//!
//! A [`Relay`] worker sits between a [`Sender`] and a [`Receiver`] and owns
//! the only buffer. Sending never waits for the consumer; receiving waits
//! until a value is handed over or the stream ends, and the stream only ends
//! after every value sent before the close has been received.
//!
//! ```
//! let (mut tx, rx) = unbounded_relay::relay();
//!
//! for c in "hello".chars() {
//!     tx.send_blocking(c).unwrap();
//! }
//! tx.close();
//!
//! assert_eq!(rx.into_iter().collect::<String>(), "hello");
//! ```

pub mod error;
mod handoff;
mod loom;
mod relay;

pub use crate::error::{SendError, TryRecvError, TrySendError};
pub use crate::relay::wrapper::SenderSink;
pub use crate::relay::{relay, Builder, Receiver, Relay, Sender};
