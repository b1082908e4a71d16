use futures_executor::block_on;
use futures_util::stream::FusedStream;
use futures_util::task::noop_waker_ref;
use futures_util::{stream, SinkExt, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;
use std::time::Duration;
use unbounded_relay::{relay, Builder, SendError, SenderSink, TryRecvError};

const HELLO: &str = "hello world";

#[test]
fn hello_world() {
    let (mut tx, rx) = relay();

    let t = thread::spawn(move || {
        for c in HELLO.chars() {
            tx.send_blocking(c).unwrap();
        }
        tx.close();
    });

    let received: Vec<char> = rx.into_iter().collect();
    assert_eq!(
        received,
        ['h', 'e', 'l', 'l', 'o', ' ', 'w', 'o', 'r', 'l', 'd']
    );

    t.join().unwrap();
}

#[test]
fn hello_world_with_slow_receiver() {
    let (mut tx, mut rx) = relay();

    // the whole string is accepted while nobody is reading
    let t = thread::spawn(move || {
        for c in HELLO.chars() {
            tx.send_blocking(c).unwrap();
        }
    });
    t.join().unwrap();

    let mut received = String::new();
    while let Some(c) = rx.recv_blocking() {
        thread::sleep(Duration::from_millis(1));
        received.push(c);
    }
    assert_eq!(received, HELLO);
    assert_eq!(rx.recv_blocking(), None);
}

#[test]
fn burst_is_accepted_without_a_reader() {
    const BURST: u64 = 20_000;
    let (mut tx, rx) = Builder::new().name("burst").spawn().unwrap();

    for i in 0..BURST {
        tx.send_blocking(i).unwrap();
    }
    drop(tx);

    let mut expected = 0;
    for i in rx {
        assert_eq!(i, expected);
        expected += 1;
    }
    assert_eq!(expected, BURST);
}

#[test]
fn end_of_stream_repeats() {
    let (mut tx, mut rx) = relay();
    tx.send_blocking(1).unwrap();
    tx.send_blocking(2).unwrap();
    tx.close();

    assert_eq!(rx.recv_blocking(), Some(1));
    assert!(!rx.is_terminated());
    assert_eq!(rx.recv_blocking(), Some(2));

    for _ in 0..3 {
        assert_eq!(rx.recv_blocking(), None);
    }
    assert!(rx.is_terminated());
    assert!(!rx.is_aborted());
    assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    assert_eq!(block_on(rx.next()), None);
}

#[test]
fn closing_without_sending() {
    let (tx, mut rx) = relay::<()>();
    tx.close();
    assert_eq!(rx.recv_blocking(), None);
}

#[test]
fn dropped_receiver_disconnects_sender() {
    let (mut tx, rx) = relay();
    tx.send_blocking(0).unwrap();
    drop(rx);

    // the worker notices asynchronously, a few sends may still get through
    let err = loop {
        if let Err(err) = tx.send_blocking(1) {
            break err;
        }
    };
    assert!(err.is_disconnected());
    assert_eq!(err.into_inner(), 1);
    assert!(tx.is_closed());
}

#[test]
fn worker_must_be_polled() {
    let (mut tx, mut rx, relay) = Builder::new().build();

    let err = tx.try_send(1).unwrap_err();
    assert!(err.is_busy());
    assert_eq!(err.into_inner(), 1);
    assert!(!tx.is_closed());

    // dropping the worker disconnects the sender and aborts the receiver
    drop(relay);
    assert!(tx.is_closed());
    assert!(tx.try_send(2).unwrap_err().is_disconnected());
    assert!(rx.is_aborted());
    assert_eq!(rx.try_recv(), Err(TryRecvError::Aborted));
    assert_eq!(rx.recv_blocking(), None);
}

#[test]
fn dropping_the_worker_reports_lost_values() {
    let (mut tx, mut rx, mut relay) = Builder::new().build();
    let mut cx = Context::from_waker(noop_waker_ref());

    assert_eq!(Pin::new(&mut relay).poll(&mut cx), Poll::Pending);
    for i in 0..3 {
        tx.try_send(i).unwrap();
        assert_eq!(Pin::new(&mut relay).poll(&mut cx), Poll::Pending);
    }
    drop(relay);

    assert_eq!(rx.try_recv(), Err(TryRecvError::Aborted));
    assert_eq!(rx.recv_blocking(), None);
    assert!(rx.is_aborted());
    assert!(rx.is_terminated());
}

#[test]
fn sink_feeds_the_relay() {
    let (tx, rx) = relay();
    let mut sink = SenderSink::from(tx);

    block_on(async {
        sink.send_all(&mut stream::iter(0..100).map(Ok)).await.unwrap();
        sink.close().await.unwrap();
    });

    let received: Vec<i32> = block_on(rx.collect());
    assert_eq!(received, (0..100).collect::<Vec<_>>());

    // closing again is harmless, sending is not
    block_on(async {
        sink.close().await.unwrap();
        assert_eq!(sink.send(100).await, Err(SendError::Disconnected));
    });
    assert!(sink.into_inner().is_none());
}

#[tokio::test]
async fn worker_on_tokio() {
    let (mut tx, mut rx, relay) = Builder::new().capacity(16).build();
    let worker = tokio::spawn(relay);

    tokio::spawn(async move {
        for i in 0..1000u32 {
            tx.send(i).await.unwrap();
        }
    });

    let mut n = 0;
    while let Some(i) = rx.recv().await {
        assert_eq!(i, n);
        n += 1;
    }
    assert_eq!(n, 1000);

    worker.await.unwrap();
}
