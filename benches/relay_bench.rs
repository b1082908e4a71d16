use criterion::{criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;
use tokio::sync::mpsc as tokio_mpsc;
use unbounded_relay::Builder;

fn rt() -> Runtime {
    tokio::runtime::Builder::new_multi_thread().build().unwrap()
}

fn no_contention_relay(c: &mut Criterion) {
    let rt = rt();
    c.bench_function("relay", |b| {
        b.iter(|| {
            rt.block_on(async move {
                let (mut tx, mut rx, relay) = Builder::new().capacity(4096).build();
                tokio::spawn(relay);

                for i in 0..4096 {
                    tx.send(i).await.unwrap();
                }
                drop(tx);

                while rx.recv().await.is_some() {}
            })
        })
    });
}

fn no_contention_mpsc(c: &mut Criterion) {
    let rt = rt();
    c.bench_function("tokio unbounded channel", |b| {
        b.iter(|| {
            rt.block_on(async move {
                let (tx, mut rx) = tokio_mpsc::unbounded_channel();

                for i in 0..4096 {
                    tx.send(i).unwrap();
                }
                drop(tx);

                while rx.recv().await.is_some() {}
            })
        })
    });
}

fn contention_relay(c: &mut Criterion) {
    c.bench_function("contention relay", |b| {
        b.to_async(rt()).iter(|| async move {
            let (mut tx, mut rx, relay) = Builder::new().build();
            tokio::spawn(relay);

            tokio::spawn(async move {
                for i in 0..4096 {
                    tx.send(i).await.unwrap();
                }
            });

            for _ in 0..4096 {
                rx.recv().await;
            }
        })
    });
}

fn contention_mpsc(c: &mut Criterion) {
    c.bench_function("contention tokio unbounded channel", |b| {
        b.to_async(rt()).iter(|| async move {
            let (tx, mut rx) = tokio_mpsc::unbounded_channel();

            tokio::spawn(async move {
                for i in 0..4096 {
                    tx.send(i).unwrap();
                }
            });

            for _ in 0..4096 {
                rx.recv().await;
            }
        })
    });
}

criterion_group!(uncontention, no_contention_relay, no_contention_mpsc);
criterion_group!(contention, contention_relay, contention_mpsc);
criterion_main!(uncontention, contention);
