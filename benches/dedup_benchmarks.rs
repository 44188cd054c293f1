use causal_dedup::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn chain(len: u64) -> Vec<Message<u64>> {
    let mut sender = Deduplicator::new("sender");
    let dest = EntityId::new("receiver");
    (0..len)
        .map(|i| sender.send(&dest, i, Timestamp::from_ticks(1_000)))
        .collect()
}

fn bench_send(c: &mut Criterion) {
    let dest = EntityId::new("receiver");
    c.bench_function("Deduplicator::send x1000 frozen clock", |b| {
        b.iter(|| {
            let mut sender = Deduplicator::new("sender");
            for i in 0..1000u64 {
                black_box(sender.send(&dest, i, Timestamp::from_ticks(1_000)));
            }
        })
    });

    let destinations: Vec<EntityId> = (0..100).map(|i| EntityId::new(format!("dest-{i}"))).collect();
    c.bench_function("Deduplicator::send 100 destinations", |b| {
        b.iter(|| {
            let mut sender = Deduplicator::new("sender");
            for (i, dest) in destinations.iter().enumerate() {
                black_box(sender.send(dest, i, Timestamp::from_ticks(i as u64)));
            }
        })
    });
}

fn bench_receive_in_order(c: &mut Criterion) {
    let messages = chain(1000);
    c.bench_function("Deduplicator::receive 1000 in order", |b| {
        b.iter(|| {
            let mut receiver = Deduplicator::new("receiver");
            for msg in &messages {
                black_box(receiver.receive(msg.clone()).unwrap());
            }
        })
    });
}

fn bench_receive_reversed(c: &mut Criterion) {
    let messages = chain(1000);
    c.bench_function("Deduplicator::receive 1000 reversed", |b| {
        b.iter(|| {
            let mut receiver = Deduplicator::new("receiver");
            let mut delivered = 0;
            for msg in messages.iter().rev() {
                delivered += receiver.receive(msg.clone()).unwrap().len();
            }
            black_box(delivered)
        })
    });
}

fn bench_collect(c: &mut Criterion) {
    let mut state = Deduplicator::new("entity");
    for i in 0..1000u64 {
        state.send(&EntityId::new(format!("dest-{i}")), (), Timestamp::from_ticks(i));
        state
            .receive(Message::from_parts(format!("origin-{i}"), Timestamp::from_ticks(i), None, ()))
            .unwrap();
    }

    c.bench_function("Deduplicator::collect 1000+1000 entries", |b| {
        b.iter(|| {
            let mut swept = state.clone();
            black_box(swept.collect(Timestamp::from_ticks(500)))
        })
    });
}

criterion_group!(
    benches,
    bench_send,
    bench_receive_in_order,
    bench_receive_reversed,
    bench_collect,
);
criterion_main!(benches);
