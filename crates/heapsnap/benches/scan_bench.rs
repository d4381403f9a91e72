//! heapsnap Benchmarks
//!
//! Run with: `cargo bench --package heapsnap`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use heapsnap::{
    dump_all_referenced, ObjectId, RecordEmitter, RecurseMode, SyntheticHeap, Text, TextEscaper,
};

/// A flat heap: `n` lists, each holding a string, an int, and the previous list
fn build_heap(n: usize) -> (SyntheticHeap, Vec<ObjectId>) {
    let mut heap = SyntheticHeap::new();
    let mut lists = Vec::with_capacity(n);
    let mut prev: Option<ObjectId> = None;
    for i in 0..n {
        let s = heap.str(format!("item-{}", i).as_bytes());
        let v = heap.int(i as i64);
        let mut items = vec![s, v];
        items.extend(prev);
        let lst = heap.list(&items, 4);
        lists.push(lst);
        prev = Some(lst);
    }
    (heap, lists)
}

fn bench_escape(c: &mut Criterion) {
    let mut group = c.benchmark_group("escape");
    let escaper = TextEscaper::default();

    let printable = "the quick brown fox jumps over the lazy dog ".repeat(3);
    group.throughput(Throughput::Bytes(printable.len() as u64));
    group.bench_function("printable_narrow", |b| {
        b.iter(|| black_box(escaper.escape(Text::Narrow(printable.as_bytes()), None).unwrap()))
    });

    let binary: Vec<u8> = (0..=255u8).collect();
    group.bench_function("binary_narrow", |b| {
        b.iter(|| black_box(escaper.escape(Text::Narrow(&binary), Some(binary.len())).unwrap()))
    });

    let wide: Vec<u16> = (0x2000u16..0x2100).collect();
    group.bench_function("wide", |b| {
        b.iter(|| black_box(escaper.escape(Text::Wide(&wide), None).unwrap()))
    });

    group.finish();
}

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    let (heap, lists) = build_heap(1_000);
    group.throughput(Throughput::Elements(lists.len() as u64));

    for mode in [RecurseMode::NoRecurse, RecurseMode::LeafOnly, RecurseMode::OneLayer] {
        group.bench_function(mode.to_string(), |b| {
            b.iter(|| {
                let mut emitter = RecordEmitter::new(&heap, Vec::with_capacity(1 << 20));
                for &lst in &lists {
                    emitter.emit(lst, mode).unwrap();
                }
                black_box(emitter.stats())
            })
        });
    }

    group.bench_function("all_referenced", |b| {
        b.iter(|| {
            let mut emitter = RecordEmitter::new(&heap, Vec::with_capacity(1 << 20));
            black_box(dump_all_referenced(&mut emitter, &lists).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_escape, bench_emit);
criterion_main!(benches);
