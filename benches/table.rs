//! Benchmarks for the routing table and packet codec.
//!
//! Run with: cargo bench --bench table

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skywire::{MemoryTable, Packet, RouteId, RoutingTable, Rule, TransportId};
use std::time::{Duration, SystemTime};

fn make_forward_rule(next: u32) -> Rule {
    Rule::forward(
        SystemTime::now() + Duration::from_secs(3600),
        RouteId::new(next),
        TransportId::generate(),
    )
}

/// Pre-populate a table with `n` forward rules.
fn populated_table(n: u32) -> MemoryTable {
    let table = MemoryTable::with_defaults();
    for i in 0..n {
        let id = table.reserve_id().unwrap();
        table.save_rule(id, make_forward_rule(i)).unwrap();
    }
    table
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_lookup");

    for &count in &[100u32, 10_000, 100_000] {
        let table = populated_table(count);
        let hit = RouteId::new(count / 2);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| table.rule(black_box(hit)))
        });
    }

    group.finish();
}

fn bench_reserve_and_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_reserve_save");
    let rule = make_forward_rule(1);

    group.bench_function("fresh", |b| {
        b.iter_with_setup(MemoryTable::with_defaults, |table| {
            for _ in 0..100 {
                let id = table.reserve_id().unwrap();
                table.save_rule(id, black_box(rule)).unwrap();
            }
        })
    });

    group.finish();
}

fn bench_forward_hot_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_hot_path");

    let table = populated_table(10_000);
    let id = RouteId::new(5_000);
    let payload = vec![0u8; 1200];
    let wire = Packet::new(id, &payload).unwrap().into_bytes();

    // Decode, look up, relabel, refresh
    group.bench_function("1200_byte_payload", |b| {
        b.iter(|| {
            let packet = Packet::decode(black_box(&wire)).unwrap();
            let rule = table.rule(packet.route_id()).unwrap();
            let out = Packet::new(rule.route_id(), packet.payload()).unwrap();
            table.update_activity(packet.route_id()).unwrap();
            out
        })
    });

    group.finish();
}

fn bench_rule_codec(c: &mut Criterion) {
    let rule = make_forward_rule(7);
    let bytes = rule.encode();

    c.bench_function("rule_encode", |b| b.iter(|| black_box(rule).encode()));
    c.bench_function("rule_decode", |b| {
        b.iter(|| Rule::decode(black_box(&bytes)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_lookup,
    bench_reserve_and_save,
    bench_forward_hot_path,
    bench_rule_codec,
);
criterion_main!(benches);
