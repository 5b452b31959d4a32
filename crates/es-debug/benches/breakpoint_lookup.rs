use criterion::{black_box, criterion_group, criterion_main, Criterion};
use es_core::config::DebuggerConfig;
use es_debug::{BreakpointStore, Debugger, ExecutionHook, NullTransport, NullWaker};
use std::sync::Arc;

fn bench_lookup(c: &mut Criterion) {
    let store = BreakpointStore::new();
    for i in 0..64u32 {
        store.add(0x0200_0000 + i * 0x100, i);
    }

    c.bench_function("breakpoint_lookup_hit", |b| {
        b.iter(|| store.lookup(black_box(0x0200_0400)))
    });

    c.bench_function("breakpoint_lookup_miss", |b| {
        b.iter(|| store.lookup(black_box(0x0200_0404)))
    });
}

fn bench_checkpoint(c: &mut Criterion) {
    let disabled = Debugger::new(3, Arc::new(NullTransport), Arc::new(NullWaker));
    disabled.add_breakpoint(0x0200_0000, 1);

    c.bench_function("checkpoint_disabled", |b| {
        b.iter(|| disabled.on_checkpoint(black_box(0x0200_0000), 0))
    });

    let enabled = Debugger::new(3, Arc::new(NullTransport), Arc::new(NullWaker));
    let config = DebuggerConfig {
        force_enabled: true,
        ..DebuggerConfig::default()
    };
    enabled.initialise(&config).unwrap();
    enabled.add_breakpoint(0x0200_0000, 1);

    c.bench_function("checkpoint_enabled_miss", |b| {
        b.iter(|| enabled.on_checkpoint(black_box(0x0200_0004), 0))
    });
}

criterion_group!(benches, bench_lookup, bench_checkpoint);
criterion_main!(benches);
