//! Criterion benchmarks for key mapping table lookups.
//!
//! Every relayed request performs exactly one `resolve`, so this is the only
//! table operation on the hot path.  Construction is measured too since it
//! runs once at startup and should stay negligible.
//!
//! Run with:
//! ```bash
//! cargo bench --package relay-core --bench keymap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relay_core::keymap::windows_vk::named_key_vk;
use relay_core::{AbstractKey, KeyMappingTable, Preset};

/// Keys a game-automation client sends most often.
const BENCH_KEYS: &[AbstractKey] = &[
    AbstractKey::Up,
    AbstractKey::Down,
    AbstractKey::Left,
    AbstractKey::Right,
    AbstractKey::Space,
    AbstractKey::Ctrl,
    AbstractKey::Shift,
    AbstractKey::Alt,
    AbstractKey::A,
    AbstractKey::F1,
];

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for preset in [Preset::Hid, Preset::Synthetic] {
        let table = KeyMappingTable::from_preset(preset);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{preset:?}")),
            &table,
            |b, table| {
                b.iter(|| {
                    for &key in BENCH_KEYS {
                        let _ = black_box(table.resolve(black_box(key)));
                    }
                })
            },
        );
    }
    group.finish();
}

fn bench_restricted_miss(c: &mut Criterion) {
    let table = KeyMappingTable::from_preset(Preset::Hid)
        .restrict(&[AbstractKey::Up, AbstractKey::Down])
        .expect("restricted table is non-empty");
    c.bench_function("resolve_unmapped", |b| {
        b.iter(|| black_box(table.resolve(black_box(AbstractKey::Enter))))
    });
}

fn bench_build_preset(c: &mut Criterion) {
    c.bench_function("from_preset_synthetic", |b| {
        b.iter(|| black_box(KeyMappingTable::from_preset(black_box(Preset::Synthetic))))
    });
}

fn bench_named_key_vk(c: &mut Criterion) {
    c.bench_function("named_key_vk", |b| {
        b.iter(|| {
            for name in ["ENTER", "PGDN", "VK_MENU", "F12"] {
                black_box(named_key_vk(black_box(name)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_restricted_miss,
    bench_build_preset,
    bench_named_key_vk
);
criterion_main!(benches);
