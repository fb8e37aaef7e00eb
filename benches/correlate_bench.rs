use bsaguard::models::PluginRecord;
use bsaguard::services::{correlate, version_from_prefix};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn load_order(count: usize) -> Vec<PluginRecord> {
    (0..count)
        .map(|i| PluginRecord::new(&format!("Mod{i:04}.esp"), i as i32))
        .collect()
}

fn data_folder(count: usize) -> Vec<String> {
    (0..count)
        .flat_map(|i| {
            [
                format!("Mod{i:04}.bsa"),
                format!("Mod{i:04} - Textures.bsa"),
                format!("Mod{i:04}.ini"),
            ]
        })
        .collect()
}

fn bench_correlate(c: &mut Criterion) {
    let plugins = load_order(250);
    let archives = data_folder(250);

    c.bench_function("correlate_250_plugins", |b| {
        b.iter(|| correlate(black_box(&plugins), black_box(&archives)))
    });

    let plugins = load_order(1000);
    let archives = data_folder(1000);

    c.bench_function("correlate_1000_plugins", |b| {
        b.iter(|| correlate(black_box(&plugins), black_box(&archives)))
    });
}

fn bench_header(c: &mut Criterion) {
    let prefix = [b'B', b'S', b'A', 0, 105, 0, 0, 0, 36];

    c.bench_function("version_from_prefix", |b| {
        b.iter(|| version_from_prefix(black_box(&prefix)))
    });
}

criterion_group!(benches, bench_correlate, bench_header);
criterion_main!(benches);
