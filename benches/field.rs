use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mzfeature::peaks::{Peak, Peakel};
use mzfeature::{MassErrorType, PeakelField};

fn build_field(n: usize) -> PeakelField {
    let entries = (0..n).map(|i| {
        let mz = 200.0 + (i % 1000) as f64 * 1.37;
        let rt = (i / 1000) as f64 * 0.5;
        Peakel::new(Peak::new(mz, 1000.0, mz - 0.01, mz + 0.01, 10.0).with_spectrum(rt, i as u64))
    });
    PeakelField::from_entries(entries).unwrap()
}

fn find_exact(field: &PeakelField, queries: &[f64]) -> usize {
    queries
        .iter()
        .map(|q| field.find(*q, 0.01, |p| p.contains_time(10.0, 5.0)).len())
        .sum()
}

fn find_ppm(field: &PeakelField, queries: &[f64]) -> usize {
    queries
        .iter()
        .map(|q| {
            field
                .find_with(*q, 10.0, MassErrorType::PPM, |p| p.contains_time(10.0, 5.0))
                .len()
        })
        .sum()
}

fn field_search(c: &mut Criterion) {
    let field = build_field(50_000);
    let queries: Vec<f64> = field.iter().step_by(7).map(|(_, p)| p.mz() + 0.003).collect();
    c.bench_function("field_find_exact", |b| {
        b.iter(|| find_exact(black_box(&field), black_box(&queries)))
    });
    c.bench_function("field_find_ppm", |b| {
        b.iter(|| find_ppm(black_box(&field), black_box(&queries)))
    });
}

criterion_group!(benches, field_search);
criterion_main!(benches);
