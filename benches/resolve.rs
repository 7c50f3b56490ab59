use criterion::{criterion_group, criterion_main, Criterion};
use teegate_core::TaUuid;

fn bench_resolve(c: &mut Criterion) {
    c.bench_function("resolve_with_extension", |b| {
        b.iter(|| TaUuid::from_path("12345678-1234-1234-1234-123456789abc.ta"))
    });

    c.bench_function("resolve_bare", |b| {
        b.iter(|| TaUuid::from_path("12345678-1234-1234-1234-123456789abc"))
    });

    let uuid = TaUuid::from_path("12345678-1234-1234-1234-123456789abc").unwrap();
    c.bench_function("render_canonical", |b| b.iter(|| uuid.to_string()));
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
