use criterion::{black_box, criterion_group, criterion_main, Criterion};
use viewgraph::graph::endpoint::normalize;

fn bench_normalize(c: &mut Criterion) {
    let paths = [
        "/api/users/42",
        "/api/users/550e8400-e29b-41d4-a716-446655440000/orders",
        "/v2.1/files/report-2024.pdf",
        "/posts/my-first-post?page=2",
        "/services/billing/invoices/INV20240101",
    ];

    c.bench_function("normalize_mixed_paths", |b| {
        b.iter(|| {
            for path in &paths {
                black_box(normalize(black_box(path)));
            }
        })
    });

    c.bench_function("normalize_already_normalized", |b| {
        b.iter(|| black_box(normalize(black_box("/api/users/:id/orders/:uuid"))))
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
