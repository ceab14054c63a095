use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;

pub fn macro_expansion_bench(c: &mut Criterion) {
    let mut rng = rand::prelude::StdRng::seed_from_u64(17);
    let tex_input = performance::generate_macro_calls(&mut rng, 20_000);

    let mut group = c.benchmark_group("macro-expansion");
    group.bench_function("macro_calls", |b| {
        b.iter(|| performance::run_in_texpand(&tex_input))
    });
}

criterion_group!(benches, macro_expansion_bench);
criterion_main!(benches);
