use criterion::{criterion_group, criterion_main, Criterion};
use solaris::board::Board;
use solaris::perft::perft;

fn perft_bench(c: &mut Criterion) {
    c.bench_function("perft4 startpos", |bench| {
        let b = Board::new_start();
        bench.iter(|| perft(&mut b.clone(), 4));
    });
}

criterion_group!(benches, perft_bench);
criterion_main!(benches);
