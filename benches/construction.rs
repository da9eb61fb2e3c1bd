use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use confound::construct::{Bose, Constructor, FullFactorial, HadamardSylvester};
use confound::interaction::{add_interactions, up_to_order};
use confound::{recode_all, DesignBuilder, DesignKind, ReplicationMode};

fn bench_full_factorial(c: &mut Criterion) {
    let mut group = c.benchmark_group("FullFactorial");

    for factors in [4, 8, 12] {
        group.bench_with_input(BenchmarkId::from_parameter(factors), &factors, |b, &factors| {
            let ff = FullFactorial::new(2).unwrap();
            b.iter(|| ff.construct(factors).unwrap());
        });
    }
    group.finish();
}

fn bench_hadamard(c: &mut Criterion) {
    let mut group = c.benchmark_group("HadamardSylvester");

    for n in [8, 32, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let h = HadamardSylvester::new(n).unwrap();
            b.iter(|| h.construct(n - 1).unwrap());
        });
    }
    group.finish();
}

fn bench_bose(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bose");

    for q in [3u32, 7, 13] {
        group.bench_with_input(BenchmarkId::from_parameter(q), &q, |b, &q| {
            let bose = Bose::new(q).unwrap();
            b.iter(|| bose.construct(q as usize + 1).unwrap());
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline");

    // Replicated L8 to recoded table with all two-way interactions
    group.bench_function("L8x10_recode_interactions", |b| {
        b.iter(|| {
            let design = DesignBuilder::new()
                .kind(DesignKind::OrthogonalArray)
                .factors(4)
                .replications(10)
                .replication_mode(ReplicationMode::Whole)
                .build()
                .unwrap();
            let table = recode_all(&design.to_table()).unwrap();
            add_interactions(&table, &up_to_order(&["A", "B", "C", "D"], 2)).unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_full_factorial,
    bench_hadamard,
    bench_bose,
    bench_pipeline
);
criterion_main!(benches);
