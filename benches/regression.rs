use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use confound::interaction::{add_interactions, two_way};
use confound::montecarlo::{monte_carlo, MonteCarloConfig};
use confound::regression::{fit, Formula};
use confound::simulate::{seeded_rng, simulate, OutcomeModel};
use confound::{fac_design, recode_all, ReplicationMode, Table};

fn factorial_table(factors: usize, replications: usize) -> Table {
    let design = fac_design(factors, 2)
        .unwrap()
        .replicate(replications, ReplicationMode::Whole)
        .unwrap();
    let table = recode_all(&design.to_table()).unwrap();
    let names: Vec<&str> = design.factor_names().iter().map(String::as_str).collect();
    add_interactions(&table, &two_way(&names)).unwrap()
}

fn bench_ols(c: &mut Criterion) {
    let mut group = c.benchmark_group("OLS");

    for replications in [1, 10, 100] {
        let table = factorial_table(4, replications);
        let model = OutcomeModel::new(1.0).with_effect("A", 2.0).with_effect("AxB", 0.5);
        let observed = simulate(&table, &model, &mut seeded_rng(1)).unwrap().observed();
        let formula = Formula::parse("Y ~ A + B + C + D + AxB + AxC + BxD").unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(observed.nrows()),
            &observed,
            |b, observed| b.iter(|| fit(&formula, observed).unwrap()),
        );
    }
    group.finish();
}

fn bench_monte_carlo(c: &mut Criterion) {
    let table = factorial_table(3, 10);
    let model = OutcomeModel::new(1.0).with_effect("A", 1.0).with_effect("AxB", 0.5);
    let formula = Formula::parse("Y ~ A + B + C").unwrap();
    let config = MonteCarloConfig::default().with_replications(100);

    c.bench_function("MonteCarlo_100", |b| {
        b.iter(|| monte_carlo(&table, &model, &formula, &config).unwrap());
    });
}

criterion_group!(benches, bench_ols, bench_monte_carlo);
criterion_main!(benches);
