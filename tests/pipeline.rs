//! End-to-end tests of the design → recode → interactions → diagnostics →
//! simulation → estimation pipeline, through the public API only.

use confound::diagnostics::{correlation_matrix, diagnose};
use confound::interaction::{add_interactions, two_way, Interaction};
use confound::regression::{lm, INTERCEPT};
use confound::simulate::{seeded_rng, simulate, OutcomeModel};
use confound::{fac_design, oa_design, recode_all, DesignBuilder, DesignKind, ReplicationMode, Table};

const FACTORS: [&str; 4] = ["A", "B", "C", "D"];

fn recoded(design: &confound::Design) -> Table {
    recode_all(&design.to_table()).unwrap()
}

#[test]
fn full_factorial_pipeline_is_orthogonal() {
    let design = fac_design(4, 2).unwrap();
    assert_eq!(design.runs(), 16);

    let table = recoded(&design);
    assert_eq!(table.names(), FACTORS);
    for name in FACTORS {
        let values = table.numeric(name).unwrap();
        assert!(values.iter().all(|&v| v == -1.0 || v == 1.0));
        assert_eq!(values.iter().filter(|&&v| v == 1.0).count(), 8);
    }

    let table = add_interactions(&table, &two_way(&FACTORS)).unwrap();
    let report = diagnose(&table).unwrap();
    assert!(report.correlations.is_orthogonal(1e-12));
    assert!(report.is_balanced());
    assert_eq!(report.correlations.get("A", "B").unwrap(), 0.0);
    assert_eq!(report.correlations.get("A", "AxB").unwrap(), 0.0);
}

#[test]
fn orthogonal_array_aliases_interactions() {
    let table = recoded(&oa_design(4, 2).unwrap());
    let mut interactions = two_way(&FACTORS);
    interactions.push(Interaction::of(&["A", "B", "C"]));
    let table = add_interactions(&table, &interactions).unwrap();

    let corr = correlation_matrix(&table).unwrap();
    // Main effects stay orthogonal to each other.
    for (i, a) in FACTORS.iter().enumerate() {
        for b in &FACTORS[i + 1..] {
            assert_eq!(corr.get(a, b).unwrap(), 0.0);
        }
    }
    assert_eq!(corr.get("AxB", "C").unwrap(), -1.0);
    assert_eq!(corr.get("AxC", "B").unwrap(), -1.0);
    assert_eq!(corr.get("BxC", "A").unwrap(), -1.0);
    assert!(corr.get("AxBxC", "A").unwrap().is_nan());
    assert!(!corr.is_orthogonal(0.5));
}

#[test]
fn zero_noise_recovers_true_coefficients() {
    let design = DesignBuilder::new()
        .kind(DesignKind::FullFactorial)
        .factors(3)
        .replications(2)
        .replication_mode(ReplicationMode::EachRow)
        .randomize(11)
        .build()
        .unwrap();
    let table = add_interactions(&recoded(&design), &two_way(&["A", "B", "C"])).unwrap();

    let model = OutcomeModel::new(4.0)
        .with_effect("A", 1.25)
        .with_effect("B", -0.5)
        .with_effect("AxC", 2.0)
        .with_noise_sd(0.0);
    let sim = simulate(&table, &model, &mut seeded_rng(0)).unwrap();
    let fit = lm("Y ~ A + B + C + AxC", &sim.observed()).unwrap();

    assert!((fit.estimate(INTERCEPT).unwrap() - 4.0).abs() < 1e-10);
    assert!((fit.estimate("A").unwrap() - 1.25).abs() < 1e-10);
    assert!((fit.estimate("B").unwrap() + 0.5).abs() < 1e-10);
    assert!(fit.estimate("C").unwrap().abs() < 1e-10);
    assert!((fit.estimate("AxC").unwrap() - 2.0).abs() < 1e-10);
}

#[test]
fn omitted_variable_biases_the_aliased_interaction() {
    let design = oa_design(4, 2)
        .unwrap()
        .replicate(10, ReplicationMode::Whole)
        .unwrap();
    let table = add_interactions(&recoded(&design), &[Interaction::of(&["A", "B"])]).unwrap();

    let (ab, c) = (0.5, 1.5);
    let model = OutcomeModel::new(5.0)
        .with_effect("A", 2.0)
        .with_effect("B", -1.0)
        .with_effect("C", c)
        .with_effect("AxB", ab)
        .with_noise_sd(0.0);
    let sim = simulate(&table, &model, &mut seeded_rng(3)).unwrap();
    let observed = sim.observed();
    assert!(!observed.contains("Y_hat"));
    assert!(!observed.contains("epsilon"));

    let fit = lm("Y ~ A + B + AxB", &observed).unwrap();
    assert!((fit.estimate("AxB").unwrap() - (ab - c)).abs() < 1e-9);
    assert!((fit.estimate("A").unwrap() - 2.0).abs() < 1e-9);

    assert!(lm("Y ~ A + B + C + AxB", &observed).is_err());
}
