//! Monte Carlo sampling distributions of OLS estimates.
//!
//! Each replication draws fresh noise from a known model, refits a formula
//! and records the estimates. Replication `i` uses seed `seed + i`, so a
//! run is reproducible and independent of evaluation order.
//!
//! ```
//! use confound::montecarlo::{monte_carlo, MonteCarloConfig};
//! use confound::regression::Formula;
//! use confound::simulate::OutcomeModel;
//! use confound::{fac_design, recode_all};
//!
//! let table = recode_all(&fac_design(3, 2).unwrap().to_table()).unwrap();
//! let model = OutcomeModel::new(1.0).with_effect("A", 2.0);
//! let formula = Formula::parse("Y ~ A + B").unwrap();
//! let config = MonteCarloConfig::default().with_replications(200);
//!
//! let summary = monte_carlo(&table, &model, &formula, &config).unwrap();
//! assert!(summary.term("A").unwrap().bias.abs() < 0.2);
//! ```

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::regression::{fit, Formula, INTERCEPT};
use crate::simulate::{simulate, OutcomeModel};
use crate::table::Table;
use crate::utils::format_value;

/// Replication settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonteCarloConfig {
    /// Number of simulated data sets.
    pub replications: usize,
    /// Base seed; replication `i` uses `seed + i`.
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            replications: 1000,
            seed: 42,
        }
    }
}

impl MonteCarloConfig {
    /// Set the number of replications.
    #[must_use]
    pub fn with_replications(mut self, replications: usize) -> Self {
        self.replications = replications;
        self
    }

    /// Set the base seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.replications == 0 {
            return Err(Error::invalid_params("replications must be at least 1"));
        }
        Ok(())
    }
}

/// Sampling distribution of one coefficient.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TermSummary {
    /// Term name.
    pub term: String,
    /// Coefficient in the generating model (0 when absent).
    pub true_value: f64,
    /// Mean estimate across replications.
    pub mean: f64,
    /// Standard deviation of the estimates (`NaN` for one replication).
    pub std_dev: f64,
    /// `mean - true_value`.
    pub bias: f64,
}

/// Result of a Monte Carlo run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonteCarloSummary {
    /// The fitted formula.
    pub formula: Formula,
    /// Number of replications.
    pub replications: usize,
    /// One entry per coefficient, in model order.
    pub terms: Vec<TermSummary>,
}

impl MonteCarloSummary {
    /// Look up a term.
    #[must_use]
    pub fn term(&self, name: &str) -> Option<&TermSummary> {
        self.terms.iter().find(|t| t.term == name)
    }
}

impl fmt::Display for MonteCarloSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} over {} replications", self.formula, self.replications)?;
        let width = self
            .terms
            .iter()
            .map(|t| t.term.len())
            .max()
            .unwrap_or(0)
            .max(4);
        writeln!(
            f,
            "{:<width$} {:>10} {:>10} {:>10} {:>10}",
            "term", "true", "mean", "sd", "bias"
        )?;
        for t in &self.terms {
            writeln!(
                f,
                "{:<width$} {:>10} {:>10} {:>10} {:>10}",
                t.term,
                format_value(t.true_value),
                format_value(t.mean),
                format_value(t.std_dev),
                format_value(t.bias)
            )?;
        }
        Ok(())
    }
}

/// Run the replications sequentially.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any simulation or
/// fit fails (e.g. the formula is rank deficient on this table).
pub fn monte_carlo(
    table: &Table,
    model: &OutcomeModel,
    formula: &Formula,
    config: &MonteCarloConfig,
) -> Result<MonteCarloSummary> {
    config.validate()?;
    let estimates = (0..config.replications)
        .map(|i| replicate(table, model, formula, config.seed, i))
        .collect::<Result<Vec<_>>>()?;
    summarize(formula, model, table, &estimates)
}

/// Simulate and fit replication `i`.
pub(crate) fn replicate(
    table: &Table,
    model: &OutcomeModel,
    formula: &Formula,
    seed: u64,
    i: usize,
) -> Result<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
    let sim = simulate(table, model, &mut rng)?;
    let fitted = fit(formula, &sim.observed())?;
    trace!(replication = i, "monte carlo replication done");
    Ok(fitted.coefficients.iter().map(|c| c.estimate).collect())
}

/// Reduce per-replication estimates to per-term moments.
pub(crate) fn summarize(
    formula: &Formula,
    model: &OutcomeModel,
    table: &Table,
    estimates: &[Vec<f64>],
) -> Result<MonteCarloSummary> {
    let names = formula
        .has_intercept()
        .then_some(INTERCEPT)
        .into_iter()
        .chain(formula.terms().iter().map(String::as_str));

    let reps = estimates.len() as f64;
    let terms = names
        .enumerate()
        .map(|(j, name)| {
            let true_value = if name == INTERCEPT {
                model.intercept()
            } else {
                model.coefficient_in(table, name)?
            };
            let mean = estimates.iter().map(|e| e[j]).sum::<f64>() / reps;
            let std_dev = if estimates.len() > 1 {
                let ss: f64 = estimates.iter().map(|e| (e[j] - mean).powi(2)).sum();
                (ss / (reps - 1.0)).sqrt()
            } else {
                f64::NAN
            };
            Ok(TermSummary {
                term: name.to_string(),
                true_value,
                mean,
                std_dev,
                bias: mean - true_value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        formula = %formula,
        replications = estimates.len(),
        "summarized monte carlo run"
    );
    Ok(MonteCarloSummary {
        formula: formula.clone(),
        replications: estimates.len(),
        terms,
    })
}
