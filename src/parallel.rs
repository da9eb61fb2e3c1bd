//! Parallel Monte Carlo replications using Rayon.
//!
//! Enable with the `parallel` feature flag. Replication `i` draws from seed
//! `seed + i` exactly as in [`monte_carlo`](crate::montecarlo::monte_carlo),
//! so both drivers return identical summaries.
//!
//! # Usage
//!
//! ```
//! use confound::montecarlo::MonteCarloConfig;
//! use confound::parallel::par_monte_carlo;
//! use confound::regression::Formula;
//! use confound::simulate::OutcomeModel;
//! use confound::{fac_design, recode_all};
//!
//! let table = recode_all(&fac_design(3, 2).unwrap().to_table()).unwrap();
//! let model = OutcomeModel::new(0.0).with_effect("B", 1.0);
//! let formula = Formula::parse("Y ~ B").unwrap();
//! let summary = par_monte_carlo(&table, &model, &formula, &MonteCarloConfig::default()).unwrap();
//! assert_eq!(summary.replications, 1000);
//! ```
//!
//! # Performance
//!
//! Each replication is a small least-squares fit, so the gain shows up
//! with thousands of replications or large replicated designs.

use rayon::prelude::*;

use crate::error::Result;
use crate::montecarlo::{replicate, summarize, MonteCarloConfig, MonteCarloSummary};
use crate::regression::Formula;
use crate::simulate::OutcomeModel;
use crate::table::Table;

/// Run the replications on the Rayon thread pool.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any replication
/// fails.
pub fn par_monte_carlo(
    table: &Table,
    model: &OutcomeModel,
    formula: &Formula,
    config: &MonteCarloConfig,
) -> Result<MonteCarloSummary> {
    config.validate()?;
    let estimates = (0..config.replications)
        .into_par_iter()
        .map(|i| replicate(table, model, formula, config.seed, i))
        .collect::<Result<Vec<_>>>()?;
    summarize(formula, model, table, &estimates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::montecarlo::monte_carlo;
    use crate::{fac_design, recode_all};

    #[test]
    fn test_matches_sequential() {
        let table = recode_all(&fac_design(4, 2).unwrap().to_table()).unwrap();
        let model = OutcomeModel::new(2.0)
            .with_effect("A", 1.0)
            .with_effect("A:B", 0.5);
        let formula = Formula::parse("Y ~ A + B").unwrap();
        let config = MonteCarloConfig::default().with_replications(64).with_seed(3);

        let sequential = monte_carlo(&table, &model, &formula, &config).unwrap();
        let parallel = par_monte_carlo(&table, &model, &formula, &config).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_propagates_errors() {
        let table = recode_all(&fac_design(2, 2).unwrap().to_table()).unwrap();
        let formula = Formula::parse("Y ~ A + Z").unwrap();
        let config = MonteCarloConfig::default().with_replications(8);
        assert!(par_monte_carlo(&table, &OutcomeModel::default(), &formula, &config).is_err());
    }
}
