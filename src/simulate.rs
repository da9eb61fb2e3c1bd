//! Simulated outcomes from a known linear model.
//!
//! For every row the simulator computes
//!
//! ```text
//! Y_hat   = intercept + Σ coefficient * term
//! epsilon ~ Normal(0, noise_sd)
//! Y       = Y_hat + epsilon
//! ```
//!
//! Randomness always comes from a caller-supplied RNG, so a fixed seed
//! reproduces the same outcomes.
//!
//! ```
//! use confound::simulate::{seeded_rng, simulate, OutcomeModel, RESPONSE};
//! use confound::{fac_design, recode_all};
//!
//! let table = recode_all(&fac_design(2, 2).unwrap().to_table()).unwrap();
//! let model = OutcomeModel::new(10.0)
//!     .with_effect("A", 2.0)
//!     .with_effect("A:B", -1.0)
//!     .with_noise_sd(0.0);
//!
//! let sim = simulate(&table, &model, &mut seeded_rng(1)).unwrap();
//! assert_eq!(sim.response(), [7.0, 13.0, 9.0, 11.0]);
//! assert!(sim.observed().contains(RESPONSE));
//! ```

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::table::{Column, Table};
use crate::utils::format_value;

/// Name of the simulated response column.
pub const RESPONSE: &str = "Y";
/// Name of the deterministic predictor column.
pub const PREDICTOR: &str = "Y_hat";
/// Name of the noise column.
pub const NOISE: &str = "epsilon";

/// A true effect in the generating model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Effect {
    /// Column name, or a `:`-joined product such as `A:B`.
    pub term: String,
    /// True coefficient.
    pub coefficient: f64,
}

/// The data-generating model: intercept, effects and noise level.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutcomeModel {
    intercept: f64,
    effects: Vec<Effect>,
    noise_sd: f64,
}

impl Default for OutcomeModel {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl OutcomeModel {
    /// A model with only an intercept and unit noise.
    #[must_use]
    pub fn new(intercept: f64) -> Self {
        Self {
            intercept,
            effects: Vec::new(),
            noise_sd: 1.0,
        }
    }

    /// Add a term with its true coefficient.
    #[must_use]
    pub fn with_effect(mut self, term: impl Into<String>, coefficient: f64) -> Self {
        self.effects.push(Effect {
            term: term.into(),
            coefficient,
        });
        self
    }

    /// Set the noise standard deviation.
    #[must_use]
    pub fn with_noise_sd(mut self, sd: f64) -> Self {
        self.noise_sd = sd;
        self
    }

    /// The intercept.
    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// The effects in declaration order.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Noise standard deviation.
    #[must_use]
    pub fn noise_sd(&self) -> f64 {
        self.noise_sd
    }

    /// True coefficient of a term, 0 when the model does not contain it.
    #[must_use]
    pub fn coefficient(&self, term: &str) -> f64 {
        self.effects
            .iter()
            .filter(|e| e.term == term)
            .fold(0.0, |acc, e| acc + e.coefficient)
    }

    /// True coefficient of a regressor of `table`, matching effects by the
    /// columns they multiply rather than by spelling. `AxB`, `A:B` and
    /// `B:A` all pick up an effect declared as any of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the term or an effect references a missing or
    /// non-numeric column.
    pub fn coefficient_in(&self, table: &Table, term: &str) -> Result<f64> {
        let key = table.term_factors(term)?;
        let mut total = 0.0;
        for effect in &self.effects {
            if table.term_factors(&effect.term)? == key {
                total += effect.coefficient;
            }
        }
        Ok(total)
    }

    fn validate(&self) -> Result<()> {
        if !(self.noise_sd.is_finite() && self.noise_sd >= 0.0) {
            return Err(Error::invalid_params(format!(
                "noise standard deviation must be finite and non-negative, got {}",
                self.noise_sd
            )));
        }
        if !self.intercept.is_finite() || self.effects.iter().any(|e| !e.coefficient.is_finite()) {
            return Err(Error::invalid_params("coefficients must be finite"));
        }
        Ok(())
    }
}

impl fmt::Display for OutcomeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{RESPONSE} = {}", format_value(self.intercept))?;
        for effect in &self.effects {
            let sign = if effect.coefficient < 0.0 { '-' } else { '+' };
            write!(
                f,
                " {sign} {}*{}",
                format_value(effect.coefficient.abs()),
                effect.term
            )?;
        }
        write!(f, " + {NOISE}, {NOISE} ~ N(0, {}²)", format_value(self.noise_sd))
    }
}

/// A table extended with `Y_hat`, `epsilon` and `Y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    table: Table,
}

impl Simulation {
    /// The full table, including the predictor and noise columns.
    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The table an analyst would see: input columns plus `Y` only.
    #[must_use]
    pub fn observed(&self) -> Table {
        let columns = self
            .table
            .iter()
            .filter(|(name, _)| *name != PREDICTOR && *name != NOISE)
            .map(|(name, column)| (name.to_string(), column.clone()));
        Table::from_trusted_columns(self.table.nrows(), columns)
    }

    /// Simulated responses.
    #[must_use]
    pub fn response(&self) -> &[f64] {
        self.numeric(RESPONSE)
    }

    /// Deterministic part of the response.
    #[must_use]
    pub fn predictor(&self) -> &[f64] {
        self.numeric(PREDICTOR)
    }

    /// Noise draws.
    #[must_use]
    pub fn noise(&self) -> &[f64] {
        self.numeric(NOISE)
    }

    fn numeric(&self, name: &str) -> &[f64] {
        self.table.numeric(name).unwrap_or(&[])
    }
}

/// An RNG seeded for reproducible simulations.
#[must_use]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Simulate outcomes for every row of `table`.
///
/// # Errors
///
/// Returns an error if the noise level is negative or not finite, a term
/// is missing or not numeric, or the output columns already exist.
pub fn simulate<R: Rng + ?Sized>(
    table: &Table,
    model: &OutcomeModel,
    rng: &mut R,
) -> Result<Simulation> {
    model.validate()?;
    for name in [PREDICTOR, NOISE, RESPONSE] {
        if table.contains(name) {
            return Err(Error::DuplicateColumn(name.to_string()));
        }
    }

    let n = table.nrows();
    let mut predictor = vec![model.intercept; n];
    for effect in &model.effects {
        let values = table.term_values(&effect.term)?;
        for (acc, v) in predictor.iter_mut().zip(values) {
            *acc += effect.coefficient * v;
        }
    }

    let noise: Vec<f64> = if model.noise_sd == 0.0 {
        vec![0.0; n]
    } else {
        let normal = Normal::new(0.0, model.noise_sd)
            .map_err(|e| Error::invalid_params(e.to_string()))?;
        normal.sample_iter(&mut *rng).take(n).collect()
    };
    let response = predictor.iter().zip(&noise).map(|(p, e)| p + e).collect();

    let table = table
        .clone()
        .with_column(PREDICTOR, Column::numeric(predictor))?
        .with_column(NOISE, Column::numeric(noise))?
        .with_column(RESPONSE, Column::numeric(response))?;
    debug!(
        rows = n,
        effects = model.effects.len(),
        noise_sd = model.noise_sd,
        "simulated outcomes"
    );
    Ok(Simulation { table })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{add_interactions, two_way};
    use crate::{fac_design, recode_all};

    fn factorial(factors: usize) -> Table {
        recode_all(&fac_design(factors, 2).unwrap().to_table()).unwrap()
    }

    #[test]
    fn test_zero_noise_is_exact() {
        let table = factorial(3);
        let model = OutcomeModel::new(1.0)
            .with_effect("A", 0.5)
            .with_effect("C", -2.0)
            .with_noise_sd(0.0);
        let sim = simulate(&table, &model, &mut seeded_rng(0)).unwrap();

        assert!(sim.noise().iter().all(|&e| e == 0.0));
        assert_eq!(sim.response(), sim.predictor());
        let a = table.numeric("A").unwrap();
        let c = table.numeric("C").unwrap();
        for i in 0..8 {
            assert_eq!(sim.response()[i], 1.0 + 0.5 * a[i] - 2.0 * c[i]);
        }
    }

    #[test]
    fn test_response_is_predictor_plus_noise() {
        let table = factorial(4);
        let model = OutcomeModel::new(3.0).with_effect("B", 1.0);
        let sim = simulate(&table, &model, &mut seeded_rng(7)).unwrap();
        for i in 0..16 {
            assert_eq!(sim.response()[i], sim.predictor()[i] + sim.noise()[i]);
        }
        assert!(sim.noise().iter().any(|&e| e != 0.0));
    }

    #[test]
    fn test_same_seed_same_outcomes() {
        let table = factorial(3);
        let model = OutcomeModel::new(0.0).with_effect("A", 1.0);
        let first = simulate(&table, &model, &mut seeded_rng(42)).unwrap();
        let second = simulate(&table, &model, &mut seeded_rng(42)).unwrap();
        let other = simulate(&table, &model, &mut seeded_rng(43)).unwrap();
        assert_eq!(first, second);
        assert_ne!(first.response(), other.response());
    }

    #[test]
    fn test_noise_moments() {
        let table = Table::new()
            .with_column("X", Column::numeric(vec![0.0; 20_000]))
            .unwrap();
        let model = OutcomeModel::new(0.0).with_noise_sd(2.0);
        let sim = simulate(&table, &model, &mut seeded_rng(5)).unwrap();
        let n = sim.noise().len() as f64;
        let mean = sim.noise().iter().sum::<f64>() / n;
        let var = sim.noise().iter().map(|e| (e - mean).powi(2)).sum::<f64>() / (n - 1.0);
        assert!(mean.abs() < 0.1);
        assert!((var.sqrt() - 2.0).abs() < 0.1);
    }

    #[test]
    fn test_observed_drops_latent_columns() {
        let table = factorial(2);
        let sim = simulate(&table, &OutcomeModel::new(1.0), &mut seeded_rng(1)).unwrap();
        assert_eq!(sim.table().names(), ["A", "B", "Y_hat", "epsilon", "Y"]);
        assert_eq!(sim.observed().names(), ["A", "B", "Y"]);
    }

    #[test]
    fn test_errors() {
        let table = factorial(2);
        let mut rng = seeded_rng(1);
        for sd in [-1.0, f64::NAN, f64::INFINITY] {
            let model = OutcomeModel::new(0.0).with_noise_sd(sd);
            assert!(matches!(
                simulate(&table, &model, &mut rng),
                Err(Error::InvalidParams { .. })
            ));
        }
        let model = OutcomeModel::new(0.0).with_effect("Q", 1.0);
        assert_eq!(
            simulate(&table, &model, &mut rng).unwrap_err(),
            Error::UnknownColumn("Q".into())
        );

        let sim = simulate(&table, &OutcomeModel::default(), &mut rng).unwrap();
        assert_eq!(
            simulate(&sim.observed(), &OutcomeModel::default(), &mut rng).unwrap_err(),
            Error::DuplicateColumn("Y".into())
        );
    }

    #[test]
    fn test_model_display_and_lookup() {
        let model = OutcomeModel::new(10.0)
            .with_effect("A", 2.0)
            .with_effect("AxB", -0.5);
        assert_eq!(model.coefficient("AxB"), -0.5);
        assert_eq!(model.coefficient("C"), 0.0);
        assert_eq!(
            model.to_string(),
            "Y = 10 + 2*A - 0.5000*AxB + epsilon, epsilon ~ N(0, 1²)"
        );
        assert!(model.coefficient("C").is_sign_positive());
    }

    #[test]
    fn test_coefficient_matches_equivalent_terms() {
        let table = add_interactions(&factorial(3), &two_way(&["A", "B", "C"])).unwrap();
        let model = OutcomeModel::new(1.0)
            .with_effect("A:B", 2.0)
            .with_effect("C", 0.5);

        for term in ["AxB", "A:B", "B:A"] {
            assert_eq!(model.coefficient_in(&table, term).unwrap(), 2.0, "{term}");
        }
        assert_eq!(model.coefficient_in(&table, "C").unwrap(), 0.5);
        assert_eq!(model.coefficient_in(&table, "AxC").unwrap(), 0.0);
        assert_eq!(
            model.coefficient_in(&table, "Q"),
            Err(Error::UnknownColumn("Q".into()))
        );
    }
}
