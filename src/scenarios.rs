//! Narrated tutorial scenarios.
//!
//! Each scenario runs the whole pipeline (design, recoding, interactions,
//! diagnostics, simulation, estimation) for one teaching point and returns
//! a typed result whose `Display` renders the walkthrough as text.
//!
//! | Scenario | Point |
//! |----------|-------|
//! | [`full_factorial_walkthrough`] | every column of a full factorial is orthogonal |
//! | [`orthogonal_array_walkthrough`] | an L8 aliases interactions with main effects |
//! | [`omitted_variable`] | omitting an aliased factor biases the interaction |
//! | [`omitted_interaction`] | omitting an interaction leaves main effects unbiased |

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::{fac_design, oa_design};
use crate::design::{Design, ReplicationMode};
use crate::diagnostics::{diagnose, ConfoundedPair, DiagnosticReport};
use crate::error::{Error, Result};
use crate::interaction::{add_interactions, two_way, Interaction};
use crate::montecarlo::{monte_carlo, MonteCarloConfig, MonteCarloSummary};
use crate::recode::recode_all;
use crate::regression::{lm, Formula, OlsFit};
use crate::simulate::{seeded_rng, simulate, OutcomeModel};
use crate::table::Table;
use crate::utils::format_value;

/// Correlations at least this large in magnitude count as confounding.
const CONFOUNDING_THRESHOLD: f64 = 0.999;

/// Factor names used throughout the walkthroughs.
const FACTORS: [&str; 4] = ["A", "B", "C", "D"];

/// Parameters of the simulated scenarios.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TutorialConfig {
    /// Seed of the single illustrative simulation and base seed of the
    /// Monte Carlo run.
    pub seed: u64,
    /// Monte Carlo replications.
    pub replications: usize,
    /// Copies of the base design in the simulated data.
    pub design_replications: usize,
    /// Noise standard deviation.
    pub noise_sd: f64,
    /// True intercept.
    pub intercept: f64,
    /// True effect of `A`.
    pub a: f64,
    /// True effect of `B`.
    pub b: f64,
    /// True effect of `C`.
    pub c: f64,
    /// True effect of the `AxB` interaction.
    pub ab: f64,
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            replications: 500,
            design_replications: 10,
            noise_sd: 1.0,
            intercept: 5.0,
            a: 2.0,
            b: -1.0,
            c: 1.5,
            ab: 0.5,
        }
    }
}

impl TutorialConfig {
    fn monte_carlo(&self) -> MonteCarloConfig {
        MonteCarloConfig::default()
            .with_replications(self.replications)
            .with_seed(self.seed)
    }

    fn validate(&self) -> Result<()> {
        if self.design_replications == 0 {
            return Err(Error::invalid_params(
                "design replications must be at least 1",
            ));
        }
        Ok(())
    }
}

/// The available scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// [`full_factorial_walkthrough`]
    FullFactorial,
    /// [`orthogonal_array_walkthrough`]
    OrthogonalArray,
    /// [`omitted_variable`]
    OmittedVariable,
    /// [`omitted_interaction`]
    OmittedInteraction,
}

impl Scenario {
    /// Every scenario in tutorial order.
    pub const ALL: [Scenario; 4] = [
        Self::FullFactorial,
        Self::OrthogonalArray,
        Self::OmittedVariable,
        Self::OmittedInteraction,
    ];

    /// Run the scenario and render it as text.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the pipeline.
    pub fn render(self, config: &TutorialConfig) -> Result<String> {
        Ok(match self {
            Self::FullFactorial => full_factorial_walkthrough()?.to_string(),
            Self::OrthogonalArray => orthogonal_array_walkthrough()?.to_string(),
            Self::OmittedVariable => omitted_variable(config)?.to_string(),
            Self::OmittedInteraction => omitted_interaction(config)?.to_string(),
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FullFactorial => "full-factorial",
            Self::OrthogonalArray => "orthogonal-array",
            Self::OmittedVariable => "omitted-variable",
            Self::OmittedInteraction => "omitted-interaction",
        })
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.to_string() == s)
            .ok_or_else(|| Error::invalid_params(format!("unknown scenario: {s}")))
    }
}

/// Result of [`full_factorial_walkthrough`].
#[derive(Debug, Clone)]
pub struct FactorialWalkthrough {
    /// The 2^4 design.
    pub design: Design,
    /// Recoded factors plus all two-way interactions.
    pub table: Table,
    /// Diagnostics of `table`.
    pub diagnostics: DiagnosticReport,
}

impl FactorialWalkthrough {
    /// True when no two distinct columns are correlated.
    #[must_use]
    pub fn is_orthogonal(&self) -> bool {
        self.diagnostics.correlations.is_orthogonal(1e-12)
    }
}

impl fmt::Display for FactorialWalkthrough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Full factorial: {} ==", self.design.params())?;
        writeln!(f)?;
        writeln!(f, "{}", self.table)?;
        write!(f, "{}", self.diagnostics)?;
        writeln!(
            f,
            "All factors and two-way interactions orthogonal: {}",
            self.is_orthogonal()
        )
    }
}

/// Recode a 2^4 full factorial, add every two-way interaction and check
/// that all columns are mutually orthogonal and balanced.
///
/// ```
/// use confound::scenarios::full_factorial_walkthrough;
///
/// let walk = full_factorial_walkthrough().unwrap();
/// assert_eq!(walk.table.nrows(), 16);
/// assert!(walk.is_orthogonal());
/// ```
///
/// # Errors
///
/// Returns any error raised by the pipeline.
pub fn full_factorial_walkthrough() -> Result<FactorialWalkthrough> {
    let design = fac_design(FACTORS.len(), 2)?;
    let table = recode_all(&design.to_table())?;
    let table = add_interactions(&table, &two_way(&FACTORS))?;
    let diagnostics = diagnose(&table)?;
    debug!(columns = table.ncols(), "full factorial walkthrough");
    Ok(FactorialWalkthrough {
        design,
        table,
        diagnostics,
    })
}

/// Result of [`orthogonal_array_walkthrough`].
#[derive(Debug, Clone)]
pub struct ArrayWalkthrough {
    /// The L8 restricted to four factors.
    pub design: Design,
    /// Recoded factors, all two-way interactions and `AxBxC`.
    pub table: Table,
    /// Diagnostics of `table`.
    pub diagnostics: DiagnosticReport,
    /// Column pairs that are perfectly correlated.
    pub confounded: Vec<ConfoundedPair>,
    /// Constant columns.
    pub degenerate: Vec<String>,
}

impl fmt::Display for ArrayWalkthrough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "== Orthogonal array: {} ({}) ==",
            self.design.params(),
            self.design.construction()
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.table)?;
        write!(f, "{}", self.diagnostics)?;
        writeln!(f, "Confounded pairs:")?;
        for pair in &self.confounded {
            writeln!(f, "  {pair}")?;
        }
        if !self.degenerate.is_empty() {
            writeln!(
                f,
                "Constant columns (aliased with the intercept): {}",
                self.degenerate.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Build the L8 for four factors with every two-way interaction and `AxBxC`,
/// then locate the aliased column pairs.
///
/// ```
/// use confound::scenarios::orthogonal_array_walkthrough;
///
/// let walk = orthogonal_array_walkthrough().unwrap();
/// assert!(walk.confounded.iter().any(|p| p.joins("AxB", "C")));
/// assert_eq!(walk.degenerate, ["AxBxC"]);
/// ```
///
/// # Errors
///
/// Returns any error raised by the pipeline.
pub fn orthogonal_array_walkthrough() -> Result<ArrayWalkthrough> {
    let design = oa_design(FACTORS.len(), 2)?;
    let table = recode_all(&design.to_table())?;
    let mut interactions = two_way(&FACTORS);
    interactions.push(Interaction::of(&FACTORS[..3]));
    let table = add_interactions(&table, &interactions)?;

    let diagnostics = diagnose(&table)?;
    let confounded = diagnostics
        .correlations
        .confounded_pairs(CONFOUNDING_THRESHOLD);
    let degenerate = diagnostics
        .correlations
        .degenerate_columns()
        .into_iter()
        .map(String::from)
        .collect();
    debug!(
        confounded = confounded.len(),
        "orthogonal array walkthrough"
    );
    Ok(ArrayWalkthrough {
        design,
        table,
        diagnostics,
        confounded,
        degenerate,
    })
}

/// Result of [`omitted_variable`].
#[derive(Debug, Clone)]
pub struct OmittedVariable {
    /// The generating model.
    pub model: OutcomeModel,
    /// Rows of the replicated array.
    pub observations: usize,
    /// Why the generating model cannot be fitted on this array.
    pub aliased: Error,
    /// `Y ~ A + B + AxB`, omitting `C`.
    pub misspecified: OlsFit,
    /// `Y ~ A + B + C`, omitting `AxB`.
    pub main_effects: OlsFit,
    /// Sampling distribution of the misspecified estimates.
    pub monte_carlo: MonteCarloSummary,
}

impl OmittedVariable {
    /// Expected `AxB` estimate when `C` is omitted: the array sets
    /// `C = -AxB`, so the estimate converges to `ab - c`.
    #[must_use]
    pub fn expected_interaction(&self) -> f64 {
        self.model.coefficient("AxB") - self.model.coefficient("C")
    }
}

impl fmt::Display for OmittedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Omitted variable on a replicated L8 ==")?;
        writeln!(f, "True model: {}", self.model)?;
        writeln!(f, "Observations: {}", self.observations)?;
        writeln!(f)?;
        writeln!(f, "Fitting the true model fails: {}", self.aliased)?;
        writeln!(f)?;
        writeln!(f, "{}", self.misspecified)?;
        writeln!(
            f,
            "AxB estimate {} targets ab - c = {}, not ab = {}",
            format_value(self.misspecified.estimate("AxB").unwrap_or(f64::NAN)),
            format_value(self.expected_interaction()),
            format_value(self.model.coefficient("AxB"))
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.main_effects)?;
        write!(f, "{}", self.monte_carlo)
    }
}

/// Simulate `Y = cons + a A + b B + c C + ab AxB + e` on a replicated L8
/// and fit models that omit `C` or `AxB`.
///
/// # Errors
///
/// Returns an error for an invalid configuration or any pipeline failure.
pub fn omitted_variable(config: &TutorialConfig) -> Result<OmittedVariable> {
    config.validate()?;
    let design = oa_design(FACTORS.len(), 2)?
        .replicate(config.design_replications, ReplicationMode::Whole)?;
    let table = recode_all(&design.to_table())?;
    let table = add_interactions(&table, &[Interaction::of(&["A", "B"])])?;

    let model = OutcomeModel::new(config.intercept)
        .with_effect("A", config.a)
        .with_effect("B", config.b)
        .with_effect("C", config.c)
        .with_effect("AxB", config.ab)
        .with_noise_sd(config.noise_sd);
    let observed = simulate(&table, &model, &mut seeded_rng(config.seed))?.observed();

    let aliased = match lm("Y ~ A + B + C + AxB", &observed) {
        Err(e @ Error::RankDeficient { .. }) => e,
        Err(e) => return Err(e),
        Ok(_) => {
            return Err(Error::invalid_params(
                "expected AxB to be aliased with C on the L8",
            ))
        }
    };
    let misspecified = lm("Y ~ A + B + AxB", &observed)?;
    let main_effects = lm("Y ~ A + B + C", &observed)?;
    let monte_carlo = monte_carlo(
        &table,
        &model,
        &misspecified.formula,
        &config.monte_carlo(),
    )?;

    Ok(OmittedVariable {
        model,
        observations: observed.nrows(),
        aliased,
        misspecified,
        main_effects,
        monte_carlo,
    })
}

/// Result of [`omitted_interaction`].
#[derive(Debug, Clone)]
pub struct OmittedInteraction {
    /// The generating model.
    pub model: OutcomeModel,
    /// `Y ~ A + B + AxB`.
    pub full: OlsFit,
    /// `Y ~ A + B`.
    pub reduced: OlsFit,
    /// Sampling distribution of the reduced estimates.
    pub monte_carlo: MonteCarloSummary,
}

impl fmt::Display for OmittedInteraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Omitted interaction on a replicated 2^2 factorial ==")?;
        writeln!(f, "True model: {}", self.model)?;
        writeln!(f)?;
        writeln!(f, "{}", self.full)?;
        writeln!(f, "{}", self.reduced)?;
        writeln!(
            f,
            "Residual sum of squares grows from {} to {}; main effects keep their targets.",
            format_value(self.full.rss),
            format_value(self.reduced.rss)
        )?;
        writeln!(f)?;
        write!(f, "{}", self.monte_carlo)
    }
}

/// Simulate a model with an `AxB` interaction on a replicated 2^2 full
/// factorial and fit it with and without the interaction.
///
/// # Errors
///
/// Returns an error for an invalid configuration or any pipeline failure.
pub fn omitted_interaction(config: &TutorialConfig) -> Result<OmittedInteraction> {
    config.validate()?;
    let design = fac_design(2, 2)?.replicate(config.design_replications, ReplicationMode::Whole)?;
    let table = recode_all(&design.to_table())?;
    let table = add_interactions(&table, &[Interaction::of(&["A", "B"])])?;

    let model = OutcomeModel::new(config.intercept)
        .with_effect("A", config.a)
        .with_effect("B", config.b)
        .with_effect("AxB", config.ab)
        .with_noise_sd(config.noise_sd);
    let observed = simulate(&table, &model, &mut seeded_rng(config.seed))?.observed();

    let full = lm("Y ~ A + B + AxB", &observed)?;
    let reduced = lm("Y ~ A + B", &observed)?;
    let formula: Formula = reduced.formula.clone();
    let monte_carlo = monte_carlo(&table, &model, &formula, &config.monte_carlo())?;

    Ok(OmittedInteraction {
        model,
        full,
        reduced,
        monte_carlo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> TutorialConfig {
        TutorialConfig {
            replications: 200,
            ..TutorialConfig::default()
        }
    }

    #[test]
    fn test_full_factorial_is_orthogonal_and_balanced() {
        let walk = full_factorial_walkthrough().unwrap();
        assert_eq!(walk.design.runs(), 16);
        assert_eq!(walk.table.ncols(), 4 + 6);
        assert!(walk.is_orthogonal());
        assert!(walk.diagnostics.is_balanced());
        assert!(walk.to_string().contains("orthogonal: true"));
    }

    #[test]
    fn test_array_walkthrough_finds_aliases() {
        let walk = orthogonal_array_walkthrough().unwrap();
        assert_eq!(walk.design.runs(), 8);
        assert_eq!(walk.table.ncols(), 4 + 6 + 1);
        assert_eq!(walk.confounded.len(), 3);
        for (a, b) in [("AxB", "C"), ("AxC", "B"), ("BxC", "A")] {
            let pair = walk.confounded.iter().find(|p| p.joins(a, b)).unwrap();
            assert!((pair.correlation + 1.0).abs() < 1e-12);
        }
        assert_eq!(walk.degenerate, ["AxBxC"]);
        assert!(walk.to_string().contains("AxBxC"));
    }

    #[test]
    fn test_omitted_variable_bias() {
        let config = quick();
        let result = omitted_variable(&config).unwrap();
        assert_eq!(result.observations, 80);
        assert_eq!(result.aliased, Error::RankDeficient { term: "AxB".into() });
        assert_eq!(result.expected_interaction(), config.ab - config.c);

        // One draw: sd of each estimate is 1/sqrt(80).
        let single = result.misspecified.estimate("AxB").unwrap();
        assert!((single - (config.ab - config.c)).abs() < 0.5);
        let c_hat = result.main_effects.estimate("C").unwrap();
        assert!((c_hat - (config.c - config.ab)).abs() < 0.5);

        let mc = result.monte_carlo.term("AxB").unwrap();
        assert!((mc.bias + config.c).abs() < 0.05);
        assert!(result.monte_carlo.term("A").unwrap().bias.abs() < 0.05);
        assert!(result.to_string().contains("rank deficient"));
    }

    #[test]
    fn test_omitted_interaction_keeps_main_effects() {
        let config = quick();
        let result = omitted_interaction(&config).unwrap();
        assert_eq!(result.full.observations(), 40);
        assert!(result.reduced.rss > result.full.rss);

        for term in ["A", "B"] {
            assert!(result.monte_carlo.term(term).unwrap().bias.abs() < 0.05);
        }
        assert!(result.monte_carlo.term("AxB").is_none());
    }

    #[test]
    fn test_scenario_names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(scenario.to_string().parse::<Scenario>().unwrap(), scenario);
        }
        assert!("nope".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_invalid_config() {
        let config = TutorialConfig {
            design_replications: 0,
            ..TutorialConfig::default()
        };
        assert!(omitted_variable(&config).is_err());
    }
}
