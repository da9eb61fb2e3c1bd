//! Builder pattern for generating experimental designs.
//!
//! The builder picks a construction from the requested kind, factor count
//! and levels, then applies naming, replication and optional run-order
//! randomisation.
//!
//! # Example
//!
//! ```
//! use confound::{DesignBuilder, DesignKind};
//!
//! let design = DesignBuilder::new()
//!     .kind(DesignKind::OrthogonalArray)
//!     .factors(4)
//!     .levels(2)
//!     .replications(10)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(design.runs(), 80);   // L8 repeated 10 times
//! assert_eq!(design.factors(), 4);
//! ```
//!
//! # Construction Selection
//!
//! - **Full factorial**: enumerate all s^k combinations
//! - **Orthogonal array, 2 levels**: smallest Sylvester-Hadamard array
//! - **Orthogonal array, prime levels**: Bose
//! - anything else fails with [`Error::NoOrthogonalArray`]

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::construct::{Bose, Constructor, FullFactorial, HadamardSylvester};
use crate::design::{Design, DesignKind, ReplicationMode};
use crate::error::{Error, Result};
use crate::utils::is_prime;

/// Builder for experimental designs.
#[derive(Debug, Clone, Default)]
pub struct DesignBuilder {
    kind: DesignKind,
    factors: Option<usize>,
    levels: Option<u32>,
    replications: Option<usize>,
    replication_mode: ReplicationMode,
    min_runs: Option<usize>,
    factor_names: Option<Vec<String>>,
    level_labels: Option<Vec<String>>,
    randomize_seed: Option<u64>,
}

impl DesignBuilder {
    /// Create a new builder with default settings (full factorial).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose between full factorial and orthogonal array.
    #[must_use]
    pub fn kind(mut self, kind: DesignKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the number of factors.
    #[must_use]
    pub fn factors(mut self, factors: usize) -> Self {
        self.factors = Some(factors);
        self
    }

    /// Set the number of levels for every factor (default 2).
    #[must_use]
    pub fn levels(mut self, levels: u32) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Repeat the design this many times (default 1).
    #[must_use]
    pub fn replications(mut self, replications: usize) -> Self {
        self.replications = Some(replications);
        self
    }

    /// Repeat whole blocks (default) or each row in place.
    #[must_use]
    pub fn replication_mode(mut self, mode: ReplicationMode) -> Self {
        self.replication_mode = mode;
        self
    }

    /// Ask for at least this many runs in the base orthogonal array.
    #[must_use]
    pub fn min_runs(mut self, min_runs: usize) -> Self {
        self.min_runs = Some(min_runs);
        self
    }

    /// Name the factors instead of `A`, `B`, ...
    #[must_use]
    pub fn factor_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.factor_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Label the levels instead of `"1"`, `"2"`, ...
    #[must_use]
    pub fn level_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.level_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Shuffle the run order with a seeded generator after replication.
    #[must_use]
    pub fn randomize(mut self, seed: u64) -> Self {
        self.randomize_seed = Some(seed);
        self
    }

    /// Build the design.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - factors is not specified or zero
    /// - no construction exists for the parameters
    /// - names or labels don't match the factor/level counts
    pub fn build(self) -> Result<Design> {
        let factors = self
            .factors
            .ok_or_else(|| Error::invalid_params("factors must be specified"))?;
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }
        let levels = self.levels.unwrap_or(2);
        let min_runs = self.min_runs.unwrap_or(0);

        let constructor = select_constructor(self.kind, factors, levels, min_runs)?;
        let mut design = constructor.construct(factors)?;
        debug!(
            construction = constructor.name(),
            runs = design.runs(),
            factors,
            levels,
            "constructed base design"
        );

        if let Some(names) = self.factor_names {
            design = design.with_factor_names(names)?;
        }
        if let Some(labels) = self.level_labels {
            design = design.with_level_labels(labels)?;
        }

        let replications = self.replications.unwrap_or(1);
        if replications != 1 {
            design = design.replicate(replications, self.replication_mode)?;
        }

        if let Some(seed) = self.randomize_seed {
            let mut rng = StdRng::seed_from_u64(seed);
            design = design.randomized(&mut rng);
        }

        Ok(design)
    }
}

/// Pick the construction for the requested parameters.
fn select_constructor(
    kind: DesignKind,
    factors: usize,
    levels: u32,
    min_runs: usize,
) -> Result<Box<dyn Constructor>> {
    let no_array = || Error::NoOrthogonalArray {
        factors,
        levels,
        min_runs,
    };

    match kind {
        DesignKind::FullFactorial => Ok(Box::new(FullFactorial::new(levels)?)),
        DesignKind::OrthogonalArray if levels == 2 => {
            Ok(Box::new(HadamardSylvester::for_factors(factors, min_runs)?))
        }
        DesignKind::OrthogonalArray if is_prime(levels) => {
            let bose = Bose::new(levels).map_err(|_| no_array())?;
            if factors <= bose.max_factors() && bose.runs(factors) >= min_runs {
                Ok(Box::new(bose))
            } else {
                Err(no_array())
            }
        }
        DesignKind::OrthogonalArray => Err(no_array()),
    }
}

/// Full factorial over `factors` factors with `levels` levels each.
///
/// # Example
///
/// ```
/// use confound::fac_design;
///
/// let design = fac_design(4, 2).unwrap();
/// assert_eq!(design.runs(), 16);
/// assert_eq!(design.factor_names(), ["A", "B", "C", "D"]);
/// ```
pub fn fac_design(factors: usize, levels: u32) -> Result<Design> {
    DesignBuilder::new()
        .kind(DesignKind::FullFactorial)
        .factors(factors)
        .levels(levels)
        .build()
}

/// Smallest known orthogonal array for `factors` factors at `levels` levels.
///
/// # Example
///
/// ```
/// use confound::oa_design;
///
/// let l8 = oa_design(4, 2).unwrap();
/// assert_eq!(l8.runs(), 8);
/// assert!(oa_design(4, 6).is_err());
/// ```
pub fn oa_design(factors: usize, levels: u32) -> Result<Design> {
    DesignBuilder::new()
        .kind(DesignKind::OrthogonalArray)
        .factors(factors)
        .levels(levels)
        .build()
}

/// List the orthogonal-array constructions available for `levels`.
///
/// Each entry is (name, runs, max factors).
///
/// ```
/// use confound::available_constructions;
///
/// let names: Vec<_> = available_constructions(2).iter().map(|c| c.0).collect();
/// assert!(names.contains(&"HadamardSylvester"));
/// assert!(names.contains(&"Bose"));
/// ```
#[must_use]
pub fn available_constructions(levels: u32) -> Vec<(&'static str, usize, usize)> {
    let mut options = Vec::new();
    if levels == 2 {
        for m in 2..=10 {
            let n = 1usize << m;
            options.push(("HadamardSylvester", n, n - 1));
        }
    }
    if let Ok(bose) = Bose::new(levels) {
        options.push(("Bose", bose.runs(0), bose.max_factors()));
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::verify_strength;

    #[test]
    fn test_fac_design_two_levels() {
        for f in 1..=5 {
            let design = fac_design(f, 2).unwrap();
            assert_eq!(design.runs(), 1 << f);
            assert_eq!(design.factors(), f);
            let report = design.balance_report();
            assert!(report.is_balanced());
            assert_eq!(report.expected_count, 1 << (f - 1));
        }
    }

    #[test]
    fn test_oa_design_binary() {
        let design = oa_design(4, 2).unwrap();
        assert_eq!(design.kind(), DesignKind::OrthogonalArray);
        assert_eq!(design.construction(), "HadamardSylvester");
        assert_eq!(design.runs(), 8);
        assert!(verify_strength(&design, 2).is_valid);

        let design = oa_design(7, 2).unwrap();
        assert_eq!(design.runs(), 8);
        let design = oa_design(8, 2).unwrap();
        assert_eq!(design.runs(), 16);
    }

    #[test]
    fn test_oa_design_prime_levels() {
        let design = oa_design(4, 3).unwrap();
        assert_eq!(design.runs(), 9);
        assert_eq!(design.construction(), "Bose");
    }

    #[test]
    fn test_no_orthogonal_array() {
        assert!(matches!(
            oa_design(3, 4),
            Err(Error::NoOrthogonalArray { levels: 4, .. })
        ));
        assert!(matches!(
            oa_design(5, 3),
            Err(Error::NoOrthogonalArray { factors: 5, .. })
        ));
        let result = DesignBuilder::new()
            .kind(DesignKind::OrthogonalArray)
            .factors(3)
            .levels(3)
            .min_runs(27)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_requests_are_errors() {
        assert!(matches!(
            oa_design(2, 65537),
            Err(Error::NoOrthogonalArray { factors: 2, levels: 65537, .. })
        ));
        assert!(matches!(
            oa_design(100_000, 2),
            Err(Error::NoOrthogonalArray { factors: 100_000, .. })
        ));
        let result = DesignBuilder::new()
            .kind(DesignKind::OrthogonalArray)
            .factors(3)
            .levels(2)
            .min_runs(usize::MAX)
            .build();
        assert!(matches!(result, Err(Error::NoOrthogonalArray { .. })));
    }

    #[test]
    fn test_builder_missing_factors() {
        assert!(DesignBuilder::new().levels(2).build().is_err());
        assert!(DesignBuilder::new().factors(0).build().is_err());
    }

    #[test]
    fn test_builder_min_runs() {
        let design = DesignBuilder::new()
            .kind(DesignKind::OrthogonalArray)
            .factors(3)
            .min_runs(16)
            .build()
            .unwrap();
        assert_eq!(design.runs(), 16);
    }

    #[test]
    fn test_builder_replications_each_row() {
        let design = DesignBuilder::new()
            .factors(2)
            .replications(3)
            .replication_mode(ReplicationMode::EachRow)
            .build()
            .unwrap();
        assert_eq!(design.runs(), 12);
        assert_eq!(design.replications(), 3);
        assert_eq!(design.run_order()[..6], [0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_builder_names_and_randomize() {
        let a = DesignBuilder::new()
            .factors(3)
            .factor_names(["price", "ad", "shelf"])
            .level_labels(["low", "high"])
            .randomize(11)
            .build()
            .unwrap();
        let b = DesignBuilder::new()
            .factors(3)
            .factor_names(["price", "ad", "shelf"])
            .level_labels(["low", "high"])
            .randomize(11)
            .build()
            .unwrap();
        assert_eq!(a.run_order(), b.run_order());
        assert_eq!(a.factor_names()[0], "price");
        assert!(a.balance_report().is_balanced());

        let bad = DesignBuilder::new().factors(2).factor_names(["x"]).build();
        assert!(bad.is_err());
    }

    #[test]
    fn test_available_constructions() {
        assert_eq!(available_constructions(3), vec![("Bose", 9, 4)]);
        assert!(available_constructions(6).is_empty());
    }
}
