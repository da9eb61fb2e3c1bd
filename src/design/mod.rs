//! Experimental design core types and operations.
//!
//! A [`Design`] is a matrix of level indices (rows = runs, columns =
//! factors) together with the parameters that describe it. Designs come out
//! of the constructions in [`crate::construct`] (usually via
//! [`crate::DesignBuilder`]) and are turned into a [`Table`] with
//! [`Design::to_table`] before recoding and analysis.
//!
//! ## Notation
//!
//! A symmetric design D(N, k, s, t) has:
//! - N rows (runs), including replications
//! - k columns (factors)
//! - s levels (symbols 0, 1, ..., s-1)
//! - strength t: every N×t subarray contains each t-tuple equally often
//!
//! A full factorial over k factors has strength k; the orthogonal arrays
//! used here have strength 2.

mod stats;
mod verify;

pub use stats::BalanceReport;
pub use verify::{compute_strength, verify_strength, VerificationIssue, VerificationResult};

use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::table::{Column, Table};
use crate::utils::factor_name;

/// Family of a generated design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DesignKind {
    /// Every combination of levels.
    #[default]
    FullFactorial,
    /// A balanced fraction of the full factorial.
    OrthogonalArray,
}

impl fmt::Display for DesignKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullFactorial => write!(f, "full factorial"),
            Self::OrthogonalArray => write!(f, "orthogonal array"),
        }
    }
}

/// How replications are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReplicationMode {
    /// Repeat the whole array as consecutive blocks.
    #[default]
    Whole,
    /// Repeat each row in place.
    EachRow,
}

/// Parameters describing a design.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignParams {
    /// Number of runs (rows), replications included.
    pub runs: usize,
    /// Number of factors (columns).
    pub factors: usize,
    /// Number of levels of every factor.
    pub levels: u32,
    /// Strength (orthogonality degree).
    pub strength: u32,
    /// How many times the base design is repeated.
    pub replications: usize,
}

impl DesignParams {
    /// Create new design parameters with validation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - levels is 0 or 1
    /// - factors or replications is 0
    /// - strength exceeds factors
    /// - runs is not divisible by levels^strength
    pub fn new(runs: usize, factors: usize, levels: u32, strength: u32) -> Result<Self> {
        if levels < 2 {
            return Err(Error::invalid_params("levels must be at least 2"));
        }
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }
        if strength as usize > factors {
            return Err(Error::invalid_params(format!(
                "strength {strength} cannot exceed factors {factors}"
            )));
        }

        let s_to_t = (levels as usize)
            .checked_pow(strength)
            .ok_or_else(|| Error::invalid_params(format!("{levels}^{strength} overflows")))?;
        if runs == 0 || runs % s_to_t != 0 {
            return Err(Error::invalid_params(format!(
                "runs {runs} must be a positive multiple of levels^strength = {s_to_t}"
            )));
        }

        Ok(Self {
            runs,
            factors,
            levels,
            strength,
            replications: 1,
        })
    }

    /// Runs of the unreplicated base design.
    #[must_use]
    pub fn base_runs(&self) -> usize {
        self.runs / self.replications.max(1)
    }

    /// Get the index (lambda): how often each t-tuple appears.
    #[must_use]
    pub fn index(&self) -> usize {
        self.runs / (self.levels as usize).pow(self.strength)
    }
}

impl fmt::Display for DesignParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "D({}, {}, {}, {})",
            self.runs, self.factors, self.levels, self.strength
        )?;
        if self.replications > 1 {
            write!(f, " x{}", self.replications)?;
        }
        Ok(())
    }
}

/// An experimental design.
///
/// The data is a 2D matrix of level indices where every entry lies in
/// `0..levels`. Factor names default to `A`, `B`, `C`, ... and level labels
/// to `"1"`, `"2"`, ...
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Design {
    data: Array2<u32>,
    params: DesignParams,
    kind: DesignKind,
    construction: String,
    factor_names: Vec<String>,
    level_labels: Vec<String>,
    /// Standard-order position of every run (0-based).
    run_order: Vec<usize>,
}

impl Design {
    /// Create a new design, validating data dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the data dimensions don't match the parameters or
    /// a value is out of range.
    pub fn try_new(
        data: Array2<u32>,
        params: DesignParams,
        kind: DesignKind,
        construction: impl Into<String>,
    ) -> Result<Self> {
        if data.nrows() != params.runs {
            return Err(Error::DimensionMismatch {
                expected: format!("{} rows", params.runs),
                actual: format!("{} rows", data.nrows()),
            });
        }
        if data.ncols() != params.factors {
            return Err(Error::DimensionMismatch {
                expected: format!("{} columns", params.factors),
                actual: format!("{} columns", data.ncols()),
            });
        }
        if let Some(&v) = data.iter().find(|&&v| v >= params.levels) {
            return Err(Error::invalid_params(format!(
                "value {v} out of range for {} levels",
                params.levels
            )));
        }

        let factor_names = (0..params.factors).map(factor_name).collect();
        let level_labels = (1..=params.levels).map(|l| l.to_string()).collect();
        let run_order = (0..params.runs).collect();

        Ok(Self {
            data,
            params,
            kind,
            construction: construction.into(),
            factor_names,
            level_labels,
            run_order,
        })
    }

    /// Get the number of runs (rows).
    #[must_use]
    pub fn runs(&self) -> usize {
        self.params.runs
    }

    /// Get the number of factors (columns).
    #[must_use]
    pub fn factors(&self) -> usize {
        self.params.factors
    }

    /// Get the number of levels per factor.
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.params.levels
    }

    /// Get the strength.
    #[must_use]
    pub fn strength(&self) -> u32 {
        self.params.strength
    }

    /// Get the replication count.
    #[must_use]
    pub fn replications(&self) -> usize {
        self.params.replications
    }

    /// Get the parameters.
    #[must_use]
    pub fn params(&self) -> &DesignParams {
        &self.params
    }

    /// Full factorial or orthogonal array.
    #[must_use]
    pub fn kind(&self) -> DesignKind {
        self.kind
    }

    /// Name of the construction that produced the base design.
    #[must_use]
    pub fn construction(&self) -> &str {
        &self.construction
    }

    /// Factor (column) names.
    #[must_use]
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Level labels shared by every factor.
    #[must_use]
    pub fn level_labels(&self) -> &[String] {
        &self.level_labels
    }

    /// Standard-order index of every run.
    #[must_use]
    pub fn run_order(&self) -> &[usize] {
        &self.run_order
    }

    /// Get a reference to the underlying level matrix.
    #[must_use]
    pub fn data(&self) -> &Array2<u32> {
        &self.data
    }

    /// Get the level index at a specific position.
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.data[[row, col]]
    }

    /// Get a column of level indices.
    #[must_use]
    pub fn column(&self, idx: usize) -> ndarray::ArrayView1<'_, u32> {
        self.data.column(idx)
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = ndarray::ArrayView1<'_, u32>> {
        self.data.rows().into_iter()
    }

    /// Rename the factors.
    ///
    /// # Errors
    ///
    /// Returns an error if the count doesn't match or a name repeats.
    pub fn with_factor_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.factors() {
            return Err(Error::DimensionMismatch {
                expected: format!("{} factor names", self.factors()),
                actual: format!("{} factor names", names.len()),
            });
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(Error::DuplicateColumn(name.clone()));
            }
        }
        self.factor_names = names;
        Ok(self)
    }

    /// Relabel the levels (first label is level 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the count doesn't match the number of levels.
    pub fn with_level_labels<S: Into<String>>(
        mut self,
        labels: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != self.levels() as usize {
            return Err(Error::DimensionMismatch {
                expected: format!("{} level labels", self.levels()),
                actual: format!("{} level labels", labels.len()),
            });
        }
        self.level_labels = labels;
        Ok(self)
    }

    /// Select a subset of factors, returning a new design.
    ///
    /// # Errors
    ///
    /// Returns an error if any index is out of bounds or the list is empty.
    pub fn select_factors(&self, cols: &[usize]) -> Result<Self> {
        if cols.is_empty() {
            return Err(Error::invalid_params("select at least one factor"));
        }
        if let Some(&bad) = cols.iter().find(|&&c| c >= self.factors()) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: self.factors(),
            });
        }

        let data = self.data.select(Axis(1), cols);
        let mut params = self.params.clone();
        params.factors = cols.len();
        params.strength = params.strength.min(cols.len() as u32);

        Ok(Self {
            data,
            params,
            kind: self.kind,
            construction: self.construction.clone(),
            factor_names: cols.iter().map(|&c| self.factor_names[c].clone()).collect(),
            level_labels: self.level_labels.clone(),
            run_order: self.run_order.clone(),
        })
    }

    /// Repeat the design `times` times.
    ///
    /// # Errors
    ///
    /// Returns an error if `times` is 0.
    ///
    /// # Example
    ///
    /// ```
    /// use confound::{fac_design, ReplicationMode};
    ///
    /// let design = fac_design(2, 2).unwrap();
    /// let rep = design.replicate(3, ReplicationMode::EachRow).unwrap();
    /// assert_eq!(rep.runs(), 12);
    /// assert_eq!(rep.replications(), 3);
    /// assert_eq!(rep.row(0), rep.row(2));
    /// ```
    pub fn replicate(&self, times: usize, mode: ReplicationMode) -> Result<Self> {
        if times == 0 {
            return Err(Error::invalid_params("replications must be at least 1"));
        }

        let n = self.runs();
        let order: Vec<usize> = match mode {
            ReplicationMode::Whole => (0..times).flat_map(|_| 0..n).collect(),
            ReplicationMode::EachRow => (0..n).flat_map(|r| std::iter::repeat(r).take(times)).collect(),
        };

        let data = self.data.select(Axis(0), &order);
        let mut params = self.params.clone();
        params.runs = n * times;
        params.replications = self.params.replications * times;

        Ok(Self {
            data,
            params,
            kind: self.kind,
            construction: self.construction.clone(),
            factor_names: self.factor_names.clone(),
            level_labels: self.level_labels.clone(),
            run_order: order.iter().map(|&r| self.run_order[r]).collect(),
        })
    }

    /// Shuffle the run order, keeping track of standard-order positions.
    #[must_use]
    pub fn randomized<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..self.runs()).collect();
        order.shuffle(rng);

        let mut shuffled = self.clone();
        shuffled.data = self.data.select(Axis(0), &order);
        shuffled.run_order = order.iter().map(|&r| self.run_order[r]).collect();
        shuffled
    }

    /// Get a row of level indices as a vector.
    #[must_use]
    pub fn row(&self, idx: usize) -> Vec<u32> {
        self.data.row(idx).to_vec()
    }

    /// Verify that this design has its claimed strength.
    #[must_use]
    pub fn verify(&self) -> VerificationResult {
        verify_strength(self, self.strength())
    }

    /// Convert to a table with one factor column per design factor.
    ///
    /// # Example
    ///
    /// ```
    /// use confound::fac_design;
    ///
    /// let table = fac_design(3, 2).unwrap().to_table();
    /// assert_eq!(table.nrows(), 8);
    /// assert_eq!(table.names(), ["A", "B", "C"]);
    /// ```
    #[must_use]
    pub fn to_table(&self) -> Table {
        let columns = self
            .factor_names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let codes = self.data.column(j).to_vec();
                (
                    name.clone(),
                    Column::factor_unchecked(self.level_labels.clone(), codes),
                )
            });
        // Names are unique and lengths agree by construction.
        Table::from_trusted_columns(self.runs(), columns)
    }
}

impl fmt::Debug for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) with data {:?}",
            self.kind, self.params, self.construction, self.data
        )
    }
}

impl fmt::Display for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} via {}", self.kind, self.params, self.construction)?;
        writeln!(f, "  {}", self.factor_names.join(" "))?;
        for row in self.data.rows() {
            let cells: Vec<&str> = row
                .iter()
                .map(|&v| self.level_labels[v as usize].as_str())
                .collect();
            writeln!(f, "  {}", cells.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_l4() -> Design {
        let params = DesignParams::new(4, 3, 2, 2).unwrap();
        let data =
            Array2::from_shape_vec((4, 3), vec![0, 0, 0, 0, 1, 1, 1, 0, 1, 1, 1, 0]).unwrap();
        Design::try_new(data, params, DesignKind::OrthogonalArray, "test").unwrap()
    }

    #[test]
    fn test_params_new() {
        let params = DesignParams::new(8, 3, 2, 3).unwrap();
        assert_eq!(params.index(), 1);
        assert_eq!(params.replications, 1);
        assert_eq!(format!("{params}"), "D(8, 3, 2, 3)");
    }

    #[test]
    fn test_params_invalid() {
        assert!(DesignParams::new(9, 4, 1, 2).is_err());
        assert!(DesignParams::new(9, 2, 3, 3).is_err());
        assert!(DesignParams::new(10, 4, 3, 2).is_err());
        assert!(DesignParams::new(4, 0, 2, 0).is_err());
    }

    #[test]
    fn test_try_new_rejects_bad_shapes() {
        let params = DesignParams::new(4, 3, 2, 2).unwrap();
        let data = Array2::zeros((4, 2));
        assert!(matches!(
            Design::try_new(data, params.clone(), DesignKind::OrthogonalArray, "x"),
            Err(Error::DimensionMismatch { .. })
        ));

        let data = Array2::from_elem((4, 3), 2);
        assert!(Design::try_new(data, params, DesignKind::OrthogonalArray, "x").is_err());
    }

    #[test]
    fn test_default_names_and_labels() {
        let d = make_l4();
        assert_eq!(d.factor_names(), ["A", "B", "C"]);
        assert_eq!(d.level_labels(), ["1", "2"]);
    }

    #[test]
    fn test_rename() {
        let d = make_l4()
            .with_factor_names(["price", "ad", "shelf"])
            .unwrap()
            .with_level_labels(["low", "high"])
            .unwrap();
        assert_eq!(d.factor_names()[1], "ad");
        assert!(make_l4().with_factor_names(["x", "x", "y"]).is_err());
        assert!(make_l4().with_level_labels(["a"]).is_err());
        assert!(format!("{d}").contains("high"));
    }

    #[test]
    fn test_select_factors() {
        let d = make_l4();
        let sub = d.select_factors(&[0, 2]).unwrap();
        assert_eq!(sub.factors(), 2);
        assert_eq!(sub.factor_names(), ["A", "C"]);
        assert_eq!(sub.get(2, 1), 1);
        assert!(d.select_factors(&[5]).is_err());
    }

    #[test]
    fn test_replicate_whole() {
        let d = make_l4();
        let rep = d.replicate(2, ReplicationMode::Whole).unwrap();
        assert_eq!(rep.runs(), 8);
        assert_eq!(rep.params().base_runs(), 4);
        assert_eq!(rep.row(1), rep.row(5));
        assert_eq!(rep.run_order(), [0, 1, 2, 3, 0, 1, 2, 3]);
        assert!(rep.verify().is_valid);
        assert!(d.replicate(0, ReplicationMode::Whole).is_err());
    }

    #[test]
    fn test_randomized_is_permutation() {
        let d = make_l4().replicate(3, ReplicationMode::Whole).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = d.randomized(&mut rng);

        let mut original: Vec<Vec<u32>> = d.rows().map(|r| r.to_vec()).collect();
        let mut permuted: Vec<Vec<u32>> = shuffled.rows().map(|r| r.to_vec()).collect();
        original.sort();
        permuted.sort();
        assert_eq!(original, permuted);

        for (i, &std_idx) in shuffled.run_order().iter().enumerate() {
            assert_eq!(shuffled.row(i), d.row(std_idx));
        }
    }

    #[test]
    fn test_to_table() {
        let table = make_l4().to_table();
        assert_eq!(table.nrows(), 4);
        assert_eq!(table.ncols(), 3);
        match table.column("B").unwrap() {
            Column::Factor(f) => assert_eq!(f.codes(), [0, 1, 0, 1]),
            Column::Numeric(_) => panic!("expected a factor column"),
        }
    }
}
