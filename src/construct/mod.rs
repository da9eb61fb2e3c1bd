//! Design construction algorithms.
//!
//! | Construction | Runs | Requirements |
//! |-------------|------|--------------|
//! | [`FullFactorial`] | s^k | any s ≥ 2 |
//! | [`HadamardSylvester`] | 2^m | 2 levels, k ≤ 2^m - 1 |
//! | [`Bose`] | q² | prime q, k ≤ q + 1 |
//!
//! ## Usage
//!
//! All constructors implement the [`Constructor`] trait:
//!
//! ```
//! use confound::construct::{Constructor, FullFactorial};
//!
//! let design = FullFactorial::new(2).unwrap().construct(4).unwrap();
//! assert_eq!(design.runs(), 16);
//! ```
//!
//! The orthogonal-array constructions take the first k columns of the
//! saturated array, so the defining relations between those columns are
//! fixed: in the 8-run Sylvester array the third column is the (negated)
//! product of the first two.

mod bose;
mod full_factorial;
mod hadamard;

pub use bose::Bose;
pub use full_factorial::FullFactorial;
pub use hadamard::HadamardSylvester;

use crate::design::{Design, DesignKind};
use crate::error::Result;

/// Largest number of runs any construction will produce.
pub(crate) const MAX_RUNS: usize = 1 << 20;

/// Largest runs × factors level matrix any construction will allocate.
pub(crate) const MAX_CELLS: usize = 1 << 25;

/// Trait for design construction algorithms.
pub trait Constructor: Send + Sync {
    /// Get the name of this construction method.
    fn name(&self) -> &'static str;

    /// Get a description of the family of designs this constructor produces.
    fn family(&self) -> &'static str;

    /// Full factorial or orthogonal array.
    fn kind(&self) -> DesignKind;

    /// Get the number of levels for designs produced by this constructor.
    fn levels(&self) -> u32;

    /// Get the number of runs for a design with `factors` columns.
    fn runs(&self, factors: usize) -> usize;

    /// Get the maximum number of factors this constructor can produce.
    fn max_factors(&self) -> usize;

    /// Construct a design with the specified number of factors.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - factors is 0 or exceeds `max_factors()`
    /// - construction fails for any other reason
    fn construct(&self, factors: usize) -> Result<Design>;
}
