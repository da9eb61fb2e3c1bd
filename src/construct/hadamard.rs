//! Sylvester-Hadamard construction for two-level orthogonal arrays.
//!
//! For n = 2^m (m ≥ 2) the Sylvester Hadamard matrix of order n gives
//! OA(n, n-1, 2, 2): drop the all-ones column and map +1 → level 0,
//! -1 → level 1.
//!
//! Entry (i, j) of the matrix is (-1)^popcount(i & j), so column j of the
//! array is the XOR of the row bits selected by j. Columns whose index is
//! the XOR of two others are their interaction: column 3 = column 1 ⊕
//! column 2, which is why the third factor of a 4-factor, 8-run array is
//! aliased with the interaction of the first two.
//!
//! ## Example
//!
//! ```
//! use confound::construct::{Constructor, HadamardSylvester};
//!
//! let h = HadamardSylvester::new(8).unwrap();
//! let l8 = h.construct(7).unwrap();
//!
//! assert_eq!(l8.runs(), 8);
//! assert_eq!(l8.factors(), 7);
//! assert_eq!(l8.levels(), 2);
//! ```

use ndarray::Array2;

use super::{Constructor, MAX_CELLS, MAX_RUNS};
use crate::design::{Design, DesignKind, DesignParams};
use crate::error::{Error, Result};

/// Sylvester-Hadamard construction, OA(n, k, 2, 2) with n = 2^m, k ≤ n-1.
#[derive(Debug, Clone)]
pub struct HadamardSylvester {
    /// Order of the Hadamard matrix (a power of 2, at least 4).
    n: usize,
}

impl HadamardSylvester {
    /// Create a new Sylvester-Hadamard constructor.
    ///
    /// # Errors
    ///
    /// Returns an error if `n` is not a power of 2 or is less than 4.
    ///
    /// ```
    /// use confound::construct::HadamardSylvester;
    ///
    /// assert!(HadamardSylvester::new(16).is_ok());
    /// assert!(HadamardSylvester::new(12).is_err());
    /// assert!(HadamardSylvester::new(2).is_err());
    /// ```
    pub fn new(n: usize) -> Result<Self> {
        if !n.is_power_of_two() {
            return Err(Error::invalid_params(format!(
                "HadamardSylvester requires n to be a power of 2, got {n}"
            )));
        }
        if n < 4 {
            return Err(Error::invalid_params(
                "HadamardSylvester requires n >= 4 for a valid array",
            ));
        }
        if n > MAX_RUNS {
            return Err(Error::invalid_params(format!(
                "HadamardSylvester supports at most {MAX_RUNS} runs, got {n}"
            )));
        }
        Ok(Self { n })
    }

    /// Smallest Sylvester array with room for `factors` columns and at
    /// least `min_runs` rows.
    ///
    /// # Errors
    ///
    /// Returns an error if that would need more than 2^20 runs, or a level
    /// matrix larger than 2^25 cells.
    ///
    /// ```
    /// use confound::construct::{Constructor, HadamardSylvester};
    ///
    /// assert_eq!(HadamardSylvester::for_factors(4, 0).unwrap().runs(4), 8);
    /// assert_eq!(HadamardSylvester::for_factors(4, 16).unwrap().runs(4), 16);
    /// ```
    pub fn for_factors(factors: usize, min_runs: usize) -> Result<Self> {
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }
        let no_array = || Error::NoOrthogonalArray {
            factors,
            levels: 2,
            min_runs,
        };
        let mut n = 4;
        while n - 1 < factors || n < min_runs {
            n *= 2;
            if n > MAX_RUNS {
                return Err(no_array());
            }
        }
        let sylvester = Self::new(n)?;
        if factors > sylvester.max_factors() {
            return Err(no_array());
        }
        Ok(sylvester)
    }

    /// Entry (i, j) of the Sylvester-Hadamard matrix of order n.
    fn sign(i: usize, j: usize) -> i8 {
        if (i & j).count_ones() % 2 == 0 {
            1
        } else {
            -1
        }
    }
}

impl Constructor for HadamardSylvester {
    fn name(&self) -> &'static str {
        "HadamardSylvester"
    }

    fn family(&self) -> &'static str {
        "OA(2^m, 2^m-1, 2, 2), m ≥ 2"
    }

    fn kind(&self) -> DesignKind {
        DesignKind::OrthogonalArray
    }

    fn levels(&self) -> u32 {
        2
    }

    fn runs(&self, _factors: usize) -> usize {
        self.n
    }

    fn max_factors(&self) -> usize {
        (self.n - 1).min(MAX_CELLS / self.n)
    }

    fn construct(&self, factors: usize) -> Result<Design> {
        let max = self.max_factors();
        if factors > max {
            return Err(Error::TooManyFactors {
                factors,
                max,
                algorithm: "HadamardSylvester",
            });
        }
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }

        let n = self.n;
        let mut data = Array2::zeros((n, factors));
        for i in 0..n {
            for j in 0..factors {
                // Column 0 of H is all ones and carries no factor.
                data[[i, j]] = u32::from(Self::sign(i, j + 1) != 1);
            }
        }

        let strength = 2.min(factors as u32);
        let params = DesignParams::new(n, factors, 2, strength)?;
        Design::try_new(data, params, DesignKind::OrthogonalArray, self.name())
    }
}
