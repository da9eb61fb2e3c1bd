//! Full factorial enumeration.
//!
//! Lists every combination of s levels over k factors in standard order:
//! the first factor changes fastest, the last slowest.

use ndarray::Array2;

use super::{Constructor, MAX_RUNS};
use crate::design::{Design, DesignKind, DesignParams};
use crate::error::{Error, Result};

/// Full factorial construction: s^k runs, strength k.
///
/// # Example
///
/// ```
/// use confound::construct::{Constructor, FullFactorial};
///
/// let design = FullFactorial::new(3).unwrap().construct(2).unwrap();
/// assert_eq!(design.runs(), 9);
/// assert_eq!(design.row(1), vec![1, 0]);
/// assert_eq!(design.strength(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct FullFactorial {
    levels: u32,
}

impl FullFactorial {
    /// Create a full factorial constructor for `levels` levels per factor.
    ///
    /// # Errors
    ///
    /// Returns an error if `levels < 2`.
    pub fn new(levels: u32) -> Result<Self> {
        if levels < 2 {
            return Err(Error::invalid_params("levels must be at least 2"));
        }
        Ok(Self { levels })
    }

    fn checked_runs(&self, factors: usize) -> Option<usize> {
        let exp = u32::try_from(factors).ok()?;
        (self.levels as usize)
            .checked_pow(exp)
            .filter(|&n| n <= MAX_RUNS)
    }
}

impl Constructor for FullFactorial {
    fn name(&self) -> &'static str {
        "FullFactorial"
    }

    fn family(&self) -> &'static str {
        "D(s^k, k, s, k)"
    }

    fn kind(&self) -> DesignKind {
        DesignKind::FullFactorial
    }

    fn levels(&self) -> u32 {
        self.levels
    }

    fn runs(&self, factors: usize) -> usize {
        self.checked_runs(factors).unwrap_or(usize::MAX)
    }

    fn max_factors(&self) -> usize {
        let mut k = 0;
        while self.checked_runs(k + 1).is_some() {
            k += 1;
        }
        k
    }

    fn construct(&self, factors: usize) -> Result<Design> {
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }
        let runs = self.checked_runs(factors).ok_or(Error::TooManyFactors {
            factors,
            max: self.max_factors(),
            algorithm: "FullFactorial",
        })?;

        let s = self.levels;
        let mut data = Array2::zeros((runs, factors));
        for row in 0..runs {
            let mut rest = row;
            for col in 0..factors {
                // Mixed-radix digits, least significant first.
                data[[row, col]] = (rest % s as usize) as u32;
                rest /= s as usize;
            }
        }

        let params = DesignParams::new(runs, factors, s, factors as u32)?;
        Design::try_new(data, params, DesignKind::FullFactorial, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::verify_strength;

    #[test]
    fn test_two_level_four_factors() {
        let design = FullFactorial::new(2).unwrap().construct(4).unwrap();
        assert_eq!(design.runs(), 16);
        assert_eq!(design.factors(), 4);
        assert_eq!(design.row(0), vec![0, 0, 0, 0]);
        assert_eq!(design.row(1), vec![1, 0, 0, 0]);
        assert_eq!(design.row(15), vec![1, 1, 1, 1]);
        assert!(verify_strength(&design, 4).is_valid);
    }

    #[test]
    fn test_rows_are_distinct() {
        let design = FullFactorial::new(3).unwrap().construct(3).unwrap();
        let mut rows: Vec<Vec<u32>> = design.rows().map(|r| r.to_vec()).collect();
        rows.sort();
        rows.dedup();
        assert_eq!(rows.len(), 27);
    }

    #[test]
    fn test_invalid() {
        assert!(FullFactorial::new(1).is_err());
        let ff = FullFactorial::new(2).unwrap();
        assert!(ff.construct(0).is_err());
        assert_eq!(ff.max_factors(), 20);
        assert!(matches!(
            ff.construct(21),
            Err(Error::TooManyFactors { max: 20, .. })
        ));
    }
}
