//! Bose construction for prime-level orthogonal arrays.
//!
//! Produces OA(q², k, q, 2) for prime q and k ≤ q + 1. Row (i, j) with
//! i, j ∈ Z_q carries j in column 0 and (i + c·j) mod q in column c ≥ 1;
//! column q (c ≡ 0) is i itself.
//!
//! ```
//! use confound::construct::{Bose, Constructor};
//!
//! let l9 = Bose::new(3).unwrap().construct(4).unwrap();
//! assert_eq!(l9.runs(), 9);
//! assert_eq!(l9.levels(), 3);
//! ```

use ndarray::Array2;

use super::{Constructor, MAX_CELLS, MAX_RUNS};
use crate::design::{Design, DesignKind, DesignParams};
use crate::error::{Error, Result};
use crate::utils::is_prime;

/// Bose construction for strength-2 arrays over a prime number of levels.
#[derive(Debug, Clone)]
pub struct Bose {
    q: u32,
}

impl Bose {
    /// Create a Bose constructor for `q` levels.
    ///
    /// # Errors
    ///
    /// Returns an error if `q` is not prime, or if q² runs would exceed
    /// the run limit.
    pub fn new(q: u32) -> Result<Self> {
        if !is_prime(q) {
            return Err(Error::LevelsNotPrime {
                levels: q,
                algorithm: "Bose",
            });
        }
        let side = q as usize;
        match side.checked_mul(side) {
            Some(runs) if runs <= MAX_RUNS => Ok(Self { q }),
            _ => Err(Error::NoOrthogonalArray {
                factors: 0,
                levels: q,
                min_runs: 0,
            }),
        }
    }
}

impl Constructor for Bose {
    fn name(&self) -> &'static str {
        "Bose"
    }

    fn family(&self) -> &'static str {
        "OA(q², k, q, 2), k ≤ q+1"
    }

    fn kind(&self) -> DesignKind {
        DesignKind::OrthogonalArray
    }

    fn levels(&self) -> u32 {
        self.q
    }

    fn runs(&self, _factors: usize) -> usize {
        self.q as usize * self.q as usize
    }

    fn max_factors(&self) -> usize {
        (self.q as usize + 1).min(MAX_CELLS / self.runs(0))
    }

    fn construct(&self, factors: usize) -> Result<Design> {
        let max = self.max_factors();
        if factors > max {
            return Err(Error::TooManyFactors {
                factors,
                max,
                algorithm: "Bose",
            });
        }
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }

        let q = self.q;
        let runs = self.runs(factors);
        let mut data = Array2::zeros((runs, factors));
        for i in 0..q {
            for j in 0..q {
                let row = i as usize * q as usize + j as usize;
                data[[row, 0]] = j;
                for c in 1..factors {
                    let c_val = c as u32 % q;
                    data[[row, c]] = (i + c_val * j) % q;
                }
            }
        }

        let strength = 2.min(factors as u32);
        let params = DesignParams::new(runs, factors, q, strength)?;
        Design::try_new(data, params, DesignKind::OrthogonalArray, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::verify_strength;

    #[test]
    fn test_bose_primes_verify() {
        for q in [2, 3, 5, 7] {
            let bose = Bose::new(q).unwrap();
            let oa = bose.construct(bose.max_factors()).unwrap();
            assert_eq!(oa.runs(), (q * q) as usize);
            assert!(verify_strength(&oa, 2).is_valid, "q = {q}");
        }
    }

    #[test]
    fn test_bose_rejects_composite() {
        assert!(matches!(
            Bose::new(4),
            Err(Error::LevelsNotPrime { levels: 4, .. })
        ));
    }

    #[test]
    fn test_bose_too_many_factors() {
        let bose = Bose::new(3).unwrap();
        assert!(bose.construct(5).is_err());
    }

    #[test]
    fn test_bose_rejects_oversized_levels() {
        assert!(matches!(
            Bose::new(65537),
            Err(Error::NoOrthogonalArray { levels: 65537, .. })
        ));
        assert!(matches!(
            Bose::new(4_294_967_291),
            Err(Error::NoOrthogonalArray { .. })
        ));

        let largest = Bose::new(1021).unwrap();
        assert_eq!(largest.runs(2), 1021 * 1021);
        assert!(largest.max_factors() < 1022);
    }
}
