//! Strength verification for designs.
//!
//! A design has strength t when every selection of t columns contains each
//! of the s^t level tuples the same number of times.

use std::collections::HashMap;

use crate::utils::combinations;

use super::Design;

/// Result of verifying a design.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// Whether the design passes verification.
    pub is_valid: bool,
    /// The claimed strength.
    pub claimed_strength: u32,
    /// The highest t (up to the claim) for which the design is balanced.
    pub actual_strength: u32,
    /// Details about any issues found.
    pub issues: Vec<VerificationIssue>,
}

/// A specific issue found during verification.
#[derive(Debug, Clone)]
pub enum VerificationIssue {
    /// A subarray is not balanced.
    ImbalancedSubarray {
        /// Columns of the subarray.
        columns: Vec<usize>,
        /// How often each tuple should appear.
        expected_count: usize,
        /// How often each tuple does appear.
        tuple_counts: HashMap<Vec<u32>, usize>,
    },
}

/// Verify that a design has the claimed strength.
///
/// For each t from 1 to `strength`, every combination of t columns is
/// checked for tuple balance; checking stops at the first failing t.
///
/// # Example
///
/// ```
/// use confound::{oa_design, verify_strength};
///
/// let l8 = oa_design(4, 2).unwrap();
/// assert!(verify_strength(&l8, 2).is_valid);
/// assert!(!verify_strength(&l8, 3).is_valid);
/// ```
#[must_use]
pub fn verify_strength(design: &Design, strength: u32) -> VerificationResult {
    let mut issues = Vec::new();
    let runs = design.runs();
    let factors = design.factors();
    let s = design.levels() as usize;
    let mut verified_strength = 0;

    for t in 1..=strength {
        if t as usize > factors {
            break;
        }

        let s_to_t = s.pow(t);
        let expected_count = runs / s_to_t;
        let mut balanced_at_t = runs % s_to_t == 0;

        for col_combo in combinations(factors, t as usize) {
            let mut tuple_counts: HashMap<Vec<u32>, usize> = HashMap::new();
            for row in design.rows() {
                let tuple: Vec<u32> = col_combo.iter().map(|&c| row[c]).collect();
                *tuple_counts.entry(tuple).or_insert(0) += 1;
            }

            let all_equal = tuple_counts.values().all(|&c| c == expected_count);
            if tuple_counts.len() != s_to_t || !all_equal {
                balanced_at_t = false;
                issues.push(VerificationIssue::ImbalancedSubarray {
                    columns: col_combo,
                    expected_count,
                    tuple_counts,
                });
            }
        }

        if !balanced_at_t {
            break;
        }
        verified_strength = t;
    }

    VerificationResult {
        is_valid: issues.is_empty() && verified_strength >= strength,
        claimed_strength: strength,
        actual_strength: verified_strength,
        issues,
    }
}

/// Compute the actual strength of a design, checking up to `max_check`.
#[must_use]
pub fn compute_strength(design: &Design, max_check: u32) -> u32 {
    let max_t = max_check.min(design.factors() as u32);
    verify_strength(design, max_t).actual_strength
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{DesignKind, DesignParams};
    use crate::{fac_design, oa_design};
    use ndarray::Array2;

    #[test]
    fn test_full_factorial_has_full_strength() {
        let design = fac_design(3, 2).unwrap();
        let result = verify_strength(&design, 3);
        assert!(result.is_valid);
        assert_eq!(compute_strength(&design, 10), 3);
    }

    #[test]
    fn test_l8_is_strength_two_only() {
        let design = oa_design(4, 2).unwrap();
        assert_eq!(compute_strength(&design, 4), 2);

        let result = verify_strength(&design, 3);
        assert!(!result.is_valid);
        assert_eq!(result.actual_strength, 2);
        // Columns A, B, C form a defining relation, so that triple is imbalanced.
        assert!(result.issues.iter().any(|issue| match issue {
            VerificationIssue::ImbalancedSubarray { columns, .. } => columns == &vec![0, 1, 2],
        }));
    }

    #[test]
    fn test_verify_imbalanced() {
        let params = DesignParams::new(4, 3, 2, 2).unwrap();
        let data =
            Array2::from_shape_vec((4, 3), vec![0, 0, 0, 0, 0, 0, 1, 0, 1, 1, 1, 0]).unwrap();
        let design = Design::try_new(data, params, DesignKind::OrthogonalArray, "bad").unwrap();

        let result = verify_strength(&design, 2);
        assert!(!result.is_valid);
        assert_eq!(result.actual_strength, 0);
    }
}
