//! Balance statistics for designs.

use std::collections::BTreeMap;

use super::Design;

/// A report on the balance of a design.
#[derive(Debug, Clone)]
pub struct BalanceReport {
    /// Whether each factor is perfectly balanced (each level appears equally).
    pub factor_balance: Vec<bool>,
    /// The counts of each level index for each factor.
    pub level_counts: Vec<BTreeMap<u32, usize>>,
    /// Expected count for each level if balanced.
    pub expected_count: usize,
}

impl BalanceReport {
    /// True when every factor is balanced.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.factor_balance.iter().all(|&b| b)
    }
}

impl Design {
    /// Perform a balance check on all factors.
    ///
    /// Checks that each level appears exactly N/s times in each column.
    #[must_use]
    pub fn balance_report(&self) -> BalanceReport {
        let n = self.runs();
        let s = self.levels();
        let expected_count = n / s as usize;

        let mut factor_balance = Vec::with_capacity(self.factors());
        let mut level_counts = Vec::with_capacity(self.factors());

        for col in 0..self.factors() {
            let mut counts = BTreeMap::new();
            for &v in self.column(col) {
                *counts.entry(v).or_insert(0) += 1;
            }

            let balanced =
                counts.len() == s as usize && counts.values().all(|&c| c == expected_count);
            factor_balance.push(balanced);
            level_counts.push(counts);
        }

        BalanceReport {
            factor_balance,
            level_counts,
            expected_count,
        }
    }
}
