//! Orthogonality and balance diagnostics.
//!
//! The reporter never modifies the table. It computes the Pearson
//! correlation between every pair of numeric columns and a frequency table
//! of every column's distinct values. A constant column has no variance, so
//! every correlation involving it (its diagonal entry included) is `NaN`.
//!
//! ```
//! use confound::diagnostics::correlation_matrix;
//! use confound::{fac_design, recode_all};
//!
//! let table = recode_all(&fac_design(4, 2).unwrap().to_table()).unwrap();
//! let corr = correlation_matrix(&table).unwrap();
//! assert_eq!(corr.get("A", "B").unwrap(), 0.0);
//! ```

use ndarray::Array2;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::table::{Column, Table};
use crate::utils::format_value;

/// Pairwise Pearson correlations between named columns.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrelationMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl CorrelationMatrix {
    /// Column names, in table order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The raw matrix.
    #[must_use]
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Correlation between two named columns.
    ///
    /// # Errors
    ///
    /// Returns an error if either name is unknown.
    pub fn get(&self, a: &str, b: &str) -> Result<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Ok(self.values[[i, j]])
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Distinct pairs whose absolute correlation is at least `threshold`.
    ///
    /// Pairs involving a constant column are skipped; see
    /// [`degenerate_columns`](Self::degenerate_columns).
    #[must_use]
    pub fn confounded_pairs(&self, threshold: f64) -> Vec<ConfoundedPair> {
        let k = self.names.len();
        let mut pairs = Vec::new();
        for i in 0..k {
            for j in (i + 1)..k {
                let r = self.values[[i, j]];
                if r.abs() >= threshold {
                    pairs.push(ConfoundedPair {
                        first: self.names[i].clone(),
                        second: self.names[j].clone(),
                        correlation: r,
                    });
                }
            }
        }
        pairs
    }

    /// Columns with zero variance (undefined correlation).
    #[must_use]
    pub fn degenerate_columns(&self) -> Vec<&str> {
        self.names
            .iter()
            .enumerate()
            .filter(|&(i, _)| self.values[[i, i]].is_nan())
            .map(|(_, n)| n.as_str())
            .collect()
    }

    /// True when every pair of distinct, non-constant columns is uncorrelated.
    #[must_use]
    pub fn is_orthogonal(&self, tolerance: f64) -> bool {
        self.confounded_pairs(tolerance).is_empty()
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self.names.iter().map(String::len).max().unwrap_or(0);
        let cell_width = self.names.iter().map(String::len).max().unwrap_or(0).max(6);

        write!(f, "{:label_width$}", "")?;
        for name in &self.names {
            write!(f, " {name:>cell_width$}")?;
        }
        writeln!(f)?;
        for (i, name) in self.names.iter().enumerate() {
            write!(f, "{name:label_width$}")?;
            for j in 0..self.names.len() {
                let v = self.values[[i, j]];
                let cell = if v.is_nan() {
                    "NA".to_string()
                } else {
                    // Avoid printing "-0.00" for exact orthogonality.
                    format!("{:.2}", if v.abs() < 5e-3 { 0.0 } else { v })
                };
                write!(f, " {cell:>cell_width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Two columns that cannot be told apart statistically.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfoundedPair {
    /// Earlier column in table order.
    pub first: String,
    /// Later column in table order.
    pub second: String,
    /// Their correlation.
    pub correlation: f64,
}

impl ConfoundedPair {
    /// Whether this pair joins `a` and `b` (in either order).
    #[must_use]
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

impl fmt::Display for ConfoundedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {} (r = {:.2})", self.first, self.second, self.correlation)
    }
}

/// Compute the Pearson correlation matrix of all columns.
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] if any column is still a raw factor.
pub fn correlation_matrix(table: &Table) -> Result<CorrelationMatrix> {
    let n = table.nrows();
    let k = table.ncols();

    // Centre every column once.
    let mut centered = Array2::zeros((n, k));
    for (j, (name, column)) in table.iter().enumerate() {
        let values = column
            .as_numeric()
            .ok_or_else(|| Error::NotNumeric(name.to_string()))?;
        let mean = values.iter().sum::<f64>() / n as f64;
        for (r, &v) in values.iter().enumerate() {
            centered[[r, j]] = v - mean;
        }
    }

    let sum_squares: Vec<f64> = (0..k)
        .map(|j| centered.column(j).dot(&centered.column(j)))
        .collect();

    let mut values = Array2::zeros((k, k));
    for i in 0..k {
        for j in 0..k {
            values[[i, j]] = if sum_squares[i] > 0.0 && sum_squares[j] > 0.0 {
                let r = centered.column(i).dot(&centered.column(j))
                    / (sum_squares[i] * sum_squares[j]).sqrt();
                r.clamp(-1.0, 1.0)
            } else {
                f64::NAN
            };
        }
    }

    Ok(CorrelationMatrix {
        names: table.names().to_vec(),
        values,
    })
}

/// Counts of each distinct value of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrequencyTable {
    /// Column name.
    pub column: String,
    /// `(value, count)` pairs: factor labels in declaration order, numeric
    /// values in ascending order.
    pub entries: Vec<(String, usize)>,
}

impl FrequencyTable {
    /// Count for a displayed value (`"-1"`, `"1"`, a factor label, ...).
    #[must_use]
    pub fn count(&self, value: &str) -> usize {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map_or(0, |(_, c)| *c)
    }

    /// True when every distinct value occurs equally often.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].1 == w[1].1)
    }
}

impl fmt::Display for FrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = self
            .entries
            .iter()
            .map(|(v, c)| v.len().max(c.to_string().len()))
            .collect();
        writeln!(f, "{}", self.column)?;
        let values: Vec<String> = self
            .entries
            .iter()
            .zip(&widths)
            .map(|((v, _), &w)| format!("{v:>w$}"))
            .collect();
        let counts: Vec<String> = self
            .entries
            .iter()
            .zip(&widths)
            .map(|((_, c), &w)| format!("{c:>w$}"))
            .collect();
        writeln!(f, "{}", values.join(" "))?;
        writeln!(f, "{}", counts.join(" "))
    }
}

/// Frequency table of one column.
#[must_use]
pub fn frequency_table(name: &str, column: &Column) -> FrequencyTable {
    let entries = match column {
        Column::Factor(factor) => factor
            .labels()
            .iter()
            .enumerate()
            .map(|(code, label)| {
                let count = factor.codes().iter().filter(|&&c| c as usize == code).count();
                (label.clone(), count)
            })
            .collect(),
        Column::Numeric(values) => {
            let mut sorted: Vec<f64> = values.iter().map(|v| v + 0.0).collect();
            sorted.sort_by(f64::total_cmp);
            let mut entries: Vec<(String, usize)> = Vec::new();
            let mut last: Option<f64> = None;
            for v in sorted {
                match (last, entries.last_mut()) {
                    (Some(prev), Some(entry)) if prev.total_cmp(&v).is_eq() => entry.1 += 1,
                    _ => entries.push((format_value(v), 1)),
                }
                last = Some(v);
            }
            entries
        }
    };
    FrequencyTable {
        column: name.to_string(),
        entries,
    }
}

/// Frequency tables of every column, in table order.
#[must_use]
pub fn frequency_tables(table: &Table) -> Vec<FrequencyTable> {
    table
        .iter()
        .map(|(name, column)| frequency_table(name, column))
        .collect()
}

/// Correlations plus frequencies for one table.
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    /// Pairwise correlations.
    pub correlations: CorrelationMatrix,
    /// One frequency table per column.
    pub frequencies: Vec<FrequencyTable>,
}

impl DiagnosticReport {
    /// True when every column is balanced.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.frequencies.iter().all(FrequencyTable::is_balanced)
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Correlation matrix")?;
        writeln!(f, "{}", self.correlations)?;
        writeln!(f, "Frequency tables")?;
        for table in &self.frequencies {
            writeln!(f, "{table}")?;
        }
        Ok(())
    }
}

/// Run both diagnostics on a numeric table.
///
/// # Errors
///
/// Returns an error if any column is a raw factor.
pub fn diagnose(table: &Table) -> Result<DiagnosticReport> {
    Ok(DiagnosticReport {
        correlations: correlation_matrix(table)?,
        frequencies: frequency_tables(table),
    })
}
