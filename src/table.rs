//! Named, ordered columns of experiment data.
//!
//! A [`Table`] is an ordered mapping from column name to [`Column`]. Row
//! order is fixed at creation; columns are added, replaced, dropped and
//! selected by name, and every such operation returns a new table value.
//!
//! ```
//! use confound::table::{Column, Table};
//!
//! let table = Table::new()
//!     .with_column("A", Column::numeric(vec![-1.0, 1.0, -1.0, 1.0]))
//!     .unwrap()
//!     .with_column("B", Column::numeric(vec![-1.0, -1.0, 1.0, 1.0]))
//!     .unwrap();
//!
//! assert_eq!(table.names(), ["A", "B"]);
//! assert_eq!(table.term_values("A:B").unwrap(), vec![1.0, -1.0, -1.0, 1.0]);
//! ```

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::interaction::NAME_SEPARATOR;
use crate::utils::format_value;

/// Separator for on-the-fly product terms such as `A:B`.
pub const PRODUCT_SEPARATOR: char = ':';

/// A categorical column: level labels plus one level code per row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactorColumn {
    labels: Vec<String>,
    codes: Vec<u32>,
}

impl FactorColumn {
    /// Level labels, in declaration order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Level code of every row (index into `labels`).
    #[must_use]
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// Label of row `row`.
    #[must_use]
    pub fn label(&self, row: usize) -> &str {
        &self.labels[self.codes[row] as usize]
    }
}

/// One column of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Column {
    /// Raw categorical levels, as produced by a design.
    Factor(FactorColumn),
    /// Numeric values: recoded factors, interactions, responses.
    Numeric(Vec<f64>),
}

impl Column {
    /// Build a factor column.
    ///
    /// # Errors
    ///
    /// Returns an error if a code has no label.
    ///
    /// ```
    /// use confound::table::Column;
    ///
    /// assert!(Column::factor(vec!["lo".into(), "hi".into()], vec![0, 1]).is_ok());
    /// assert!(Column::factor(vec!["lo".into()], vec![0, 1]).is_err());
    /// ```
    pub fn factor(labels: Vec<String>, codes: Vec<u32>) -> Result<Self> {
        if let Some(&code) = codes.iter().find(|&&c| c as usize >= labels.len()) {
            return Err(Error::invalid_params(format!(
                "factor code {code} has no label ({} labels)",
                labels.len()
            )));
        }
        Ok(Self::factor_unchecked(labels, codes))
    }

    /// Build a factor column whose codes are known to index `labels`.
    pub(crate) fn factor_unchecked(labels: Vec<String>, codes: Vec<u32>) -> Self {
        debug_assert!(codes.iter().all(|&c| (c as usize) < labels.len()));
        Self::Factor(FactorColumn { labels, codes })
    }

    /// Build a numeric column.
    #[must_use]
    pub fn numeric(values: Vec<f64>) -> Self {
        Self::Numeric(values)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Factor(f) => f.codes.len(),
            Self::Numeric(v) => v.len(),
        }
    }

    /// True when the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric values, or `None` for a factor column.
    #[must_use]
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Self::Numeric(v) => Some(v),
            Self::Factor(_) => None,
        }
    }

    /// Display text of row `row`.
    #[must_use]
    pub fn cell(&self, row: usize) -> String {
        match self {
            Self::Factor(f) => f.label(row).to_string(),
            Self::Numeric(v) => format_value(v[row]),
        }
    }
}

/// An ordered collection of equally long named columns.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Table {
    nrows: usize,
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    /// An empty table; the first column added fixes the row count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, column)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate names or unequal column lengths.
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Column)>,
    ) -> Result<Self> {
        columns
            .into_iter()
            .try_fold(Self::new(), |table, (name, column)| {
                table.with_column(name, column)
            })
    }

    /// Build a table whose names are known unique and lengths equal `nrows`.
    pub(crate) fn from_trusted_columns(
        nrows: usize,
        columns: impl IntoIterator<Item = (String, Column)>,
    ) -> Self {
        let (names, columns): (Vec<_>, Vec<_>) = columns.into_iter().unzip();
        debug_assert!(columns.iter().all(|c| c.len() == nrows));
        Self {
            nrows,
            names,
            columns,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[must_use]
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether a column with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Iterate over `(name, column)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(&self.columns)
    }

    /// Look up a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`] if it does not exist.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.position(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Look up a numeric column by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or is a factor.
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        self.column(name)?
            .as_numeric()
            .ok_or_else(|| Error::NotNumeric(name.to_string()))
    }

    /// Values of a regressor term: a numeric column, or the elementwise
    /// product of columns joined by `:` when no column has that exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced column is missing or not numeric.
    pub fn term_values(&self, term: &str) -> Result<Vec<f64>> {
        if self.contains(term) || !term.contains(PRODUCT_SEPARATOR) {
            return Ok(self.numeric(term)?.to_vec());
        }

        let mut values = vec![1.0; self.nrows];
        for part in term.split(PRODUCT_SEPARATOR).map(str::trim) {
            for (acc, v) in values.iter_mut().zip(self.numeric(part)?) {
                *acc *= v;
            }
        }
        Ok(values)
    }

    /// Sorted base columns a term multiplies, so that `AxB`, `A:B` and
    /// `B:A` resolve to the same key.
    ///
    /// A column named `AxB` splits into `A` and `B` only when it holds
    /// their product; any other column stands for itself.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced column is missing or not numeric.
    ///
    /// ```
    /// use confound::interaction::{add_interactions, two_way};
    /// use confound::{fac_design, recode_all};
    ///
    /// let table = recode_all(&fac_design(2, 2).unwrap().to_table()).unwrap();
    /// let table = add_interactions(&table, &two_way(&["A", "B"])).unwrap();
    /// assert_eq!(table.term_factors("AxB").unwrap(), ["A", "B"]);
    /// assert_eq!(table.term_factors("B:A").unwrap(), ["A", "B"]);
    /// ```
    pub fn term_factors(&self, term: &str) -> Result<Vec<String>> {
        let parts: Vec<&str> = if self.contains(term) || !term.contains(PRODUCT_SEPARATOR) {
            vec![term]
        } else {
            term.split(PRODUCT_SEPARATOR).map(str::trim).collect()
        };
        let mut factors = Vec::new();
        for part in parts {
            factors.extend(self.column_factors(part)?);
        }
        factors.sort();
        Ok(factors)
    }

    fn column_factors(&self, name: &str) -> Result<Vec<String>> {
        let values = self.numeric(name)?;
        let pieces: Vec<&str> = name.split(NAME_SEPARATOR).collect();
        if pieces.len() < 2 || pieces.iter().any(|p| *p == name || self.numeric(p).is_err()) {
            return Ok(vec![name.to_string()]);
        }
        let mut product = vec![1.0; self.nrows];
        for piece in &pieces {
            for (acc, v) in product.iter_mut().zip(self.numeric(piece)?) {
                *acc *= v;
            }
        }
        if product.as_slice() == values {
            Ok(pieces.into_iter().map(str::to_string).collect())
        } else {
            Ok(vec![name.to_string()])
        }
    }

    /// Append a column.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the length differs.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        let name = name.into();
        if self.contains(&name) {
            return Err(Error::DuplicateColumn(name));
        }
        if self.columns.is_empty() && self.nrows == 0 {
            self.nrows = column.len();
        } else if column.len() != self.nrows {
            return Err(Error::LengthMismatch {
                column: name,
                expected: self.nrows,
                actual: column.len(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(self)
    }

    /// Replace an existing column in place (same position).
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or the length differs.
    pub fn replace_column(mut self, name: &str, column: Column) -> Result<Self> {
        let idx = self
            .position(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
        if column.len() != self.nrows {
            return Err(Error::LengthMismatch {
                column: name.to_string(),
                expected: self.nrows,
                actual: column.len(),
            });
        }
        self.columns[idx] = column;
        Ok(self)
    }

    /// Remove the named columns.
    ///
    /// # Errors
    ///
    /// Returns an error if any name is missing.
    pub fn drop_columns(mut self, names: &[&str]) -> Result<Self> {
        for &name in names {
            let idx = self
                .position(name)
                .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
            self.names.remove(idx);
            self.columns.remove(idx);
        }
        Ok(self)
    }

    /// Keep only the named columns, in the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if any name is missing or repeated.
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let mut out = Self {
            nrows: self.nrows,
            names: Vec::with_capacity(names.len()),
            columns: Vec::with_capacity(names.len()),
        };
        for &name in names {
            out = out.with_column(name, self.column(name)?.clone())?;
        }
        Ok(out)
    }

    /// The first `n` rows.
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.nrows);
        let columns = self.columns.iter().map(|c| match c {
            Column::Factor(f) => Column::Factor(FactorColumn {
                labels: f.labels.clone(),
                codes: f.codes[..n].to_vec(),
            }),
            Column::Numeric(v) => Column::Numeric(v[..n].to_vec()),
        });
        Self::from_trusted_columns(n, self.names.iter().cloned().zip(columns))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row_label_width = self.nrows.to_string().len();
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| (0..self.nrows).map(|r| c.cell(r)).collect())
            .collect();
        let widths: Vec<usize> = self
            .names
            .iter()
            .zip(&cells)
            .map(|(name, col)| col.iter().map(String::len).chain([name.len()]).max().unwrap_or(0))
            .collect();

        write!(f, "{:>row_label_width$}", "")?;
        for (name, &w) in self.names.iter().zip(&widths) {
            write!(f, " {name:>w$}")?;
        }
        writeln!(f)?;

        for r in 0..self.nrows {
            write!(f, "{:>row_label_width$}", r + 1)?;
            for (col, &w) in cells.iter().zip(&widths) {
                write!(f, " {:>w$}", col[r])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns([
            (
                "A",
                Column::factor(vec!["lo".into(), "hi".into()], vec![0, 1, 0, 1]).unwrap(),
            ),
            ("B", Column::numeric(vec![-1.0, -1.0, 1.0, 1.0])),
            ("C", Column::numeric(vec![1.0, -1.0, -1.0, 1.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_term_factors() {
        let table = sample()
            .with_column("BxC", Column::numeric(vec![-1.0, 1.0, -1.0, 1.0]))
            .unwrap()
            .with_column("CxB", Column::numeric(vec![1.0, 1.0, 1.0, 1.0]))
            .unwrap();
        assert_eq!(table.term_factors("BxC").unwrap(), ["B", "C"]);
        assert_eq!(table.term_factors("C:B").unwrap(), ["B", "C"]);
        assert_eq!(table.term_factors("B").unwrap(), ["B"]);
        // Named like a product but holding something else.
        assert_eq!(table.term_factors("CxB").unwrap(), ["CxB"]);
        assert_eq!(table.term_factors("BxC:B").unwrap(), ["B", "B", "C"]);
        assert_eq!(
            table.term_factors("B:Q"),
            Err(Error::UnknownColumn("Q".into()))
        );
    }

    #[test]
    fn test_factor_rejects_unlabelled_code() {
        assert!(matches!(
            Column::factor(vec!["lo".into(), "hi".into()], vec![0, 2, 1]),
            Err(Error::InvalidParams { .. })
        ));
        let column = Column::factor(vec!["lo".into(), "hi".into()], vec![1, 0]).unwrap();
        assert_eq!(column.cell(0), "hi");
        assert_eq!(column.len(), 2);
    }

    #[test]
    fn test_from_columns_validates() {
        let dup = Table::from_columns([
            ("A", Column::numeric(vec![1.0])),
            ("A", Column::numeric(vec![2.0])),
        ]);
        assert_eq!(dup, Err(Error::DuplicateColumn("A".into())));

        let short = Table::from_columns([
            ("A", Column::numeric(vec![1.0, 2.0])),
            ("B", Column::numeric(vec![2.0])),
        ]);
        assert!(matches!(short, Err(Error::LengthMismatch { .. })));
    }

    #[test]
    fn test_lookup() {
        let t = sample();
        assert_eq!(t.nrows(), 4);
        assert_eq!(t.ncols(), 3);
        assert_eq!(t.numeric("B").unwrap(), [-1.0, -1.0, 1.0, 1.0]);
        assert_eq!(t.numeric("A"), Err(Error::NotNumeric("A".into())));
        assert_eq!(t.numeric("Z"), Err(Error::UnknownColumn("Z".into())));
    }

    #[test]
    fn test_term_values_product() {
        let t = sample();
        assert_eq!(t.term_values("B:C").unwrap(), vec![-1.0, 1.0, -1.0, 1.0]);
        assert!(t.term_values("A:B").is_err());
        assert!(t.term_values("B:Z").is_err());
    }

    #[test]
    fn test_transformations_preserve_order() {
        let t = sample()
            .with_column("D", Column::numeric(vec![0.0; 4]))
            .unwrap()
            .drop_columns(&["B"])
            .unwrap();
        assert_eq!(t.names(), ["A", "C", "D"]);

        let t = t.replace_column("D", Column::numeric(vec![1.0; 4])).unwrap();
        assert_eq!(t.numeric("D").unwrap(), [1.0; 4]);
        assert!(t.clone().replace_column("D", Column::numeric(vec![1.0])).is_err());
        assert!(t.clone().drop_columns(&["nope"]).is_err());

        let sel = t.select(&["D", "A"]).unwrap();
        assert_eq!(sel.names(), ["D", "A"]);
        assert!(t.select(&["A", "A"]).is_err());
    }

    #[test]
    fn test_head_and_display() {
        let t = sample().head(2);
        assert_eq!(t.nrows(), 2);
        let text = t.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("A  B  C"));
        assert!(lines[1].starts_with("1 lo -1  1"));
    }
}
