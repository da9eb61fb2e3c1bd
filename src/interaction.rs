//! Interaction columns: elementwise products of recoded factors.
//!
//! ```
//! use confound::interaction::{add_interactions, two_way};
//! use confound::{fac_design, recode_all};
//!
//! let table = recode_all(&fac_design(3, 2).unwrap().to_table()).unwrap();
//! let table = add_interactions(&table, &two_way(&["A", "B", "C"])).unwrap();
//! assert_eq!(table.names(), ["A", "B", "C", "AxB", "AxC", "BxC"]);
//! ```

use tracing::debug;

use crate::error::{Error, Result};
use crate::table::{Column, Table};
use crate::utils::combinations;

/// Separator used in default interaction names (`AxB`).
pub const NAME_SEPARATOR: &str = "x";

/// A requested interaction column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    /// Output column name.
    pub name: String,
    /// Columns whose product forms the interaction.
    pub factors: Vec<String>,
}

impl Interaction {
    /// An interaction with a caller-chosen output name.
    pub fn new<S: Into<String>>(name: impl Into<String>, factors: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            factors: factors.into_iter().map(Into::into).collect(),
        }
    }

    /// An interaction named by joining its factors with `x`.
    ///
    /// ```
    /// use confound::interaction::Interaction;
    ///
    /// assert_eq!(Interaction::of(&["A", "B", "C"]).name, "AxBxC");
    /// ```
    #[must_use]
    pub fn of(factors: &[&str]) -> Self {
        Self::new(factors.join(NAME_SEPARATOR), factors.iter().copied())
    }
}

/// All pairwise interactions of `factors`, in lexicographic order.
#[must_use]
pub fn two_way(factors: &[&str]) -> Vec<Interaction> {
    up_to_order(factors, 2)
}

/// All interactions of order 2 through `max_order`.
///
/// ```
/// use confound::interaction::up_to_order;
///
/// // 6 two-way + 4 three-way
/// assert_eq!(up_to_order(&["A", "B", "C", "D"], 3).len(), 10);
/// ```
#[must_use]
pub fn up_to_order(factors: &[&str], max_order: usize) -> Vec<Interaction> {
    (2..=max_order.min(factors.len()))
        .flat_map(|k| combinations(factors.len(), k))
        .map(|idx| {
            let names: Vec<&str> = idx.iter().map(|&i| factors[i]).collect();
            Interaction::of(&names)
        })
        .collect()
}

/// Append one product column per interaction.
///
/// Existing columns are never recomputed or overwritten.
///
/// # Errors
///
/// Returns an error if an interaction has fewer than two factors, a factor
/// is missing or not numeric, or the output name is taken.
pub fn add_interactions(table: &Table, interactions: &[Interaction]) -> Result<Table> {
    let mut out = table.clone();
    for interaction in interactions {
        if interaction.factors.len() < 2 {
            return Err(Error::invalid_params(format!(
                "interaction '{}' needs at least two factors",
                interaction.name
            )));
        }
        if out.contains(&interaction.name) {
            return Err(Error::DuplicateColumn(interaction.name.clone()));
        }

        let mut values = vec![1.0; out.nrows()];
        for factor in &interaction.factors {
            for (acc, v) in values.iter_mut().zip(out.numeric(factor)?) {
                *acc *= v;
            }
        }
        out = out.with_column(interaction.name.clone(), Column::numeric(values))?;
    }
    debug!(added = interactions.len(), "added interaction columns");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fac_design, recode_all};

    fn recoded(factors: usize) -> Table {
        recode_all(&fac_design(factors, 2).unwrap().to_table()).unwrap()
    }

    #[test]
    fn test_products_match_constituents() {
        let base = recoded(4);
        let table = add_interactions(&base, &up_to_order(&["A", "B", "C", "D"], 3)).unwrap();
        assert_eq!(table.ncols(), 4 + 6 + 4);

        for interaction in up_to_order(&["A", "B", "C", "D"], 3) {
            let column = table.numeric(&interaction.name).unwrap();
            for (row, &v) in column.iter().enumerate() {
                let expected: f64 = interaction
                    .factors
                    .iter()
                    .map(|f| base.numeric(f).unwrap()[row])
                    .product();
                assert_eq!(v, expected);
                assert!(v == 1.0 || v == -1.0);
            }
        }
    }

    #[test]
    fn test_custom_names() {
        let table = add_interactions(
            &recoded(2),
            &[Interaction::new("price_by_ad", ["A", "B"])],
        )
        .unwrap();
        assert_eq!(table.numeric("price_by_ad").unwrap(), [1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_errors() {
        let base = recoded(2);
        assert!(matches!(
            add_interactions(&base, &[Interaction::of(&["A"])]),
            Err(Error::InvalidParams { .. })
        ));
        assert_eq!(
            add_interactions(&base, &[Interaction::new("A", ["A", "B"])]),
            Err(Error::DuplicateColumn("A".into()))
        );
        assert_eq!(
            add_interactions(&base, &[Interaction::of(&["A", "Q"])]),
            Err(Error::UnknownColumn("Q".into()))
        );

        let raw = fac_design(2, 2).unwrap().to_table();
        assert_eq!(
            add_interactions(&raw, &two_way(&["A", "B"])),
            Err(Error::NotNumeric("A".into()))
        );
    }
}
