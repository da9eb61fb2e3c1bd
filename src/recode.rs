//! Recoding two-level factors to -1/+1.
//!
//! The first declared label of a factor column (or the smaller value of a
//! numeric column) becomes -1, the other +1. A column that is already coded
//! -1/+1 maps onto itself, so recoding is idempotent.
//!
//! ```
//! use confound::{fac_design, recode_all};
//!
//! let table = recode_all(&fac_design(2, 2).unwrap().to_table()).unwrap();
//! assert_eq!(table.numeric("A").unwrap(), [-1.0, 1.0, -1.0, 1.0]);
//! assert_eq!(recode_all(&table).unwrap(), table);
//! ```

use tracing::debug;

use crate::error::{Error, Result};
use crate::table::{Column, Table};

/// Recode the named columns to -1/+1.
///
/// # Errors
///
/// Returns an error if a column is missing or does not have exactly two
/// distinct levels.
pub fn recode(table: &Table, columns: &[&str]) -> Result<Table> {
    let mut out = table.clone();
    for &name in columns {
        let recoded = recode_column(name, table.column(name)?)?;
        out = out.replace_column(name, recoded)?;
    }
    debug!(columns = columns.len(), "recoded factor columns to -1/+1");
    Ok(out)
}

/// Recode every factor column of the table; numeric columns are untouched.
///
/// # Errors
///
/// Returns an error if a factor column does not have exactly two levels.
pub fn recode_all(table: &Table) -> Result<Table> {
    let factors: Vec<&str> = table
        .iter()
        .filter(|(_, c)| matches!(c, Column::Factor(_)))
        .map(|(name, _)| name)
        .collect();
    recode(table, &factors)
}

fn recode_column(name: &str, column: &Column) -> Result<Column> {
    match column {
        Column::Factor(f) => {
            if f.labels().len() != 2 {
                return Err(Error::NotTwoLevel {
                    column: name.to_string(),
                    distinct: f.labels().len(),
                });
            }
            let values = f
                .codes()
                .iter()
                .map(|&c| if c == 0 { -1.0 } else { 1.0 })
                .collect();
            Ok(Column::numeric(values))
        }
        Column::Numeric(values) => {
            let mut distinct: Vec<f64> = Vec::with_capacity(2);
            for &v in values {
                if !distinct.contains(&v) {
                    distinct.push(v);
                }
            }
            if distinct.len() != 2 || distinct.iter().any(|v| !v.is_finite()) {
                return Err(Error::NotTwoLevel {
                    column: name.to_string(),
                    distinct: distinct.len(),
                });
            }
            let low = distinct[0].min(distinct[1]);
            let values = values
                .iter()
                .map(|&v| if v == low { -1.0 } else { 1.0 })
                .collect();
            Ok(Column::numeric(values))
        }
    }
}
