//! Linear model estimation.
//!
//! Fits `Y ~ terms` by ordinary least squares and reports the usual
//! inference: standard errors, t statistics, p-values, R², the overall F
//! test, confidence intervals and a sequential ANOVA table.
//!
//! # Example
//!
//! ```
//! use confound::regression::lm;
//! use confound::table::Column;
//! use confound::{fac_design, recode_all};
//!
//! let table = recode_all(&fac_design(2, 2).unwrap().to_table()).unwrap();
//! let a = table.numeric("A").unwrap().to_vec();
//! let y = a.iter().map(|v| 1.0 + 0.5 * v).collect();
//! let table = table.with_column("Y", Column::numeric(y)).unwrap();
//!
//! let model = lm("Y ~ A + B", &table).unwrap();
//! assert!((model.estimate("A").unwrap() - 0.5).abs() < 1e-12);
//! ```

pub mod distributions;
mod formula;
mod ols;

pub use formula::Formula;
pub use ols::{fit, lm, AnovaEntry, Coefficient, ConfidenceInterval, OlsFit, INTERCEPT};
