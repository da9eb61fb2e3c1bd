//! Ordinary least squares by QR decomposition.
//!
//! The regressor matrix is factored with modified Gram-Schmidt. A column
//! whose remainder after projection onto the earlier columns vanishes is
//! aliased with them, and the fit stops with [`Error::RankDeficient`]
//! naming it.

use std::fmt;

use ndarray::{Array1, Array2};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::distributions::{
    f_distribution_p_value, significance_code, t_quantile, t_two_sided_p_value,
};
use super::formula::Formula;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::utils::format_value;

/// Name reported for the intercept coefficient.
pub const INTERCEPT: &str = "(Intercept)";

/// Relative tolerance below which a column counts as aliased.
const RANK_TOLERANCE: f64 = 1e-10;

/// One estimated coefficient.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coefficient {
    /// Term name (`(Intercept)` for the constant).
    pub term: String,
    /// Point estimate.
    pub estimate: f64,
    /// Standard error, `NaN` without residual degrees of freedom.
    pub std_error: f64,
    /// t statistic, `None` when the standard error is zero or undefined.
    pub t_value: Option<f64>,
    /// Two-sided p-value of the t statistic.
    pub p_value: Option<f64>,
}

impl Coefficient {
    /// R-style significance stars.
    #[must_use]
    pub fn significance(&self) -> &'static str {
        self.p_value.map_or("", significance_code)
    }
}

/// A confidence interval for one coefficient.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfidenceInterval {
    /// Term name.
    pub term: String,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// One row of a sequential (type I) ANOVA table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaEntry {
    /// Term name, or `Residuals`.
    pub term: String,
    /// Degrees of freedom.
    pub degrees_of_freedom: usize,
    /// Sum of squares explained when the term enters after the previous ones.
    pub sum_of_squares: f64,
    /// Mean square (SS / df).
    pub mean_square: f64,
    /// F-ratio against the residual mean square, `None` for residuals.
    pub f_ratio: Option<f64>,
    /// P-value from the F distribution.
    pub p_value: Option<f64>,
}

/// A fitted linear model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OlsFit {
    /// The fitted formula.
    pub formula: Formula,
    /// Coefficients in model order, intercept first.
    pub coefficients: Vec<Coefficient>,
    /// Fitted values.
    pub fitted: Vec<f64>,
    /// Residuals (observed minus fitted).
    pub residuals: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Residual degrees of freedom.
    pub df_residual: usize,
    /// Residual standard error.
    pub sigma: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// R² adjusted for the number of regressors.
    pub adj_r_squared: f64,
    /// Overall F statistic against the intercept-only (or empty) model.
    pub f_statistic: Option<f64>,
    /// P-value of the overall F statistic.
    pub f_p_value: Option<f64>,
    /// Sequential ANOVA, one entry per term plus residuals.
    pub anova: Vec<AnovaEntry>,
    /// Unscaled covariance (X'X)^-1 of the estimates.
    unscaled_covariance: Array2<f64>,
}

impl OlsFit {
    /// Number of observations.
    #[must_use]
    pub fn observations(&self) -> usize {
        self.fitted.len()
    }

    /// Look up a coefficient by term name.
    #[must_use]
    pub fn coefficient(&self, term: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.term == term)
    }

    /// Point estimate of a term.
    #[must_use]
    pub fn estimate(&self, term: &str) -> Option<f64> {
        self.coefficient(term).map(|c| c.estimate)
    }

    /// Estimated covariance matrix of the coefficients, sigma² (X'X)^-1.
    #[must_use]
    pub fn covariance(&self) -> Array2<f64> {
        &self.unscaled_covariance * self.sigma.powi(2)
    }

    /// Two-sided confidence intervals at the given level (e.g. 0.95).
    ///
    /// Bounds are `NaN` without residual degrees of freedom.
    #[must_use]
    pub fn confidence_intervals(&self, level: f64) -> Vec<ConfidenceInterval> {
        let q = t_quantile(level, self.df_residual);
        self.coefficients
            .iter()
            .map(|c| ConfidenceInterval {
                term: c.term.clone(),
                lower: c.estimate - q * c.std_error,
                upper: c.estimate + q * c.std_error,
            })
            .collect()
    }

    /// Text rendering of the sequential ANOVA table.
    #[must_use]
    pub fn anova_table(&self) -> String {
        let mut rows = vec![[
            String::new(),
            "Df".to_string(),
            "Sum Sq".to_string(),
            "Mean Sq".to_string(),
            "F value".to_string(),
            "Pr(>F)".to_string(),
        ]];
        for entry in &self.anova {
            rows.push([
                entry.term.clone(),
                entry.degrees_of_freedom.to_string(),
                format_value(entry.sum_of_squares),
                format_value(entry.mean_square),
                entry.f_ratio.map_or_else(String::new, format_value),
                entry.p_value.map_or_else(String::new, format_p_value),
            ]);
        }
        render_rows(&rows)
    }
}

impl fmt::Display for OlsFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Call: lm({})", self.formula)?;
        writeln!(f)?;

        if self.observations() > 5 {
            let q = quartiles(&self.residuals);
            writeln!(f, "Residuals:")?;
            let rows = [
                ["Min", "1Q", "Median", "3Q", "Max"].map(String::from),
                q.map(format_value),
            ];
            write!(f, "{}", render_rows(&rows))?;
            writeln!(f)?;
        }

        writeln!(f, "Coefficients:")?;
        let mut rows = vec![[
            String::new(),
            "Estimate".to_string(),
            "Std. Error".to_string(),
            "t value".to_string(),
            "Pr(>|t|)".to_string(),
            String::new(),
        ]];
        for c in &self.coefficients {
            rows.push([
                c.term.clone(),
                format_value(c.estimate),
                format_value(c.std_error),
                c.t_value.map_or_else(|| "NA".to_string(), format_value),
                c.p_value.map_or_else(|| "NA".to_string(), format_p_value),
                c.significance().to_string(),
            ]);
        }
        write!(f, "{}", render_rows(&rows))?;
        writeln!(f, "---")?;
        writeln!(
            f,
            "Signif. codes:  0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1 ' ' 1"
        )?;
        writeln!(f)?;

        writeln!(
            f,
            "Residual standard error: {} on {} degrees of freedom",
            format_value(self.sigma),
            self.df_residual
        )?;
        writeln!(
            f,
            "Multiple R-squared: {}, Adjusted R-squared: {}",
            format_value(self.r_squared),
            format_value(self.adj_r_squared)
        )?;
        if let (Some(stat), Some(p)) = (self.f_statistic, self.f_p_value) {
            let model_df = self.anova.len().saturating_sub(1);
            writeln!(
                f,
                "F-statistic: {} on {} and {} DF, p-value: {}",
                format_value(stat),
                model_df,
                self.df_residual,
                format_p_value(p)
            )?;
        }
        Ok(())
    }
}

/// Fit `formula` to `table` by ordinary least squares.
///
/// ```
/// use confound::regression::{fit, Formula};
/// use confound::table::{Column, Table};
///
/// let table = Table::from_columns([
///     ("X", Column::numeric(vec![-1.0, 1.0, -1.0, 1.0])),
///     ("Y", Column::numeric(vec![1.0, 5.0, 1.0, 5.0])),
/// ])
/// .unwrap();
/// let model = fit(&Formula::parse("Y ~ X").unwrap(), &table).unwrap();
/// assert!((model.estimate("X").unwrap() - 2.0).abs() < 1e-12);
/// assert!((model.estimate("(Intercept)").unwrap() - 3.0).abs() < 1e-12);
/// ```
///
/// # Errors
///
/// Returns an error if a column is missing or not numeric, the response has
/// non-finite values, there are fewer rows than parameters, or a term is a
/// linear combination of the terms before it.
pub fn fit(formula: &Formula, table: &Table) -> Result<OlsFit> {
    let y = Array1::from(table.numeric(formula.response())?.to_vec());
    if y.iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid_params(format!(
            "response '{}' has non-finite values",
            formula.response()
        )));
    }

    let mut names = Vec::with_capacity(formula.parameters());
    let mut columns = Vec::with_capacity(formula.parameters());
    if formula.has_intercept() {
        names.push(INTERCEPT.to_string());
        columns.push(vec![1.0; table.nrows()]);
    }
    for term in formula.terms() {
        names.push(term.clone());
        columns.push(table.term_values(term)?);
    }

    let n = table.nrows();
    let p = columns.len();
    if n < p {
        return Err(Error::InsufficientData {
            observations: n,
            parameters: p,
        });
    }
    let x = Array2::from_shape_fn((n, p), |(i, j)| columns[j][i]);

    let qr = QrDecomposition::new(&x, &names)?;
    let effects = qr.effects(&y);
    let beta = qr.solve(&effects);
    let unscaled_covariance = qr.unscaled_covariance();

    let fitted = x.dot(&beta);
    let residuals = &y - &fitted;
    let rss = residuals.dot(&residuals);
    let df_residual = n - p;
    let sigma2 = if df_residual > 0 {
        rss / df_residual as f64
    } else {
        f64::NAN
    };

    let coefficients = names
        .iter()
        .enumerate()
        .map(|(j, term)| {
            let std_error = (sigma2 * unscaled_covariance[[j, j]]).sqrt();
            let t_value = (std_error > 0.0 && std_error.is_finite()).then(|| beta[j] / std_error);
            Coefficient {
                term: term.clone(),
                estimate: beta[j],
                std_error,
                t_value,
                p_value: t_value.map(|t| t_two_sided_p_value(t, df_residual)),
            }
        })
        .collect();

    let intercept = usize::from(formula.has_intercept());
    let tss = if formula.has_intercept() {
        let mean = y.mean().unwrap_or(0.0);
        y.iter().map(|v| (v - mean).powi(2)).sum()
    } else {
        y.dot(&y)
    };
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN };
    let adj_r_squared = if df_residual > 0 {
        1.0 - (1.0 - r_squared) * (n - intercept) as f64 / df_residual as f64
    } else {
        f64::NAN
    };

    let model_df = p - intercept;
    let f_statistic = (model_df > 0 && df_residual > 0 && sigma2 > 0.0)
        .then(|| ((tss - rss) / model_df as f64) / sigma2);
    let f_p_value = f_statistic.map(|f| f_distribution_p_value(f, model_df, df_residual));

    let effects = effects.to_vec();
    let anova = sequential_anova(&names[intercept..], &effects[intercept..], rss, df_residual);

    let fit = OlsFit {
        formula: formula.clone(),
        coefficients,
        fitted: fitted.to_vec(),
        residuals: residuals.to_vec(),
        rss,
        df_residual,
        sigma: sigma2.sqrt(),
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value,
        anova,
        unscaled_covariance,
    };
    debug!(
        formula = %fit.formula,
        observations = n,
        parameters = p,
        r_squared = fit.r_squared,
        "fitted OLS model"
    );
    Ok(fit)
}

/// Parse `formula` and fit it to `table`.
///
/// # Errors
///
/// Returns any error from [`Formula::parse`] or [`fit`].
pub fn lm(formula: &str, table: &Table) -> Result<OlsFit> {
    fit(&Formula::parse(formula)?, table)
}

/// Thin QR factorization X = QR.
struct QrDecomposition {
    q: Array2<f64>,
    r: Array2<f64>,
}

impl QrDecomposition {
    fn new(x: &Array2<f64>, names: &[String]) -> Result<Self> {
        let (n, p) = x.dim();
        let mut q = x.clone();
        let mut r = Array2::<f64>::zeros((p, p));

        for j in 0..p {
            let original_norm = x.column(j).dot(&x.column(j)).sqrt();
            for i in 0..j {
                let proj = q.column(i).dot(&q.column(j));
                r[[i, j]] = proj;
                for row in 0..n {
                    let qi = q[[row, i]];
                    q[[row, j]] -= proj * qi;
                }
            }
            let norm = q.column(j).dot(&q.column(j)).sqrt();
            if norm <= RANK_TOLERANCE * original_norm.max(1.0) {
                return Err(Error::RankDeficient {
                    term: names[j].clone(),
                });
            }
            r[[j, j]] = norm;
            q.column_mut(j).mapv_inplace(|v| v / norm);
        }
        Ok(Self { q, r })
    }

    /// Q'y, computed against the running residual for stability.
    fn effects(&self, y: &Array1<f64>) -> Array1<f64> {
        let mut remainder = y.clone();
        let mut effects = Array1::zeros(self.q.ncols());
        for (j, qj) in self.q.columns().into_iter().enumerate() {
            let e = qj.dot(&remainder);
            effects[j] = e;
            remainder.scaled_add(-e, &qj);
        }
        effects
    }

    /// Back-substitution for R b = rhs.
    fn solve(&self, rhs: &Array1<f64>) -> Array1<f64> {
        let p = self.r.nrows();
        let mut b = Array1::zeros(p);
        for j in (0..p).rev() {
            let tail: f64 = (j + 1..p).map(|k| self.r[[j, k]] * b[k]).sum();
            b[j] = (rhs[j] - tail) / self.r[[j, j]];
        }
        b
    }

    /// (X'X)^-1 = R^-1 R^-T.
    fn unscaled_covariance(&self) -> Array2<f64> {
        let p = self.r.nrows();
        let mut r_inv = Array2::<f64>::zeros((p, p));
        for k in 0..p {
            let mut e = Array1::zeros(p);
            e[k] = 1.0;
            r_inv.column_mut(k).assign(&self.solve(&e));
        }
        r_inv.dot(&r_inv.t())
    }
}

fn sequential_anova(
    terms: &[String],
    effects: &[f64],
    rss: f64,
    df_residual: usize,
) -> Vec<AnovaEntry> {
    let residual_ms = if df_residual > 0 {
        rss / df_residual as f64
    } else {
        f64::NAN
    };
    let mut entries: Vec<AnovaEntry> = terms
        .iter()
        .zip(effects)
        .map(|(term, &e)| {
            let ss = e * e;
            let f_ratio = (residual_ms > 0.0).then(|| ss / residual_ms);
            AnovaEntry {
                term: term.clone(),
                degrees_of_freedom: 1,
                sum_of_squares: ss,
                mean_square: ss,
                f_ratio,
                p_value: f_ratio.map(|f| f_distribution_p_value(f, 1, df_residual)),
            }
        })
        .collect();
    entries.push(AnovaEntry {
        term: "Residuals".to_string(),
        degrees_of_freedom: df_residual,
        sum_of_squares: rss,
        mean_square: residual_ms,
        f_ratio: None,
        p_value: None,
    });
    entries
}

fn format_p_value(p: f64) -> String {
    if p.is_nan() {
        "NA".to_string()
    } else if p < 2e-16 {
        "<2e-16".to_string()
    } else if p < 1e-4 {
        format!("{p:.2e}")
    } else {
        format!("{p:.4}")
    }
}

fn quartiles(values: &[f64]) -> [f64; 5] {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let at = |prob: f64| {
        let h = prob * (sorted.len() - 1) as f64;
        let lo = h.floor() as usize;
        let hi = h.ceil() as usize;
        sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
    };
    [at(0.0), at(0.25), at(0.5), at(0.75), at(1.0)]
}

fn render_rows<const N: usize>(rows: &[[String; N]]) -> String {
    let widths: Vec<usize> = (0..N)
        .map(|c| rows.iter().map(|r| r[c].len()).max().unwrap_or(0))
        .collect();
    let mut out = String::new();
    for row in rows {
        let mut line = String::new();
        for (c, cell) in row.iter().enumerate() {
            let w = widths[c];
            if c == 0 {
                line.push_str(&format!("{cell:<w$}"));
            } else {
                line.push_str(&format!(" {cell:>w$}"));
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
