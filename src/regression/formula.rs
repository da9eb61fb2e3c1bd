//! Model formulas of the form `Y ~ A + B + AxB`.
//!
//! The intercept is included unless removed with `- 1` or `0 +`. A term is
//! either a column name or a `:`-joined product such as `A:B`.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A parsed regression formula.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Formula {
    response: String,
    terms: Vec<String>,
    intercept: bool,
}

impl Formula {
    /// A formula with an intercept and the given regressors.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is empty or a term repeats.
    pub fn new<S: Into<String>>(
        response: impl Into<String>,
        terms: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let formula = Self {
            response: response.into(),
            terms: terms.into_iter().map(Into::into).collect(),
            intercept: true,
        };
        formula.validate()?;
        Ok(formula)
    }

    /// Parse formula text.
    ///
    /// ```
    /// use confound::regression::Formula;
    ///
    /// let f = Formula::parse("Y ~ A + B + AxB").unwrap();
    /// assert_eq!(f.response(), "Y");
    /// assert_eq!(f.terms(), ["A", "B", "AxB"]);
    /// assert!(f.has_intercept());
    ///
    /// assert!(!Formula::parse("Y ~ A - 1").unwrap().has_intercept());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormulaParse`] for malformed text.
    pub fn parse(text: &str) -> Result<Self> {
        let (lhs, rhs) = text
            .split_once('~')
            .ok_or_else(|| Error::formula(text, "expected 'response ~ terms'"))?;
        if rhs.contains('~') {
            return Err(Error::formula(text, "more than one '~'"));
        }

        let response = lhs.trim();
        if response.is_empty() {
            return Err(Error::formula(text, "missing response"));
        }

        let mut intercept = true;
        let mut terms = Vec::new();
        for token in rhs.replace('-', "+-").split('+').map(str::trim) {
            let (removed, name) = match token.strip_prefix('-') {
                Some(rest) => (true, rest.trim()),
                None => (false, token),
            };
            match (removed, name) {
                (false, "") if terms.is_empty() && intercept && rhs.trim_start().starts_with('-') => {}
                (_, "") => return Err(Error::formula(text, "empty term")),
                (false, "1") => intercept = true,
                (false, "0") | (true, "1") => intercept = false,
                (true, other) => {
                    return Err(Error::formula(
                        text,
                        format!("cannot remove '{other}', only the intercept can be removed"),
                    ))
                }
                (false, term) => terms.push(term.to_string()),
            }
        }

        let formula = Self {
            response: response.to_string(),
            terms,
            intercept,
        };
        formula.validate().map_err(|e| match e {
            Error::FormulaParse { message, .. } => Error::formula(text, message),
            other => other,
        })?;
        Ok(formula)
    }

    /// Drop the intercept.
    #[must_use]
    pub fn without_intercept(mut self) -> Self {
        self.intercept = false;
        self
    }

    /// Name of the response column.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Regressor terms, excluding the intercept.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Whether the model has an intercept.
    #[must_use]
    pub fn has_intercept(&self) -> bool {
        self.intercept
    }

    /// Number of model parameters.
    #[must_use]
    pub fn parameters(&self) -> usize {
        self.terms.len() + usize::from(self.intercept)
    }

    fn validate(&self) -> Result<()> {
        let text = self.to_string();
        if self.response.trim().is_empty() {
            return Err(Error::formula(text, "missing response"));
        }
        if self.parameters() == 0 {
            return Err(Error::formula(text, "model has no parameters"));
        }
        for (i, term) in self.terms.iter().enumerate() {
            if term.trim().is_empty() {
                return Err(Error::formula(text, "empty term"));
            }
            if term == &self.response {
                return Err(Error::formula(text, format!("response '{term}' used as a regressor")));
            }
            if self.terms[..i].contains(term) {
                return Err(Error::formula(text, format!("term '{term}' repeated")));
            }
        }
        Ok(())
    }
}

impl FromStr for Formula {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ ", self.response)?;
        match (self.intercept, self.terms.is_empty()) {
            (true, true) => write!(f, "1"),
            (true, false) => write!(f, "{}", self.terms.join(" + ")),
            (false, true) => write!(f, "0"),
            (false, false) => write!(f, "{} - 1", self.terms.join(" + ")),
        }
    }
}
