//! Error types for the confound library.
//!
//! All fallible operations return [`Result`], built on the `thiserror`
//! derived [`Error`] enum below. Variants are grouped by the pipeline stage
//! that raises them.

use thiserror::Error;

/// The main error type for the confound library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ============ Parameter Validation Errors ============
    /// Invalid parameters passed to a constructor, builder or simulator.
    #[error("invalid parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },

    /// The number of factors exceeds the maximum allowed by the construction.
    #[error("factors {factors} exceeds maximum {max} for {algorithm} construction")]
    TooManyFactors {
        /// Requested number of factors.
        factors: usize,
        /// Maximum allowed factors.
        max: usize,
        /// Name of the construction algorithm.
        algorithm: &'static str,
    },

    /// The number of levels is not prime as required.
    #[error("levels {levels} is not prime as required by {algorithm}")]
    LevelsNotPrime {
        /// The invalid levels value.
        levels: u32,
        /// Name of the construction algorithm.
        algorithm: &'static str,
    },

    // ============ Design Generation Errors ============
    /// No known orthogonal array covers the requested combination.
    #[error("no known orthogonal array for {factors} factors at {levels} levels with at least {min_runs} runs")]
    NoOrthogonalArray {
        /// Requested number of factors.
        factors: usize,
        /// Requested number of levels.
        levels: u32,
        /// Requested minimum run size.
        min_runs: usize,
    },

    /// Design data does not match its declared parameters.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension description.
        expected: String,
        /// Actual dimension description.
        actual: String,
    },

    /// Index is out of bounds.
    #[error("index {index} is out of bounds for size {size}")]
    IndexOutOfBounds {
        /// The invalid index.
        index: usize,
        /// The maximum valid size.
        size: usize,
    },

    // ============ Table Errors ============
    /// A column referenced by name does not exist.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// A column with this name already exists.
    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    /// A numeric column was required but a factor column was found.
    #[error("column '{0}' is not numeric (recode factor columns first)")]
    NotNumeric(String),

    /// A column added to a table has the wrong number of rows.
    #[error("column '{column}' has {actual} rows, table has {expected}")]
    LengthMismatch {
        /// Name of the offending column.
        column: String,
        /// Row count of the table.
        expected: usize,
        /// Row count of the column.
        actual: usize,
    },

    /// Recoding requires exactly two distinct levels.
    #[error("column '{column}' has {distinct} distinct levels, recoding to -1/+1 needs exactly 2")]
    NotTwoLevel {
        /// Name of the offending column.
        column: String,
        /// Number of distinct levels found.
        distinct: usize,
    },

    // ============ Estimation Errors ============
    /// A model formula could not be parsed.
    #[error("cannot parse formula '{formula}': {message}")]
    FormulaParse {
        /// The formula text.
        formula: String,
        /// What went wrong.
        message: String,
    },

    /// The regressor matrix is rank deficient.
    #[error("design matrix is rank deficient: term '{term}' is aliased with earlier terms")]
    RankDeficient {
        /// First term that is a linear combination of the preceding ones.
        term: String,
    },

    /// Fewer observations than parameters.
    #[error("{observations} observations cannot identify {parameters} parameters")]
    InsufficientData {
        /// Number of rows.
        observations: usize,
        /// Number of model parameters.
        parameters: usize,
    },
}

/// A specialized `Result` type for confound operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create a new `FormulaParse` error.
    #[must_use]
    pub fn formula(formula: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FormulaParse {
            formula: formula.into(),
            message: message.into(),
        }
    }
}
