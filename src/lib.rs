//! # Confound
//!
//! Experimental designs and misspecification simulations for teaching
//! design of experiments in economics and business research.
//!
//! ## Overview
//!
//! Every example runs the same linear pipeline:
//!
//! 1. **Design**: a full factorial or an orthogonal array, optionally replicated
//! 2. **Recode**: map the two levels of each factor to -1/+1
//! 3. **Interactions**: append products of recoded factor columns
//! 4. **Diagnostics**: correlation matrix and frequency tables
//! 5. **Simulation**: a known linear model plus seeded Gaussian noise
//! 6. **Estimation**: OLS on a chosen subset of regressors
//!
//! A Monte Carlo driver repeats steps 5 and 6 to show the sampling
//! distribution of every estimate, and [`scenarios`] packages the classic
//! walkthroughs (aliasing in an L8, omitted variables, omitted interactions).
//!
//! ## Quick Start
//!
//! ```rust
//! use confound::interaction::{add_interactions, Interaction};
//! use confound::regression::lm;
//! use confound::simulate::{seeded_rng, simulate, OutcomeModel};
//! use confound::{oa_design, recode_all, ReplicationMode};
//!
//! // L8 for four factors, repeated ten times
//! let design = oa_design(4, 2)
//!     .unwrap()
//!     .replicate(10, ReplicationMode::Whole)
//!     .unwrap();
//! let table = recode_all(&design.to_table()).unwrap();
//! let table = add_interactions(&table, &[Interaction::of(&["A", "B"])]).unwrap();
//!
//! let model = OutcomeModel::new(1.0)
//!     .with_effect("A", 1.0)
//!     .with_effect("C", 2.0)
//!     .with_noise_sd(0.0);
//! let sim = simulate(&table, &model, &mut seeded_rng(7)).unwrap();
//!
//! // C is aliased with -AxB, so omitting it moves its effect onto AxB.
//! let fit = lm("Y ~ A + B + AxB", &sim.observed()).unwrap();
//! assert!((fit.estimate("AxB").unwrap() + 2.0).abs() < 1e-9);
//! ```
//!
//! ## Notation
//!
//! Design parameters are written D(N, k, s, t) where:
//! - **N**: Number of runs (rows)
//! - **k**: Number of factors (columns)
//! - **s**: Number of levels (symbols 0, 1, ..., s-1)
//! - **t**: Strength (every t-column subarray contains all s^t tuples equally)
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of designs, tables and results
//! - `parallel`: Enable the rayon-backed Monte Carlo driver

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod builder;
pub mod catalogue;
pub mod construct;
pub mod design;
pub mod diagnostics;
pub mod error;
pub mod interaction;
pub mod montecarlo;
pub mod recode;
pub mod regression;
pub mod scenarios;
pub mod simulate;
pub mod table;
pub mod utils;

#[cfg(feature = "parallel")]
pub mod parallel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::{fac_design, oa_design, DesignBuilder};
    pub use crate::construct::{Bose, Constructor, FullFactorial, HadamardSylvester};
    pub use crate::design::{Design, DesignKind, DesignParams, ReplicationMode};
    pub use crate::diagnostics::{correlation_matrix, diagnose, frequency_tables};
    pub use crate::error::{Error, Result};
    pub use crate::interaction::{add_interactions, two_way, up_to_order, Interaction};
    pub use crate::montecarlo::{monte_carlo, MonteCarloConfig, MonteCarloSummary};
    pub use crate::recode::{recode, recode_all};
    pub use crate::regression::{fit, lm, Formula, OlsFit};
    pub use crate::scenarios::{Scenario, TutorialConfig};
    pub use crate::simulate::{seeded_rng, simulate, OutcomeModel, Simulation};
    pub use crate::table::{Column, Table};

    #[cfg(feature = "parallel")]
    pub use crate::parallel::par_monte_carlo;
}

// Re-export commonly used items at crate root
pub use builder::{available_constructions, fac_design, oa_design, DesignBuilder};
pub use catalogue::get_by_name as get_standard_array;
pub use design::{compute_strength, verify_strength, Design, DesignKind, ReplicationMode};
pub use error::{Error, Result};
pub use recode::{recode, recode_all};
pub use table::{Column, Table};

#[cfg(feature = "parallel")]
pub use parallel::par_monte_carlo;
