//! dispatch — uniform operations over any model.
//!
//! Purpose
//! -------
//! Expose every model operation as one free function that calls the model's
//! capability when it has one and otherwise synthesizes the result from what
//! it does have:
//!
//! | operation         | capability used first | fallback                                  |
//! |-------------------|-----------------------|-------------------------------------------|
//! | [`estimate`]      | `estimate`            | maximum likelihood                        |
//! | [`p`]             | `p`                   | `exp(log_likelihood)`                     |
//! | [`log_likelihood`]| `log_likelihood`      | `ln(p)`                                   |
//! | [`score`]         | `score`               | finite differences of the log-likelihood |
//! | [`draw`]          | `draw`                | adaptive rejection Metropolis sampling    |
//! | [`predict`]       | `predict`             | maximum-likelihood imputation             |
//! | [`cdf`]           | `cdf`                 | Monte Carlo over cached draws             |
//! | [`parameter_model`]| `parameter_model`    | bootstrap normal, or simulated PMF        |
//!
//! Invariants & assumptions
//! ------------------------
//! - `p` and `log_likelihood` never recurse into each other: each only
//!   consults the other's capability slot.
//! - A model with neither `p` nor `log_likelihood` fails every
//!   likelihood-based fallback with `MissingCapability`, logged at `warn`.
//! - Operations that keep state between calls (`draw`, `cdf`,
//!   `parameter_model`) take the model mutably; the state lives in the
//!   model's settings groups.
//!
//! Conventions
//! -----------
//! - The chosen path is logged at `debug` when a fallback runs.

pub mod estimate;
pub mod likelihood;
pub mod predict;
pub mod sampling;

pub use self::estimate::{estimate, parameter_model};
pub use self::likelihood::{log_likelihood, p, score};
pub use self::predict::predict;
pub use self::sampling::{cdf, draw};

use log::warn;

use crate::model::{Model, ModelError};

/// `MissingCapability` for `operation`, logged at `warn`.
pub(crate) fn missing(model: &Model<'_>, operation: &'static str) -> ModelError {
    warn!("{}: cannot {operation}: the model has neither a closed form nor a likelihood", model.name);
    ModelError::MissingCapability { model: model.name.clone(), operation }
}

/// Whether any likelihood-based fallback can run.
pub(crate) fn has_likelihood(model: &Model<'_>) -> bool {
    model.capabilities.p.is_some() || model.capabilities.log_likelihood.is_some()
}
