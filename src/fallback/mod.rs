//! fallback — generic algorithms that stand in for missing capabilities.
//!
//! Purpose
//! -------
//! Implement, once, the strategies the dispatch layer uses when a model lacks
//! a closed form:
//! - [`mle`]: estimate by maximizing the log-likelihood over the packed
//!   parameters.
//! - [`gradient`]: numerical score by finite differences of the
//!   log-likelihood.
//! - [`arms`]: univariate draws by adaptive rejection Metropolis sampling.
//! - [`bootstrap`]: covariance of parameter estimates by resampling rows.
//! - [`impute`]: fill NaN cells by maximizing the likelihood over them.
//!
//! Conventions
//! -----------
//! - Every fallback evaluates the model only through [`crate::dispatch`], so
//!   chained fallbacks (for example an MLE over a model that only has `p`)
//!   work without special cases.
//! - Objectives work on copies of the model; the caller's model is written
//!   once at the end, if at all.
//! - Fallbacks log their choice at `debug` level and never panic on bad
//!   input.

pub mod arms;
pub mod bootstrap;
pub mod gradient;
pub mod impute;
pub mod mle;

pub use self::arms::arms_draw;
pub use self::bootstrap::bootstrap_cov;
pub use self::gradient::numerical_gradient;
pub use self::impute::ml_impute;
pub use self::mle::{ParameterProblem, maximum_likelihood};
