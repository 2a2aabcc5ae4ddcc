//! loglik_optimizer — argmin-powered log-likelihood maximization.
//!
//! Purpose
//! -------
//! Maximize a log-likelihood `ℓ(θ)` over a packed parameter vector. This is
//! the engine behind the maximum-likelihood estimate fallback and the
//! imputation fallback of the dispatch layer. Callers implement
//! [`LogLikelihood`] and call [`maximize`].
//!
//! Key behaviors
//! -------------
//! - Convert `ℓ(θ)` into Argmin cost functions `c(θ) = -ℓ(θ)` via the
//!   [`adapter`]s: a strict one for L-BFGS and a lenient one for the simplex,
//!   which treats failures as `+∞` cost.
//! - [`maximize`] validates the start, builds the solver selected by
//!   [`MleMethod`] (and [`LineSearcher`] for L-BFGS) via [`builders`], runs it
//!   via [`run`], and normalizes the result into an [`OptimOutcome`].
//! - Finite-difference gradients with error capture live in [`finite_diff`]
//!   and are shared with the model layer's numerical score.
//!
//! Invariants & assumptions
//! ------------------------
//! - User code implements `ℓ(θ)` and optionally `∇ℓ(θ)`, never the cost.
//! - [`LogLikelihood::value`] reports invalid inputs as [`OptError`]
//!   values, not panics.
//! - Configuration types ([`Tolerances`], [`MLEOptions`]) are validated on
//!   construction.
//!
//! Conventions
//! -----------
//! - [`OptimOutcome::value`] is `ℓ(θ̂)`, not the cost.
//! - Errors bubble up as [`OptResult<T>`]; this module never intentionally
//!   panics.
//!
//! Testing notes
//! -------------
//! - Unit tests cover adapter sign conventions and domain handling, solver
//!   construction, finite differences, option validation, and `maximize` on
//!   small concave problems with both methods.
//!
//! [`OptError`]: crate::optimization::errors::OptError
//! [`OptResult<T>`]: crate::optimization::errors::OptResult

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, MleMethod, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, MleMethod, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
