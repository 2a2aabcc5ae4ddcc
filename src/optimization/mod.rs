//! optimization — maximum-likelihood machinery and its error surface.
//!
//! Purpose
//! -------
//! Provide the numerical optimization used by the model layer's fallbacks:
//! an Argmin-backed log-likelihood maximizer (`loglik_optimizer`) and a
//! single error/result surface (`errors::OptError`, `OptResult<T>`).
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; user-facing
//!   values are expressed in terms of `ℓ`.
//! - Model-layer failures raised inside an objective travel through
//!   `OptError::ModelEvaluation` and come back out unchanged when converted
//!   to `ModelError`.
//! - This module does no I/O; it logs only at `debug` level.

pub mod errors;
pub mod loglik_optimizer;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
}
