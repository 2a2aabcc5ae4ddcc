//! loglik_optimizer::types — numeric aliases, solver aliases, and defaults.
//!
//! Purpose
//! -------
//! Keep the parameter/gradient/cost shapes and the concrete Argmin solver
//! types in one place so the adapter, builders, and runners agree on them.
//!
//! Key behaviors
//! -------------
//! - `Theta`, `Grad`, `Cost` describe the packed parameter vector of a model,
//!   the gradient of its log-likelihood, and a scalar cost.
//! - `FnEvalMap` is Argmin's function-evaluation counter map.
//! - Solver aliases pair L-BFGS with either line search, and fix the
//!   Nelder–Mead simplex to the same numeric shapes.
//!
//! Conventions
//! -----------
//! - `Theta` has one entry per packed model parameter (vector entries first,
//!   then matrix entries row-major).
//! - Defaults here are the values used when `MLEOptions` leaves a knob unset.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    neldermead::NelderMead,
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Packed model parameters as seen by the optimizer.
pub type Theta = Array1<f64>;

/// Gradient of the log-likelihood with respect to `Theta`.
pub type Grad = Array1<f64>;

pub type Cost = f64;

pub type FnEvalMap = HashMap<String, u64>;

pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Offset of each initial simplex vertex from the starting point.
pub const DEFAULT_STEP_SIZE: f64 = 0.1;

/// Simplex stops once the standard deviation of vertex costs drops below this.
pub const DEFAULT_SD_TOLERANCE: f64 = 1e-9;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

pub type SimplexSolver = NelderMead<Theta, Cost>;
