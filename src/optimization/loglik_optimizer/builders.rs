//! loglik_optimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Build the Argmin solvers used by the maximum-likelihood fallback from
//! [`MLEOptions`], keeping Argmin's generic wiring out of the callers.
//!
//! Key behaviors
//! -------------
//! - L-BFGS with Hager–Zhang or More–Thuente line search, with optional
//!   gradient and cost-change tolerances applied by [`configure_lbfgs`].
//! - Nelder–Mead with an initial simplex of `n + 1` vertices: the starting
//!   point plus one vertex offset by `step_size` along each axis.
//!
//! Conventions
//! -----------
//! - Builders never set the iteration limit or the initial state; runners
//!   do.
//! - Invalid tolerances rejected by Argmin surface as [`OptError`] through
//!   `OptResult`.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, SimplexSolver, Theta,
        },
        validation::verify_step_size,
    },
};

/// L-BFGS with Hager–Zhang line search.
///
/// # Errors
/// Tolerances rejected by Argmin.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// L-BFGS with More–Thuente line search.
///
/// # Errors
/// Tolerances rejected by Argmin.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Apply the optional gradient and cost-change tolerances to an L-BFGS
/// solver. `None` leaves Argmin's default in place.
///
/// # Errors
/// Tolerances rejected by Argmin.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// The `n + 1` vertices of the initial simplex around `theta0`.
pub fn initial_simplex(theta0: &Theta, step: f64) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[i] += step;
        vertices.push(vertex);
    }
    vertices
}

/// Nelder–Mead around `theta0` with the options' step and cost-spread
/// tolerance.
///
/// # Errors
/// `InvalidStepSize` for a bad step; tolerances rejected by Argmin.
pub fn build_simplex(theta0: &Theta, opts: &MLEOptions) -> OptResult<SimplexSolver> {
    verify_step_size(opts.step_size)?;
    let solver = SimplexSolver::new(initial_simplex(theta0, opts.step_size))
        .with_sd_tolerance(opts.sd_tolerance())?;
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::traits::{LineSearcher, MleMethod, Tolerances};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction of both L-BFGS variants with and without explicit memory.
    // - Tolerance wiring, including absent tolerances.
    // - Shape of the initial simplex.
    //
    // They intentionally DO NOT cover:
    // - Executor behavior, which is exercised through `maximize`.
    // -------------------------------------------------------------------------

    fn lbfgs_opts(searcher: LineSearcher, mem: Option<usize>) -> MLEOptions {
        let tols = Tolerances::new(Some(1e-6), Some(1e-8), Some(50)).expect("valid tolerances");
        MLEOptions::new(tols, MleMethod::Lbfgs, searcher, mem).expect("valid options")
    }

    #[test]
    // Purpose
    // -------
    // Both line-search builders succeed with default and explicit memory.
    //
    // Given
    // -----
    // - Valid tolerances; memory `None` and `Some(11)`.
    //
    // Expect
    // ------
    // - Every builder returns `Ok`.
    fn lbfgs_builders_accept_default_and_explicit_memory() {
        assert!(build_optimizer_hager_zhang(&lbfgs_opts(LineSearcher::HagerZhang, None)).is_ok());
        assert!(build_optimizer_hager_zhang(&lbfgs_opts(LineSearcher::HagerZhang, Some(11))).is_ok());
        assert!(build_optimizer_more_thuente(&lbfgs_opts(LineSearcher::MoreThuente, None)).is_ok());
        assert!(build_optimizer_more_thuente(&lbfgs_opts(LineSearcher::MoreThuente, Some(9))).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `configure_lbfgs` is a no-op when no tolerance is set.
    //
    // Given
    // -----
    // - Tolerances with only `max_iter`.
    //
    // Expect
    // ------
    // - `Ok`.
    fn configure_lbfgs_respects_absent_tolerances() {
        // Arrange
        let raw = LBFGS::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM);
        let tols = Tolerances::new(None, None, Some(50)).expect("valid tolerances");
        let opts = MLEOptions::new(tols, MleMethod::Lbfgs, LineSearcher::MoreThuente, None)
            .expect("valid options");

        // Act
        let configured = configure_lbfgs(raw, &opts);

        // Assert
        assert!(configured.is_ok());
    }

    #[test]
    // Purpose
    // -------
    // The initial simplex offsets one coordinate per vertex.
    //
    // Given
    // -----
    // - θ₀ = (1, 2), step 0.5.
    //
    // Expect
    // ------
    // - Vertices (1, 2), (1.5, 2), (1, 2.5).
    fn initial_simplex_offsets_each_axis() {
        // Act
        let vertices = initial_simplex(&array![1.0, 2.0], 0.5);

        // Assert
        assert_eq!(vertices, vec![array![1.0, 2.0], array![1.5, 2.0], array![1.0, 2.5]]);
    }
}
