//! High-level entry point for maximizing a [`LogLikelihood`].
//!
//! Dispatches on [`MleMethod`]: Nelder–Mead runs through the lenient
//! [`SimplexAdapter`]; L-BFGS builds the solver for the chosen line search and
//! runs through the strict [`ArgMinAdapter`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::{ArgMinAdapter, SimplexAdapter},
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente, build_simplex},
        run::{run_lbfgs, run_simplex},
        traits::{LineSearcher, LogLikelihood, MLEOptions, MleMethod},
    },
};

/// Maximize `ℓ(θ)` from `theta0`.
///
/// # Behavior
/// - Validates the starting point via `f.check(theta0, data)`.
/// - Nelder–Mead: evaluates `ℓ(θ₀)` once so a start outside the domain is
///   reported instead of silently stalling, then runs the simplex.
/// - L-BFGS: builds the solver for `opts.line_searcher` and runs it.
///
/// # Errors
/// - Errors from `f.check` or from `ℓ(θ₀)` (Nelder–Mead).
/// - Builder errors (tolerances, step size).
/// - Solver runtime errors and outcome validation errors.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use rust_statmodels::optimization::errors::OptResult;
/// use rust_statmodels::optimization::loglik_optimizer::{
///     maximize, LogLikelihood, MLEOptions, Theta,
/// };
///
/// struct Concave;
/// impl LogLikelihood for Concave {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Concave, array![0.1, -0.2, 0.3], &(), &MLEOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), rust_statmodels::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    match opts.method {
        MleMethod::NelderMead => {
            f.value(&theta0, data)?;
            let solver = build_simplex(&theta0, opts)?;
            run_simplex(opts, SimplexAdapter::new(f, data), solver)
        }
        MleMethod::Lbfgs => {
            let problem = ArgMinAdapter::new(f, data);
            match opts.line_searcher {
                LineSearcher::MoreThuente => {
                    let solver = build_optimizer_more_thuente(opts)?;
                    run_lbfgs(theta0, opts, problem, solver)
                }
                LineSearcher::HagerZhang => {
                    let solver = build_optimizer_hager_zhang(opts)?;
                    run_lbfgs(theta0, opts, problem, solver)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::{OptError, OptResult};
    use crate::optimization::loglik_optimizer::{Cost, Tolerances};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    /// ℓ(θ) = -Σ (θᵢ - cᵢ)², maximized at `c`.
    struct Bowl;

    impl LogLikelihood for Bowl {
        type Data = Theta;

        fn value(&self, theta: &Theta, centre: &Theta) -> OptResult<Cost> {
            Ok(-(theta - centre).mapv(|d| d * d).sum())
        }

        fn check(&self, theta: &Theta, centre: &Theta) -> OptResult<()> {
            if theta.len() != centre.len() {
                return Err(OptError::ThetaLengthMismatch {
                    expected: centre.len(),
                    actual: theta.len(),
                });
            }
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // The default simplex finds the maximum of a concave bowl.
    //
    // Given
    // -----
    // - Centre (1, -2), start (0, 0), default options.
    //
    // Expect
    // ------
    // - θ̂ ≈ centre and ℓ(θ̂) ≈ 0.
    fn simplex_finds_bowl_centre() {
        // Act
        let out = maximize(&Bowl, array![0.0, 0.0], &array![1.0, -2.0], &MLEOptions::default())
            .unwrap();

        // Assert
        assert_abs_diff_eq!(out.theta_hat[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(out.theta_hat[1], -2.0, epsilon = 1e-3);
        assert_abs_diff_eq!(out.value, 0.0, epsilon = 1e-5);
        assert!(out.converged);
    }

    #[test]
    // Purpose
    // -------
    // L-BFGS with finite-difference gradients finds the same maximum.
    //
    // Given
    // -----
    // - Centre (0.5, 3), start (0, 0), L-BFGS with More–Thuente.
    //
    // Expect
    // ------
    // - θ̂ ≈ centre.
    fn lbfgs_finds_bowl_centre() {
        // Arrange
        let tols = Tolerances::new(Some(1e-8), None, Some(200)).unwrap();
        let opts = MLEOptions::new(tols, MleMethod::Lbfgs, LineSearcher::MoreThuente, None).unwrap();

        // Act
        let out = maximize(&Bowl, array![0.0, 0.0], &array![0.5, 3.0], &opts).unwrap();

        // Assert
        assert_abs_diff_eq!(out.theta_hat[0], 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(out.theta_hat[1], 3.0, epsilon = 1e-4);
    }

    #[test]
    // Purpose
    // -------
    // A starting point rejected by `check` never reaches a solver.
    //
    // Given
    // -----
    // - A 1-element start for a 2-element centre.
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch`.
    fn check_failure_is_returned() {
        let err = maximize(&Bowl, array![0.0], &array![1.0, 2.0], &MLEOptions::default()).unwrap_err();
        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 2, actual: 1 });
    }
}
