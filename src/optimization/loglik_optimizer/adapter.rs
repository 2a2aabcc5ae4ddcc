//! Adapters that expose a [`LogLikelihood`] as an `argmin` problem.
//!
//! Maximizing `ℓ(θ)` becomes minimizing `c(θ) = -ℓ(θ)`.
//!
//! - [`ArgMinAdapter`] is strict: a failing or non-finite `ℓ` aborts the run.
//!   It also provides gradients (analytic, negated; or finite differences of
//!   the cost) for L-BFGS.
//! - [`SimplexAdapter`] is lenient: a failing or non-finite `ℓ` costs `+∞`,
//!   so the simplex steps away from out-of-domain parameters instead of
//!   aborting.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::fd_gradient,
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Strict cost/gradient bridge for gradient-based solvers.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// `c(θ) = -ℓ(θ)`.
    ///
    /// # Errors
    /// Any error from `value`, or `NonFiniteCost` for a non-finite `ℓ`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Gradient of the cost at `θ`.
    ///
    /// Uses `-grad(θ)` when the problem has an analytic gradient; otherwise
    /// finite differences of the cost (central, then forward), with errors
    /// from cost evaluations captured and re-raised.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                fd_gradient(theta, &cost_func, &closure_err)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Lenient cost bridge for the simplex solver.
#[derive(Debug, Clone)]
pub struct SimplexAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> SimplexAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: LogLikelihood> CostFunction for SimplexAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// `c(θ) = -ℓ(θ)`, or `+∞` where `ℓ` fails or is not finite.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        match self.f.value(theta, self.data) {
            Ok(v) if v.is_finite() => Ok(-v),
            _ => Ok(f64::INFINITY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    /// ℓ(θ) = -(θ - 1)², undefined for θ < 0.
    struct HalfLine;

    impl LogLikelihood for HalfLine {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            if theta[0] < 0.0 {
                return Err(OptError::InvalidThetaInput { index: 0, value: theta[0] });
            }
            Ok(-(theta[0] - 1.0).powi(2))
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // The strict adapter negates ℓ and differentiates the cost.
    //
    // Given
    // -----
    // - `HalfLine` at θ = 3.
    //
    // Expect
    // ------
    // - cost = 4 and d cost / dθ ≈ 4.
    fn strict_adapter_negates_value_and_gradient() {
        // Arrange
        let adapter = ArgMinAdapter::new(&HalfLine, &());
        let theta = array![3.0];

        // Act
        let cost = adapter.cost(&theta).unwrap();
        let grad = adapter.gradient(&theta).unwrap();

        // Assert
        assert_abs_diff_eq!(cost, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[0], 4.0, epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Out-of-domain points abort the strict adapter but cost +∞ in the
    // simplex adapter.
    //
    // Given
    // -----
    // - `HalfLine` at θ = -1.
    //
    // Expect
    // ------
    // - `Err` from the strict adapter; `+∞` from the simplex adapter.
    fn out_of_domain_handling_differs() {
        // Arrange
        let theta = array![-1.0];

        // Act
        let strict = ArgMinAdapter::new(&HalfLine, &()).cost(&theta);
        let lenient = SimplexAdapter::new(&HalfLine, &()).cost(&theta).unwrap();

        // Assert
        assert!(strict.is_err());
        assert!(lenient.is_infinite() && lenient > 0.0);
    }
}
