//! loglik_optimizer::validation — option, input, and outcome checks.
//!
//! Small guards shared by the option constructors, the adapters, and the
//! outcome builder. Each returns `OptResult<()>` (or the validated value) so
//! callers can use `?` and keep invalid numbers out of Argmin.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta},
};

/// Gradient tolerance, when given, must be finite and positive.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Cost tolerance, when given, must be finite and positive.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Simplex step must be finite and positive.
pub fn verify_step_size(step: f64) -> OptResult<()> {
    if !step.is_finite() {
        return Err(OptError::InvalidStepSize { step, reason: "Step size must be finite." });
    }
    if step <= 0.0 {
        return Err(OptError::InvalidStepSize { step, reason: "Step size must be positive." });
    }
    Ok(())
}

/// A starting point must match the parameter count and be finite.
pub fn validate_theta_input(theta: &Theta, dim: usize) -> OptResult<()> {
    if theta.len() != dim {
        return Err(OptError::ThetaLengthMismatch { expected: dim, actual: theta.len() });
    }
    match theta.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(OptError::InvalidThetaInput { index, value: theta[index] }),
        None => Ok(()),
    }
}

pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let t = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some(index) = t.iter().position(|v| !v.is_finite()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value: t[index],
            reason: "Parameter estimates must be finite.",
        });
    }
    Ok(t)
}

pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Tolerance and step checks reject non-finite and non-positive values.
    //
    // Given
    // -----
    // - NaN, zero, and a valid positive value for each check.
    //
    // Expect
    // ------
    // - Errors for NaN and zero; `Ok` for the positive value and for `None`.
    fn tolerance_and_step_checks() {
        assert!(verify_tol_grad(Some(f64::NAN)).is_err());
        assert!(verify_tol_cost(Some(0.0)).is_err());
        assert!(verify_tol_grad(None).is_ok());
        assert!(verify_tol_cost(Some(1e-8)).is_ok());
        assert!(verify_step_size(0.0).is_err());
        assert!(verify_step_size(f64::INFINITY).is_err());
        assert!(verify_step_size(0.5).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Starting points are checked for length before finiteness.
    //
    // Given
    // -----
    // - A length-2 point against dim 3, and [1, NaN] against dim 2.
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch`, then `InvalidThetaInput { index: 1 }`.
    fn theta_input_checks_length_then_values() {
        // Act
        let short = validate_theta_input(&array![1.0, 2.0], 3).unwrap_err();
        let nan = validate_theta_input(&array![1.0, f64::NAN], 2).unwrap_err();

        // Assert
        assert_eq!(short, OptError::ThetaLengthMismatch { expected: 3, actual: 2 });
        assert!(matches!(nan, OptError::InvalidThetaInput { index: 1, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Missing or non-finite estimates are rejected.
    //
    // Given
    // -----
    // - `None`, and `Some([0, inf])`.
    //
    // Expect
    // ------
    // - `MissingThetaHat`, then `InvalidThetaHat { index: 1 }`.
    fn theta_hat_checks() {
        assert_eq!(validate_theta_hat(None).unwrap_err(), OptError::MissingThetaHat);
        let err = validate_theta_hat(Some(array![0.0, f64::INFINITY])).unwrap_err();
        assert!(matches!(err, OptError::InvalidThetaHat { index: 1, .. }));
    }
}
