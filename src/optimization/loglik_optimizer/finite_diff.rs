//! loglik_optimizer::finite_diff — finite-difference gradients with error
//! capture.
//!
//! Purpose
//! -------
//! Differentiate a scalar objective that can fail, using `finitediff`, whose
//! closures must return a plain `f64`.
//!
//! Key behaviors
//! -------------
//! - The objective closure stores its first error in a shared
//!   `RefCell<Option<E>>` and returns `NaN`; after differencing, a captured
//!   error is returned as `Err`.
//! - [`fd_gradient`] tries central differences first and retries with
//!   forward differences when an evaluation failed or the central estimate
//!   is not finite.
//! - Both helpers are generic over the error type, so the Argmin adapter
//!   (`argmin::core::Error`) and the model layer (`ModelError`) share them.
//!
//! Invariants & assumptions
//! ------------------------
//! - A returned gradient always passes [`validate_grad`] for `theta.len()`.
//! - `closure_err` is cleared before each differencing pass.
use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{Grad, Theta, validation::validate_grad},
};
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient of `func` at `theta`, with error capture.
///
/// # Errors
/// The first error captured from `func`, or a validation error converted
/// from [`OptError`] if the gradient has non-finite entries.
pub fn run_fd_diff<G, E>(theta: &Theta, func: &G, closure_err: &RefCell<Option<E>>) -> Result<Grad, E>
where
    G: Fn(&Theta) -> f64,
    E: From<OptError>,
{
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Central-difference gradient, falling back to [`run_fd_diff`].
///
/// # Errors
/// As [`run_fd_diff`], for the forward-difference retry.
pub fn fd_gradient<G, E>(theta: &Theta, func: &G, closure_err: &RefCell<Option<E>>) -> Result<Grad, E>
where
    G: Fn(&Theta) -> f64,
    E: From<OptError>,
{
    closure_err.replace(None);
    let central = theta.central_diff(func);
    if closure_err.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
        return Ok(central);
    }
    log::debug!("central difference failed; retrying with forward differences");
    run_fd_diff(theta, func, closure_err)
}
