//! Numerical score: finite differences of the dispatched log-likelihood with
//! respect to the packed parameters.
use std::cell::RefCell;

use crate::data::Data;
use crate::fallback::mle::log_likelihood_at;
use crate::model::{copy, Model, ModelError, ModelResult};
use crate::optimization::loglik_optimizer::{finite_diff::fd_gradient, Grad, Theta};

/// `∇ℓ(θ)` at the model's current parameters, in pack order.
///
/// Central differences are tried first, then forward differences. The
/// caller's model is not modified.
///
/// # Errors
/// - `NullModel` if the model has no parameters.
/// - The first error raised by the log-likelihood during differencing.
/// - `ModelError::Optimization` if the gradient has non-finite entries.
pub fn numerical_gradient(data: &Data, model: &Model<'_>) -> ModelResult<Grad> {
    let theta = model.require_parameters("score")?.pack();
    let scratch = RefCell::new(copy(model)?);
    let closure_err: RefCell<Option<ModelError>> = RefCell::new(None);
    let ll = |point: &Theta| -> f64 {
        match log_likelihood_at(&mut scratch.borrow_mut(), point, data) {
            Ok(value) => value,
            Err(err) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(err);
                }
                f64::NAN
            }
        }
    };
    fd_gradient(&theta, &ll, &closure_err)
}
