//! Likelihood operations: `p`, `log_likelihood`, and `score`.
use log::debug;
use ndarray::Array1;

use crate::data::Data;
use crate::dispatch::{has_likelihood, missing};
use crate::fallback::numerical_gradient;
use crate::model::{Model, ModelError, ModelResult};

/// Probability (or density) of `data` under `model`.
///
/// Uses the `p` capability, else `exp` of the `log_likelihood` capability.
///
/// # Errors
/// `MissingCapability` if the model has neither; errors from the capability.
pub fn p(data: &Data, model: &Model<'_>) -> ModelResult<f64> {
    if let Some(cap) = &model.capabilities.p {
        return cap.p(data, model);
    }
    if let Some(cap) = &model.capabilities.log_likelihood {
        return cap.log_likelihood(data, model).map(f64::exp);
    }
    Err(missing(model, "p"))
}

/// Log-likelihood of `data` under `model`.
///
/// Uses the `log_likelihood` capability, else `ln` of the `p` capability.
///
/// # Errors
/// `MissingCapability` if the model has neither; errors from the capability.
pub fn log_likelihood(data: &Data, model: &Model<'_>) -> ModelResult<f64> {
    if let Some(cap) = &model.capabilities.log_likelihood {
        return cap.log_likelihood(data, model);
    }
    if let Some(cap) = &model.capabilities.p {
        return cap.p(data, model).map(f64::ln);
    }
    Err(missing(model, "log_likelihood"))
}

/// Gradient of the log-likelihood with respect to the packed parameters,
/// written into `out`.
///
/// Uses the `score` capability, else finite differences of
/// [`log_likelihood`].
///
/// # Errors
/// - `MissingCapability` without a score or any likelihood.
/// - `NullModel` if the model has no parameters.
/// - `PackLengthMismatch` if `out` does not match the packed parameter count.
pub fn score(data: &Data, out: &mut Array1<f64>, model: &Model<'_>) -> ModelResult<()> {
    if let Some(cap) = &model.capabilities.score {
        return cap.score(data, out, model);
    }
    if !has_likelihood(model) {
        return Err(missing(model, "score"));
    }
    let expected = model.require_parameters("score")?.packed_len();
    if out.len() != expected {
        return Err(ModelError::PackLengthMismatch { expected, found: out.len() });
    }
    debug!("{}: no score capability; differencing the log-likelihood", model.name);
    let grad = numerical_gradient(data, model)?;
    out.assign(&grad);
    Ok(())
}
