//! distributions — concrete models built on the capability table.
//!
//! Purpose
//! -------
//! Provide the distributions the dispatch fallbacks need to return
//! (multivariate normal, normal, PMF) plus a few common families and an
//! ordinary least squares regression. Each module exposes `NAME` and
//! `model()` (unparameterized, ready for `estimate`); the families also have
//! a `with_parameters(..)` constructor.
//!
//! Conventions
//! -----------
//! - Each family implements only the capabilities it has a closed form for;
//!   the rest come from the dispatch fallbacks.
//! - Parameters live in the parameter container's vector (and matrix for the
//!   multivariate normal) in a documented order.
//! - Invalid parameter values are reported as `InvalidParameters`, never as
//!   NaN results.
//! - Closed-form densities use `statrs`; samplers use `rand_distr`.

pub mod bernoulli;
pub mod exponential;
pub mod multivariate_normal;
pub mod normal;
pub mod ols;
pub mod pmf;
pub mod t_distribution;

use log::debug;
use ndarray::Array1;

use crate::data::Data;
use crate::dispatch::log_likelihood;
use crate::model::{Model, ModelError, ModelResult};

pub(crate) fn invalid(model: &Model<'_>, reason: impl Into<String>) -> ModelError {
    ModelError::InvalidParameters { model: model.name.clone(), reason: reason.into() }
}

/// `data`, or `MissingData` for `operation`.
pub(crate) fn require_data<'a>(
    data: Option<&'a Data>, model: &Model<'_>, operation: &'static str,
) -> ModelResult<&'a Data> {
    match data {
        Some(d) if !d.is_empty() => Ok(d),
        _ => Err(ModelError::MissingData { model: model.name.clone(), operation }),
    }
}

/// The first `N` entries of the parameter vector.
pub(crate) fn vector_params<const N: usize>(
    model: &Model<'_>, operation: &'static str,
) -> ModelResult<[f64; N]> {
    let params = model.require_parameters(operation)?;
    let found = params.vector_len();
    let vector = params
        .vector
        .as_ref()
        .filter(|v| v.len() >= N)
        .ok_or(ModelError::PackLengthMismatch { expected: N, found })?;
    let mut out = [0.0; N];
    for (slot, value) in out.iter_mut().zip(vector.iter()) {
        *slot = *value;
    }
    Ok(out)
}

/// Replace the parameter vector with `values`.
pub(crate) fn store_vector(model: &mut Model<'_>, values: &[f64]) {
    model.parameters.get_or_insert_with(Data::default).vector = Some(Array1::from(values.to_vec()));
}

/// Write the log-likelihood of `data` at the fitted parameters to the info
/// page. A likelihood that cannot be evaluated (degenerate fit) is skipped.
pub(crate) fn record_log_likelihood(model: &mut Model<'_>, data: &Data) {
    match log_likelihood(data, model) {
        Ok(ll) => model.info.get_or_insert_with(Data::default).set_named("log-likelihood", ll),
        Err(e) => debug!("{}: no log-likelihood for the fit: {e}", model.name),
    }
}

/// Mean of every value in `data`.
pub(crate) fn mean_of(data: &Data) -> Option<f64> {
    let (sum, n) = data.values().fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    (n > 0).then(|| sum / n as f64)
}
