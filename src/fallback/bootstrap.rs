//! Bootstrap covariance of a model's parameter estimates.
use log::debug;
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore};

use crate::data::Data;
use crate::dispatch::estimate;
use crate::model::{Model, ModelError, ModelResult};

/// Covariance of the packed parameter estimates over `iterations` bootstrap
/// samples of `data`.
///
/// Each sample draws `observation_count` rows with replacement (vector,
/// matrix and weights together) and re-estimates a copy of `model`. The
/// result is the sample covariance of the estimates (divisor `n - 1`).
///
/// # Errors
/// - `MissingData` if `data` has no observations.
/// - `SamplingFailed` if fewer than two iterations are requested.
/// - `NullModel` or `PackLengthMismatch` if an estimate comes back without
///   parameters or with a different parameter count.
/// - Any error from [`estimate`].
pub fn bootstrap_cov(
    data: &Data, model: &Model<'_>, rng: &mut dyn RngCore, iterations: usize,
) -> ModelResult<Array2<f64>> {
    let n = data.observation_count();
    if n == 0 {
        return Err(ModelError::MissingData { model: model.name.clone(), operation: "bootstrap" });
    }
    if iterations < 2 {
        return Err(ModelError::SamplingFailed {
            model: model.name.clone(),
            reason: "a bootstrap covariance needs at least two resamples",
        });
    }

    let mut estimates: Vec<Array1<f64>> = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        let sample = data.select_rows(&rows);
        let fitted = estimate(Some(&sample), model)?;
        let packed = fitted.packed_parameters().ok_or(ModelError::NullModel { operation: "bootstrap" })?;
        if let Some(first) = estimates.first() {
            if first.len() != packed.len() {
                return Err(ModelError::PackLengthMismatch { expected: first.len(), found: packed.len() });
            }
        }
        estimates.push(packed);
    }
    debug!("{}: bootstrapped {iterations} estimates from {n} observations", model.name);

    let k = estimates.first().map_or(0, Array1::len);
    let stacked = Array2::from_shape_fn((iterations, k), |(r, c)| estimates[r][c]);
    Ok(sample_covariance(&stacked))
}

/// Column covariance of `rows` with divisor `n - 1`.
pub(crate) fn sample_covariance(rows: &Array2<f64>) -> Array2<f64> {
    let n = rows.nrows();
    let k = rows.ncols();
    match rows.mean_axis(Axis(0)) {
        Some(mean) if n > 1 => {
            let centered = rows - &mean;
            centered.t().dot(&centered) / (n - 1) as f64
        }
        _ => Array2::zeros((k, k)),
    }
}
