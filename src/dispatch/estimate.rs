//! Estimation and the distribution of parameter estimates.
use log::debug;
use ndarray::{Array1, Array2};

use crate::data::Data;
use crate::distributions::{multivariate_normal, normal, pmf};
use crate::fallback::{bootstrap_cov, maximum_likelihood};
use crate::model::{copy, free, prep, Model, ModelError, ModelResult};
use crate::settings::{ParamIndex, PmSettings};

/// Fit a copy of `model` to `data`.
///
/// The copy is prepared against `data`, then passed to the `estimate`
/// capability, or to the maximum-likelihood fallback when there is none.
/// The caller's model is never modified.
///
/// # Errors
/// Errors from [`copy`], [`prep`], the capability, or the fallback. On
/// failure the partially built copy is dropped.
pub fn estimate<'d>(data: Option<&'d Data>, model: &Model<'d>) -> ModelResult<Model<'d>> {
    let mut out = copy(model)?;
    prep(data, &mut out)?;
    match out.capabilities.estimate.clone() {
        Some(cap) => cap.estimate(data, out),
        None => {
            debug!("{}: no estimate capability; maximizing the likelihood", out.name);
            maximum_likelihood(data, out)
        }
    }
}

/// Distribution of the model's parameter estimates.
///
/// A [`PmSettings`] group is attached to `model` first if absent. The
/// `parameter_model` capability is used when present. Otherwise:
/// - with data, the packed parameters are treated as normal with the
///   bootstrap covariance: the joint multivariate normal for
///   `ParamIndex::All`, or the univariate normal of one parameter;
/// - without data, `draws` estimates of `model` are stacked into an
///   empirical PMF: over whole rows for `ParamIndex::All`, or over one
///   column.
///
/// # Errors
/// - `SettingsMismatch` if the `parameter_model` name holds another type.
/// - `NullModel` when bootstrapping a model without parameters.
/// - `IndexOutOfRange` if the selected parameter does not exist.
/// - `InvalidParameters` if a selected bootstrap variance is not positive.
/// - Errors from the bootstrap, the repeated estimates, or the capability.
pub fn parameter_model<'d>(data: Option<&'d Data>, model: &mut Model<'d>) -> ModelResult<Model<'d>> {
    if model.settings.get_or_insert_with(PmSettings::default).is_none() {
        return Err(ModelError::SettingsMismatch { group: "parameter_model".to_string() });
    }
    if let Some(cap) = model.capabilities.parameter_model.clone() {
        return cap.parameter_model(data, model);
    }
    match data {
        Some(observed) => bootstrap_normal(observed, model),
        None => simulated_pmf(model),
    }
}

fn bootstrap_normal<'d>(data: &Data, model: &mut Model<'d>) -> ModelResult<Model<'d>> {
    let point = model.require_parameters("parameter_model")?.pack();
    let (index, cov) = model.with_settings_group::<PmSettings, _>(|pm, model| {
        let draws = pm.draws;
        let cov = pm.rng.with(|rng| bootstrap_cov(data, model, rng, draws))?;
        Ok((pm.index, cov))
    })?;
    if cov.dim() != (point.len(), point.len()) {
        return Err(ModelError::PackLengthMismatch { expected: point.len(), found: cov.nrows() });
    }
    debug!("{}: parameter model from {} bootstrap estimates", model.name, cov.nrows());

    let joint = multivariate_normal::with_parameters(point, cov);
    match index {
        ParamIndex::All => Ok(joint),
        ParamIndex::Single(i) => {
            let marginal = marginal_normal(&joint, i)?;
            free(Some(joint));
            Ok(marginal)
        }
    }
}

/// Univariate normal of coordinate `i` of a multivariate normal.
fn marginal_normal<'d>(joint: &Model<'_>, i: usize) -> ModelResult<Model<'d>> {
    let params = joint.require_parameters("parameter_model")?;
    let (Some(mean), Some(cov)) = (params.vector.as_ref(), params.matrix.as_ref()) else {
        return Err(ModelError::NullModel { operation: "parameter_model" });
    };
    if i >= mean.len() {
        return Err(ModelError::IndexOutOfRange { index: i, len: mean.len() });
    }
    let variance = cov[[i, i]];
    if !(variance > 0.0 && variance.is_finite()) {
        return Err(ModelError::InvalidParameters {
            model: joint.name.clone(),
            reason: format!("bootstrap variance of parameter {i} is {variance}"),
        });
    }
    Ok(normal::with_parameters(mean[i], variance.sqrt()))
}

fn simulated_pmf<'d>(model: &mut Model<'d>) -> ModelResult<Model<'d>> {
    let (index, draws) = model
        .settings
        .get::<PmSettings>()
        .map(|pm| (pm.index, pm.draws))
        .ok_or(ModelError::SettingsMismatch { group: "parameter_model".to_string() })?;

    let mut rows: Vec<Array1<f64>> = Vec::with_capacity(draws);
    for _ in 0..draws {
        let fitted = estimate(None, model)?;
        let packed = fitted.packed_parameters().ok_or(ModelError::NullModel { operation: "parameter_model" })?;
        if let Some(first) = rows.first() {
            if first.len() != packed.len() {
                return Err(ModelError::PackLengthMismatch { expected: first.len(), found: packed.len() });
            }
        }
        rows.push(packed);
    }
    let width = rows.first().map_or(0, Array1::len);
    debug!("{}: parameter model from {draws} simulated estimates", model.name);

    let stacked = Data::from_matrix(Array2::from_shape_fn((rows.len(), width), |(r, c)| rows[r][c]));
    let joint = estimate(Some(&stacked), &pmf::model())?.into_detached();
    match index {
        ParamIndex::All => Ok(joint),
        ParamIndex::Single(i) => {
            if i >= width {
                return Err(ModelError::IndexOutOfRange { index: i, len: width });
            }
            let marginal = pmf::marginal(&joint, i)?;
            free(Some(joint));
            Ok(marginal)
        }
    }
}
