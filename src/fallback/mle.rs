//! Maximum-likelihood estimation over a model's packed parameters.
//!
//! The model's parameter container is flattened with [`Data::pack`]; the
//! optimizer works on that vector and every evaluation unpacks it into a
//! scratch copy of the model before calling the dispatched log-likelihood.
use std::cell::RefCell;

use log::debug;
use ndarray::Array1;

use crate::data::Data;
use crate::dispatch::log_likelihood;
use crate::model::{copy, Model, ModelError, ModelResult};
use crate::optimization::errors::OptResult;
use crate::optimization::loglik_optimizer::{
    maximize, validation::validate_theta_input, Cost, LogLikelihood, Theta,
};
use crate::settings::MleSettings;

/// Log-likelihood of a model as a function of its packed parameters.
pub struct ParameterProblem<'d> {
    scratch: RefCell<Model<'d>>,
}

impl<'d> ParameterProblem<'d> {
    /// Wrap an independent copy of `model`.
    ///
    /// # Errors
    /// Any error from [`copy`].
    pub fn new(model: &Model<'d>) -> ModelResult<Self> {
        Ok(Self { scratch: RefCell::new(copy(model)?) })
    }

    /// Number of packed parameters the problem expects.
    pub fn dim(&self) -> usize {
        self.scratch.borrow().parameters.as_ref().map_or(0, Data::packed_len)
    }
}

impl LogLikelihood for ParameterProblem<'_> {
    type Data = Data;

    fn value(&self, theta: &Theta, data: &Data) -> OptResult<Cost> {
        let mut model = self.scratch.borrow_mut();
        Ok(log_likelihood_at(&mut model, theta, data)?)
    }

    fn check(&self, theta: &Theta, _data: &Data) -> OptResult<()> {
        validate_theta_input(theta, self.dim())
    }
}

/// Unpack `theta` into `model`'s parameters and evaluate the log-likelihood.
pub(crate) fn log_likelihood_at(model: &mut Model<'_>, theta: &Theta, data: &Data) -> ModelResult<f64> {
    model
        .parameters
        .as_mut()
        .ok_or(ModelError::NullModel { operation: "log_likelihood" })?
        .unpack(theta.view())?;
    log_likelihood(data, model)
}

/// Estimate `model` by maximizing its log-likelihood on `data`.
///
/// `model` must already be prepared (parameters allocated). The search
/// starts at the [`MleSettings`] starting point, or at 1.0 for every packed
/// parameter, and uses the group's optimizer options. On success the
/// parameters hold `θ̂` and the info page records `log-likelihood`,
/// `iterations`, and `converged` (1 or 0).
///
/// # Errors
/// - `NullModel` if the model has no parameters.
/// - Optimizer errors as `ModelError::Optimization`; errors raised by the
///   model's own log-likelihood come back unchanged.
pub fn maximum_likelihood<'d>(data: Option<&'d Data>, mut model: Model<'d>) -> ModelResult<Model<'d>> {
    let settings = model.settings.get::<MleSettings>().cloned().unwrap_or_default();
    let dim = model.require_parameters("estimate")?.packed_len();
    if dim == 0 {
        debug!("{}: no free parameters; nothing to maximize", model.name);
        return Ok(model);
    }
    let theta0 = settings.starting_point.clone().unwrap_or_else(|| Array1::from_elem(dim, 1.0));

    let empty = Data::default();
    let observed = data.unwrap_or(&empty);
    let problem = ParameterProblem::new(&model)?;
    let outcome = maximize(&problem, theta0, observed, &settings.options)?;
    debug!(
        "{}: maximum likelihood {} after {} iterations ({})",
        model.name, outcome.value, outcome.iterations, outcome.status
    );

    model
        .parameters
        .as_mut()
        .ok_or(ModelError::NullModel { operation: "estimate" })?
        .unpack(outcome.theta_hat.view())?;
    let info = model.info.get_or_insert_with(Data::default);
    info.set_named("log-likelihood", outcome.value);
    info.set_named("iterations", outcome.iterations as f64);
    info.set_named("converged", if outcome.converged { 1.0 } else { 0.0 });
    Ok(model)
}
