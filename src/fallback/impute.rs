//! Maximum-likelihood imputation of missing (NaN) cells.
use std::cell::RefCell;

use log::debug;

use crate::data::{Cell, Data};
use crate::dispatch::log_likelihood;
use crate::model::{Model, ModelResult};
use crate::optimization::errors::OptResult;
use crate::optimization::loglik_optimizer::{
    maximize, validation::validate_theta_input, Cost, LogLikelihood, MLEOptions, Theta,
};
use crate::settings::MleSettings;

/// Log-likelihood of the data as a function of its missing cells.
struct MissingCells<'m, 'd> {
    model: &'m Model<'d>,
    filled: RefCell<Data>,
    cells: Vec<Cell>,
}

impl LogLikelihood for MissingCells<'_, '_> {
    type Data = ();

    fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
        let mut filled = self.filled.borrow_mut();
        for (cell, &value) in self.cells.iter().zip(theta.iter()) {
            filled.set(*cell, value);
        }
        Ok(log_likelihood(&filled, self.model)?)
    }

    fn check(&self, theta: &Theta, _: &()) -> OptResult<()> {
        validate_theta_input(theta, self.cells.len())
    }
}

/// Replace every NaN cell of `data` with the values that maximize the
/// model's log-likelihood of the completed data.
///
/// Matrix cells start from their column's observed mean, vector cells from
/// the vector's observed mean, and 0.0 when nothing is observed. The search
/// uses the model's [`MleSettings`] options if present.
///
/// # Errors
/// Optimizer errors, and errors raised by the model's log-likelihood. `data`
/// is left untouched on error.
pub fn ml_impute(data: &mut Data, model: &Model<'_>) -> ModelResult<()> {
    let cells = data.nan_cells();
    if cells.is_empty() {
        return Ok(());
    }
    let vector_mean = observed_mean(data.vector.iter().flat_map(|v| v.iter().copied()));
    let theta0: Theta = cells
        .iter()
        .map(|cell| match *cell {
            Cell::Matrix(_, col) => data.column_mean(col),
            Cell::Vector(_) => vector_mean,
        })
        .map(|start| start.unwrap_or(0.0))
        .collect();
    let options: MLEOptions = model.settings.get::<MleSettings>().map(|s| s.options.clone()).unwrap_or_default();

    let problem = MissingCells { model, filled: RefCell::new(data.clone()), cells };
    let outcome = maximize(&problem, theta0, &(), &options)?;
    for (cell, &value) in problem.cells.iter().zip(outcome.theta_hat.iter()) {
        data.set(*cell, value);
    }
    debug!("{}: imputed {} cells (log-likelihood {})", model.name, problem.cells.len(), outcome.value);
    Ok(())
}

fn observed_mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.filter(|x| !x.is_nan()).fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    (n > 0).then(|| sum / n as f64)
}
