//! Exponential distribution. Parameter vector: `[λ]` (rate).
use std::rc::Rc;

use ndarray::array;
use rand::RngCore;
use rand_distr::{Distribution, Exp as ExpSampler};
use statrs::distribution::{Continuous, ContinuousCDF, Exp as ExpDensity};

use crate::data::Data;
use crate::distributions::{invalid, mean_of, record_log_likelihood, require_data, store_vector, vector_params};
use crate::model::{Capabilities, CdfFn, Dim, DrawFn, EstimateFn, LogLikelihoodFn, Model, ModelError, ModelResult};

pub const NAME: &str = "Exponential distribution";

struct Exponential;

fn density(model: &Model<'_>, operation: &'static str) -> ModelResult<ExpDensity> {
    let [rate] = vector_params::<1>(model, operation)?;
    ExpDensity::new(rate).map_err(|e| invalid(model, format!("Exp({rate}): {e}")))
}

impl EstimateFn for Exponential {
    fn estimate<'d>(&self, data: Option<&'d Data>, mut model: Model<'d>) -> ModelResult<Model<'d>> {
        let data = require_data(data, &model, "estimate")?;
        let mean = mean_of(data).unwrap_or(0.0);
        if mean <= 0.0 {
            return Err(invalid(&model, format!("sample mean {mean} gives no positive rate")));
        }
        store_vector(&mut model, &[1.0 / mean]);
        record_log_likelihood(&mut model, data);
        Ok(model)
    }
}

impl LogLikelihoodFn for Exponential {
    /// Observations below zero contribute `-∞`.
    fn log_likelihood(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let dist = density(model, "log_likelihood")?;
        Ok(data.values().map(|x| dist.ln_pdf(x)).sum())
    }
}

impl DrawFn for Exponential {
    fn draw(&self, out: &mut [f64], rng: &mut dyn RngCore, model: &Model<'_>) -> ModelResult<()> {
        let [rate] = vector_params::<1>(model, "draw")?;
        let sampler = ExpSampler::new(rate).map_err(|e| invalid(model, e.to_string()))?;
        if let Some(slot) = out.first_mut() {
            *slot = sampler.sample(rng);
        }
        Ok(())
    }
}

impl CdfFn for Exponential {
    fn cdf(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let dist = density(model, "cdf")?;
        let x = data.values().next().ok_or(ModelError::EmptyQuery { operation: "cdf" })?;
        Ok(dist.cdf(x))
    }
}

/// Unparameterized exponential model.
pub fn model<'d>() -> Model<'d> {
    let imp = Rc::new(Exponential);
    Model::new(NAME)
        .with_dsize(Dim::Fixed(1))
        .with_bases(Dim::Fixed(1), Dim::Fixed(0), Dim::Fixed(0))
        .with_capabilities(Capabilities {
            estimate: Some(imp.clone()),
            log_likelihood: Some(imp.clone()),
            draw: Some(imp.clone()),
            cdf: Some(imp),
            ..Capabilities::default()
        })
}

pub fn with_parameters<'d>(rate: f64) -> Model<'d> {
    model().with_parameters(Data::from_vector(array![rate]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{cdf, log_likelihood, p};
    use approx::assert_abs_diff_eq;

    #[test]
    // Purpose
    // -------
    // Density, probability and CDF follow the closed forms.
    //
    // Given
    // -----
    // - Exp(2) at x = 0.5.
    //
    // Expect
    // ------
    // - ℓ = ln 2 - 1, p = 2e⁻¹, F = 1 - e⁻¹.
    fn closed_forms() {
        let mut m = with_parameters(2.0);
        let x = Data::from_vector(array![0.5]);
        assert_abs_diff_eq!(log_likelihood(&x, &m).unwrap(), 2f64.ln() - 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p(&x, &m).unwrap(), 2.0 * (-1f64).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(cdf(&x, &mut m).unwrap(), 1.0 - (-1f64).exp(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A negative observation has zero density.
    //
    // Given
    // -----
    // - Exp(1) at x = -1.
    //
    // Expect
    // ------
    // - ℓ = -∞.
    fn negative_observation_has_no_mass() {
        let ll = log_likelihood(&Data::from_vector(array![-1.0]), &with_parameters(1.0)).unwrap();
        assert_eq!(ll, f64::NEG_INFINITY);
    }
}
