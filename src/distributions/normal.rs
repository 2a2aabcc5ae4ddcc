//! Univariate normal distribution. Parameter vector: `[μ, σ]`.
use std::rc::Rc;

use ndarray::{array, Array1};
use rand::RngCore;
use rand_distr::{Distribution, Normal as NormalSampler};
use statrs::distribution::{Continuous, ContinuousCDF, Normal as NormalDensity};

use crate::data::Data;
use crate::distributions::{invalid, mean_of, record_log_likelihood, require_data, store_vector, vector_params};
use crate::model::{
    Capabilities, CdfFn, Dim, DrawFn, EstimateFn, LogLikelihoodFn, Model, ModelError, ModelResult, PredictFn,
    ScoreFn,
};

pub const NAME: &str = "Normal distribution";

struct Normal;

fn density(model: &Model<'_>, operation: &'static str) -> ModelResult<NormalDensity> {
    let [mu, sigma] = vector_params::<2>(model, operation)?;
    NormalDensity::new(mu, sigma).map_err(|e| invalid(model, format!("N({mu}, {sigma}): {e}")))
}

impl EstimateFn for Normal {
    /// Sample mean and the maximum-likelihood (divisor `n`) standard
    /// deviation.
    fn estimate<'d>(&self, data: Option<&'d Data>, mut model: Model<'d>) -> ModelResult<Model<'d>> {
        let data = require_data(data, &model, "estimate")?;
        let mu = mean_of(data).unwrap_or(0.0);
        let n = data.values().count() as f64;
        let sigma = (data.values().map(|x| (x - mu).powi(2)).sum::<f64>() / n).sqrt();
        store_vector(&mut model, &[mu, sigma]);
        record_log_likelihood(&mut model, data);
        Ok(model)
    }
}

impl LogLikelihoodFn for Normal {
    fn log_likelihood(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let dist = density(model, "log_likelihood")?;
        Ok(data.values().map(|x| dist.ln_pdf(x)).sum())
    }
}

impl ScoreFn for Normal {
    fn score(&self, data: &Data, out: &mut Array1<f64>, model: &Model<'_>) -> ModelResult<()> {
        let [mu, sigma] = vector_params::<2>(model, "score")?;
        if sigma <= 0.0 {
            return Err(invalid(model, format!("σ = {sigma} must be positive")));
        }
        if out.len() != 2 {
            return Err(ModelError::PackLengthMismatch { expected: 2, found: out.len() });
        }
        let n = data.values().count() as f64;
        let sum = data.values().map(|x| x - mu).sum::<f64>();
        let sum_sq = data.values().map(|x| (x - mu).powi(2)).sum::<f64>();
        out[0] = sum / sigma.powi(2);
        out[1] = -n / sigma + sum_sq / sigma.powi(3);
        Ok(())
    }
}

impl DrawFn for Normal {
    fn draw(&self, out: &mut [f64], rng: &mut dyn RngCore, model: &Model<'_>) -> ModelResult<()> {
        let [mu, sigma] = vector_params::<2>(model, "draw")?;
        let sampler = NormalSampler::new(mu, sigma).map_err(|e| invalid(model, e.to_string()))?;
        if let Some(slot) = out.first_mut() {
            *slot = sampler.sample(rng);
        }
        Ok(())
    }
}

impl CdfFn for Normal {
    fn cdf(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let dist = density(model, "cdf")?;
        let x = data.values().next().ok_or(ModelError::EmptyQuery { operation: "cdf" })?;
        Ok(dist.cdf(x))
    }
}

impl PredictFn for Normal {
    /// Missing cells take the mean.
    fn predict(&self, data: &mut Data, model: &Model<'_>) -> ModelResult<Option<Data>> {
        let [mu, _] = vector_params::<2>(model, "predict")?;
        for cell in data.nan_cells() {
            data.set(cell, mu);
        }
        Ok(None)
    }
}

/// Unparameterized normal model.
pub fn model<'d>() -> Model<'d> {
    let imp = Rc::new(Normal);
    Model::new(NAME)
        .with_dsize(Dim::Fixed(1))
        .with_bases(Dim::Fixed(2), Dim::Fixed(0), Dim::Fixed(0))
        .with_capabilities(Capabilities {
            estimate: Some(imp.clone()),
            log_likelihood: Some(imp.clone()),
            score: Some(imp.clone()),
            draw: Some(imp.clone()),
            cdf: Some(imp.clone()),
            predict: Some(imp),
            ..Capabilities::default()
        })
}

pub fn with_parameters<'d>(mu: f64, sigma: f64) -> Model<'d> {
    model().with_parameters(Data::from_vector(array![mu, sigma]))
}
