//! Location-scale Student's t distribution. Parameter vector: `[μ, σ, ν]`
//! (location, scale, degrees of freedom).
//!
//! Returned by the regression model as the distribution of one coefficient.
//! There is no closed-form estimator; `estimate` goes through maximum
//! likelihood.
use std::rc::Rc;

use ndarray::array;
use rand::RngCore;
use rand_distr::{Distribution, StudentT as StudentTSampler};
use statrs::distribution::{Continuous, ContinuousCDF, StudentsT};

use crate::data::Data;
use crate::distributions::{invalid, vector_params};
use crate::model::{Capabilities, CdfFn, Dim, DrawFn, LogLikelihoodFn, Model, ModelError, ModelResult};

pub const NAME: &str = "t distribution";

struct TDistribution;

fn density(model: &Model<'_>, operation: &'static str) -> ModelResult<StudentsT> {
    let [mu, sigma, df] = vector_params::<3>(model, operation)?;
    StudentsT::new(mu, sigma, df).map_err(|e| invalid(model, format!("t({mu}, {sigma}, {df}): {e}")))
}

impl LogLikelihoodFn for TDistribution {
    fn log_likelihood(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let dist = density(model, "log_likelihood")?;
        Ok(data.values().map(|x| dist.ln_pdf(x)).sum())
    }
}

impl DrawFn for TDistribution {
    /// `μ + σ T` with `T` a standard t variate on `ν` degrees of freedom.
    fn draw(&self, out: &mut [f64], rng: &mut dyn RngCore, model: &Model<'_>) -> ModelResult<()> {
        let [mu, sigma, df] = vector_params::<3>(model, "draw")?;
        if !(sigma > 0.0) {
            return Err(invalid(model, format!("σ = {sigma} must be positive")));
        }
        let sampler = StudentTSampler::new(df).map_err(|e| invalid(model, e.to_string()))?;
        if let Some(slot) = out.first_mut() {
            *slot = mu + sigma * sampler.sample(rng);
        }
        Ok(())
    }
}

impl CdfFn for TDistribution {
    fn cdf(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let dist = density(model, "cdf")?;
        let x = data.values().next().ok_or(ModelError::EmptyQuery { operation: "cdf" })?;
        Ok(dist.cdf(x))
    }
}

/// Unparameterized t model.
pub fn model<'d>() -> Model<'d> {
    let imp = Rc::new(TDistribution);
    Model::new(NAME)
        .with_dsize(Dim::Fixed(1))
        .with_bases(Dim::Fixed(3), Dim::Fixed(0), Dim::Fixed(0))
        .with_capabilities(Capabilities {
            log_likelihood: Some(imp.clone()),
            draw: Some(imp.clone()),
            cdf: Some(imp),
            ..Capabilities::default()
        })
}

pub fn with_parameters<'d>(mu: f64, sigma: f64, df: f64) -> Model<'d> {
    model().with_parameters(Data::from_vector(array![mu, sigma, df]))
}
