//! Bernoulli distribution. Parameter vector: `[p]`. Any nonzero observation
//! counts as a success.
use std::rc::Rc;

use ndarray::array;
use rand::{Rng, RngCore};

use crate::data::Data;
use crate::distributions::{invalid, mean_of, record_log_likelihood, require_data, store_vector, vector_params};
use crate::model::{Capabilities, CdfFn, Dim, DrawFn, EstimateFn, LogLikelihoodFn, Model, ModelResult};

pub const NAME: &str = "Bernoulli distribution";

struct Bernoulli;

fn success_probability(model: &Model<'_>, operation: &'static str) -> ModelResult<f64> {
    let [p] = vector_params::<1>(model, operation)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(invalid(model, format!("p = {p} is outside [0, 1]")));
    }
    Ok(p)
}

impl EstimateFn for Bernoulli {
    fn estimate<'d>(&self, data: Option<&'d Data>, mut model: Model<'d>) -> ModelResult<Model<'d>> {
        let data = require_data(data, &model, "estimate")?;
        let successes = Data::from_vector(data.values().map(|x| f64::from(u8::from(x != 0.0))).collect());
        let p = mean_of(&successes).unwrap_or(0.0);
        store_vector(&mut model, &[p]);
        record_log_likelihood(&mut model, data);
        Ok(model)
    }
}

impl LogLikelihoodFn for Bernoulli {
    fn log_likelihood(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let p = success_probability(model, "log_likelihood")?;
        Ok(data.values().map(|x| if x != 0.0 { p.ln() } else { (1.0 - p).ln() }).sum())
    }
}

impl DrawFn for Bernoulli {
    fn draw(&self, out: &mut [f64], rng: &mut dyn RngCore, model: &Model<'_>) -> ModelResult<()> {
        let p = success_probability(model, "draw")?;
        if let Some(slot) = out.first_mut() {
            *slot = if rng.gen::<f64>() < p { 1.0 } else { 0.0 };
        }
        Ok(())
    }
}

impl CdfFn for Bernoulli {
    fn cdf(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let p = success_probability(model, "cdf")?;
        let x = data.values().next().ok_or(crate::model::ModelError::EmptyQuery { operation: "cdf" })?;
        Ok(if x < 0.0 {
            0.0
        } else if x < 1.0 {
            1.0 - p
        } else {
            1.0
        })
    }
}

/// Unparameterized Bernoulli model.
pub fn model<'d>() -> Model<'d> {
    let imp = Rc::new(Bernoulli);
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

pub fn with_parameters<'d>(p: f64) -> Model<'d> {
    model().with_parameters(Data::from_vector(array![p]))
}
