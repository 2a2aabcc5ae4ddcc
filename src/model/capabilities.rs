//! Narrow per-operation traits a model may implement, and the slot table that
//! holds them.
//!
//! A model type supplies only the operations it has a closed form for; the
//! dispatcher fills the gaps. Each trait is object safe and stored as
//! `Rc<dyn _>`, so copying a model shares its behavior table.
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use ndarray::Array1;
use rand::RngCore;

use crate::data::Data;
use crate::model::errors::ModelResult;
use crate::model::Model;

/// Fit a model to data. Receives an already prepared copy and returns the
/// estimated model.
pub trait EstimateFn {
    fn estimate<'d>(&self, data: Option<&'d Data>, model: Model<'d>) -> ModelResult<Model<'d>>;
}

/// Probability (or density) of a data set under the model's parameters.
pub trait ProbabilityFn {
    fn p(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64>;
}

/// Log-likelihood of a data set under the model's parameters.
pub trait LogLikelihoodFn {
    fn log_likelihood(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64>;
}

/// Gradient of the log-likelihood with respect to the packed parameters,
/// written into `out`.
pub trait ScoreFn {
    fn score(&self, data: &Data, out: &mut Array1<f64>, model: &Model<'_>) -> ModelResult<()>;
}

/// Fill `out` with one draw.
pub trait DrawFn {
    fn draw(&self, out: &mut [f64], rng: &mut dyn RngCore, model: &Model<'_>) -> ModelResult<()>;
}

/// Fill missing cells in place (`Ok(None)`) or return a replacement data set.
pub trait PredictFn {
    fn predict(&self, data: &mut Data, model: &Model<'_>) -> ModelResult<Option<Data>>;
}

/// Cumulative probability of the first row of `data`.
pub trait CdfFn {
    fn cdf(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64>;
}

/// Model-specific preparation; replaces the default size resolution.
pub trait PrepFn {
    fn prep<'d>(&self, data: Option<&'d Data>, model: &mut Model<'d>) -> ModelResult<()>;
}

/// Model-specific text rendering.
pub trait PrintFn {
    fn print(&self, model: &Model<'_>, out: &mut dyn Write) -> io::Result<()>;
}

/// Distribution of the model's parameter estimates.
pub trait ParameterModelFn {
    fn parameter_model<'d>(
        &self, data: Option<&'d Data>, model: &mut Model<'d>,
    ) -> ModelResult<Model<'d>>;
}

/// Optional capability slots. A `None` slot makes the dispatcher fall back.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub estimate: Option<Rc<dyn EstimateFn>>,
    pub p: Option<Rc<dyn ProbabilityFn>>,
    pub log_likelihood: Option<Rc<dyn LogLikelihoodFn>>,
    pub score: Option<Rc<dyn ScoreFn>>,
    pub draw: Option<Rc<dyn DrawFn>>,
    pub predict: Option<Rc<dyn PredictFn>>,
    pub cdf: Option<Rc<dyn CdfFn>>,
    pub prep: Option<Rc<dyn PrepFn>>,
    pub print: Option<Rc<dyn PrintFn>>,
    pub parameter_model: Option<Rc<dyn ParameterModelFn>>,
}

impl Capabilities {
    /// Names of the filled slots, in declaration order.
    pub fn present(&self) -> Vec<&'static str> {
        let slots = [
            ("estimate", self.estimate.is_some()),
            ("p", self.p.is_some()),
            ("log_likelihood", self.log_likelihood.is_some()),
            ("score", self.score.is_some()),
            ("draw", self.draw.is_some()),
            ("predict", self.predict.is_some()),
            ("cdf", self.cdf.is_some()),
            ("prep", self.prep.is_some()),
            ("print", self.print.is_some()),
            ("parameter_model", self.parameter_model.is_some()),
        ];
        slots.iter().filter(|(_, set)| *set).map(|(name, _)| *name).collect()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.present()).finish()
    }
}
