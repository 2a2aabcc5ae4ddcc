//! Empirical probability mass function.
//!
//! The parameter container is the support itself: each observation (matrix
//! row, or vector entry without a matrix) is one support point, and the
//! container's weights give its mass (equal masses when absent).
use std::rc::Rc;

use ndarray::{Array1, ArrayView1};
use rand::{Rng, RngCore};

use crate::data::Data;
use crate::distributions::{invalid, require_data};
use crate::model::{Capabilities, CdfFn, Dim, DrawFn, EstimateFn, Model, ModelError, ModelResult, ProbabilityFn};

pub const NAME: &str = "PMF";

struct Pmf;

/// Support observations with their masses, normalized to sum to one.
struct Support<'a> {
    points: &'a Data,
    masses: Array1<f64>,
}

impl<'a> Support<'a> {
    fn new(model: &'a Model<'_>, operation: &'static str) -> ModelResult<Self> {
        let points = model.require_parameters(operation)?;
        let n = points.observation_count();
        if n == 0 {
            return Err(invalid(model, "the support is empty"));
        }
        let weights = points.weights.clone().unwrap_or_else(|| Array1::ones(n));
        if weights.len() != n {
            return Err(invalid(model, format!("{} weights for {n} support points", weights.len())));
        }
        let total = weights.sum();
        if !(total > 0.0) || weights.iter().any(|w| *w < 0.0) {
            return Err(invalid(model, "weights must be non-negative with a positive total"));
        }
        Ok(Self { points, masses: weights / total })
    }

    fn width(&self) -> usize {
        self.points.width()
    }

    /// `(point, mass)` pairs in support order.
    fn iter(&self) -> impl Iterator<Item = (Array1<f64>, f64)> + '_ {
        (0..self.masses.len()).filter_map(|i| self.points.observation(i).map(|point| (point, self.masses[i])))
    }

    fn mass_of(&self, x: ArrayView1<'_, f64>) -> f64 {
        self.iter().filter(|(point, _)| point.view() == x).map(|(_, mass)| mass).sum()
    }
}

impl EstimateFn for Pmf {
    /// The data becomes the support. Weights are kept; the data is copied.
    fn estimate<'d>(&self, data: Option<&'d Data>, mut model: Model<'d>) -> ModelResult<Model<'d>> {
        let data = require_data(data, &model, "estimate")?;
        let mut support = data.clone();
        support.title = String::new();
        support.error = None;
        model.dsize = Dim::Fixed(support.width());
        model.parameters = Some(support);
        Ok(model)
    }
}

impl ProbabilityFn for Pmf {
    /// Product over the observations of `data` of their support mass.
    fn p(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let support = Support::new(model, "p")?;
        let mut prob = 1.0;
        for i in 0..data.observation_count() {
            let Some(x) = data.observation(i) else { continue };
            if x.len() != support.width() {
                return Err(ModelError::QueryWidthMismatch { expected: support.width(), found: x.len() });
            }
            prob *= support.mass_of(x.view());
        }
        Ok(prob)
    }
}

impl DrawFn for Pmf {
    fn draw(&self, out: &mut [f64], rng: &mut dyn RngCore, model: &Model<'_>) -> ModelResult<()> {
        let support = Support::new(model, "draw")?;
        if out.len() < support.width() {
            return Err(ModelError::PackLengthMismatch { expected: support.width(), found: out.len() });
        }
        let mut target = rng.gen::<f64>();
        let last = support.masses.len() - 1;
        let chosen = support
            .masses
            .iter()
            .position(|mass| {
                target -= mass;
                target < 0.0
            })
            .unwrap_or(last);
        if let Some(point) = support.points.observation(chosen) {
            for (slot, value) in out.iter_mut().zip(point.iter()) {
                *slot = *value;
            }
        }
        Ok(())
    }
}

impl CdfFn for Pmf {
    /// Mass of the support points componentwise at most the first row.
    fn cdf(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let support = Support::new(model, "cdf")?;
        let query = data.first_row().ok_or(ModelError::EmptyQuery { operation: "cdf" })?;
        if query.len() < support.width() {
            return Err(ModelError::QueryWidthMismatch { expected: support.width(), found: query.len() });
        }
        Ok(support
            .iter()
            .filter(|(point, _)| point.iter().zip(query.iter()).all(|(p, q)| p <= q))
            .map(|(_, mass)| mass)
            .sum())
    }
}

/// Unparameterized PMF; `estimate` turns data into the support.
pub fn model<'d>() -> Model<'d> {
    let imp = Rc::new(Pmf);
    Model::new(NAME)
        .with_dsize(Dim::DataWidth)
        .with_bases(Dim::Fixed(0), Dim::Fixed(0), Dim::Fixed(0))
        .with_capabilities(Capabilities {
            estimate: Some(imp.clone()),
            p: Some(imp.clone()),
            draw: Some(imp.clone()),
            cdf: Some(imp),
            ..Capabilities::default()
        })
}

/// PMF over `support` as given.
pub fn from_support<'d>(support: Data) -> Model<'d> {
    let width = support.width();
    model().with_dsize(Dim::Fixed(width)).with_parameters(support)
}

/// Univariate PMF over column `col` of a PMF's support, with the same
/// masses.
///
/// # Errors
/// `NullModel` without a support; `IndexOutOfRange` if `col` is not a
/// support column.
pub fn marginal<'d>(joint: &Model<'_>, col: usize) -> ModelResult<Model<'d>> {
    let support = joint.require_parameters("marginal")?;
    let width = support.width();
    if col >= width {
        return Err(ModelError::IndexOutOfRange { index: col, len: width });
    }
    let column: Array1<f64> =
        (0..support.observation_count()).filter_map(|i| support.observation(i).map(|row| row[col])).collect();
    let mut points = Data::from_vector(column);
    points.weights = support.weights.clone();
    Ok(from_support(points))
}
