//! Ordinary least squares regression.
//!
//! Purpose
//! -------
//! A linear model `y = Xβ + ε` with normal errors, and the one bundled model
//! that fills every capability slot except `p` and `cdf`: estimation in closed
//! form, a custom prep, log-likelihood and exact score, regressor-driven
//! draws, prediction of the dependent variable, a closed-form parameter model,
//! and a regression-table print.
//!
//! Data layout
//! -----------
//! - With a vector: the vector is `y` and the matrix is `X` as given (include
//!   a column of ones for an intercept).
//! - Without a vector: matrix column 0 is `y`, and for the regression it is
//!   replaced by a column of ones, so `X = [1, x₁, …]`.
//! - Weights, when present, weight each observation's squared error.
//!
//! Parameters
//! ----------
//! The vector holds `β` (one coefficient per matrix column, the constant
//! first) and the matrix holds `Cov(β̂) = s² (XᵀX)⁻¹` with
//! `s² = SSE / (n - k)`. The info page records `SSE`, `SSR`, `SST`,
//! `R squared`, `df`, and `log-likelihood`.
use std::io::{self, Write};
use std::rc::Rc;

use log::debug;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;
use statrs::distribution::{Continuous, Normal as NormalDensity};

use crate::data::Data;
use crate::distributions::{invalid, multivariate_normal, record_log_likelihood, require_data, t_distribution};
use crate::impl_settings_group;
use crate::model::{
    clear, Capabilities, Dim, DrawFn, EstimateFn, LogLikelihoodFn, Model, ModelError, ModelResult,
    ParameterModelFn, PredictFn, PrepFn, PrintFn, ScoreFn,
};
use crate::settings::{ParamIndex, PmSettings};

pub const NAME: &str = "Ordinary Least Squares";

/// Distribution of the regressors, used by `draw`.
///
/// The input model draws the `k - 1` non-constant regressors of one row.
/// Copies of the group share the input model.
#[derive(Debug, Clone, Default)]
pub struct LmSettings {
    pub input_distribution: Option<Rc<Model<'static>>>,
}

impl LmSettings {
    pub fn with_input_distribution(mut self, input: Model<'static>) -> Self {
        self.input_distribution = Some(Rc::new(input));
        self
    }
}

impl_settings_group!(LmSettings, "lm");

struct Ols;

/// Dependent variable and design matrix read from a data set.
struct Design {
    y: Array1<f64>,
    x: Array2<f64>,
}

impl Design {
    fn new(data: &Data, model: &Model<'_>, operation: &'static str) -> ModelResult<Self> {
        let matrix = data
            .matrix
            .as_ref()
            .filter(|m| m.nrows() > 0 && m.ncols() > 0)
            .ok_or_else(|| ModelError::MissingData { model: model.name.clone(), operation })?;
        match &data.vector {
            Some(y) => {
                if y.len() != matrix.nrows() {
                    return Err(ModelError::PackLengthMismatch { expected: matrix.nrows(), found: y.len() });
                }
                Ok(Self { y: y.clone(), x: matrix.clone() })
            }
            None => {
                let y = matrix.column(0).to_owned();
                let mut x = matrix.clone();
                x.column_mut(0).fill(1.0);
                Ok(Self { y, x })
            }
        }
    }

    fn check_width(&self, beta: &Array1<f64>) -> ModelResult<()> {
        if self.x.ncols() != beta.len() {
            return Err(ModelError::QueryWidthMismatch { expected: beta.len(), found: self.x.ncols() });
        }
        Ok(())
    }

    /// `X` and `y` with each row scaled by the square root of its weight.
    fn weighted(&self, weights: Option<&Array1<f64>>, model: &Model<'_>) -> ModelResult<(Array2<f64>, Array1<f64>)> {
        let Some(w) = weights else {
            return Ok((self.x.clone(), self.y.clone()));
        };
        if w.len() != self.y.len() {
            return Err(ModelError::PackLengthMismatch { expected: self.y.len(), found: w.len() });
        }
        if w.iter().any(|v| !(*v >= 0.0)) {
            return Err(invalid(model, "weights must be non-negative"));
        }
        let root = w.mapv(f64::sqrt);
        let x = &self.x * &root.view().insert_axis(Axis(1));
        let y = &self.y * &root;
        Ok((x, y))
    }

    /// Errors `Xβ - y`.
    fn errors(&self, beta: &Array1<f64>) -> Array1<f64> {
        self.x.dot(beta) - &self.y
    }
}

/// Coefficients and, once estimated, their covariance.
fn fitted_parts<'m>(
    model: &'m Model<'_>, operation: &'static str,
) -> ModelResult<(&'m Array1<f64>, Option<&'m Array2<f64>>)> {
    let params = model.require_parameters(operation)?;
    let beta = params.vector.as_ref().filter(|b| !b.is_empty()).ok_or(ModelError::NullModel { operation })?;
    Ok((beta, params.matrix.as_ref()))
}

/// Standard deviation (divisor `n - 1`) of the errors.
fn error_spread(errors: &Array1<f64>, model: &Model<'_>) -> ModelResult<f64> {
    let n = errors.len();
    if n < 2 {
        return Err(invalid(model, "the error spread needs at least two observations"));
    }
    let mean = errors.sum() / n as f64;
    let sigma = (errors.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt();
    if !(sigma > 0.0 && sigma.is_finite()) {
        return Err(invalid(model, format!("the errors have spread {sigma}")));
    }
    Ok(sigma)
}

fn label(params: &Data, i: usize) -> String {
    match params.row_names.get(i).filter(|n| !n.is_empty()) {
        Some(name) => name.clone(),
        None if i == 0 => "1".to_string(),
        None => format!("x{i}"),
    }
}

impl PrepFn for Ols {
    /// Rejects data without a regressor matrix, then applies the default
    /// sizing: one coefficient per matrix column and a square covariance.
    fn prep<'d>(&self, data: Option<&'d Data>, model: &mut Model<'d>) -> ModelResult<()> {
        if let Some(d) = data {
            if d.matrix.as_ref().map_or(true, |m| m.ncols() == 0) {
                return Err(ModelError::MissingData { model: model.name.clone(), operation: "prep" });
            }
        }
        clear(data, model).map(|_| ())
    }
}

impl EstimateFn for Ols {
    /// `β̂ = (XᵀWX)⁻¹ XᵀWy` with its covariance and fit statistics.
    fn estimate<'d>(&self, data: Option<&'d Data>, mut model: Model<'d>) -> ModelResult<Model<'d>> {
        let data = require_data(data, &model, "estimate")?;
        let design = Design::new(data, &model, "estimate")?;
        let (n, k) = design.x.dim();
        if n <= k {
            return Err(invalid(&model, format!("{n} observations for {k} coefficients")));
        }
        let (x, y) = design.weighted(data.weights.as_ref(), &model)?;

        let xtx = DMatrix::from_fn(k, k, |r, c| x.column(r).dot(&x.column(c)));
        let inverse = xtx.try_inverse().ok_or_else(|| invalid(&model, "XᵀX is singular"))?;
        let xty = x.t().dot(&y);
        let beta = Array1::from_shape_fn(k, |r| (0..k).map(|c| inverse[(r, c)] * xty[c]).sum::<f64>());

        let residuals = &y - &x.dot(&beta);
        let sse = residuals.dot(&residuals);
        let df = (n - k) as f64;
        let s_sq = sse / df;
        let cov = Array2::from_shape_fn((k, k), |(r, c)| inverse[(r, c)] * s_sq);
        let y_mean = y.sum() / n as f64;
        let sst = y.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>();
        debug!("{}: {k} coefficients from {n} observations, SSE {sse}", model.name);

        let params = model.parameters.get_or_insert_with(Data::default);
        params.title = "Regression coefficients".to_string();
        params.row_names = (0..k).map(|i| if i == 0 { "1".to_string() } else { format!("x{i}") }).collect();
        params.vector = Some(beta);
        params.matrix = Some(cov);

        let info = model.info.get_or_insert_with(Data::default);
        info.set_named("SSE", sse);
        info.set_named("SSR", sst - sse);
        info.set_named("SST", sst);
        if sst > 0.0 {
            info.set_named("R squared", 1.0 - sse / sst);
        }
        info.set_named("df", df);
        record_log_likelihood(&mut model, data);
        Ok(model)
    }
}

impl LogLikelihoodFn for Ols {
    /// `Σ ln φ(eᵢ; 0, σ) + Σ ln wᵢ`, with `e = Xβ - y` and `σ` the standard
    /// deviation of the errors.
    fn log_likelihood(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let (beta, _) = fitted_parts(model, "log_likelihood")?;
        let design = Design::new(data, model, "log_likelihood")?;
        design.check_width(beta)?;
        let errors = design.errors(beta);
        let sigma = error_spread(&errors, model)?;
        let dist = NormalDensity::new(0.0, sigma).map_err(|e| invalid(model, e.to_string()))?;
        let weight_term = data.weights.as_ref().map_or(0.0, |w| w.iter().map(|v| v.ln()).sum());
        Ok(errors.iter().map(|e| dist.ln_pdf(*e)).sum::<f64>() + weight_term)
    }
}

impl ScoreFn for Ols {
    /// Exact derivative of the log-likelihood with respect to `β`, including
    /// the dependence of `σ` on `β`. Covariance entries do not enter the
    /// likelihood and get zero.
    fn score(&self, data: &Data, out: &mut Array1<f64>, model: &Model<'_>) -> ModelResult<()> {
        let expected = model.require_parameters("score")?.packed_len();
        if out.len() != expected {
            return Err(ModelError::PackLengthMismatch { expected, found: out.len() });
        }
        let (beta, _) = fitted_parts(model, "score")?;
        let design = Design::new(data, model, "score")?;
        design.check_width(beta)?;
        let errors = design.errors(beta);
        let sigma = error_spread(&errors, model)?;

        let n = errors.len() as f64;
        let mean = errors.sum() / n;
        let d_sigma_term = -n / sigma + errors.dot(&errors) / sigma.powi(3);
        out.fill(0.0);
        for (j, column) in design.x.axis_iter(Axis(1)).enumerate() {
            let direct = -column.dot(&errors) / sigma.powi(2);
            let centred: f64 = errors.iter().zip(column.iter()).map(|(e, x)| (e - mean) * x).sum();
            out[j] = direct + d_sigma_term * centred / ((n - 1.0) * sigma);
        }
        Ok(())
    }
}

impl DrawFn for Ols {
    /// One row `[y, x₁, …]`: the regressors from the [`LmSettings`] input
    /// distribution, then `y = β₀ + Σ βⱼxⱼ + ε` with `ε ~ N(0, SSE / n)`.
    fn draw(&self, out: &mut [f64], rng: &mut dyn RngCore, model: &Model<'_>) -> ModelResult<()> {
        let (beta, _) = fitted_parts(model, "draw")?;
        let k = beta.len();
        if out.len() < k {
            return Err(ModelError::PackLengthMismatch { expected: k, found: out.len() });
        }
        let input = model.settings.get::<LmSettings>().and_then(|lm| lm.input_distribution.clone()).ok_or_else(
            || ModelError::SamplingFailed {
                model: model.name.clone(),
                reason: "draws need an input distribution for the regressors",
            },
        )?;
        let info = model.info.as_ref();
        let (Some(sse), Some(df)) =
            (info.and_then(|i| i.get_named("SSE")), info.and_then(|i| i.get_named("df")))
        else {
            return Err(ModelError::SamplingFailed {
                model: model.name.clone(),
                reason: "draws need a fitted error variance",
            });
        };

        let mut regressors = vec![0.0; k - 1];
        if !regressors.is_empty() {
            let sampler = input.capabilities.draw.clone().ok_or_else(|| ModelError::MissingCapability {
                model: input.name.clone(),
                operation: "draw",
            })?;
            sampler.draw(&mut regressors, rng, &input)?;
        }
        let sigma = (sse / (df + k as f64)).sqrt();
        let mean = beta[0] + regressors.iter().zip(beta.iter().skip(1)).map(|(x, b)| x * b).sum::<f64>();
        out[0] = mean + sigma * rng.sample::<f64, _>(StandardNormal);
        out[1..k].copy_from_slice(&regressors);
        Ok(())
    }
}

impl PredictFn for Ols {
    /// Fills missing dependent values with `Xβ`: NaN vector entries when a
    /// vector is present, otherwise NaN cells of matrix column 0 (the other
    /// columns being the regressors). Always fills in place.
    fn predict(&self, data: &mut Data, model: &Model<'_>) -> ModelResult<Option<Data>> {
        let (beta, _) = fitted_parts(model, "predict")?;
        let k = beta.len();
        let Data { vector, matrix, .. } = data;
        let matrix =
            matrix.as_mut().ok_or_else(|| ModelError::MissingData { model: model.name.clone(), operation: "predict" })?;
        if matrix.ncols() != k {
            return Err(ModelError::QueryWidthMismatch { expected: k, found: matrix.ncols() });
        }
        match vector {
            Some(y) => {
                for (target, row) in y.iter_mut().zip(matrix.rows()) {
                    if target.is_nan() {
                        *target = row.dot(beta);
                    }
                }
            }
            None => {
                for mut row in matrix.rows_mut() {
                    if row[0].is_nan() {
                        row[0] = beta[0] + (1..k).map(|j| beta[j] * row[j]).sum::<f64>();
                    }
                }
            }
        }
        Ok(None)
    }
}

impl ParameterModelFn for Ols {
    /// Closed form from the estimated covariance; the data is not used.
    /// `ParamIndex::All` gives the multivariate normal of `β̂`, a single
    /// index the t distribution of that coefficient on `df` degrees of
    /// freedom.
    fn parameter_model<'d>(&self, _data: Option<&'d Data>, model: &mut Model<'d>) -> ModelResult<Model<'d>> {
        let index = model
            .settings
            .get::<PmSettings>()
            .map(|pm| pm.index)
            .ok_or_else(|| ModelError::SettingsMismatch { group: "parameter_model".to_string() })?;
        let (beta, cov) = fitted_parts(model, "parameter_model")?;
        let cov = cov.ok_or(ModelError::NullModel { operation: "parameter_model" })?;
        match index {
            ParamIndex::All => Ok(multivariate_normal::with_parameters(beta.clone(), cov.clone())),
            ParamIndex::Single(i) => {
                if i >= beta.len() {
                    return Err(ModelError::IndexOutOfRange { index: i, len: beta.len() });
                }
                let df = model
                    .info
                    .as_ref()
                    .and_then(|info| info.get_named("df"))
                    .ok_or_else(|| invalid(model, "no degrees of freedom on the info page"))?;
                let variance = cov[[i, i]];
                if !(variance > 0.0 && variance.is_finite()) {
                    return Err(invalid(model, format!("variance of coefficient {i} is {variance}")));
                }
                Ok(t_distribution::with_parameters(beta[i], variance.sqrt(), df))
            }
        }
    }
}

impl PrintFn for Ols {
    /// Name, a coefficient table (estimate, standard error, t statistic),
    /// then the info page.
    fn print(&self, model: &Model<'_>, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", model.name)?;
        writeln!(out)?;
        let Some(params) = model.parameters.as_ref() else {
            return writeln!(out, "(not estimated)");
        };
        writeln!(out, "\tcoefficient\tstd. error\tt statistic")?;
        if let Some(beta) = params.vector.as_ref() {
            for (i, b) in beta.iter().enumerate() {
                let se = params.matrix.as_ref().and_then(|c| c.get((i, i))).map_or(f64::NAN, |v| v.sqrt());
                writeln!(out, "{}\t{b:.4}\t{se:.4}\t{:.4}", label(params, i), b / se)?;
            }
        }
        if let Some(info) = model.info.as_ref().filter(|i| !i.is_empty()) {
            writeln!(out)?;
            info.print(out)?;
        }
        Ok(())
    }
}

/// Unestimated regression; every size follows the data width.
pub fn model<'d>() -> Model<'d> {
    let imp = Rc::new(Ols);
    Model::new(NAME)
        .with_dsize(Dim::DataWidth)
        .with_bases(Dim::DataWidth, Dim::DataWidth, Dim::DataWidth)
        .with_capabilities(Capabilities {
            estimate: Some(imp.clone()),
            log_likelihood: Some(imp.clone()),
            score: Some(imp.clone()),
            draw: Some(imp.clone()),
            predict: Some(imp.clone()),
            prep: Some(imp.clone()),
            print: Some(imp.clone()),
            parameter_model: Some(imp),
            ..Capabilities::default()
        })
}
