//! Multivariate normal distribution.
//!
//! Parameters: the vector holds the mean `μ` (length `k`) and the matrix the
//! covariance `Σ` (`k × k`). Every size follows the data width, so the model
//! can be estimated on data of any width; `with_parameters` fixes `dsize` to
//! `k`.
use std::f64::consts::PI;
use std::rc::Rc;

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

use crate::data::Data;
use crate::distributions::{invalid, record_log_likelihood, require_data};
use crate::model::{Capabilities, Dim, DrawFn, EstimateFn, LogLikelihoodFn, Model, ModelError, ModelResult};

pub const NAME: &str = "Multivariate normal distribution";

struct MultivariateNormal;

/// Mean, lower Cholesky factor, and log-determinant of the covariance.
struct Factored {
    mean: DVector<f64>,
    lower: DMatrix<f64>,
    log_det: f64,
}

impl Factored {
    fn new(model: &Model<'_>, operation: &'static str) -> ModelResult<Self> {
        let params = model.require_parameters(operation)?;
        let (Some(mean), Some(cov)) = (params.vector.as_ref(), params.matrix.as_ref()) else {
            return Err(ModelError::NullModel { operation });
        };
        let k = mean.len();
        if cov.dim() != (k, k) {
            return Err(invalid(model, format!("covariance is {:?} for a mean of length {k}", cov.dim())));
        }
        let sigma = DMatrix::from_fn(k, k, |r, c| cov[[r, c]]);
        let lower = sigma.cholesky().ok_or_else(|| invalid(model, "covariance is not positive definite"))?.l();
        let log_det = 2.0 * lower.diagonal().iter().map(|d| d.ln()).sum::<f64>();
        Ok(Self { mean: DVector::from_iterator(k, mean.iter().copied()), lower, log_det })
    }

    fn dim(&self) -> usize {
        self.mean.len()
    }

    fn log_density(&self, x: &Array1<f64>) -> ModelResult<f64> {
        let k = self.dim();
        if x.len() != k {
            return Err(ModelError::QueryWidthMismatch { expected: k, found: x.len() });
        }
        let diff = DVector::from_iterator(k, x.iter().zip(self.mean.iter()).map(|(a, m)| a - m));
        let whitened = self
            .lower
            .solve_lower_triangular(&diff)
            .ok_or(ModelError::QueryWidthMismatch { expected: k, found: x.len() })?;
        let quad = whitened.norm_squared();
        Ok(-0.5 * (k as f64 * (2.0 * PI).ln() + self.log_det + quad))
    }
}

/// Observations of `data` as rows.
fn observation_rows(data: &Data) -> Array2<f64> {
    match (&data.matrix, &data.vector) {
        (Some(m), _) => m.clone(),
        (None, Some(v)) => v.clone().insert_axis(Axis(1)),
        (None, None) => Array2::zeros((0, 0)),
    }
}

impl EstimateFn for MultivariateNormal {
    /// Column means and the maximum-likelihood (divisor `n`) covariance.
    fn estimate<'d>(&self, data: Option<&'d Data>, mut model: Model<'d>) -> ModelResult<Model<'d>> {
        let data = require_data(data, &model, "estimate")?;
        let rows = observation_rows(data);
        let n = rows.nrows();
        let mean = rows.mean_axis(Axis(0)).ok_or(ModelError::MissingData { model: model.name.clone(), operation: "estimate" })?;
        let centered = &rows - &mean;
        let cov = centered.t().dot(&centered) / n as f64;
        let params = model.parameters.get_or_insert_with(Data::default);
        params.vector = Some(mean);
        params.matrix = Some(cov);
        record_log_likelihood(&mut model, data);
        Ok(model)
    }
}

impl LogLikelihoodFn for MultivariateNormal {
    fn log_likelihood(&self, data: &Data, model: &Model<'_>) -> ModelResult<f64> {
        let factored = Factored::new(model, "log_likelihood")?;
        observation_rows(data).rows().into_iter().map(|row| factored.log_density(&row.to_owned())).sum()
    }
}

impl DrawFn for MultivariateNormal {
    /// `μ + L z` with `z` standard normal and `L Lᵀ = Σ`.
    fn draw(&self, out: &mut [f64], rng: &mut dyn RngCore, model: &Model<'_>) -> ModelResult<()> {
        let factored = Factored::new(model, "draw")?;
        let k = factored.dim();
        if out.len() < k {
            return Err(ModelError::PackLengthMismatch { expected: k, found: out.len() });
        }
        let z = DVector::from_fn(k, |_, _| rng.sample::<f64, _>(StandardNormal));
        let x = &factored.mean + &factored.lower * z;
        for (slot, value) in out.iter_mut().zip(x.iter()) {
            *slot = *value;
        }
        Ok(())
    }
}

/// Unparameterized model; all sizes follow the data width.
pub fn model<'d>() -> Model<'d> {
    let imp = Rc::new(MultivariateNormal);
    Model::new(NAME)
        .with_dsize(Dim::DataWidth)
        .with_bases(Dim::DataWidth, Dim::DataWidth, Dim::DataWidth)
        .with_capabilities(Capabilities {
            estimate: Some(imp.clone()),
            log_likelihood: Some(imp.clone()),
            draw: Some(imp),
            ..Capabilities::default()
        })
}

/// Model with mean `mean` and covariance `cov`; `dsize` is `mean.len()`.
pub fn with_parameters<'d>(mean: Array1<f64>, cov: Array2<f64>) -> Model<'d> {
    let k = mean.len();
    let parameters = Data { vector: Some(mean), matrix: Some(cov), ..Data::default() };
    model().with_dsize(Dim::Fixed(k)).with_parameters(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{draw, estimate, log_likelihood};
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    // Purpose
    // -------
    // With identity covariance the log density is the sum of univariate ones.
    //
    // Given
    // -----
    // - μ = (0, 0), Σ = I, x = (1, -1).
    //
    // Expect
    // ------
    // - ℓ = -ln 2π - 1.
    fn identity_covariance_log_density() {
        let m = with_parameters(array![0.0, 0.0], Array2::eye(2));
        let ll = log_likelihood(&Data::from_matrix(array![[1.0, -1.0]]), &m).unwrap();
        assert_abs_diff_eq!(ll, -(2.0 * PI).ln() - 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Estimating on draws recovers the mean and covariance.
    //
    // Given
    // -----
    // - 5000 draws from μ = (1, 2), Σ = [[2, 0.6], [0.6, 1]].
    //
    // Expect
    // ------
    // - Estimates within 0.1 of the truth; the estimate's sizes resolve to 2.
    fn estimate_recovers_draws() {
        // Arrange
        let mut truth = with_parameters(array![1.0, 2.0], array![[2.0, 0.6], [0.6, 1.0]]);
        let mut rng = SmallRng::seed_from_u64(21);
        let mut rows = Array2::zeros((5000, 2));
        let mut buf = [0.0; 2];
        for mut row in rows.rows_mut() {
            draw(&mut buf, &mut rng, &mut truth).unwrap();
            row.assign(&array![buf[0], buf[1]]);
        }
        let data = Data::from_matrix(rows);

        // Act
        let fitted = estimate(Some(&data), &model()).unwrap();

        // Assert
        let params = fitted.parameters.as_ref().unwrap();
        let mean = params.vector.as_ref().unwrap();
        let cov = params.matrix.as_ref().unwrap();
        assert_eq!(fitted.dsize, Dim::Fixed(2));
        assert_abs_diff_eq!(mean[0], 1.0, epsilon = 0.1);
        assert_abs_diff_eq!(mean[1], 2.0, epsilon = 0.1);
        assert_abs_diff_eq!(cov[[0, 0]], 2.0, epsilon = 0.15);
        assert_abs_diff_eq!(cov[[0, 1]], 0.6, epsilon = 0.1);
        assert_abs_diff_eq!(cov[[1, 1]], 1.0, epsilon = 0.1);
    }

    #[test]
    // Purpose
    // -------
    // A covariance that is not positive definite is reported.
    //
    // Given
    // -----
    // - Σ = [[1, 2], [2, 1]].
    //
    // Expect
    // ------
    // - `InvalidParameters`.
    fn indefinite_covariance_fails() {
        let m = with_parameters(array![0.0, 0.0], array![[1.0, 2.0], [2.0, 1.0]]);
        let err = log_likelihood(&Data::from_matrix(array![[0.0, 0.0]]), &m).unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameters { .. }));
    }
}
