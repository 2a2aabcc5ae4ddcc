//! Integration tests for capability dispatch and the inference fallbacks.
//!
//! Purpose
//! -------
//! - Validate the end-to-end behavior of models that lack one or more
//!   capabilities: estimation by maximum likelihood, likelihood conversions,
//!   numerical scores, Monte Carlo CDFs over adaptive rejection draws,
//!   imputation, and both parameter-model fallbacks.
//! - Use the bundled distributions with capabilities removed, so every
//!   fallback result can be compared with a closed form.
//!
//! Coverage
//! --------
//! - `dispatch`: every public operation, through both its capability and
//!   its fallback path.
//! - `model::lifecycle`: copy independence and release.
//! - `settings`: `MleSettings`, `CdfSettings`, `PmSettings`, `ArmsSettings`
//!   and shared generators.
//!
//! Exclusions
//! ----------
//! - Fine-grained behavior of containers, settings stores, and optimizer
//!   building blocks, which is covered by unit tests.
//! - Exact distributional testing of samplers; moments are checked with
//!   loose bounds.
use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use ndarray::{Array1, array};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rust_statmodels::{
    Capabilities, Data, Dim, Model, ModelError, ModelResult, cdf, copy, draw, estimate, free,
    log_likelihood, p, parameter_model, predict, score,
    distributions::{bernoulli, exponential, multivariate_normal, normal, pmf},
    model::{EstimateFn, PredictFn},
    settings::{ArmsSettings, CdfSettings, MleSettings, ParamIndex, PmSettings, RngHandle},
};

/// Purpose
/// -------
/// Draw `n` values from `model` through the dispatch layer.
///
/// Invariants
/// ----------
/// - Panics if a draw fails; callers pass models that can be drawn from.
fn sample(model: &mut Model<'_>, n: usize, seed: u64) -> Data {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut out = [0.0];
    let values: Array1<f64> = (0..n)
        .map(|_| {
            draw(&mut out, &mut rng, model).expect("draw should succeed for a parameterized model");
            out[0]
        })
        .collect();
    Data::from_vector(values)
}

/// Generator shared between a test and the estimator it drives.
#[derive(Debug, Clone)]
struct SharedRng(Rc<RefCell<SmallRng>>);

rust_statmodels::impl_extension!(SharedRng);

/// Estimator whose "estimate" is a fresh draw `(z₁, 1 + z₂)` from the
/// shared generator, ignoring the data.
struct NoisyEstimate;

impl EstimateFn for NoisyEstimate {
    fn estimate<'d>(&self, _data: Option<&'d Data>, mut model: Model<'d>) -> ModelResult<Model<'d>> {
        let shared = model
            .extension::<SharedRng>()
            .map(|ext| Rc::clone(&ext.0))
            .ok_or(ModelError::NullModel { operation: "estimate" })?;
        let (z1, z2): (f64, f64) = {
            let mut rng = shared.borrow_mut();
            (rng.sample(StandardNormal), rng.sample(StandardNormal))
        };
        model.parameters = Some(Data::from_vector(array![z1, 1.0 + z2]));
        Ok(model)
    }
}

fn noisy_estimator<'d>(draws: usize, index: ParamIndex) -> Model<'d> {
    Model::new("noisy estimator")
        .with_bases(Dim::Fixed(2), Dim::Fixed(0), Dim::Fixed(0))
        .with_capabilities(Capabilities { estimate: Some(Rc::new(NoisyEstimate)), ..Capabilities::default() })
        .with_extension(SharedRng(Rc::new(RefCell::new(SmallRng::seed_from_u64(99)))))
        .with_settings(PmSettings::default().with_draws(draws).with_index(index))
}

#[test]
// Purpose
// -------
// A Bernoulli model without an estimate capability is fitted by the
// maximum-likelihood fallback.
//
// Given
// -----
// - 2000 draws from Bernoulli(0.5).
// - The estimate capability removed; search started at 0.3.
//
// Expect
// ------
// - p̂ within 0.1 of 0.5 and equal to the sample share within 1e-3.
// - The info page records the log-likelihood and a convergence flag.
fn bernoulli_mle_fallback_recovers_probability() {
    // Arrange
    let data = sample(&mut bernoulli::with_parameters(0.5), 2000, 17);
    let share = data.values().filter(|x| *x != 0.0).count() as f64 / 2000.0;
    let mut model = bernoulli::model().with_settings(MleSettings::default().with_starting_point(array![0.3]));
    model.capabilities.estimate = None;

    // Act
    let fitted = estimate(Some(&data), &model).expect("MLE fallback should converge");

    // Assert
    let p_hat = fitted.parameters.as_ref().unwrap().vector.as_ref().unwrap()[0];
    assert_abs_diff_eq!(p_hat, 0.5, epsilon = 0.1);
    assert_abs_diff_eq!(p_hat, share, epsilon = 1e-3);
    let info = fitted.info.as_ref().unwrap();
    assert_eq!(info.title, "Info");
    assert!(info.get_named("log-likelihood").unwrap().is_finite());
    assert!(info.get_named("converged").is_some());
}

#[test]
// Purpose
// -------
// `p` and `log_likelihood` agree whichever of the two a model implements.
//
// Given
// -----
// - Normal and Exponential (log-likelihood only) and a PMF (p only).
//
// Expect
// ------
// - p = exp(ℓ) within 1e-12 for every model.
fn p_and_log_likelihood_agree() {
    // Arrange
    let obs = Data::from_vector(array![0.5, 1.0, 1.5]);
    let support = Data::from_vector(array![0.5, 1.0, 1.5, 1.0]);
    let models = [normal::with_parameters(1.0, 0.7), exponential::with_parameters(1.3), pmf::from_support(support)];

    for model in &models {
        // Act
        let prob = p(&obs, model).unwrap();
        let ll = log_likelihood(&obs, model).unwrap();

        // Assert
        assert_abs_diff_eq!(prob, ll.exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(prob.ln(), ll, epsilon = 1e-12);
    }
}

#[test]
// Purpose
// -------
// Copies are independent and releasing one leaves the other usable.
//
// Given
// -----
// - A fitted Normal and a copy whose parameters are overwritten.
//
// Expect
// ------
// - The original parameters are unchanged; the original still evaluates
//   after the copy is freed.
fn copies_are_independent() {
    // Arrange
    let data = Data::from_vector(array![1.0, 2.0, 4.0]);
    let fitted = estimate(Some(&data), &normal::model()).unwrap();
    let before = fitted.parameters.clone();
    let mut twin = copy(&fitted).unwrap();

    // Act
    twin.parameters.as_mut().unwrap().unpack(array![9.0, 9.0].view()).unwrap();
    free(Some(twin));

    // Assert
    assert_eq!(fitted.parameters, before);
    assert!(log_likelihood(&data, &fitted).unwrap().is_finite());
}

#[test]
// Purpose
// -------
// The numerical score of a model without a score capability matches the
// analytic derivative.
//
// Given
// -----
// - Exponential(λ = 1.5), which has no score; data [0.2, 0.7, 1.1].
//
// Expect
// ------
// - dℓ/dλ = n/λ - Σx within 1e-5.
fn exponential_numerical_score() {
    // Arrange
    let model = exponential::with_parameters(1.5);
    let data = Data::from_vector(array![0.2, 0.7, 1.1]);
    let mut out = Array1::zeros(1);

    // Act
    score(&data, &mut out, &model).unwrap();

    // Assert
    assert_abs_diff_eq!(out[0], 3.0 / 1.5 - 2.0, epsilon = 1e-5);
}

#[test]
// Purpose
// -------
// Chain two fallbacks: a Monte Carlo CDF built from ARMS draws of a model
// that has neither a CDF nor a sampler.
//
// Given
// -----
// - Exponential(1) without draw and cdf; ARMS bounds [0, 20];
//   3000 CDF draws from a seeded generator.
//
// Expect
// ------
// - F(1) within 0.05 of 1 - e⁻¹; a second query reuses the cache and
//   returns the same value; a copy of the model starts without a cache.
fn monte_carlo_cdf_over_arms_draws() {
    // Arrange
    let mut model = exponential::with_parameters(1.0)
        .with_settings(ArmsSettings::default().with_bounds(0.0, 20.0))
        .with_settings(CdfSettings::default().with_draws(3000).with_rng(RngHandle::from_seed(5)));
    model.capabilities.draw = None;
    model.capabilities.cdf = None;
    let query = Data::from_vector(array![1.0]);

    // Act
    let first = cdf(&query, &mut model).unwrap();
    let second = cdf(&query, &mut model).unwrap();
    let twin = copy(&model).unwrap();

    // Assert
    assert_abs_diff_eq!(first, 1.0 - (-1f64).exp(), epsilon = 0.05);
    assert_eq!(first, second);
    let cache = model.settings.get::<CdfSettings>().unwrap().draws_made.as_ref().unwrap();
    assert_eq!(cache.dim(), (3000, 1));
    assert!(twin.settings.get::<CdfSettings>().unwrap().draws_made.is_none());
}

#[test]
// Purpose
// -------
// Without data, the parameter model is the empirical distribution of
// repeated estimates.
//
// Given
// -----
// - An estimator drawing (z₁, 1 + z₂) from a shared generator; 400 draws.
//
// Expect
// ------
// - Index All: a PMF whose support has 400 rows of width 2, with column
//   means near (0, 1).
// - Index 1: a univariate PMF over 400 points.
fn simulated_parameter_model_support_size() {
    // Arrange
    let mut joint_source = noisy_estimator(400, ParamIndex::All);
    let mut marginal_source = noisy_estimator(400, ParamIndex::Single(1));

    // Act
    let joint = parameter_model(None, &mut joint_source).unwrap();
    let marginal = parameter_model(None, &mut marginal_source).unwrap();

    // Assert
    let support = joint.parameters.as_ref().unwrap();
    assert_eq!(joint.name, pmf::NAME);
    assert_eq!(support.observation_count(), 400);
    assert_eq!(support.width(), 2);
    assert_abs_diff_eq!(support.column_mean(0).unwrap(), 0.0, epsilon = 0.2);
    assert_abs_diff_eq!(support.column_mean(1).unwrap(), 1.0, epsilon = 0.2);
    let column = marginal.parameters.as_ref().unwrap();
    assert_eq!(column.observation_count(), 400);
    assert_eq!(column.width(), 1);
}

#[test]
// Purpose
// -------
// With data, the parameter model of a Normal mean reflects its standard
// error.
//
// Given
// -----
// - 400 draws from N(5, 2); a fitted Normal; 200 bootstrap resamples for
//   parameter 0.
//
// Expect
// ------
// - A Normal centred on μ̂ with σ ≈ 2/√400 = 0.1 (within 0.03).
fn bootstrap_parameter_model_recovers_standard_error() {
    // Arrange
    let data = sample(&mut normal::with_parameters(5.0, 2.0), 400, 23);
    let mut fitted = estimate(Some(&data), &normal::model()).unwrap();
    fitted.settings.add(PmSettings::default().with_draws(200).with_rng(RngHandle::from_seed(6)));
    let mu_hat = fitted.parameters.as_ref().unwrap().vector.as_ref().unwrap()[0];

    // Act
    let pm = parameter_model(Some(&data), &mut fitted).unwrap();

    // Assert
    let params = pm.parameters.as_ref().unwrap().vector.as_ref().unwrap();
    assert_eq!(pm.name, normal::NAME);
    assert_abs_diff_eq!(params[0], mu_hat, epsilon = 1e-12);
    assert_abs_diff_eq!(params[1], 0.1, epsilon = 0.03);
}

#[test]
// Purpose
// -------
// Predicting without data fills a whole `dsize`-wide row.
//
// Given
// -----
// - A 3-dimensional MVN (no predict capability) and no data.
//
// Expect
// ------
// - A 1×3 matrix with no NaN left, at the mean.
fn predict_without_data_fills_row() {
    // Arrange
    let model = multivariate_normal::with_parameters(array![0.5, 1.5, -2.0], ndarray::Array2::eye(3));

    // Act
    let out = predict(None, &model).unwrap();

    // Assert
    let row = out.matrix.as_ref().unwrap();
    assert_eq!(row.dim(), (1, 3));
    assert_eq!(out.nan_count(), 0);
    for (got, want) in row.iter().zip([0.5, 1.5, -2.0]) {
        assert_abs_diff_eq!(*got, want, epsilon = 1e-3);
    }
}

#[test]
// Purpose
// -------
// A predict capability that returns a replacement short-circuits
// imputation, even if the replacement still holds NaN.
//
// Given
// -----
// - A model whose predict returns [7, NaN] and that has no likelihood.
//
// Expect
// ------
// - The replacement is returned unchanged.
fn predict_replacement_is_returned_as_is() {
    // Arrange
    struct Replace;
    impl PredictFn for Replace {
        fn predict(&self, _: &mut Data, _: &Model<'_>) -> ModelResult<Option<Data>> {
            Ok(Some(Data::from_vector(array![7.0, f64::NAN])))
        }
    }
    let model = Model::new("replacer")
        .with_dsize(Dim::Fixed(2))
        .with_capabilities(Capabilities { predict: Some(Rc::new(Replace)), ..Capabilities::default() });

    // Act
    let out = predict(Some(Data::from_vector(array![f64::NAN, f64::NAN])), &model).unwrap();

    // Assert
    let v = out.vector.as_ref().unwrap();
    assert_eq!(v[0], 7.0);
    assert!(v[1].is_nan());
}
