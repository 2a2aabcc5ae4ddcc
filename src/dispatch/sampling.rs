//! Sampling operations: `draw` and the cumulative distribution `cdf`.
use std::rc::Rc;

use log::debug;
use ndarray::{Array2, ArrayView1};
use rand::RngCore;

use crate::data::Data;
use crate::dispatch::{has_likelihood, missing};
use crate::fallback::arms_draw;
use crate::model::{Model, ModelError, ModelResult};
use crate::settings::CdfSettings;

/// Fill `out` with one draw from `model`.
///
/// Uses the `draw` capability, else adaptive rejection Metropolis sampling
/// of the (univariate) log-likelihood, whose state is kept in the model's
/// [`ArmsSettings`](crate::settings::ArmsSettings).
///
/// # Errors
/// `MissingCapability` without a draw capability or any likelihood; errors
/// from the capability or the sampler.
pub fn draw(out: &mut [f64], rng: &mut dyn RngCore, model: &mut Model<'_>) -> ModelResult<()> {
    if let Some(cap) = model.capabilities.draw.clone() {
        return cap.draw(out, rng, model);
    }
    if !has_likelihood(model) {
        return Err(missing(model, "draw"));
    }
    debug!("{}: no draw capability; adaptive rejection sampling", model.name);
    arms_draw(out, rng, model)
}

/// Probability that a draw is componentwise at most the first row of `data`.
///
/// Uses the `cdf` capability, else the fraction of the cached Monte Carlo
/// draws (see [`CdfSettings`]) lying below the query. The draw matrix is
/// made on first use, `draws` rows of the model's `dsize` (or the query
/// width for a data-width model), and reused by later calls on the same
/// model. Copies, including the results of `estimate` and `set_parameters`,
/// draw afresh.
///
/// # Errors
/// - `EmptyQuery` if `data` has no observations.
/// - `QueryWidthMismatch` if the query is narrower than the draws.
/// - `SamplingFailed` if the draw count is zero.
/// - Errors from [`draw`].
pub fn cdf(data: &Data, model: &mut Model<'_>) -> ModelResult<f64> {
    if let Some(cap) = model.capabilities.cdf.clone() {
        return cap.cdf(data, model);
    }
    let query = data.first_row().ok_or(ModelError::EmptyQuery { operation: "cdf" })?;
    model.with_settings_group::<CdfSettings, _>(|cs, model| {
        let draws = match &cs.draws_made {
            Some(cached) => Rc::clone(cached),
            None => {
                let width = model.dsize.fixed().filter(|w| *w > 0).unwrap_or(query.len());
                let made = Rc::new(make_draws(cs, width, model)?);
                cs.draws_made = Some(Rc::clone(&made));
                made
            }
        };
        if draws.nrows() == 0 {
            return Err(ModelError::SamplingFailed {
                model: model.name.clone(),
                reason: "the Monte Carlo CDF has no draws",
            });
        }
        if query.len() < draws.ncols() {
            return Err(ModelError::QueryWidthMismatch { expected: draws.ncols(), found: query.len() });
        }
        let below = draws
            .rows()
            .into_iter()
            .filter(|row| row.iter().zip(query.iter()).all(|(d, q)| d <= q))
            .count();
        Ok(below as f64 / draws.nrows() as f64)
    })
}

fn make_draws(cs: &mut CdfSettings, width: usize, model: &mut Model<'_>) -> ModelResult<Array2<f64>> {
    let mut made = Array2::zeros((cs.draws, width));
    let mut row = vec![0.0; width];
    cs.rng.with(|rng| -> ModelResult<()> {
        for mut target in made.rows_mut() {
            draw(&mut row, rng, model)?;
            target.assign(&ArrayView1::from(&row[..]));
        }
        Ok(())
    })?;
    debug!("{}: cached {} draws for the Monte Carlo CDF", model.name, cs.draws);
    Ok(made)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::estimate;
    use crate::distributions::{normal, pmf};
    use crate::model::set_parameters;
    use crate::settings::RngHandle;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Draw through a capability and the missing-capability path.
    // - Monte Carlo CDF accuracy, caching, and query validation.
    //
    // They intentionally DO NOT cover:
    // - ARMS internals, tested with the sampler.
    // -------------------------------------------------------------------------

    fn normal_without_cdf(draws: usize) -> Model<'static> {
        let mut model = normal::with_parameters(0.0, 1.0)
            .with_settings(CdfSettings::default().with_draws(draws).with_rng(RngHandle::from_seed(8)));
        model.capabilities.cdf = None;
        model
    }

    #[test]
    // Purpose
    // -------
    // A bare model cannot be drawn from.
    //
    // Given
    // -----
    // - A model with no capabilities.
    //
    // Expect
    // ------
    // - `MissingCapability` naming `draw`.
    fn bare_model_cannot_draw() {
        let mut model = Model::new("bare");
        let mut rng = SmallRng::seed_from_u64(0);
        let err = draw(&mut [0.0], &mut rng, &mut model).unwrap_err();
        assert_eq!(err, ModelError::MissingCapability { model: "bare".into(), operation: "draw" });
    }

    #[test]
    // Purpose
    // -------
    // The Monte Carlo CDF of N(0, 1) approximates Φ and caches its draws.
    //
    // Given
    // -----
    // - 20000 draws; queries 0 and 1.
    //
    // Expect
    // ------
    // - cdf(0) ≈ 0.5, cdf(1) ≈ 0.841 within 0.02; one cached matrix of
    //   20000 × 1 reused by both calls.
    fn monte_carlo_cdf_approximates_normal() {
        // Arrange
        let mut model = normal_without_cdf(20_000);

        // Act
        let at_zero = cdf(&Data::from_vector(array![0.0]), &mut model).unwrap();
        let cached = Rc::clone(model.settings.get::<CdfSettings>().unwrap().draws_made.as_ref().unwrap());
        let at_one = cdf(&Data::from_vector(array![1.0]), &mut model).unwrap();

        // Assert
        assert_abs_diff_eq!(at_zero, 0.5, epsilon = 0.02);
        assert_abs_diff_eq!(at_one, 0.8413, epsilon = 0.02);
        assert_eq!(cached.dim(), (20_000, 1));
        let still = model.settings.get::<CdfSettings>().unwrap().draws_made.as_ref().unwrap();
        assert!(Rc::ptr_eq(&cached, still));
    }

    #[test]
    // Purpose
    // -------
    // Repeating a query gives the same value.
    //
    // Given
    // -----
    // - 500 draws; the query 0.3 twice.
    //
    // Expect
    // ------
    // - Identical results.
    fn repeated_query_is_idempotent() {
        let mut model = normal_without_cdf(500);
        let query = Data::from_vector(array![0.3]);
        let first = cdf(&query, &mut model).unwrap();
        let second = cdf(&query, &mut model).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    // Purpose
    // -------
    // Draws cached under old parameters are not reused after the model is
    // re-estimated or re-parameterized.
    //
    // Given
    // -----
    // - N(0, 1) without a CDF capability, queried at 0 (2000 draws).
    // - A fit on data centred on 10, and `set_parameters` to (10, 1).
    //
    // Expect
    // ------
    // - cdf(0) ≈ 0.5 before; below 0.01 for both derived models; the
    //   source keeps its own cache.
    fn derived_models_do_not_reuse_stale_draws() {
        // Arrange
        let mut model = normal_without_cdf(2000);
        let query = Data::from_vector(array![0.0]);
        let before = cdf(&query, &mut model).unwrap();
        let data = Data::from_vector(array![9.0, 10.0, 11.0, 10.5, 9.5]);

        // Act
        let mut fitted = estimate(Some(&data), &model).unwrap();
        let after_fit = cdf(&query, &mut fitted).unwrap();
        let mut moved = set_parameters(&model, &[10.0, 1.0]).unwrap();
        let after_set = cdf(&query, &mut moved).unwrap();

        // Assert
        assert_abs_diff_eq!(before, 0.5, epsilon = 0.05);
        assert!(after_fit < 0.01);
        assert!(after_set < 0.01);
        assert_eq!(cdf(&query, &mut model).unwrap(), before);
    }

    #[test]
    // Purpose
    // -------
    // A caller-supplied draw matrix is used as is.
    //
    // Given
    // -----
    // - Draws [[0], [1], [2], [3]] and query 1.5.
    //
    // Expect
    // ------
    // - 0.5.
    fn supplied_draws_are_used() {
        let mut model = normal_without_cdf(10);
        model.settings.add(CdfSettings::default().with_draws_made(array![[0.0], [1.0], [2.0], [3.0]]));
        assert_eq!(cdf(&Data::from_vector(array![1.5]), &mut model).unwrap(), 0.5);
    }

    #[test]
    // Purpose
    // -------
    // Empty and too-narrow queries are rejected.
    //
    // Given
    // -----
    // - An empty data set; a 1-wide query against 2-wide supplied draws.
    //
    // Expect
    // ------
    // - `EmptyQuery` and `QueryWidthMismatch`.
    fn invalid_queries_fail() {
        // Arrange
        let mut model = pmf::model();
        model.capabilities.cdf = None;
        model.settings.add(CdfSettings::default().with_draws_made(array![[0.0, 0.0], [1.0, 1.0]]));

        // Act / Assert
        assert_eq!(cdf(&Data::default(), &mut model).unwrap_err(), ModelError::EmptyQuery { operation: "cdf" });
        assert_eq!(
            cdf(&Data::from_vector(array![0.5]), &mut model).unwrap_err(),
            ModelError::QueryWidthMismatch { expected: 2, found: 1 }
        );
    }
}
