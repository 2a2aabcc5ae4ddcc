//! Adaptive rejection Metropolis sampling for univariate models.
//!
//! The envelope is piecewise constant over the hull abscissae in
//! `[lower, upper]`: on each segment it sits at the larger of the two
//! endpoint log densities. That bounds any log-concave density away from its
//! mode; where it does not bound the density, the Metropolis step corrects
//! the chain. Rejected and under-covered points refine the hull until it
//! holds `max_points` abscissae.
use log::{debug, trace};
use ndarray::array;
use rand::{Rng, RngCore};

use crate::data::Data;
use crate::dispatch::log_likelihood;
use crate::model::{Model, ModelError, ModelResult};
use crate::settings::ArmsSettings;

/// Proposals tried for a single draw before giving up.
const MAX_PROPOSALS: usize = 10_000;

/// One draw into `out[0]` using the model's [`ArmsSettings`] (created with
/// defaults if absent). The hull and the chain state persist in the group
/// between calls. Only `out[0]` is written.
///
/// # Errors
/// - `SamplingFailed` if the bounds are unusable, the density vanishes at
///   every hull point, or no proposal is accepted.
/// - Errors raised by the model's log-likelihood.
pub fn arms_draw(out: &mut [f64], rng: &mut dyn RngCore, model: &mut Model<'_>) -> ModelResult<()> {
    let Some(slot) = out.first_mut() else {
        return Ok(());
    };
    *slot = model.with_settings_group::<ArmsSettings, _>(|arms, model| {
        if arms.hull.is_empty() {
            build_hull(arms, model)?;
        }
        let proposal = propose(arms, rng, model)?;
        let next = metropolis(arms, proposal, rng, model)?;
        arms.previous = Some(next);
        Ok(next)
    })?;
    Ok(())
}

/// `log p(x)`, with non-finite values treated as outside the support.
fn log_density(x: f64, model: &Model<'_>) -> ModelResult<f64> {
    let ll = log_likelihood(&Data::from_vector(array![x]), model)?;
    Ok(if ll.is_nan() { f64::NEG_INFINITY } else { ll })
}

fn build_hull(arms: &mut ArmsSettings, model: &Model<'_>) -> ModelResult<()> {
    if !(arms.lower.is_finite() && arms.upper.is_finite() && arms.lower < arms.upper) {
        return Err(failed(model, "sampling bounds must be finite with lower < upper"));
    }
    let n = arms.init_points.max(3);
    let step = (arms.upper - arms.lower) / (n - 1) as f64;
    let mut hull = Vec::with_capacity(n);
    for i in 0..n {
        let x = if i + 1 == n { arms.upper } else { arms.lower + step * i as f64 };
        hull.push((x, log_density(x, model)?));
    }
    if hull.iter().all(|(_, lp)| *lp == f64::NEG_INFINITY) {
        return Err(failed(model, "the density is zero at every initial hull point"));
    }
    trace!("{}: initial hull of {n} points on [{}, {}]", model.name, arms.lower, arms.upper);
    arms.hull = hull;
    Ok(())
}

/// Envelope height on each hull segment.
fn envelope(hull: &[(f64, f64)]) -> Vec<f64> {
    hull.windows(2).map(|w| w[0].1.max(w[1].1)).collect()
}

/// Envelope height at `x`.
fn envelope_at(hull: &[(f64, f64)], x: f64) -> f64 {
    let i = hull.partition_point(|(h, _)| *h <= x).clamp(1, hull.len().max(2) - 1);
    hull[i - 1].1.max(hull[i].1)
}

/// Rejection-sample a point from the envelope, refining the hull on the way.
fn propose(arms: &mut ArmsSettings, rng: &mut dyn RngCore, model: &Model<'_>) -> ModelResult<f64> {
    for _ in 0..MAX_PROPOSALS {
        let heights = envelope(&arms.hull);
        let top = heights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if top == f64::NEG_INFINITY {
            return Err(failed(model, "the envelope has no mass"));
        }
        let weights: Vec<f64> = arms
            .hull
            .windows(2)
            .zip(&heights)
            .map(|(w, h)| (w[1].0 - w[0].0) * (h - top).exp())
            .collect();
        let total: f64 = weights.iter().sum();
        let mut target = rng.gen::<f64>() * total;
        let mut segment = weights.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                segment = i;
                break;
            }
            target -= w;
        }

        let (left, right) = (arms.hull[segment].0, arms.hull[segment + 1].0);
        let x = left + rng.gen::<f64>() * (right - left);
        let lp = log_density(x, model)?;
        let height = heights[segment];
        let accept = lp >= height || rng.gen::<f64>().ln() < lp - height;
        if (!accept || lp > height) && arms.hull.len() < arms.max_points {
            insert_point(&mut arms.hull, x, lp);
        }
        if accept {
            return Ok(x);
        }
    }
    Err(failed(model, "no proposal was accepted"))
}

fn insert_point(hull: &mut Vec<(f64, f64)>, x: f64, lp: f64) {
    let i = hull.partition_point(|(h, _)| *h < x);
    if hull.get(i).map_or(true, |(h, _)| *h != x) {
        hull.insert(i, (x, lp));
    }
}

/// Metropolis correction against the previous state of the chain.
fn metropolis(
    arms: &ArmsSettings, proposal: f64, rng: &mut dyn RngCore, model: &Model<'_>,
) -> ModelResult<f64> {
    let Some(current) = arms.previous else {
        return Ok(proposal);
    };
    let lp_new = log_density(proposal, model)?;
    let lp_cur = log_density(current, model)?;
    if lp_cur == f64::NEG_INFINITY {
        return Ok(proposal);
    }
    let env_new = envelope_at(&arms.hull, proposal);
    let env_cur = envelope_at(&arms.hull, current);
    let log_ratio = lp_new + lp_cur.min(env_cur) - lp_cur - lp_new.min(env_new);
    if log_ratio >= 0.0 || rng.gen::<f64>().ln() < log_ratio {
        Ok(proposal)
    } else {
        debug!("{}: Metropolis step kept {current}", model.name);
        Ok(current)
    }
}

fn failed(model: &Model<'_>, reason: &'static str) -> ModelError {
    ModelError::SamplingFailed { model: model.name.clone(), reason }
}
